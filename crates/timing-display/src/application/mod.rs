//! Application layer use cases for the timing display.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure business rules, here `timing_core`) and the infrastructure (serial
//! devices, the console, config files).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain functions to fulfil a goal (e.g., "read lines off
//!   the radio link and tell the operator how each run should be shown").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so a scripted transport can replace the serial port in tests.
//! - **Contain no direct OS calls**.
//!
//! # Sub-modules
//!
//! - **`run_session`** – Owns one open transport, drives the bounded read loop,
//!   decodes and classifies each line, and emits events to a report sink.

pub mod run_session;
