//! # timing-core
//!
//! Shared library for the finish-line timing display containing the telemetry
//! record model, the priority classification rule, and the line decoder.
//!
//! It has zero dependencies on OS APIs, async runtimes, or serial drivers, so
//! every function here can be called from any thread or test without setup.
//!
//! # Architecture overview (for beginners)
//!
//! The timing system at the finish line sends one text line per completed run
//! over a LoRa radio that is bridged to a serial port:
//!
//! ```text
//! CAR7, 00:12.345, 1, 0, 0, 0
//! ```
//!
//! This crate turns such a line into something the display can act on:
//!
//! - **`protocol`** – How a line of text becomes a typed [`Record`].  The
//!   decoder is strict: six fields, four integers, or the whole line is
//!   rejected with a [`DecodeError`] that says why.
//!
//! - **`domain`** – Pure business rules.  The most important piece is
//!   [`classify`]: it decides which colour the board shows for a run, with a
//!   safety signal (off course) always winning.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `timing_core::Record` instead of `timing_core::domain::record::Record`.
pub use domain::record::{classify, Classification, Record};
pub use protocol::decoder::{decode, DecodeError, NumericField};
