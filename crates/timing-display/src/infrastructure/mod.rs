//! Infrastructure layer for the timing display.
//!
//! Contains OS-facing adapters: the serial transport, the report sinks that
//! render session events, and configuration file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `timing_core`, but MUST NOT be imported by `timing_core`.

pub mod reporting;
pub mod storage;
pub mod transport;
