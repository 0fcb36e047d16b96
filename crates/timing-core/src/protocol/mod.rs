//! Protocol module containing the line decoder for the telemetry wire format.

pub mod decoder;

pub use decoder::{decode, DecodeError, NumericField, FIELD_COUNT};
