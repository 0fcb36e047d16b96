//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the optional TOML file that supplies the
//! connection parameters (device, bit rate, read timeout) and output
//! preferences, falling back to built-in defaults when no file is given.

pub mod config;
