//! TOML-based configuration for the timing display.
//!
//! Example file:
//!
//! ```toml
//! [serial]
//! device_id = "/dev/ttyUSB0"
//! bit_rate = 115200
//! read_timeout_ms = 1000
//!
//! [output]
//! format = "text"
//! log_level = "info"
//! ```
//!
//! Every field is optional; `#[serde(default = "...")]` fills in the value
//! the display uses out of the box.  Command-line flags override the file
//! (see `main.rs`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::run_session::SessionConfig;
use crate::infrastructure::reporting::OutputFormat;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Connection parameters for the serial link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialConfig {
    /// Device node of the radio's serial adapter.
    #[serde(default = "default_device_id")]
    pub device_id: String,
    /// Link speed in bits per second.
    #[serde(default = "default_bit_rate")]
    pub bit_rate: u32,
    /// Ceiling for each blocking read, in milliseconds.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

/// Console and logging preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_device_id() -> String {
    "/dev/ttyUSB0".to_string()
}
fn default_bit_rate() -> u32 {
    115_200
}
fn default_read_timeout_ms() -> u64 {
    1_000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            bit_rate: default_bit_rate(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            log_level: default_log_level(),
        }
    }
}

impl DisplayConfig {
    /// Checks the values the session relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty device, a zero bit rate,
    /// or a zero read timeout (reads must always be bounded).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.device_id.trim().is_empty() {
            return Err(ConfigError::Invalid("device_id must not be empty".to_string()));
        }
        if self.serial.bit_rate == 0 {
            return Err(ConfigError::Invalid("bit_rate must be greater than zero".to_string()));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "read_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the session parameters from the serial section.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            device_id: self.serial.device_id.clone(),
            bit_rate: self.serial.bit_rate,
            read_timeout: Duration::from_millis(self.serial.read_timeout_ms),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads a [`DisplayConfig`] from `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read (including when it
/// does not exist: an explicitly named file is expected to be there) and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<DisplayConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: DisplayConfig = toml::from_str(&content)?;
    Ok(cfg)
}

/// Loads the file at `path` if one was given, otherwise returns defaults.
///
/// # Errors
///
/// Same as [`load_config`].
pub fn load_config_or_default(path: Option<&Path>) -> Result<DisplayConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(DisplayConfig::default()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_field_hardware() {
        let cfg = DisplayConfig::default();
        assert_eq!(cfg.serial.device_id, "/dev/ttyUSB0");
        assert_eq!(cfg.serial.bit_rate, 115_200);
        assert_eq!(cfg.serial.read_timeout_ms, 1_000);
        assert_eq!(cfg.output.format, OutputFormat::Text);
        assert_eq!(cfg.output.log_level, "info");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: DisplayConfig = toml::from_str("").expect("empty file is valid");
        assert_eq!(cfg, DisplayConfig::default());
    }

    #[test]
    fn test_partial_serial_section_overrides_only_given_fields() {
        // Arrange
        let toml_str = r#"
[serial]
device_id = "/dev/ttyACM0"
"#;

        // Act
        let cfg: DisplayConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.serial.device_id, "/dev/ttyACM0");
        assert_eq!(cfg.serial.bit_rate, 115_200);
    }

    #[test]
    fn test_full_file_round_trips() {
        let mut cfg = DisplayConfig::default();
        cfg.serial.bit_rate = 57_600;
        cfg.output.format = OutputFormat::Json;

        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: DisplayConfig = toml::from_str(&toml_str).expect("deserialize");

        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let result: Result<DisplayConfig, toml::de::Error> = toml::from_str("[[[ nope");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_read_timeout() {
        let mut cfg = DisplayConfig::default();
        cfg.serial.read_timeout_ms = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_device() {
        let mut cfg = DisplayConfig::default();
        cfg.serial.device_id = "  ".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_bit_rate() {
        let mut cfg = DisplayConfig::default();
        cfg.serial.bit_rate = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_session_config_converts_timeout_to_duration() {
        let mut cfg = DisplayConfig::default();
        cfg.serial.read_timeout_ms = 250;

        let session = cfg.session_config();

        assert_eq!(session.read_timeout, Duration::from_millis(250));
        assert_eq!(session.device_id, "/dev/ttyUSB0");
    }

    #[test]
    fn test_load_config_missing_file_is_io_error() {
        let path = PathBuf::from("/nonexistent/path/timing/config.toml");
        assert!(matches!(load_config(&path), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_config_or_default_without_path_is_default() {
        let cfg = load_config_or_default(None).unwrap();
        assert_eq!(cfg, DisplayConfig::default());
    }

    #[test]
    fn test_load_config_reads_file_from_temp_dir() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("timing_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[serial]\nbit_rate = 9600\n[output]\nlog_level = \"debug\"\n").unwrap();

        // Act
        let cfg = load_config(&path).expect("load");

        // Assert
        assert_eq!(cfg.serial.bit_rate, 9_600);
        assert_eq!(cfg.output.log_level, "debug");

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }
}
