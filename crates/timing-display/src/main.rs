//! Finish-line timing display — entry point.
//!
//! Listens on the serial adapter of the finish-line radio, decodes each
//! finish-time line, and prints how the run should be shown on the board.
//!
//! # Usage
//!
//! ```text
//! timing-display [OPTIONS]
//!
//! Options:
//!   --device <ID>            Serial device to open [default: /dev/ttyUSB0]
//!   --baud <RATE>            Link speed in bit/s [default: 115200]
//!   --read-timeout-ms <MS>   Ceiling for each blocking read [default: 1000]
//!   --config <PATH>          Optional TOML config file
//!   --format <text|json>     Console output format [default: text]
//! ```
//!
//! Precedence: CLI flag > environment variable > config file > default.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ Cli::into_config()          -- file + env + flags, validated
//!  └─ Session::open()             -- DeviceTransportProvider
//!  └─ Session::run()              -- bounded reads until Ctrl-C or fault
//!       └─ ConsoleSink            -- [ECHO] / [WARN] lines
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use timing_display::application::run_session::Session;
use timing_display::infrastructure::{
    reporting::{ConsoleSink, OutputFormat},
    storage::config::{load_config_or_default, DisplayConfig},
    transport::device::DeviceTransportProvider,
};

#[cfg(not(unix))]
compile_error!("timing-display reads tty device nodes and builds on Unix hosts only");

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Finish-line timing display.
///
/// Reads finish-time telemetry from a serial radio link and reports each run's
/// time, cone count and board colour.
#[derive(Debug, Parser)]
#[command(
    name = "timing-display",
    about = "Decode and classify finish-line timing telemetry from a serial link",
    version
)]
struct Cli {
    /// Serial device to open (e.g. /dev/ttyUSB0).
    #[arg(long, env = "TIMING_DEVICE")]
    device: Option<String>,

    /// Link speed in bits per second.
    #[arg(long, env = "TIMING_BAUD")]
    baud: Option<u32>,

    /// Maximum time a single read may block, in milliseconds.
    ///
    /// Ctrl-C is noticed at least once per interval.
    #[arg(long, env = "TIMING_READ_TIMEOUT_MS")]
    read_timeout_ms: Option<u64>,

    /// Optional TOML configuration file.
    #[arg(long, env = "TIMING_CONFIG")]
    config: Option<PathBuf>,

    /// Console output format.
    #[arg(long, value_enum, env = "TIMING_FORMAT")]
    format: Option<OutputFormat>,
}

impl Cli {
    /// Loads the config file (if any) and applies CLI/env overrides on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if the
    /// merged configuration is invalid.
    fn into_config(self) -> anyhow::Result<DisplayConfig> {
        let mut cfg = load_config_or_default(self.config.as_deref()).with_context(|| {
            format!(
                "failed to load config from {}",
                self.config
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            )
        })?;

        if let Some(device) = self.device {
            cfg.serial.device_id = device;
        }
        if let Some(baud) = self.baud {
            cfg.serial.bit_rate = baud;
        }
        if let Some(ms) = self.read_timeout_ms {
            cfg.serial.read_timeout_ms = ms;
        }
        if let Some(format) = self.format {
            cfg.output.format = format;
        }

        cfg.validate().context("invalid configuration")?;
        Ok(cfg)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;

    // Logs go to stderr so JSON event output on stdout stays machine-readable.
    // `RUST_LOG` overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.output.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("stop requested");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl-C: {e}"),
        }
    });

    // ── Session ───────────────────────────────────────────────────────────────
    let sink = ConsoleSink::stdout(config.output.format);
    let mut session = Session::open(&DeviceTransportProvider, config.session_config())
        .await
        .context("serial error")?;

    let summary = session
        .run(&sink, &running)
        .await
        .context("serial error")?;

    info!(
        lines_read = summary.lines_read,
        records_reported = summary.records_reported,
        lines_rejected = summary.lines_rejected,
        "session closed"
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
