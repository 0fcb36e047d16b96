//! Report sinks: where session events end up.
//!
//! - [`ConsoleSink`] prints each event for the operator, either in the
//!   human-readable board format or as one JSON object per line.
//! - [`ChannelSink`] forwards events into a Tokio channel so another task
//!   (a UI, a relay) can consume them.
//!
//! Text format:
//! ```text
//! [ECHO] Time: 00:12.345 | Cones Hit: 0 | Color: green
//! [WARN] Invalid data: CAR3, bad, line (incorrect number of fields: expected 6, found 3)
//! ```

use std::io::Write;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::application::run_session::{ReportSink, SessionEvent};

/// How [`ConsoleSink`] renders events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `[ECHO] ...` / `[WARN] ...` lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Renders a single event in the requested format, without a trailing newline.
pub fn render_event(event: &SessionEvent, format: OutputFormat) -> String {
    match (format, event) {
        (
            OutputFormat::Text,
            SessionEvent::Report {
                time_value,
                cones_hit,
                classification,
            },
        ) => format!(
            "[ECHO] Time: {time_value} | Cones Hit: {cones_hit} | Color: {}",
            classification.colour()
        ),
        (OutputFormat::Text, SessionEvent::Warning { raw_line, reason }) => {
            format!("[WARN] Invalid data: {raw_line} ({reason})")
        }
        (
            OutputFormat::Json,
            SessionEvent::Report {
                time_value,
                cones_hit,
                classification,
            },
        ) => json!({
            "event": "report",
            "time_value": time_value,
            "cones_hit": cones_hit,
            "classification": classification,
            "colour": classification.colour(),
        })
        .to_string(),
        (OutputFormat::Json, SessionEvent::Warning { raw_line, reason }) => json!({
            "event": "warning",
            "raw_line": raw_line,
            "reason": reason.to_string(),
        })
        .to_string(),
    }
}

/// Writes rendered events to any [`Write`] target, one per line.
pub struct ConsoleSink<W: Write + Send> {
    out: Mutex<W>,
    format: OutputFormat,
}

impl ConsoleSink<std::io::Stdout> {
    /// A sink that prints to standard output.
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(std::io::stdout(), format)
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out: Mutex::new(out),
            format,
        }
    }

    /// Consumes the sink and returns the writer (useful in tests).
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> ReportSink for ConsoleSink<W> {
    fn emit(&self, event: SessionEvent) {
        let line = render_event(&event, self.format);
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            error!("failed to write event to console: {e}");
        }
    }
}

/// Forwards events into an unbounded Tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiver that will observe its events.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ReportSink for ChannelSink {
    fn emit(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("event receiver dropped; discarding event");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
