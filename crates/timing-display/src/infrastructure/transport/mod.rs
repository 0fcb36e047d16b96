//! Transport infrastructure: the line-oriented byte stream the display reads.
//!
//! In the field this is a LoRa radio bridged to a USB serial adapter
//! (`/dev/ttyUSB0` at 115200 baud).  The session loop never talks to the
//! device directly; it goes through the [`TransportProvider`] / [`Transport`]
//! traits so a scripted transport can stand in during tests.
//!
//! # Contract
//!
//! - [`TransportProvider::open`] acquires the device or fails with
//!   [`TransportError`].
//! - [`Transport::read_line`] waits at most `timeout` for one complete line.
//!   It returns the line with its terminator removed, or
//!   [`ReadOutcome::Timeout`] when nothing complete arrived in time.  Bytes of
//!   a partially received line are kept by the transport for the next call.
//! - [`Transport::close`] releases the device.  Closing twice is a no-op.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[cfg(unix)]
pub mod device;
pub mod mock;

/// Result of a single bounded read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// One complete line, terminator stripped.
    Line(Vec<u8>),
    /// The timeout elapsed before a complete line was available.
    Timeout,
}

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The device could not be acquired.
    #[error("failed to open {device_id}: {source}")]
    Open {
        device_id: String,
        #[source]
        source: std::io::Error,
    },

    /// An I/O fault occurred while reading.
    #[error("I/O error on {device_id}: {source}")]
    Io {
        device_id: String,
        #[source]
        source: std::io::Error,
    },

    /// The device went away (end of stream, unplugged adapter).
    #[error("{device_id} disconnected")]
    Disconnected { device_id: String },
}

/// Opens transports.  The production implementation is
/// [`device::DeviceTransportProvider`]; tests use
/// [`mock::ScriptedTransportProvider`].
#[async_trait]
pub trait TransportProvider: Send + Sync {
    /// Opens `device_id` at `bit_rate`.  `read_timeout` is the ceiling the
    /// caller will use for each read.
    async fn open(
        &self,
        device_id: &str,
        bit_rate: u32,
        read_timeout: Duration,
    ) -> Result<Box<dyn Transport>, TransportError>;
}

/// One open, line-oriented byte stream.
#[async_trait]
pub trait Transport: Send {
    /// Waits at most `timeout` for the next complete line.
    async fn read_line(&mut self, timeout: Duration) -> Result<ReadOutcome, TransportError>;

    /// Releases the underlying device.
    fn close(&mut self);
}

/// Removes a trailing `\n` and an optional `\r` before it.
pub(crate) fn strip_line_terminator(mut line: Vec<u8>) -> Vec<u8> {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    line
}
