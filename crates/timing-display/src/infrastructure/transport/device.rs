//! Device-node transport: reads lines from a character device such as
//! `/dev/ttyUSB0`.
//!
//! The node is opened with `O_NONBLOCK` through Tokio's Unix pipe receiver
//! (`unchecked`, so tty character devices are accepted as well as FIFOs) and
//! is driven by the I/O reactor.  No read ever parks a blocking-pool thread,
//! so dropping the reader closes the descriptor at once, even when the radio
//! is silent.
//!
//! Lines are assembled with `read_until(b'\n')`.  If the timeout fires
//! part-way through a line, the bytes received so far stay in `pending` and
//! the next call keeps appending to them, so a slow radio never splits one
//! record into two.
//!
//! Line speed is a property of the tty and is set by the driver (or `stty`)
//! before this process opens it; the configured bit rate is only logged here.

use std::time::Duration;

use async_trait::async_trait;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::unix::pipe::{self, Receiver},
    time,
};
use tracing::{debug, info};

use super::{strip_line_terminator, ReadOutcome, Transport, TransportError, TransportProvider};

/// Opens [`DeviceTransport`]s by path.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeviceTransportProvider;

#[async_trait]
impl TransportProvider for DeviceTransportProvider {
    async fn open(
        &self,
        device_id: &str,
        bit_rate: u32,
        read_timeout: Duration,
    ) -> Result<Box<dyn Transport>, TransportError> {
        let receiver = pipe::OpenOptions::new()
            .unchecked(true)
            .open_receiver(device_id)
            .map_err(|source| TransportError::Open {
                device_id: device_id.to_string(),
                source,
            })?;

        info!(device_id, bit_rate, ?read_timeout, "device opened");

        Ok(Box::new(DeviceTransport {
            device_id: device_id.to_string(),
            reader: Some(BufReader::new(receiver)),
            pending: Vec::new(),
        }))
    }
}

/// A line reader over an open device node.
pub struct DeviceTransport {
    device_id: String,
    reader: Option<BufReader<Receiver>>,
    /// Bytes of a line whose terminator has not arrived yet.
    pending: Vec<u8>,
}

#[async_trait]
impl Transport for DeviceTransport {
    async fn read_line(&mut self, timeout: Duration) -> Result<ReadOutcome, TransportError> {
        let Some(reader) = self.reader.as_mut() else {
            return Err(TransportError::Disconnected {
                device_id: self.device_id.clone(),
            });
        };

        // `read_until` appends to `pending` as bytes arrive, so a timeout
        // mid-line loses nothing.
        match time::timeout(timeout, reader.read_until(b'\n', &mut self.pending)).await {
            Err(_elapsed) => Ok(ReadOutcome::Timeout),
            Ok(Ok(0)) if self.pending.is_empty() => Err(TransportError::Disconnected {
                device_id: self.device_id.clone(),
            }),
            // A final unterminated line before end of stream is still a line.
            Ok(Ok(_)) => {
                let line = std::mem::take(&mut self.pending);
                Ok(ReadOutcome::Line(strip_line_terminator(line)))
            }
            Ok(Err(source)) => Err(TransportError::Io {
                device_id: self.device_id.clone(),
                source,
            }),
        }
    }

    fn close(&mut self) {
        // Dropping the receiver deregisters it and closes the descriptor.
        if self.reader.take().is_some() {
            debug!(device_id = %self.device_id, "device closed");
        }
        self.pending.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
