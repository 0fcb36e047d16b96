//! Scripted transport for unit and integration testing.
//!
//! Replays a queue of [`ScriptStep`]s without any device, and records every
//! open/read/close so tests can assert on the resource lifecycle (for example
//! "closed exactly once" or "no reads after close").
//!
//! When the script runs dry the transport behaves like an idle radio link:
//! each read waits for the full timeout and returns [`ReadOutcome::Timeout`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{ReadOutcome, Transport, TransportError, TransportProvider};

/// One scripted response to a `read_line` call.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Deliver this line (terminator already stripped).
    Line(Vec<u8>),
    /// Wait for the timeout, then report [`ReadOutcome::Timeout`].
    Timeout,
    /// Fail the read with [`TransportError::Io`] carrying this message.
    Fault(String),
}

impl ScriptStep {
    /// Convenience constructor for a text line.
    pub fn line(text: &str) -> Self {
        ScriptStep::Line(text.as_bytes().to_vec())
    }
}

/// Counters describing how the session used the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub opens: u32,
    pub reads: u32,
    pub closes: u32,
    /// Reads attempted after `close()` – always a bug in the caller.
    pub reads_after_close: u32,
}

#[derive(Debug, Default)]
struct ScriptState {
    steps: VecDeque<ScriptStep>,
    open_failure: Option<String>,
    stats: TransportStats,
    closed: bool,
}

/// A mock [`TransportProvider`] that hands out scripted transports.
///
/// Clones share the same script and counters, so a test can keep one clone
/// for assertions while the session owns the transport.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransportProvider {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransportProvider {
    /// Creates a provider that will replay `steps` in order.
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        let state = ScriptState {
            steps: steps.into_iter().collect(),
            ..ScriptState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Creates a provider whose `open` always fails with `reason`.
    pub fn failing_open(reason: &str) -> Self {
        let state = ScriptState {
            open_failure: Some(reason.to_string()),
            ..ScriptState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Appends a step to the script, as if more data arrived on the link.
    pub fn push(&self, step: ScriptStep) {
        self.state.lock().expect("lock poisoned").steps.push_back(step);
    }

    /// Returns a snapshot of the lifecycle counters.
    pub fn stats(&self) -> TransportStats {
        self.state.lock().expect("lock poisoned").stats
    }
}

#[async_trait]
impl TransportProvider for ScriptedTransportProvider {
    async fn open(
        &self,
        device_id: &str,
        _bit_rate: u32,
        _read_timeout: Duration,
    ) -> Result<Box<dyn Transport>, TransportError> {
        let mut state = self.state.lock().expect("lock poisoned");
        if let Some(reason) = &state.open_failure {
            return Err(TransportError::Open {
                device_id: device_id.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, reason.clone()),
            });
        }
        state.stats.opens += 1;
        state.closed = false;
        Ok(Box::new(ScriptedTransport {
            device_id: device_id.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

/// Transport handed out by [`ScriptedTransportProvider`].
pub struct ScriptedTransport {
    device_id: String,
    state: Arc<Mutex<ScriptState>>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn read_line(&mut self, timeout: Duration) -> Result<ReadOutcome, TransportError> {
        let step = {
            let mut state = self.state.lock().expect("lock poisoned");
            state.stats.reads += 1;
            if state.closed {
                state.stats.reads_after_close += 1;
            }
            state.steps.pop_front()
        };

        match step {
            Some(ScriptStep::Line(bytes)) => Ok(ReadOutcome::Line(bytes)),
            Some(ScriptStep::Fault(message)) => Err(TransportError::Io {
                device_id: self.device_id.clone(),
                source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, message),
            }),
            Some(ScriptStep::Timeout) | None => {
                tokio::time::sleep(timeout).await;
                Ok(ReadOutcome::Timeout)
            }
        }
    }

    fn close(&mut self) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.stats.closes += 1;
        state.closed = true;
    }
}
