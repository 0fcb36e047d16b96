//! Session use case: owns one open transport and drives the read loop.
//!
//! # Lifecycle
//!
//! ```text
//!           open()                 run()
//! Closed ──────────► Open ──► Reading ⇄ Idle ──► Closed   (stop flag cleared)
//!                      │            │
//!                      └────────────┴──────────► Failed   (transport fault)
//! ```
//!
//! Every read is bounded by `read_timeout`, so the stop flag is checked at
//! least once per timeout interval even when the radio is silent.  A malformed
//! line produces a [`SessionEvent::Warning`] and the loop carries on; only a
//! transport fault ends the session with an error.
//!
//! The transport is held by a guard that closes it exactly once: explicitly
//! on stop or failure, or on drop if the `run` future is cancelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use timing_core::{decode, Classification, DecodeError};
use tokio::time;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::infrastructure::transport::{ReadOutcome, Transport, TransportError, TransportProvider};

/// Connection parameters for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Which transport to open, e.g. `/dev/ttyUSB0`.
    pub device_id: String,
    /// Link speed in bits per second.
    pub bit_rate: u32,
    /// Ceiling for each blocking read.  Must be non-zero.
    pub read_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device_id: "/dev/ttyUSB0".to_string(),
            bit_rate: 115_200,
            read_timeout: Duration::from_secs(1),
        }
    }
}

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Open,
    /// A line was received and is being decoded.
    Reading,
    /// Waiting for the next line.
    Idle,
    /// The transport faulted.  Absorbing.
    Failed,
}

impl SessionState {
    fn is_live(self) -> bool {
        matches!(
            self,
            SessionState::Open | SessionState::Reading | SessionState::Idle
        )
    }
}

/// Events emitted to the [`ReportSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A line was rejected by the decoder and dropped.
    Warning { raw_line: String, reason: DecodeError },
    /// A line decoded successfully.
    Report {
        time_value: String,
        cones_hit: i64,
        classification: Classification,
    },
}

/// Consumer of session events.  Rendering is entirely up to the implementor.
#[cfg_attr(test, mockall::automock)]
pub trait ReportSink: Send + Sync {
    fn emit(&self, event: SessionEvent);
}

/// Errors that end (or prevent) a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to open transport {device_id}")]
    TransportOpen {
        device_id: String,
        #[source]
        source: TransportError,
    },

    #[error("transport {device_id} failed while reading")]
    TransportRead {
        device_id: String,
        #[source]
        source: TransportError,
    },

    #[error("session is not open (state: {0:?})")]
    NotOpen(SessionState),

    #[error("read timeout must be greater than zero")]
    InvalidReadTimeout,
}

/// Totals for a session that stopped cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub lines_read: u64,
    pub records_reported: u64,
    pub lines_rejected: u64,
    pub final_state: SessionState,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    lines_read: u64,
    records_reported: u64,
    lines_rejected: u64,
}

/// Owns an open transport and releases it exactly once.
struct TransportGuard {
    transport: Option<Box<dyn Transport>>,
}

impl TransportGuard {
    fn get(&mut self) -> Option<&mut (dyn Transport + 'static)> {
        self.transport.as_deref_mut()
    }

    fn release(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }
}

impl Drop for TransportGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// One open transport connection and its read lifecycle.
pub struct Session {
    id: Uuid,
    config: SessionConfig,
    state: SessionState,
    counters: Counters,
    transport: TransportGuard,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("state", &self.state)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Opens the transport described by `config`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidReadTimeout`] if `read_timeout` is zero.
    /// - [`SessionError::TransportOpen`] if the provider cannot acquire the
    ///   device.  No session exists in that case.
    pub async fn open(
        provider: &dyn TransportProvider,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        if config.read_timeout.is_zero() {
            return Err(SessionError::InvalidReadTimeout);
        }

        let transport = provider
            .open(&config.device_id, config.bit_rate, config.read_timeout)
            .await
            .map_err(|source| {
                error!(device_id = %config.device_id, "transport open failed: {source}");
                SessionError::TransportOpen {
                    device_id: config.device_id.clone(),
                    source,
                }
            })?;

        let id = Uuid::new_v4();
        info!(
            session_id = %id,
            device_id = %config.device_id,
            bit_rate = config.bit_rate,
            "listening for finish-time data"
        );

        Ok(Self {
            id,
            config,
            state: SessionState::Open,
            counters: Counters::default(),
            transport: TransportGuard {
                transport: Some(transport),
            },
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Runs the read loop until `running` is cleared or the transport fails.
    ///
    /// `running` is checked before every read; because each read waits at
    /// most `read_timeout`, a stop request is honoured within one timeout.
    ///
    /// # Errors
    ///
    /// - [`SessionError::TransportRead`] on a transport fault.  The session is
    ///   then [`SessionState::Failed`] and the transport has been released.
    /// - [`SessionError::NotOpen`] if the session already ended.
    pub async fn run(
        &mut self,
        sink: &dyn ReportSink,
        running: &AtomicBool,
    ) -> Result<SessionSummary, SessionError> {
        if !self.state.is_live() {
            return Err(SessionError::NotOpen(self.state));
        }

        let span = info_span!("session", id = %self.id, device = %self.config.device_id);
        self.read_loop(sink, running).instrument(span).await
    }

    async fn read_loop(
        &mut self,
        sink: &dyn ReportSink,
        running: &AtomicBool,
    ) -> Result<SessionSummary, SessionError> {
        let read_timeout = self.config.read_timeout;

        loop {
            if !running.load(Ordering::Relaxed) {
                self.shutdown(SessionState::Closed);
                info!("stopped by user");
                return Ok(self.summary());
            }

            let Some(transport) = self.transport.get() else {
                return Err(SessionError::NotOpen(self.state));
            };

            // The outer timeout keeps the loop live even if a transport
            // ignores the ceiling it was given.
            let outcome = match time::timeout(read_timeout, transport.read_line(read_timeout)).await
            {
                Ok(result) => result,
                Err(_elapsed) => Ok(ReadOutcome::Timeout),
            };

            match outcome {
                Ok(ReadOutcome::Timeout) => {
                    self.state = SessionState::Idle;
                }
                Ok(ReadOutcome::Line(bytes)) => {
                    self.state = SessionState::Reading;
                    self.handle_line(&bytes, sink);
                    self.state = SessionState::Idle;
                }
                Err(source) => {
                    error!("transport error: {source}");
                    self.shutdown(SessionState::Failed);
                    return Err(SessionError::TransportRead {
                        device_id: self.config.device_id.clone(),
                        source,
                    });
                }
            }
        }
    }

    fn handle_line(&mut self, bytes: &[u8], sink: &dyn ReportSink) {
        self.counters.lines_read += 1;
        let raw_line = String::from_utf8_lossy(bytes);

        match decode(&raw_line) {
            Ok(record) => {
                let classification = record.classification();
                debug!(
                    identifier = record.identifier(),
                    %classification,
                    "record decoded"
                );
                self.counters.records_reported += 1;
                sink.emit(SessionEvent::Report {
                    time_value: record.time_value().to_string(),
                    cones_hit: record.cones_hit(),
                    classification,
                });
            }
            Err(reason) => {
                warn!(line = %raw_line, "invalid data: {reason}");
                self.counters.lines_rejected += 1;
                sink.emit(SessionEvent::Warning {
                    raw_line: raw_line.into_owned(),
                    reason,
                });
            }
        }
    }

    fn shutdown(&mut self, final_state: SessionState) {
        self.transport.release();
        self.state = final_state;
        debug!(state = ?final_state, "transport released");
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            lines_read: self.counters.lines_read,
            records_reported: self.counters.records_reported,
            lines_rejected: self.counters.lines_rejected,
            final_state: self.state,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::infrastructure::transport::mock::{ScriptStep, ScriptedTransportProvider};

    const TICK: Duration = Duration::from_millis(20);

    fn config() -> SessionConfig {
        SessionConfig {
            device_id: "mock0".to_string(),
            bit_rate: 115_200,
            read_timeout: TICK,
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<SessionEvent>>,
    }

    impl ReportSink for RecordingSink {
        fn emit(&self, event: SessionEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    // ── open ──────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_open_starts_in_open_state() {
        let provider = ScriptedTransportProvider::default();

        let session = Session::open(&provider, config()).await.expect("open");

        assert_eq!(session.state(), SessionState::Open);
        assert_eq!(provider.stats().opens, 1);
    }

    #[tokio::test]
    async fn test_open_failure_is_transport_open_error() {
        let provider = ScriptedTransportProvider::failing_open("no adapter");

        let result = Session::open(&provider, config()).await;

        assert!(matches!(result, Err(SessionError::TransportOpen { .. })));
    }

    #[tokio::test]
    async fn test_open_rejects_zero_read_timeout() {
        let provider = ScriptedTransportProvider::default();
        let cfg = SessionConfig {
            read_timeout: Duration::ZERO,
            ..config()
        };

        let result = Session::open(&provider, cfg).await;

        assert!(matches!(result, Err(SessionError::InvalidReadTimeout)));
        assert_eq!(provider.stats().opens, 0);
    }

    #[tokio::test]
    async fn test_dropping_open_session_releases_transport_once() {
        let provider = ScriptedTransportProvider::default();
        let session = Session::open(&provider, config()).await.unwrap();

        drop(session);

        assert_eq!(provider.stats().closes, 1);
    }

    // ── run ───────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_report_is_emitted_through_sink() {
        // Arrange
        let provider = ScriptedTransportProvider::new([ScriptStep::line("CAR7, 00:12.345, 1, 0, 0, 0")]);
        let mut sink = MockReportSink::new();
        sink.expect_emit()
            .withf(|event| {
                *event
                    == SessionEvent::Report {
                        time_value: "00:12.345".to_string(),
                        cones_hit: 0,
                        classification: Classification::PersonalBest,
                    }
            })
            .times(1)
            .return_const(());
        let running = AtomicBool::new(true);
        let mut session = Session::open(&provider, config()).await.unwrap();

        // Act: stop as soon as the script is drained.
        let stopper = async {
            time::sleep(TICK * 3).await;
            running.store(false, Ordering::Relaxed);
        };
        let (result, ()) = tokio::join!(session.run(&sink, &running), stopper);

        // Assert
        let summary = result.expect("clean stop");
        assert_eq!(summary.records_reported, 1);
        assert_eq!(summary.final_state, SessionState::Closed);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_becomes_warning() {
        let provider = ScriptedTransportProvider::new([ScriptStep::Line(vec![0xFF, 0xFE, b',', b'1'])]);
        let sink = RecordingSink::default();
        let running = AtomicBool::new(true);
        let mut session = Session::open(&provider, config()).await.unwrap();

        let stopper = async {
            time::sleep(TICK * 3).await;
            running.store(false, Ordering::Relaxed);
        };
        let (result, ()) = tokio::join!(session.run(&sink, &running), stopper);

        assert_eq!(result.unwrap().lines_rejected, 1);
        let events = sink.events.lock().unwrap();
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::Warning {
                reason: DecodeError::FieldCountMismatch { found: 2, .. },
                ..
            }]
        ));
    }

    #[tokio::test]
    async fn test_run_with_stop_flag_already_cleared_never_reads() {
        let provider = ScriptedTransportProvider::new([ScriptStep::line("CAR1, t, 0, 0, 0, 0")]);
        let sink = RecordingSink::default();
        let running = AtomicBool::new(false);
        let mut session = Session::open(&provider, config()).await.unwrap();

        let summary = session.run(&sink, &running).await.unwrap();

        assert_eq!(summary.lines_read, 0);
        assert_eq!(provider.stats().reads, 0);
        assert_eq!(provider.stats().closes, 1);
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_run_after_close_is_not_open_error() {
        let provider = ScriptedTransportProvider::default();
        let sink = RecordingSink::default();
        let running = AtomicBool::new(false);
        let mut session = Session::open(&provider, config()).await.unwrap();
        session.run(&sink, &running).await.unwrap();

        let second = session.run(&sink, &running).await;

        assert!(matches!(second, Err(SessionError::NotOpen(SessionState::Closed))));
        assert_eq!(provider.stats().closes, 1);
    }

    #[tokio::test]
    async fn test_transport_fault_fails_session_and_skips_drop_release() {
        let provider = ScriptedTransportProvider::new([ScriptStep::Fault("unplugged".to_string())]);
        let sink = RecordingSink::default();
        let running = AtomicBool::new(true);
        let mut session = Session::open(&provider, config()).await.unwrap();

        let result = session.run(&sink, &running).await;
        drop(session);

        assert!(matches!(result, Err(SessionError::TransportRead { .. })));
        assert_eq!(provider.stats().closes, 1);
    }
}
