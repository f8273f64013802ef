//! Scan sessions.
//!
//! A session is one scan of one target over one port range, from creation
//! to its terminal `Finished` event. [`ScanEngine::create_session`] validates
//! the request; the returned [`SessionHandle`] starts, stops, observes and
//! awaits the scan.
//!
//! ```text
//! Idle --start--> Running --request_stop--> Stopping --pool drained--> Completed
//!                    \------------------ pool drained ------------------/
//! ```

mod coordinator;
pub mod events;

pub use events::{ChannelSink, EventSink, Progress, ScanEvent, ScanSummary};

use crate::error::{SessionError, SessionResult};
use crate::scanner::{CancelToken, Dispatcher, Prober, TcpProber};
use crate::types::{PortRange, SessionId, Target};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Default number of concurrent probes.
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Default per-probe timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Stopping,
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Per-session tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Maximum number of probes in flight.
    pub concurrency: usize,
    /// Connection timeout per probe.
    pub timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SessionOptions {
    /// Set the concurrency level.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn validate(&self) -> SessionResult<()> {
        if self.concurrency == 0 {
            return Err(SessionError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(SessionError::InvalidConfig(
                "timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub state: SessionState,
    /// Lowest port not yet claimed by a worker.
    pub next_port_to_dispatch: u32,
    pub emitted: usize,
    pub total: usize,
}

/// Creates sessions that share one prober.
#[derive(Clone)]
pub struct ScanEngine {
    prober: Arc<dyn Prober>,
}

impl ScanEngine {
    /// Create an engine around a prober.
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self { prober }
    }

    /// Create an engine that probes with real TCP connects.
    pub fn tcp() -> Self {
        Self::new(Arc::new(TcpProber::new()))
    }

    /// Validate a scan request and create an `Idle` session for it.
    ///
    /// Fails with `InvalidRange` unless `1 <= start <= end <= 65535`, with
    /// `UnresolvedTarget` if the target has no address, and with
    /// `InvalidConfig` for a zero concurrency or timeout.
    pub fn create_session(
        &self,
        target: Target,
        start: u32,
        end: u32,
        options: SessionOptions,
    ) -> SessionResult<SessionHandle> {
        let range = PortRange::from_bounds(start, end)
            .map_err(|_| SessionError::InvalidRange { start, end })?;
        let addr = target
            .ip
            .ok_or_else(|| SessionError::UnresolvedTarget(target.original.clone()))?;
        options.validate()?;

        let options = SessionOptions {
            concurrency: options.concurrency.min(range.len()),
            ..options
        };
        let token = CancelToken::new();
        let (state, _) = watch::channel(SessionState::Idle);
        let id = SessionId::new();

        debug!(session = %id, %target, %range, concurrency = options.concurrency, "session created");

        Ok(SessionHandle {
            shared: Arc::new(Shared {
                id,
                target,
                addr,
                range,
                options,
                prober: Arc::clone(&self.prober),
                dispatcher: Arc::new(Dispatcher::new(range, token.clone())),
                token,
                state,
                emitted: AtomicUsize::new(0),
                sinks: Mutex::new(Vec::new()),
                summary: OnceLock::new(),
            }),
        })
    }
}

/// State shared between handles and the coordinator task.
///
/// Only the coordinator writes `emitted` and `summary`; handles only read.
pub(crate) struct Shared {
    pub id: SessionId,
    pub target: Target,
    pub addr: IpAddr,
    pub range: PortRange,
    pub options: SessionOptions,
    pub prober: Arc<dyn Prober>,
    pub dispatcher: Arc<Dispatcher>,
    pub token: CancelToken,
    pub state: watch::Sender<SessionState>,
    pub emitted: AtomicUsize,
    pub sinks: Mutex<Vec<Box<dyn EventSink>>>,
    pub summary: OnceLock<ScanSummary>,
}

/// Cloneable handle to one scan session.
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<Shared>,
}

impl SessionHandle {
    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.shared.id
    }

    /// The target being scanned.
    pub fn target(&self) -> &Target {
        &self.shared.target
    }

    /// The range being scanned.
    pub fn range(&self) -> PortRange {
        self.shared.range
    }

    /// Effective options (concurrency clamped to the range size).
    pub fn options(&self) -> SessionOptions {
        self.shared.options
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    /// Read-only view of the session's counters.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.shared.id,
            state: self.state(),
            next_port_to_dispatch: self.shared.dispatcher.next_to_dispatch(),
            emitted: self.shared.emitted.load(Ordering::Acquire),
            total: self.shared.range.len(),
        }
    }

    /// Attach a sink. Only possible before the session starts.
    pub fn subscribe(&self, sink: impl EventSink + 'static) -> SessionResult<()> {
        let mut sinks = self.shared.sinks.lock().unwrap_or_else(PoisonError::into_inner);
        if self.state() != SessionState::Idle {
            return Err(SessionError::AlreadyStarted);
        }
        sinks.push(Box::new(sink));
        Ok(())
    }

    /// Attach a channel sink and return its receiver.
    pub fn events(&self) -> SessionResult<mpsc::UnboundedReceiver<ScanEvent>> {
        let (sink, rx) = ChannelSink::new();
        self.subscribe(sink)?;
        Ok(rx)
    }

    /// Begin scanning. Returns immediately; results arrive through sinks.
    ///
    /// `Ok(true)` when this call started the scan, `Ok(false)` when the
    /// session had already left `Idle`. Must be called inside a tokio
    /// runtime.
    pub fn start(&self) -> SessionResult<bool> {
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;

        let started = self.shared.state.send_if_modified(|state| {
            if *state == SessionState::Idle {
                *state = SessionState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            return Ok(false);
        }

        let sinks = std::mem::take(
            &mut *self.shared.sinks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        runtime.spawn(coordinator::drive(Arc::clone(&self.shared), sinks));
        Ok(true)
    }

    /// Ask the scan to stop claiming new ports.
    ///
    /// Non-blocking and idempotent. In-flight probes finish and their results
    /// are still delivered. Returns `true` only for the call that moved the
    /// session from `Running` to `Stopping`; has no effect in any other state.
    pub fn request_stop(&self) -> bool {
        let stopping = self.shared.state.send_if_modified(|state| {
            if *state == SessionState::Running {
                *state = SessionState::Stopping;
                true
            } else {
                false
            }
        });
        if stopping {
            self.shared.token.cancel();
            info!(
                session = %self.shared.id,
                next_port = self.shared.dispatcher.next_to_dispatch(),
                "stop requested"
            );
        }
        stopping
    }

    /// Wait for the session to complete and return its summary.
    ///
    /// Never resolves for a session that is never started.
    pub async fn wait(&self) -> Option<ScanSummary> {
        let mut rx = self.shared.state.subscribe();
        rx.wait_for(|state| *state == SessionState::Completed)
            .await
            .ok()?;
        self.shared.summary.get().cloned()
    }

    /// Summary of a completed session.
    pub fn summary(&self) -> Option<ScanSummary> {
        self.shared.summary.get().cloned()
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.shared.id)
            .field("target", &self.shared.target)
            .field("range", &self.shared.range)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn localhost() -> Target {
        Target::from_ip(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    #[test]
    fn test_create_rejects_invalid_ranges() {
        let engine = ScanEngine::tcp();
        for (start, end) in [(1, 65536), (0, 10), (10, 9), (70000, 70001)] {
            let err = engine
                .create_session(localhost(), start, end, SessionOptions::default())
                .unwrap_err();
            assert_eq!(err, SessionError::InvalidRange { start, end });
        }
    }

    #[test]
    fn test_create_rejects_unresolved_target() {
        let err = ScanEngine::tcp()
            .create_session(Target::unresolved("nowhere.invalid"), 1, 10, SessionOptions::default())
            .unwrap_err();
        assert_eq!(err, SessionError::UnresolvedTarget("nowhere.invalid".into()));
    }

    #[test]
    fn test_range_checked_before_target() {
        let err = ScanEngine::tcp()
            .create_session(Target::unresolved("x"), 1, 65536, SessionOptions::default())
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidRange { .. }));
    }

    #[test]
    fn test_create_rejects_bad_options() {
        let engine = ScanEngine::tcp();
        let zero_workers = SessionOptions::default().with_concurrency(0);
        assert!(matches!(
            engine.create_session(localhost(), 1, 10, zero_workers),
            Err(SessionError::InvalidConfig(_))
        ));
        let zero_timeout = SessionOptions::default().with_timeout(Duration::ZERO);
        assert!(matches!(
            engine.create_session(localhost(), 1, 10, zero_timeout),
            Err(SessionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = ScanEngine::tcp()
            .create_session(localhost(), 20, 29, SessionOptions::default())
            .unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, SessionState::Idle);
        assert_eq!(snapshot.total, 10);
        assert_eq!(snapshot.emitted, 0);
        assert_eq!(snapshot.next_port_to_dispatch, 20);
        // Concurrency never exceeds the number of ports
        assert_eq!(session.options().concurrency, 10);
    }

    #[test]
    fn test_stop_before_start_is_noop() {
        let session = ScanEngine::tcp()
            .create_session(localhost(), 1, 10, SessionOptions::default())
            .unwrap();
        assert!(!session.request_stop());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_start_requires_runtime() {
        let session = ScanEngine::tcp()
            .create_session(localhost(), 1, 10, SessionOptions::default())
            .unwrap();
        assert_eq!(session.start(), Err(SessionError::NoRuntime));
        assert_eq!(session.state(), SessionState::Idle);
    }
}
