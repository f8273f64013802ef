//! Events a session delivers to its subscribers.
//!
//! Every sink sees the same sequence: zero or more `Result`/`Progress`
//! events in ascending port order, then exactly one `Finished`. Sinks are
//! called from a single task, one event at a time.

use crate::scanner::{ProbeResult, ProbeStatus};
use crate::types::{PortRange, SessionId, Target};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Emitted count against total, sent after each released batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub emitted: usize,
    pub total: usize,
}

impl Progress {
    /// Completed fraction in `[0.0, 1.0]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.emitted as f64 / self.total as f64
    }
}

/// Terminal report for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub session_id: SessionId,
    pub target: Target,
    pub range: PortRange,
    /// Results delivered to subscribers.
    pub emitted: usize,
    /// Ports in the range.
    pub total: usize,
    /// Whether a stop request kept some ports from being probed.
    pub was_stopped: bool,
    pub open: usize,
    pub closed: usize,
    pub errors: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// One item of a session's ordered event stream.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// A port's outcome, delivered in ascending port order.
    Result(ProbeResult),
    /// Monotonically non-decreasing progress.
    Progress(Progress),
    /// Terminal event; nothing follows it.
    Finished(ScanSummary),
}

impl ScanEvent {
    /// Check whether this is the terminal event.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

/// Consumer of a session's events (display, persistence, ...).
pub trait EventSink: Send {
    /// Handle one event. Must not block for long: the scan's emitter waits.
    fn handle(&mut self, event: &ScanEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&ScanEvent) + Send,
{
    fn handle(&mut self, event: &ScanEvent) {
        self(event)
    }
}

/// Forwards events into an unbounded channel.
///
/// A dropped receiver is not an error; the scan keeps going.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ScanEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver it feeds.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScanEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn handle(&mut self, event: &ScanEvent) {
        let _ = self.tx.send(event.clone());
    }
}

/// Running counts by status, folded into the summary.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Tally {
    pub open: usize,
    pub closed: usize,
    pub errors: usize,
}

impl Tally {
    pub fn record(&mut self, status: &ProbeStatus) {
        match status {
            ProbeStatus::Open => self.open += 1,
            ProbeStatus::Closed => self.closed += 1,
            ProbeStatus::Error(_) => self.errors += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_fraction() {
        let progress = Progress {
            emitted: 25,
            total: 100,
        };
        assert!((progress.fraction() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tally() {
        let mut tally = Tally::default();
        tally.record(&ProbeStatus::Open);
        tally.record(&ProbeStatus::Closed);
        tally.record(&ProbeStatus::Closed);
        tally.record(&ProbeStatus::Error("unreachable".into()));
        assert_eq!((tally.open, tally.closed, tally.errors), (1, 2, 1));
    }

    #[tokio::test]
    async fn test_channel_sink_survives_dropped_receiver() {
        let (mut sink, rx) = ChannelSink::new();
        drop(rx);
        sink.handle(&ScanEvent::Progress(Progress {
            emitted: 1,
            total: 2,
        }));
    }

    #[test]
    fn test_closure_sink() {
        let mut count = 0;
        {
            let mut sink = |event: &ScanEvent| {
                if !event.is_finished() {
                    count += 1;
                }
            };
            sink.handle(&ScanEvent::Progress(Progress {
                emitted: 0,
                total: 1,
            }));
        }
        assert_eq!(count, 1);
    }
}
