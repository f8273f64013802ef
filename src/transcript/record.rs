//! Transcript records and the sink that builds them.

use crate::scanner::ProbeStatus;
use crate::session::{EventSink, ScanEvent, ScanSummary};
use crate::types::{Port, PortRange, SessionId, Target};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// One port line of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub port: Port,
    /// `open`, `closed` or `error`.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TranscriptEntry {
    fn from_status(port: Port, status: &ProbeStatus) -> Self {
        Self {
            port,
            status: status.label().to_string(),
            reason: status.reason().map(str::to_string),
        }
    }

    /// Check if the port was open.
    pub fn is_open(&self) -> bool {
        self.status == "open"
    }
}

/// A finished session, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub session_id: SessionId,
    pub target: Target,
    pub range: PortRange,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub was_stopped: bool,
    pub emitted: usize,
    pub total: usize,
    pub entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Rebuild a transcript from an event sequence.
    ///
    /// Returns `None` if the sequence has no `Finished` event.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a ScanEvent>) -> Option<Self> {
        let mut builder = Builder::default();
        for event in events {
            builder.push(event);
        }
        builder.build()
    }

    /// Number of open ports.
    pub fn open_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_open()).count()
    }

    /// Short one-line description.
    pub fn summary(&self) -> String {
        format!(
            "{} [{}] - {} open of {}/{} ports{}",
            self.target,
            self.range,
            self.open_count(),
            self.emitted,
            self.total,
            if self.was_stopped { " (stopped)" } else { "" }
        )
    }
}

#[derive(Debug, Default)]
struct Builder {
    entries: Vec<TranscriptEntry>,
    summary: Option<ScanSummary>,
}

impl Builder {
    fn push(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::Result(result) => self
                .entries
                .push(TranscriptEntry::from_status(result.port, &result.status)),
            ScanEvent::Progress(_) => {}
            ScanEvent::Finished(summary) => self.summary = Some(summary.clone()),
        }
    }

    fn build(&self) -> Option<Transcript> {
        let summary = self.summary.as_ref()?;
        Some(Transcript {
            session_id: summary.session_id,
            target: summary.target.clone(),
            range: summary.range,
            started_at: summary.started_at,
            finished_at: summary.finished_at,
            was_stopped: summary.was_stopped,
            emitted: summary.emitted,
            total: summary.total,
            entries: self.entries.clone(),
        })
    }
}

/// Event sink that records a transcript.
///
/// Clones share the recording, so keep one clone and subscribe another.
#[derive(Debug, Clone, Default)]
pub struct TranscriptSink {
    builder: Arc<Mutex<Builder>>,
}

impl TranscriptSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished transcript, once the session has completed.
    pub fn transcript(&self) -> Option<Transcript> {
        self.builder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .build()
    }
}

impl EventSink for TranscriptSink {
    fn handle(&mut self, event: &ScanEvent) {
        self.builder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::scanner::ProbeResult;
    use crate::session::Progress;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    pub(crate) fn sample_events(stopped: bool) -> Vec<ScanEvent> {
        let range = PortRange::from_bounds(20, 24).unwrap();
        let statuses = [
            ProbeStatus::Closed,
            ProbeStatus::Open,
            ProbeStatus::Error("network unreachable".to_string()),
        ];
        let mut events: Vec<ScanEvent> = statuses
            .iter()
            .zip(20u16..)
            .map(|(status, port)| {
                ScanEvent::Result(ProbeResult::new(
                    Port::new(port).unwrap(),
                    status.clone(),
                    Duration::from_millis(3),
                ))
            })
            .collect();
        events.push(ScanEvent::Progress(Progress {
            emitted: 3,
            total: 5,
        }));
        let started_at = Utc::now();
        events.push(ScanEvent::Finished(ScanSummary {
            session_id: SessionId::new(),
            target: Target::new("lab", IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))),
            range,
            emitted: 3,
            total: 5,
            was_stopped: stopped,
            open: 1,
            closed: 1,
            errors: 1,
            started_at,
            finished_at: started_at,
            duration_ms: 0,
        }));
        events
    }

    #[test]
    fn test_from_events() {
        let transcript = Transcript::from_events(&sample_events(true)).unwrap();
        assert_eq!(transcript.entries.len(), 3);
        assert_eq!(transcript.entries[1].port.as_u16(), 21);
        assert!(transcript.entries[1].is_open());
        assert_eq!(
            transcript.entries[2].reason.as_deref(),
            Some("network unreachable")
        );
        assert!(transcript.was_stopped);
        assert_eq!(transcript.open_count(), 1);
        assert!(transcript.summary().ends_with("(stopped)"));
    }

    #[test]
    fn test_incomplete_stream_has_no_transcript() {
        let mut events = sample_events(false);
        events.pop();
        assert!(Transcript::from_events(&events).is_none());
    }

    #[test]
    fn test_sink_shares_recording() {
        let recorder = TranscriptSink::new();
        let mut sink = recorder.clone();
        for event in &sample_events(false) {
            sink.handle(event);
        }
        let transcript = recorder.transcript().unwrap();
        assert!(!transcript.was_stopped);
        assert_eq!(transcript.emitted, 3);
    }

    #[test]
    fn test_transcript_serialization() {
        let transcript = Transcript::from_events(&sample_events(false)).unwrap();
        let json = serde_json::to_string(&transcript).unwrap();
        let parsed: Transcript = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, transcript);
    }
}
