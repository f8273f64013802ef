//! Prober trait abstraction.
//!
//! Defines the single-port probe interface the worker pool drives, and the
//! result types a probe produces.

use crate::types::Port;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;
use std::time::{Duration, Instant};

/// Reachability of a probed port.
///
/// A timeout is reported as `Closed`, same as an active refusal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    /// Handshake completed (service listening).
    Open,
    /// Connection refused, or no answer within the timeout.
    Closed,
    /// Any other failure, with a short diagnostic.
    Error(String),
}

impl ProbeStatus {
    /// Check if the port is open.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Diagnostic attached to an `Error` status.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Error(reason) => Some(reason),
            _ => None,
        }
    }

    /// Status keyword without the diagnostic.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Error(_) => "error",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Error(reason) => write!(f, "error ({})", reason),
        }
    }
}

/// Result of probing a single port.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    /// The port that was probed.
    pub port: Port,
    /// Outcome of the probe.
    pub status: ProbeStatus,
    /// Monotonic completion time.
    #[serde(skip)]
    pub completed_at: Instant,
    /// Time spent in the probe, in milliseconds.
    pub elapsed_ms: u64,
}

impl ProbeResult {
    /// Create a result stamped with the current instant.
    pub fn new(port: Port, status: ProbeStatus, elapsed: Duration) -> Self {
        Self {
            port,
            status,
            completed_at: Instant::now(),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Check if the port is open.
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}

/// A bounded-time connectivity check against one port.
///
/// Implementations must return within `timeout` plus scheduling slack,
/// must not retry, and must release any socket they open before returning.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `port` on `addr`.
    async fn probe(&self, addr: IpAddr, port: Port, timeout: Duration) -> ProbeStatus;

    /// Short name for logs.
    fn name(&self) -> &'static str {
        "probe"
    }
}
