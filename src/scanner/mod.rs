//! Scanner module - the probing engine beneath a scan session.
//!
//! This module provides the single-port [`Prober`] interface and its TCP
//! implementation, the [`WorkerPool`] that runs probes concurrently, the
//! [`ReorderBuffer`] that restores ascending port order, and the
//! [`CancelToken`] that stops new work from being claimed.

pub mod cancel;
pub mod pool;
pub mod reorder;
pub mod tcp;
pub mod traits;

pub use cancel::CancelToken;
pub use pool::{Completion, Dispatcher, PoolConfig, WorkerPool, PROBE_SLACK};
pub use reorder::{ReorderBuffer, ReorderError};
pub use tcp::TcpProber;
pub use traits::{ProbeResult, ProbeStatus, Prober};
