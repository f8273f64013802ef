//! Bounded worker pool.
//!
//! A fixed number of tokio tasks pull ports from a shared [`Dispatcher`],
//! probe them, and hand the results to the session coordinator over a
//! channel. A window semaphore caps `in flight + awaiting release` at the
//! concurrency level, so memory use does not grow with the range size.

use crate::scanner::cancel::CancelToken;
use crate::scanner::traits::{ProbeResult, ProbeStatus, Prober};
use crate::types::{Port, PortRange};
use futures::FutureExt;
use std::net::IpAddr;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Grace period on top of the probe timeout before a probe is cut short.
pub const PROBE_SLACK: Duration = Duration::from_millis(250);

/// Hands out each port of a range exactly once, until the range is
/// exhausted or the cancel token is set.
#[derive(Debug)]
pub struct Dispatcher {
    range: PortRange,
    cursor: Mutex<u32>,
    token: CancelToken,
}

impl Dispatcher {
    /// Create a dispatcher positioned at the start of `range`.
    pub fn new(range: PortRange, token: CancelToken) -> Self {
        Self {
            range,
            cursor: Mutex::new(u32::from(range.start().as_u16())),
            token,
        }
    }

    /// Claim the next unclaimed port.
    ///
    /// The cancel check and the cursor advance happen under one lock, so no
    /// port is handed out twice and none is handed out once a claimer has
    /// seen the token set.
    pub fn claim(&self) -> Option<Port> {
        let mut next = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        if *next > u32::from(self.range.end().as_u16()) || self.token.is_cancelled() {
            return None;
        }
        let port = u16::try_from(*next).ok().and_then(Port::new)?;
        *next += 1;
        Some(port)
    }

    /// The lowest port not yet claimed (one past the end when exhausted).
    pub fn next_to_dispatch(&self) -> u32 {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// How many ports have been claimed so far.
    pub fn dispatched(&self) -> usize {
        (self.next_to_dispatch() - u32::from(self.range.start().as_u16())) as usize
    }

    /// Check whether every port has been claimed.
    pub fn is_exhausted(&self) -> bool {
        self.dispatched() == self.range.len()
    }

    /// The range being dispatched.
    pub fn range(&self) -> PortRange {
        self.range
    }
}

/// A probed port on its way to the coordinator.
///
/// The permit keeps a window slot occupied until the coordinator releases
/// the result to consumers and drops it.
#[derive(Debug)]
pub struct Completion {
    pub result: ProbeResult,
    pub permit: OwnedSemaphorePermit,
}

/// Settings for one pool run.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub addr: IpAddr,
    pub concurrency: usize,
    pub timeout: Duration,
}

struct WorkerContext {
    config: PoolConfig,
    prober: Arc<dyn Prober>,
    dispatcher: Arc<Dispatcher>,
    window: Arc<Semaphore>,
}

/// A running set of workers.
pub struct WorkerPool {
    workers: JoinSet<usize>,
}

impl WorkerPool {
    /// Spawn `config.concurrency` workers onto the current runtime.
    ///
    /// Each worker exits once the dispatcher stops handing out ports or the
    /// receiving side of `tx` is gone. The channel closes when the last
    /// worker exits, which is how the coordinator learns the pool drained.
    pub fn spawn(
        config: PoolConfig,
        prober: Arc<dyn Prober>,
        dispatcher: Arc<Dispatcher>,
        tx: mpsc::UnboundedSender<Completion>,
    ) -> Self {
        let concurrency = config.concurrency.max(1);
        let ctx = Arc::new(WorkerContext {
            config,
            prober,
            dispatcher,
            window: Arc::new(Semaphore::new(concurrency)),
        });

        let mut workers = JoinSet::new();
        for id in 0..concurrency {
            workers.spawn(run_worker(id, Arc::clone(&ctx), tx.clone()));
        }

        debug!(workers = concurrency, prober = ctx.prober.name(), "worker pool started");
        Self { workers }
    }

    /// Wait for every worker to exit. Returns the number of probes run.
    pub async fn join(mut self) -> usize {
        let mut probed = 0;
        while let Some(joined) = self.workers.join_next().await {
            match joined {
                Ok(count) => probed += count,
                Err(e) => error!(error = %e, "worker task failed"),
            }
        }
        probed
    }
}

async fn run_worker(
    id: usize,
    ctx: Arc<WorkerContext>,
    tx: mpsc::UnboundedSender<Completion>,
) -> usize {
    let mut probed = 0;

    loop {
        let Ok(permit) = Arc::clone(&ctx.window).acquire_owned().await else {
            break;
        };
        let Some(port) = ctx.dispatcher.claim() else {
            break;
        };

        let started = Instant::now();
        let status = probe_port(&ctx, port).await;
        let result = ProbeResult::new(port, status, started.elapsed());
        probed += 1;

        if tx.send(Completion { result, permit }).is_err() {
            warn!(worker = id, %port, "coordinator gone, dropping result");
            break;
        }
    }

    debug!(worker = id, probed, "worker exiting");
    probed
}

/// Run one probe with panic containment and a hard deadline.
async fn probe_port(ctx: &WorkerContext, port: Port) -> ProbeStatus {
    let config = ctx.config;
    let probe = AssertUnwindSafe(ctx.prober.probe(config.addr, port, config.timeout)).catch_unwind();

    match tokio::time::timeout(config.timeout + PROBE_SLACK, probe).await {
        Ok(Ok(status)) => status,
        Ok(Err(_)) => {
            error!(%port, "probe panicked");
            ProbeStatus::Error("probe panicked".to_string())
        }
        // No answer in time is a closed port
        Err(_) => ProbeStatus::Closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProber {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Prober for CountingProber {
        async fn probe(&self, _addr: IpAddr, port: Port, _timeout: Duration) -> ProbeStatus {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(u64::from(port.as_u16() % 3))).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            if port.as_u16() == 13 {
                panic!("unlucky port");
            }
            ProbeStatus::Closed
        }
    }

    fn range(start: u32, end: u32) -> PortRange {
        PortRange::from_bounds(start, end).unwrap()
    }

    #[test]
    fn test_dispatcher_claims_each_port_once() {
        let dispatcher = Dispatcher::new(range(1, 3), CancelToken::new());
        let claimed: Vec<u16> = std::iter::from_fn(|| dispatcher.claim())
            .map(Port::as_u16)
            .collect();
        assert_eq!(claimed, vec![1, 2, 3]);
        assert!(dispatcher.is_exhausted());
        assert_eq!(dispatcher.next_to_dispatch(), 4);
    }

    #[test]
    fn test_dispatcher_stops_after_cancel() {
        let token = CancelToken::new();
        let dispatcher = Dispatcher::new(range(100, 200), token.clone());
        assert_eq!(dispatcher.claim(), Port::new(100));
        token.cancel();
        assert_eq!(dispatcher.claim(), None);
        assert_eq!(dispatcher.dispatched(), 1);
        assert!(!dispatcher.is_exhausted());
    }

    #[test]
    fn test_dispatcher_top_of_port_space() {
        let dispatcher = Dispatcher::new(range(65535, 65535), CancelToken::new());
        assert_eq!(dispatcher.claim(), Port::new(65535));
        assert_eq!(dispatcher.claim(), None);
        assert_eq!(dispatcher.next_to_dispatch(), 65536);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pool_probes_every_port_within_bound() {
        let prober = Arc::new(CountingProber {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let dispatcher = Arc::new(Dispatcher::new(range(1, 200), CancelToken::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let config = PoolConfig {
            addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            concurrency: 8,
            timeout: Duration::from_millis(100),
        };

        let pool = WorkerPool::spawn(config, prober.clone(), dispatcher, tx);

        let mut seen = HashSet::new();
        while let Some(completion) = rx.recv().await {
            if completion.result.port.as_u16() == 13 {
                assert_eq!(
                    completion.result.status,
                    ProbeStatus::Error("probe panicked".to_string())
                );
            }
            assert!(seen.insert(completion.result.port));
            drop(completion.permit);
        }

        assert_eq!(pool.join().await, 200);
        assert_eq!(seen.len(), 200);
        assert!(prober.peak.load(Ordering::SeqCst) <= 8);
    }
}
