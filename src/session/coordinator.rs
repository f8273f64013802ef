//! The per-session coordinator task.
//!
//! Owns the reorder buffer and is the only emitter: workers hand results
//! over a channel, the coordinator releases the ready prefix to the sinks,
//! and once the channel closes (every worker exited) it reports completion.

use super::events::{EventSink, Progress, ScanEvent, ScanSummary, Tally};
use super::{SessionState, Shared};
use crate::scanner::{Completion, PoolConfig, ReorderBuffer, WorkerPool};
use crate::types::SessionId;
use chrono::Utc;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Delivers events to every sink in subscription order.
///
/// A sink that panics is dropped; the others keep receiving events.
struct Emitter {
    session: SessionId,
    sinks: Vec<Box<dyn EventSink>>,
}

impl Emitter {
    fn emit(&mut self, event: ScanEvent) {
        let session = self.session;
        self.sinks.retain_mut(|sink| {
            match panic::catch_unwind(AssertUnwindSafe(|| sink.handle(&event))) {
                Ok(()) => true,
                Err(_) => {
                    error!(%session, "event sink panicked, unsubscribing it");
                    false
                }
            }
        });
    }
}

/// Run a session from `Running` to `Completed`.
pub(super) async fn drive(shared: Arc<Shared>, sinks: Vec<Box<dyn EventSink>>) {
    let started_at = Utc::now();
    let clock = Instant::now();
    let total = shared.range.len();
    let mut emitter = Emitter {
        session: shared.id,
        sinks,
    };

    info!(
        session = %shared.id,
        target = %shared.target,
        range = %shared.range,
        concurrency = shared.options.concurrency,
        "scan started"
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
    let pool = WorkerPool::spawn(
        PoolConfig {
            addr: shared.addr,
            concurrency: shared.options.concurrency,
            timeout: shared.options.timeout,
        },
        Arc::clone(&shared.prober),
        Arc::clone(&shared.dispatcher),
        tx,
    );

    let mut buffer = ReorderBuffer::new(shared.range);
    let mut tally = Tally::default();
    let mut emitted = 0usize;

    while let Some(completion) = rx.recv().await {
        let port = completion.result.port;
        if let Err(e) = buffer.submit(port, completion) {
            warn!(session = %shared.id, error = %e, "discarding result");
            continue;
        }
        release_ready(&shared, &mut buffer, &mut emitter, &mut tally, &mut emitted);
    }

    let probed = pool.join().await;
    // Pool drained: flush whatever contiguous prefix is left
    release_ready(&shared, &mut buffer, &mut emitter, &mut tally, &mut emitted);
    if !buffer.is_empty() {
        warn!(
            session = %shared.id,
            stranded = buffer.pending_len(),
            "results beyond a missing port were not delivered"
        );
    }

    let dispatched = shared.dispatcher.dispatched();
    let summary = ScanSummary {
        session_id: shared.id,
        target: shared.target.clone(),
        range: shared.range,
        emitted,
        total,
        was_stopped: dispatched < total,
        open: tally.open,
        closed: tally.closed,
        errors: tally.errors,
        started_at,
        finished_at: Utc::now(),
        duration_ms: clock.elapsed().as_millis() as u64,
    };

    info!(
        session = %shared.id,
        emitted,
        total,
        probed,
        open = summary.open,
        stopped = summary.was_stopped,
        duration_ms = summary.duration_ms,
        "scan finished"
    );

    emitter.emit(ScanEvent::Finished(summary.clone()));
    let _ = shared.summary.set(summary);
    shared.state.send_replace(SessionState::Completed);
}

/// Emit the buffer's ready prefix followed by one progress event.
fn release_ready(
    shared: &Shared,
    buffer: &mut ReorderBuffer<Completion>,
    emitter: &mut Emitter,
    tally: &mut Tally,
    emitted: &mut usize,
) {
    let ready = buffer.drain_ready();
    if ready.is_empty() {
        return;
    }

    for Completion { result, permit } in ready {
        // Frees a window slot for the next claim
        drop(permit);
        tally.record(&result.status);
        *emitted += 1;
        shared.emitted.store(*emitted, Ordering::Release);
        emitter.emit(ScanEvent::Result(result));
    }

    debug!(session = %shared.id, emitted = *emitted, "released batch");
    emitter.emit(ScanEvent::Progress(Progress {
        emitted: *emitted,
        total: shared.range.len(),
    }));
}
