//! Shared helpers for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use maltus::scanner::{ProbeStatus, Prober};
use maltus::session::{ScanEvent, SessionHandle};
use maltus::types::{Port, Target};
use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A prober that answers from a script instead of the network.
#[derive(Default)]
pub struct ScriptedProber {
    open: HashSet<u16>,
    errors: HashMap<u16, String>,
    panics: HashSet<u16>,
    delays: HashMap<u16, Duration>,
    base_delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.open.extend(ports);
        self
    }

    pub fn error(mut self, port: u16, reason: &str) -> Self {
        self.errors.insert(port, reason.to_string());
        self
    }

    pub fn panic_on(mut self, port: u16) -> Self {
        self.panics.insert(port);
        self
    }

    pub fn delay(mut self, port: u16, delay: Duration) -> Self {
        self.delays.insert(port, delay);
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Highest number of probes seen running at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, _addr: IpAddr, port: Port, _timeout: Duration) -> ProbeStatus {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let port = port.as_u16();
        let delay = self.delays.get(&port).copied().unwrap_or(self.base_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panics.contains(&port) {
            panic!("scripted panic on port {port}");
        }
        if let Some(reason) = self.errors.get(&port) {
            return ProbeStatus::Error(reason.clone());
        }
        if self.open.contains(&port) {
            ProbeStatus::Open
        } else {
            ProbeStatus::Closed
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub fn shared(prober: ScriptedProber) -> Arc<ScriptedProber> {
    Arc::new(prober)
}

pub fn localhost() -> Target {
    Target::from_ip(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// Start the session and collect every event up to and including `Finished`.
pub async fn run_to_end(session: &SessionHandle) -> Vec<ScanEvent> {
    let mut rx = session.events().unwrap();
    assert!(session.start().unwrap());
    collect(&mut rx).await
}

pub async fn collect(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ScanEvent>) -> Vec<ScanEvent> {
    let collecting = async {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            let done = event.is_finished();
            events.push(event);
            if done {
                break;
            }
        }
        events
    };
    tokio::time::timeout(Duration::from_secs(30), collecting)
        .await
        .expect("scan did not finish in time")
}

/// Ports of the `Result` events, in delivery order.
pub fn result_ports(events: &[ScanEvent]) -> Vec<u16> {
    events
        .iter()
        .filter_map(|event| match event {
            ScanEvent::Result(result) => Some(result.port.as_u16()),
            _ => None,
        })
        .collect()
}

/// `(port, status)` pairs of the `Result` events.
pub fn result_statuses(events: &[ScanEvent]) -> Vec<(u16, ProbeStatus)> {
    events
        .iter()
        .filter_map(|event| match event {
            ScanEvent::Result(result) => Some((result.port.as_u16(), result.status.clone())),
            _ => None,
        })
        .collect()
}
