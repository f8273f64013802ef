//! TCP connect prober.
//!
//! Performs standard TCP connect attempts using the operating system's
//! socket API. The handshake is completed and the socket closed at once;
//! nothing is read or written.

use crate::scanner::traits::{ProbeStatus, Prober};
use crate::types::Port;
use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// TCP connect prober.
///
/// Does not require elevated privileges. Each call owns exactly one socket,
/// which is dropped on every exit path (including the timeout, which drops
/// the pending connect future).
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProber;

impl TcpProber {
    /// Create a new TCP connect prober.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, addr: IpAddr, port: Port, limit: Duration) -> ProbeStatus {
        let target = SocketAddr::new(addr, port.as_u16());

        let status = match timeout(limit, TcpStream::connect(target)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                ProbeStatus::Open
            }
            Ok(Err(e)) => classify_error(&e),
            Err(_) => ProbeStatus::Closed,
        };

        trace!(%target, %status, "probe complete");
        status
    }

    fn name(&self) -> &'static str {
        "tcp-connect"
    }
}

/// Map a failed connect to a port status.
///
/// Refusals and OS-level timeouts are ordinary `Closed` outcomes; everything
/// else (unreachable networks, exhausted descriptors, ...) is an `Error`.
pub fn classify_error(err: &io::Error) -> ProbeStatus {
    match err.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::TimedOut => ProbeStatus::Closed,
        _ => ProbeStatus::Error(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    #[test]
    fn test_classify_error() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(classify_error(&refused), ProbeStatus::Closed);

        let timed_out = io::Error::from(io::ErrorKind::TimedOut);
        assert_eq!(classify_error(&timed_out), ProbeStatus::Closed);

        let other = io::Error::new(io::ErrorKind::Other, "network unreachable");
        assert_eq!(
            classify_error(&other),
            ProbeStatus::Error("network unreachable".to_string())
        );
    }

    #[test]
    fn test_classify_uses_kind_not_message() {
        let worded = io::Error::new(io::ErrorKind::Other, "connection refused by proxy");
        assert_eq!(
            classify_error(&worded),
            ProbeStatus::Error("connection refused by proxy".to_string())
        );
    }

    #[tokio::test]
    async fn test_probe_open_port() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();

        let status = TcpProber::new()
            .probe(IpAddr::V4(Ipv4Addr::LOCALHOST), port, Duration::from_secs(1))
            .await;
        assert_eq!(status, ProbeStatus::Open);
    }

    #[tokio::test]
    async fn test_probe_closed_port() {
        // Bind then release to get a port nothing listens on
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();
        drop(listener);

        let status = TcpProber::new()
            .probe(IpAddr::V4(Ipv4Addr::LOCALHOST), port, Duration::from_millis(500))
            .await;
        assert_eq!(status, ProbeStatus::Closed);
    }
}
