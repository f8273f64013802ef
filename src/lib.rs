//! # Maltus - A Concurrent TCP Port Scanner
//!
//! Maltus probes every port of an inclusive range on one host with a bounded
//! number of concurrent TCP connection attempts, and delivers the results
//! in strictly ascending port order no matter which probes finish first.
//!
//! ## Features
//!
//! - **Ordered Results**: a reorder buffer releases only gap-free prefixes
//! - **Bounded Concurrency**: in-flight and held-back results never exceed the
//!   configured concurrency, so memory does not grow with the range
//! - **Cooperative Cancellation**: a stop request halts new claims while
//!   in-flight probes finish and still report
//! - **Transcripts**: plain text, JSON and CSV reports rebuilt from events
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use maltus::session::{ScanEngine, ScanEvent, SessionOptions};
//! use maltus::types::{DnsResolver, Resolver};
//!
//! #[tokio::main]
//! async fn main() {
//!     let target = DnsResolver::new().resolve("localhost").await;
//!     let session = ScanEngine::tcp()
//!         .create_session(target, 1, 1024, SessionOptions::default())
//!         .unwrap();
//!
//!     let mut events = session.events().unwrap();
//!     session.start().unwrap();
//!
//!     while let Some(event) = events.recv().await {
//!         if let ScanEvent::Result(result) = event {
//!             println!("Port {} is {}", result.port, result.status);
//!         }
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Ports, ranges, targets, session ids and resolvers
//! - [`scanner`] - Prober trait, TCP prober, worker pool, reorder buffer, cancel token
//! - [`session`] - Session lifecycle, coordinator and event stream
//! - [`transcript`] - Transcript recording, rendering and storage
//! - [`config`] - Settings and XDG paths
//! - [`output`] - Console rendering
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod session;
pub mod transcript;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, SessionError};
pub use scanner::{ProbeResult, ProbeStatus, Prober, TcpProber};
pub use session::{
    EventSink, ScanEngine, ScanEvent, ScanSummary, SessionHandle, SessionOptions, SessionState,
};
pub use types::{Port, PortRange, SessionId, Target};
