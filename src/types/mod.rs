//! Core type definitions using newtype patterns for type safety.
//!
//! These types prevent common logic errors by making invalid states unrepresentable
//! at compile time.

mod port;
mod session_id;
mod target;

pub use port::{Port, PortError, PortRange};
pub use session_id::{SessionId, SessionIdError};
pub use target::{is_valid_hostname, DnsResolver, Resolver, StaticResolver, Target};
