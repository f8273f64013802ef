//! Scan targets and hostname resolution.
//!
//! A `Target` pairs the host as the user typed it with the address it
//! resolved to. Resolution happens exactly once, before a session exists,
//! through a [`Resolver`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use tracing::debug;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// A scan target: the original input plus its resolved address, if any.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// The original input (hostname or IP string).
    pub original: String,
    /// The resolved IP address. `None` when resolution failed.
    pub ip: Option<IpAddr>,
}

impl Target {
    /// Create a resolved target.
    pub fn new(original: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            original: original.into(),
            ip: Some(ip),
        }
    }

    /// Create a target whose hostname could not be resolved.
    pub fn unresolved(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            ip: None,
        }
    }

    /// Create a target from a literal address.
    pub fn from_ip(ip: IpAddr) -> Self {
        Self::new(ip.to_string(), ip)
    }

    /// Check whether the target carries an address.
    pub fn is_resolved(&self) -> bool {
        self.ip.is_some()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            Some(ip) if self.original == ip.to_string() => write!(f, "{}", ip),
            Some(ip) => write!(f, "{} ({})", self.original, ip),
            None => write!(f, "{} (unresolved)", self.original),
        }
    }
}

/// Hostname-to-address lookup, consulted once per session.
///
/// Implementations never fail: an unknown host comes back as
/// [`Target::unresolved`], which session creation rejects.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve `host` to a target.
    async fn resolve(&self, host: &str) -> Target;
}

/// DNS-backed resolver using the system-independent trust-dns stack.
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
}

impl DnsResolver {
    /// Create a resolver with the default upstream configuration.
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resolver for DnsResolver {
    async fn resolve(&self, host: &str) -> Target {
        let host = host.trim();

        if let Ok(ip) = host.parse::<IpAddr>() {
            return Target::new(host, ip);
        }

        if !is_valid_hostname(host) {
            debug!(host, "rejecting malformed hostname");
            return Target::unresolved(host);
        }

        match self.resolver.lookup_ip(host).await {
            // First address only, like the system resolver
            Ok(response) => match response.iter().next() {
                Some(ip) => Target::new(host, ip),
                None => Target::unresolved(host),
            },
            Err(e) => {
                debug!(host, error = %e, "DNS lookup failed");
                Target::unresolved(host)
            }
        }
    }
}

/// Resolver backed by a fixed host table. Literal IPs always resolve.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: HashMap<String, IpAddr>,
}

impl StaticResolver {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host entry.
    pub fn with_host(mut self, host: impl Into<String>, ip: IpAddr) -> Self {
        self.hosts.insert(host.into().to_lowercase(), ip);
        self
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, host: &str) -> Target {
        let host = host.trim();
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Target::new(host, ip);
        }
        match self.hosts.get(&host.to_lowercase()) {
            Some(ip) => Target::new(host, *ip),
            None => Target::unresolved(host),
        }
    }
}

/// Check if a string is a valid hostname.
pub fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    // Each label must be 1-63 characters
    for label in s.trim_end_matches('.').split('.') {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        // Must start and end with alphanumeric
        if !label.chars().next().is_some_and(|c| c.is_alphanumeric()) {
            return false;
        }
        if !label.chars().last().is_some_and(|c| c.is_alphanumeric()) {
            return false;
        }
        // Can only contain alphanumeric and hyphens
        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return false;
        }
    }

    true
}
