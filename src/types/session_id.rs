//! Unique identifiers for scan sessions.
//!
//! `SessionId` names one scan session from creation to completion and keys
//! saved transcripts, preventing accidental misuse of string identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a scan session.
///
/// Uses UUID v4 internally for globally unique identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get a short representation (first 8 characters).
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }

    /// Check that `prefix` could start a session id: hex digits and hyphens,
    /// at most a full hyphenated UUID long.
    pub fn check_prefix(prefix: &str) -> Result<(), SessionIdError> {
        let valid = !prefix.is_empty()
            && prefix.len() <= 36
            && prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-');
        if valid {
            Ok(())
        } else {
            Err(SessionIdError::InvalidFormat(prefix.to_string()))
        }
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = SessionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(s).map_err(|_| SessionIdError::InvalidFormat(s.to_string()))?;
        Ok(Self(uuid))
    }
}

/// Error type for SessionId parsing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionIdError {
    #[error("invalid session ID format: {0}")]
    InvalidFormat(String),
}
