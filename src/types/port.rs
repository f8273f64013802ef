//! Port types with validation and parsing.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortRange` is the inclusive span a scan session walks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
///
/// Using a newtype prevents accidental misuse of raw u16 values
/// and ensures port numbers are always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Create a Port from a wider integer, as typed by a user.
    pub fn from_u32(port: u32) -> Result<Self, PortError> {
        u16::try_from(port)
            .ok()
            .and_then(Self::new)
            .ok_or(PortError::OutOfRange(port))
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(u32::from(value)))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(u32),
    #[error("invalid port number: {0}")]
    InvalidFormat(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u32, u32),
}

/// An inclusive range of ports. Always holds at least one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPortRange", into = "RawPortRange")]
pub struct PortRange {
    start: Port,
    end: Port,
}

/// Serialized form of a range, checked on the way back in.
#[derive(Clone, Copy, Serialize, Deserialize)]
struct RawPortRange {
    start: Port,
    end: Port,
}

impl TryFrom<RawPortRange> for PortRange {
    type Error = PortError;

    fn try_from(raw: RawPortRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl From<PortRange> for RawPortRange {
    fn from(range: PortRange) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

impl PortRange {
    /// Create a new port range.
    pub fn new(start: Port, end: Port) -> Result<Self, PortError> {
        if start.0 > end.0 {
            Err(PortError::InvalidRange(start.0.into(), end.0.into()))
        } else {
            Ok(Self { start, end })
        }
    }

    /// Validate raw bounds as entered by a caller.
    ///
    /// Both bounds must lie in `1..=65535` and `start <= end`.
    pub fn from_bounds(start: u32, end: u32) -> Result<Self, PortError> {
        let start_port = Port::from_u32(start)?;
        let end_port = Port::from_u32(end)?;
        Self::new(start_port, end_port)
    }

    /// Split a `START-END` (or single `PORT`) string into raw bounds.
    ///
    /// Bounds are not range-checked here so that callers can route the
    /// validation through session creation.
    pub fn parse_bounds(s: &str) -> Result<(u32, u32), PortError> {
        let s = s.trim();
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| PortError::InvalidFormat(part.to_string()))
        };

        match s.split_once('-') {
            Some((start, end)) => Ok((parse(start)?, parse(end)?)),
            None => {
                let port = parse(s)?;
                Ok((port, port))
            }
        }
    }

    /// Create a range containing a single port.
    pub const fn single(port: Port) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    /// First port of the range.
    pub const fn start(&self) -> Port {
        self.start
    }

    /// Last port of the range (inclusive).
    pub const fn end(&self) -> Port {
        self.end
    }

    /// Get the number of ports in this range.
    pub const fn len(&self) -> usize {
        (self.end.0 - self.start.0) as usize + 1
    }

    /// Check if the range is empty (never true for valid ranges).
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Check whether `port` falls inside the range.
    pub fn contains(&self, port: Port) -> bool {
        self.start <= port && port <= self.end
    }

    /// Iterate over all ports in this range.
    pub fn iter(&self) -> impl Iterator<Item = Port> {
        (self.start.0..=self.end.0).map(Port)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl FromStr for PortRange {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = Self::parse_bounds(s)?;
        Self::from_bounds(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_validation() {
        assert!(Port::new(0).is_none());
        assert!(Port::new(1).is_some());
        assert!(Port::new(65535).is_some());
        assert_eq!(Port::from_u32(65536), Err(PortError::OutOfRange(65536)));
    }

    #[test]
    fn test_port_range() {
        let range = PortRange::from_bounds(1, 100).unwrap();
        assert_eq!(range.len(), 100);
        assert_eq!(range.iter().count(), 100);
        assert!(range.contains(Port::new(100).unwrap()));
        assert!(!range.contains(Port::new(101).unwrap()));
    }

    #[test]
    fn test_full_range_length() {
        let range = PortRange::from_bounds(1, 65535).unwrap();
        assert_eq!(range.len(), 65535);
        assert_eq!(range.iter().last(), Port::new(65535));
    }

    #[test]
    fn test_invalid_bounds() {
        assert_eq!(
            PortRange::from_bounds(1, 65536),
            Err(PortError::OutOfRange(65536))
        );
        assert_eq!(PortRange::from_bounds(0, 10), Err(PortError::OutOfRange(0)));
        assert_eq!(
            PortRange::from_bounds(20, 10),
            Err(PortError::InvalidRange(20, 10))
        );
    }

    #[test]
    fn test_parse_bounds() {
        assert_eq!(PortRange::parse_bounds("1-1024").unwrap(), (1, 1024));
        assert_eq!(PortRange::parse_bounds(" 80 ").unwrap(), (80, 80));
        assert_eq!(PortRange::parse_bounds("1-70000").unwrap(), (1, 70000));
        assert!(PortRange::parse_bounds("http").is_err());
        assert_eq!("22-25".parse::<PortRange>().unwrap().to_string(), "22-25");
    }

    #[test]
    fn test_range_deserialize_checks_order() {
        let range: PortRange = serde_json::from_str(r#"{"start":20,"end":25}"#).unwrap();
        assert_eq!(range.len(), 6);
        assert_eq!(
            serde_json::to_string(&range).unwrap(),
            r#"{"start":20,"end":25}"#
        );
        assert!(serde_json::from_str::<PortRange>(r#"{"start":25,"end":20}"#).is_err());
        assert!(serde_json::from_str::<PortRange>(r#"{"start":0,"end":20}"#).is_err());
    }

    #[test]
    fn test_port_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Port>("0").is_err());
        assert_eq!(serde_json::from_str::<Port>("443").unwrap().as_u16(), 443);
    }
}
