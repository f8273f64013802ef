//! Reorder buffer.
//!
//! Workers finish ports out of order; the buffer holds early arrivals until
//! every lower port has arrived, then releases the contiguous run.

use crate::types::{Port, PortRange};
use std::collections::BTreeMap;

/// Rejected submissions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReorderError {
    #[error("port {0} is outside the scanned range")]
    OutOfRange(Port),
    #[error("port {0} was already released")]
    AlreadyReleased(Port),
    #[error("port {0} is already buffered")]
    Duplicate(Port),
}

/// Sparse holding area keyed by port plus a "next expected" cursor.
///
/// Generic over the item so callers can attach bookkeeping (such as a
/// concurrency permit) that must live exactly as long as the item is held.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    pending: BTreeMap<Port, T>,
    start: u32,
    // u32 so the cursor can step past 65535
    next: u32,
    end: u32,
}

impl<T> ReorderBuffer<T> {
    /// Create a buffer expecting `range.start()` first.
    pub fn new(range: PortRange) -> Self {
        let start = u32::from(range.start().as_u16());
        Self {
            pending: BTreeMap::new(),
            start,
            next: start,
            end: u32::from(range.end().as_u16()),
        }
    }

    /// Store the item for `port`.
    pub fn submit(&mut self, port: Port, item: T) -> Result<(), ReorderError> {
        let raw = u32::from(port.as_u16());
        if raw < self.start || raw > self.end {
            return Err(ReorderError::OutOfRange(port));
        }
        if raw < self.next {
            return Err(ReorderError::AlreadyReleased(port));
        }
        if self.pending.contains_key(&port) {
            return Err(ReorderError::Duplicate(port));
        }
        self.pending.insert(port, item);
        Ok(())
    }

    /// Remove and return the contiguous run starting at the cursor, in
    /// ascending port order. Empty when the next expected port is missing.
    pub fn drain_ready(&mut self) -> Vec<T> {
        let mut ready = Vec::new();
        while self.next <= self.end {
            let Some(port) = u16::try_from(self.next).ok().and_then(Port::new) else {
                break;
            };
            match self.pending.remove(&port) {
                Some(item) => {
                    ready.push(item);
                    self.next += 1;
                }
                None => break,
            }
        }
        ready
    }

    /// The next port the buffer is waiting for, `None` once the range is done.
    pub fn next_expected(&self) -> Option<Port> {
        if self.next > self.end {
            return None;
        }
        u16::try_from(self.next).ok().and_then(Port::new)
    }

    /// Number of items held back waiting for a lower port.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Check whether nothing is held back.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
