//! Bounded append-only buffers for the audit log.

use std::collections::VecDeque;

/// Audit event records kept in memory.
pub const EVENT_LOG_CAPACITY: usize = 100;

/// Raw server log lines kept in memory.
pub const RAW_LOG_CAPACITY: usize = 50;

/// Fixed-capacity append-only buffer evicting oldest entries first.
///
/// Synchronous and never blocks the caller; consumed only on the
/// dashboard's event turns.
#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> BoundedLog<T> {
    /// Create a buffer holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append an entry, evicting from the head when full.
    pub fn append(&mut self, entry: T) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(entry);
    }

    /// Drop every entry. Used only on explicit user action.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Current entries, oldest to newest.
    pub fn snapshot(&self) -> Vec<T> {
        self.buf.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
