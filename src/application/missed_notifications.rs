//! Missed-notification buffer.
//!
//! Holds in-app notifications that arrived while no client was connected,
//! in arrival order, until the next client connects and drains them.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::notification::Notification;

/// Ordered queue of notifications nobody was connected to receive.
///
/// Unbounded unless a capacity is given; with a capacity the oldest entry
/// is evicted to make room. Entries never expire on their own.
#[derive(Debug, Default)]
pub struct MissedNotificationBuffer {
    entries: Mutex<VecDeque<Notification>>,
    capacity: Option<usize>,
}

impl MissedNotificationBuffer {
    /// Create an unbounded buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer that keeps at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: Some(capacity.max(1)),
        }
    }

    /// Create from the optional configured cap.
    pub fn from_capacity(capacity: Option<usize>) -> Self {
        match capacity {
            Some(cap) => Self::with_capacity(cap),
            None => Self::new(),
        }
    }

    /// Append to the tail.
    ///
    /// Returns the evicted head when the buffer was at capacity.
    pub fn append(&self, notification: Notification) -> Option<Notification> {
        let mut entries = self.entries();
        let evicted = match self.capacity {
            Some(cap) if entries.len() >= cap => entries.pop_front(),
            _ => None,
        };
        entries.push_back(notification);
        evicted
    }

    /// Take every buffered notification in arrival order, leaving the buffer empty.
    pub fn drain_all(&self) -> Vec<Notification> {
        self.entries().drain(..).collect()
    }

    /// Number of buffered notifications.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries().iter().cloned().collect()
    }

    /// Configured cap, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    // A panic while holding the lock cannot leave the deque half-mutated,
    // so a poisoned guard is still safe to use.
    fn entries(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
