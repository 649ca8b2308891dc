//! Batch Queue
//!
//! Bounded FIFO of encoded events waiting to be published. A full queue
//! rejects new entries instead of blocking the producer.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Default number of entries the queue can hold
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// An encoded message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry(String);

impl QueueEntry {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    pub fn body(&self) -> &str {
        &self.0
    }

    pub fn into_body(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Entry rejected, the queue is at capacity
    #[error("Queue is full (capacity {capacity})")]
    Full { capacity: usize },

    #[error("Queue lock poisoned")]
    Poisoned,
}

#[derive(Debug)]
pub struct BatchQueue {
    entries: Mutex<VecDeque<QueueEntry>>,
    capacity: usize,
}

impl BatchQueue {
    /// Create a queue holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an entry, or reject it when the queue is full.
    ///
    /// Returns the queue length after the append.
    pub fn enqueue(&self, entry: QueueEntry) -> Result<usize, QueueError> {
        let mut entries = self.entries.lock().map_err(|_| QueueError::Poisoned)?;
        if entries.len() >= self.capacity {
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        }
        entries.push_back(entry);
        Ok(entries.len())
    }

    /// Remove up to `n` entries from the front, oldest first
    pub fn drain_up_to(&self, n: usize) -> Result<Vec<QueueEntry>, QueueError> {
        let mut entries = self.entries.lock().map_err(|_| QueueError::Poisoned)?;
        let take = n.min(entries.len());
        Ok(entries.drain(..take).collect())
    }

    /// Remove exactly `n` entries, but only if at least `n` are queued.
    ///
    /// The length check and the drain happen under one lock, so concurrent
    /// callers never receive overlapping or short batches.
    pub fn drain_batch(&self, n: usize) -> Result<Option<Vec<QueueEntry>>, QueueError> {
        let mut entries = self.entries.lock().map_err(|_| QueueError::Poisoned)?;
        if n == 0 || entries.len() < n {
            return Ok(None);
        }
        Ok(Some(entries.drain(..n).collect()))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BatchQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
