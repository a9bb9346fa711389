//! Bounded FIFO history log.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::entry::HistoryEntry;

/// Default number of entries retained.
pub const DEFAULT_CAPACITY: usize = 100;

/// Append-only ring of recent history entries.
///
/// Insertion order is chronological order. Appending at capacity evicts the
/// oldest entry. Every appended entry gets the next sequence number, starting
/// at 1, so followers can tell identical entries apart.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    next_seq: u64,
}

impl HistoryLog {
    /// Create a log holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 1,
        }
    }

    pub fn append(&mut self, mut entry: HistoryEntry) {
        entry.seq = self.next_seq;
        self.next_seq += 1;
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// The most recent `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> Vec<HistoryEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// History log shared between the request handlers and the workers.
#[derive(Debug, Clone, Default)]
pub struct SharedHistory {
    inner: Arc<RwLock<HistoryLog>>,
}

impl SharedHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HistoryLog::new(capacity))),
        }
    }

    pub async fn record(&self, entry: HistoryEntry) {
        self.inner.write().await.append(entry);
    }

    pub async fn tail(&self, n: usize) -> Vec<HistoryEntry> {
        self.inner.read().await.tail(n)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn capacity(&self) -> usize {
        self.inner.read().await.capacity()
    }
}
