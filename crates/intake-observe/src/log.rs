//! The bounded, oldest-evicted diagnostic ring.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::entry::DiagnosticEntry;

/// Default number of entries retained before eviction begins.
pub const DEFAULT_CAPACITY: usize = 100;

/// A fixed-capacity, in-memory log of diagnostic entries.
///
/// Recording beyond capacity evicts the oldest entry. All methods take
/// `&self`; the ring is protected by an internal mutex so the log can be
/// shared via `Arc` across the session driver and the agent.
#[derive(Debug)]
pub struct DiagnosticLog {
    entries: Mutex<VecDeque<DiagnosticEntry>>,
    capacity: usize,
}

impl DiagnosticLog {
    /// Creates a log with [`DEFAULT_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a log retaining at most `capacity` entries.
    ///
    /// A capacity of zero is bumped to one so that the most recent failure
    /// is always retrievable.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            capacity: capacity.max(1),
        }
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records a diagnostic entry, evicting the oldest if the ring is full.
    pub fn record(&self, source: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(source, %message, "diagnostic recorded");

        let entry = DiagnosticEntry {
            occurred_at: chrono::Utc::now().to_rfc3339(),
            source: source.to_string(),
            message,
        };

        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Returns all retained entries, oldest first.
    pub fn snapshot(&self) -> Vec<DiagnosticEntry> {
        self.lock().iter().cloned().collect()
    }

    /// Renders the retained entries as display lines, oldest first.
    pub fn render(&self) -> String {
        self.lock()
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing has been recorded (or everything was cleared).
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Discards all retained entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<DiagnosticEntry>> {
        // A poisoned lock only means a panic elsewhere while recording;
        // the ring itself is still usable.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::new()
    }
}
