use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use shared::protocol::SentimentResult;

/// One retained single-analysis result, stamped when it was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub result: SentimentResult,
    pub recorded_at: DateTime<Utc>,
}

/// Fixed-capacity, most-recent-first log. New entries push to the front;
/// anything beyond capacity falls off the back, so memory stays bounded for
/// long sessions.
#[derive(Debug)]
pub struct RollingHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl RollingHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, result: SentimentResult) {
        self.entries.push_front(HistoryEntry {
            result,
            recorded_at: Utc::now(),
        });
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
