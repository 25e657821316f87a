//! Bounded calculation history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// One recorded calculation: what was entered and what came out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub input: String,
    pub result: String,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(input: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            result: result.into(),
            recorded_at: Utc::now(),
        }
    }

    /// Format as display string: "2+3×4 = 14"
    pub fn display(&self) -> String {
        format!("{} = {}", self.input, self.result)
    }
}

/// Insertion-ordered history, optionally capped.
///
/// When full, the oldest entry is evicted.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: Option<usize>,
}

impl History {
    /// History without a size limit
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// History holding at most `capacity` entries
    pub fn bounded(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: Some(capacity),
        }
    }

    pub fn with_limit(limit: Option<usize>) -> Self {
        match limit {
            Some(capacity) => Self::bounded(capacity),
            None => Self::unbounded(),
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.capacity == Some(0) {
            return;
        }
        self.entries.push_back(entry);
        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                self.entries.pop_front();
            }
        }
    }

    pub fn record(&mut self, input: impl Into<String>, result: impl Into<String>) {
        self.push(HistoryEntry::new(input, result));
    }

    /// Entries oldest first
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Entries newest first
    pub fn recent(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_history_evicts_oldest() {
        let mut history = History::bounded(10);
        for i in 0..15 {
            history.record(i.to_string(), (i * 2).to_string());
        }
        assert_eq!(history.len(), 10);
        assert_eq!(history.entries().next().unwrap().input, "5");
        assert_eq!(history.recent().next().unwrap().input, "14");
    }

    #[test]
    fn test_unbounded_history_keeps_everything() {
        let mut history = History::unbounded();
        for i in 0..100 {
            history.record(i.to_string(), i.to_string());
        }
        assert_eq!(history.len(), 100);
        assert_eq!(history.capacity(), None);
    }

    #[test]
    fn test_huge_capacity_does_not_preallocate() {
        let mut history = History::bounded(usize::MAX);
        history.record("1+1", "2");
        assert_eq!(history.len(), 1);
        assert_eq!(history.capacity(), Some(usize::MAX));
    }

    #[test]
    fn test_zero_capacity_records_nothing() {
        let mut history = History::bounded(0);
        history.record("1+1", "2");
        assert!(history.is_empty());
    }

    #[test]
    fn test_clear_and_display() {
        let mut history = History::unbounded();
        history.record("2+3×4", "14");
        assert_eq!(history.latest().unwrap().display(), "2+3×4 = 14");
        history.clear();
        assert!(history.latest().is_none());
    }
}
