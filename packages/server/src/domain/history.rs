//! Replay buffer of previously broadcast lines.

use std::collections::VecDeque;

/// Ordered record of broadcast texts, replayed to clients as they join.
///
/// With a non-zero `limit` only the most recent `limit` entries are kept.
/// A `limit` of 0 keeps everything.
#[derive(Debug, Clone, Default)]
pub struct HistoryBuffer {
    entries: VecDeque<String>,
    limit: usize,
}

impl HistoryBuffer {
    pub fn unbounded() -> Self {
        Self::with_limit(0)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    /// Append one line, evicting the oldest entry when the limit is reached
    pub fn push(&mut self, line: String) {
        if self.limit > 0 && self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(line);
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.entries.iter()
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}
