use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

pub const FEED_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Warning,
    Error,
    Success,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Info => "info",
            LogKind::Warning => "warning",
            LogKind::Error => "error",
            LogKind::Success => "success",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub timestamp: String,
    pub agent_id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
}

impl LogEntry {
    /// Entry stamped with a fresh id and the local wall-clock time.
    pub fn now(agent_id: impl Into<String>, message: impl Into<String>, kind: LogKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            agent_id: agent_id.into(),
            message: message.into(),
            kind,
        }
    }
}

/// Append-only display feed that keeps only the most recent entries.
#[derive(Debug, Clone)]
pub struct LogFeed {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for LogFeed {
    fn default() -> Self {
        Self::with_capacity(FEED_CAPACITY)
    }
}

impl LogFeed {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = LogEntry>) {
        for entry in entries {
            self.push(entry);
        }
    }

    /// Oldest first.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &LogEntry> + ExactSizeIterator {
        self.entries.iter()
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

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> LogEntry {
        LogEntry {
            id: n.to_string(),
            timestamp: "00:00:00".to_string(),
            agent_id: "AG-01".to_string(),
            message: format!("message {n}"),
            kind: LogKind::Info,
        }
    }

    #[test]
    fn evicts_oldest_first_at_capacity() {
        let mut feed = LogFeed::default();
        feed.extend((0..105).map(entry));
        assert_eq!(feed.len(), FEED_CAPACITY);
        assert_eq!(feed.entries().next().map(|e| e.id.as_str()), Some("5"));
        assert_eq!(feed.entries().last().map(|e| e.id.as_str()), Some("104"));
    }

    #[test]
    fn zero_capacity_still_keeps_one() {
        let mut feed = LogFeed::with_capacity(0);
        feed.push(entry(1));
        feed.push(entry(2));
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.capacity(), 1);
    }

    #[test]
    fn entry_serializes_kind_as_type() {
        let json = serde_json::to_value(entry(7)).expect("json");
        assert_eq!(json["type"], "info");
        assert_eq!(json["agentId"], "AG-01");
    }

    #[test]
    fn now_stamps_unique_ids() {
        let a = LogEntry::now("AG-02", "x", LogKind::Success);
        let b = LogEntry::now("AG-02", "x", LogKind::Success);
        assert_ne!(a.id, b.id);
        assert_eq!(a.timestamp.len(), 8);
    }
}
