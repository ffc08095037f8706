//! Bounded log of bridge exchanges, kept for diagnostics.

use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which way an exchange went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

/// One request or reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub direction: Direction,
    pub method: String,
    pub path: String,
    /// HTTP status, replies only
    pub status: Option<u16>,
    pub body: Value,
    /// Seconds since the history was created
    pub elapsed: f64,
}

/// The most recent bridge exchanges, oldest dropped first.
#[derive(Debug, Clone)]
pub struct MessageHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    started: Instant,
    requests: usize,
    replies: usize,
    failed_replies: usize,
    last_error: Option<String>,
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageHistory {
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        MessageHistory {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            started: Instant::now(),
            requests: 0,
            replies: 0,
            failed_replies: 0,
            last_error: None,
        }
    }

    fn push(&mut self, entry: HistoryEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn sent(&mut self, method: &str, path: &str, body: &Value) {
        self.requests += 1;
        self.push(HistoryEntry {
            direction: Direction::Sent,
            method: method.to_string(),
            path: path.to_string(),
            status: None,
            body: body.clone(),
            elapsed: self.started.elapsed().as_secs_f64(),
        });
    }

    pub fn received(&mut self, method: &str, path: &str, status: u16, body: &Value) {
        self.replies += 1;
        if status != 200 {
            self.failed_replies += 1;
        }
        self.push(HistoryEntry {
            direction: Direction::Received,
            method: method.to_string(),
            path: path.to_string(),
            status: Some(status),
            body: body.clone(),
            elapsed: self.started.elapsed().as_secs_f64(),
        });
    }

    pub fn record_error(&mut self, error: &str) {
        self.last_error = Some(error.to_string());
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Latest retained reply for `path`.
    pub fn last_reply(&self, path: &str) -> Option<&HistoryEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.direction == Direction::Received && e.path == path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything, including the counters.
    pub fn clear(&mut self) {
        *self = Self::with_capacity(self.capacity);
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            requests: self.requests,
            replies: self.replies,
            failed_replies: self.failed_replies,
            retained: self.entries.len(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Counters over the whole lifetime of a [`MessageHistory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub requests: usize,
    pub replies: usize,
    /// Replies with a status other than 200
    pub failed_replies: usize,
    /// Entries still held
    pub retained: usize,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exchange() {
        let mut history = MessageHistory::new();
        history.sent("PUT", "/groups/1", &json!({"lights": ["5"]}));
        history.received("PUT", "/groups/1", 200, &json!([{"success": {"/groups/1/lights": ["5"]}}]));

        assert_eq!(history.len(), 2);
        let reply = history.last_reply("/groups/1").unwrap();
        assert_eq!(reply.status, Some(200));
        assert!(history.last_reply("/groups/2").is_none());
    }

    #[test]
    fn test_capacity_keeps_counters() {
        let mut history = MessageHistory::with_capacity(2);
        for i in 0..5 {
            history.sent("GET", &format!("/lights/{i}"), &Value::Null);
        }
        history.received("GET", "/lights/4", 404, &Value::Null);

        assert_eq!(history.len(), 2);
        assert_eq!(history.entries().next().unwrap().path, "/lights/4");
        let summary = history.summary();
        assert_eq!(summary.requests, 5);
        assert_eq!(summary.failed_replies, 1);
        assert_eq!(summary.retained, 2);
    }

    #[test]
    fn test_clear() {
        let mut history = MessageHistory::new();
        history.sent("GET", "/groups", &Value::Null);
        history.record_error("Connection timeout");
        assert_eq!(history.last_error(), Some("Connection timeout"));

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.last_error(), None);
        assert_eq!(history.summary().requests, 0);
    }
}
