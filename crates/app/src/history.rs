//! Conversation-history bookkeeping.
//!
//! The listen loop never stores conversational content; callers who want
//! history own it here, outside the loop, by wrapping their handler in
//! [`RecordingHandler`].

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::handler::Handler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Bounded record of conversation turns, trimmed oldest-first.
#[derive(Debug)]
pub struct ConversationHistory {
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
}

impl ConversationHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
        }
    }

    pub fn record(&mut self, role: Role, text: &str) {
        self.entries.push_back(HistoryEntry {
            role,
            text: text.to_string(),
            timestamp: Utc::now(),
        });
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
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

    /// Load history from a JSON file; a missing file is an empty history.
    pub fn load(path: &Path, max_entries: usize) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new(max_entries));
        }
        let raw = fs::read_to_string(path)?;
        let mut entries: VecDeque<HistoryEntry> = serde_json::from_str(&raw)?;
        while entries.len() > max_entries {
            entries.pop_front();
        }
        Ok(Self {
            entries,
            max_entries,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut body = serde_json::to_string_pretty(&self.entries)?;
        body.push('\n');
        fs::write(path, body)?;
        Ok(())
    }
}

/// Handler decorator that records both sides of each exchange.
pub struct RecordingHandler<H> {
    inner: H,
    history: Arc<Mutex<ConversationHistory>>,
}

impl<H> RecordingHandler<H> {
    pub fn new(inner: H, history: Arc<Mutex<ConversationHistory>>) -> Self {
        Self { inner, history }
    }
}

impl<H: Handler> Handler for RecordingHandler<H> {
    fn process(&self, text: &str) -> String {
        let response = self.inner.process(text);
        let mut history = self.history.lock();
        history.record(Role::User, text);
        history.record(Role::Assistant, &response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_to_max_entries() {
        let mut history = ConversationHistory::new(3);
        for i in 0..5 {
            history.record(Role::User, &format!("turn {}", i));
        }
        assert_eq!(history.len(), 3);
        let texts: Vec<_> = history.entries().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["turn 2", "turn 3", "turn 4"]);
    }

    #[test]
    fn round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut history = ConversationHistory::new(10);
        history.record(Role::User, "hello");
        history.record(Role::Assistant, "hi there");
        history.save(&path).unwrap();

        let reloaded = ConversationHistory::load(&path, 10).unwrap();
        assert_eq!(reloaded.len(), 2);
        let entry = reloaded.entries().next().unwrap();
        assert_eq!(entry.role, Role::User);
        assert_eq!(entry.text, "hello");
    }

    #[test]
    fn missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let history =
            ConversationHistory::load(&dir.path().join("absent.json"), 5).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn recording_handler_captures_both_sides() {
        let history = Arc::new(Mutex::new(ConversationHistory::new(10)));
        let handler = RecordingHandler::new(|text: &str| format!("re: {}", text), history.clone());

        assert_eq!(handler.process("ping"), "re: ping");

        let history = history.lock();
        let entries: Vec<_> = history.entries().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, Role::User);
        assert_eq!(entries[0].text, "ping");
        assert_eq!(entries[1].role, Role::Assistant);
        assert_eq!(entries[1].text, "re: ping");
    }
}
