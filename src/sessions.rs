//! Per-session conversation history.
//!
//! Maps the message-history-by-session-id pattern onto an explicit mapping
//! from session identifier to an append-only message list. History lives in
//! process memory only and is lost when the run ends.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::message::Message;

/// Append-only chat histories keyed by session identifier.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Vec<Message>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the session's history, oldest first.
    ///
    /// An unknown session id yields an empty history.
    pub fn history(&self, session_id: &str) -> Vec<Message> {
        self.sessions
            .lock()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Appends one message to the session, creating it on first use.
    pub fn append(&self, session_id: &str, message: Message) {
        self.sessions
            .lock()
            .entry(session_id.to_string())
            .or_default()
            .push(message);
    }

    /// Number of messages recorded for the session.
    pub fn turn_count(&self, session_id: &str) -> usize {
        self.sessions
            .lock()
            .get(session_id)
            .map_or(0, Vec::len)
    }
}
