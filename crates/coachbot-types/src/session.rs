//! Session types: the persisted binding between an external chat identity
//! and a reasoning-backend thread.
//!
//! A chat identity has at most one session. The thread handle is assigned
//! once at subscription time and never reassigned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;

/// Opaque external chat identity (e.g. a Telegram chat id rendered as text).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl ChatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// Opaque handle into the reasoning backend's conversation state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One subscribed chat.
///
/// `last_interaction_at` is refreshed after every successful exchange and
/// drives the re-engagement scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub chat_id: ChatId,
    pub thread_id: ThreadId,
    pub created_at: DateTime<Utc>,
    pub last_interaction_at: DateTime<Utc>,
}

impl Session {
    /// A fresh session whose recency equals its creation time.
    pub fn new(chat_id: ChatId, thread_id: ThreadId, now: DateTime<Utc>) -> Self {
        Self {
            chat_id,
            thread_id,
            created_at: now,
            last_interaction_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_id_from_i64() {
        let id = ChatId::from(-100_123_i64);
        assert_eq!(id.as_str(), "-100123");
    }

    #[test]
    fn test_new_session_recency_matches_creation() {
        let now = Utc::now();
        let session = Session::new(ChatId::new("42"), ThreadId::new("thread_abc"), now);
        assert_eq!(session.created_at, session.last_interaction_at);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let session = Session::new(ChatId::new("42"), ThreadId::new("thread_abc"), Utc::now());
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"chat_id\":\"42\""));
        assert!(json.contains("\"thread_id\":\"thread_abc\""));
    }
}
