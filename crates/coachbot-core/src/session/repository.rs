//! SessionRepository trait definition.
//!
//! Durable chat -> thread mapping. Follows the RPITIT pattern used by every
//! port in this crate.

use chrono::{DateTime, Utc};
use coachbot_types::error::RepositoryError;
use coachbot_types::session::{ChatId, Session};

/// Repository trait for session persistence.
///
/// Implementations live in coachbot-infra (e.g., `SqliteSessionRepository`).
pub trait SessionRepository: Send + Sync {
    /// Get the session for a chat, if any.
    fn get_session(
        &self,
        chat_id: &ChatId,
    ) -> impl std::future::Future<Output = Result<Option<Session>, RepositoryError>> + Send;

    /// Insert a new session.
    ///
    /// Must fail with `RepositoryError::Conflict` when a session for the same
    /// chat already exists; an existing row is never overwritten.
    fn insert_session(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Raise `last_interaction_at` to `at`.
    ///
    /// Never moves the value backward. Returns `false` when no session exists
    /// for the chat.
    fn update_last_interaction(
        &self,
        chat_id: &ChatId,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// All sessions. Order is unspecified.
    fn list_sessions(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Session>, RepositoryError>> + Send;
}
