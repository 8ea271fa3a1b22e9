//! Session store: the sole source of truth for chat -> thread resolution.
//!
//! Wraps a `SessionRepository` with the subscription contract: one session
//! per chat, thread ids never reassigned, recency only moves forward.
//! There is no in-memory cache; every call goes to the repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use coachbot_types::error::{RepositoryError, SessionError};
use coachbot_types::session::{ChatId, Session, ThreadId};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::session::repository::SessionRepository;

/// Subscription-aware facade over a `SessionRepository`.
pub struct SessionStore<R: SessionRepository> {
    repo: R,
    clock: Arc<dyn Clock>,
}

impl<R: SessionRepository> SessionStore<R> {
    pub fn new(repo: R, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Access the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Existence check. No side effects.
    pub async fn is_subscribed(&self, chat_id: &ChatId) -> Result<bool, SessionError> {
        Ok(self.repo.get_session(chat_id).await?.is_some())
    }

    /// Resolve the thread bound to a chat.
    pub async fn resolve_thread(&self, chat_id: &ChatId) -> Result<ThreadId, SessionError> {
        self.repo
            .get_session(chat_id)
            .await?
            .map(|s| s.thread_id)
            .ok_or(SessionError::NotFound)
    }

    pub async fn get_session(&self, chat_id: &ChatId) -> Result<Option<Session>, SessionError> {
        Ok(self.repo.get_session(chat_id).await?)
    }

    /// Bind a chat to a freshly created thread.
    ///
    /// Fails with `AlreadySubscribed` if the chat already has a session;
    /// the existing binding is left untouched.
    pub async fn create_session(
        &self,
        chat_id: &ChatId,
        thread_id: ThreadId,
    ) -> Result<Session, SessionError> {
        if self.repo.get_session(chat_id).await?.is_some() {
            return Err(SessionError::AlreadySubscribed);
        }

        let session = Session::new(chat_id.clone(), thread_id, self.clock.now());
        match self.repo.insert_session(&session).await {
            Ok(()) => {
                info!(chat_id = %chat_id, thread_id = %session.thread_id, "Session created");
                Ok(session)
            }
            // Lost a race with another insert for the same chat.
            Err(RepositoryError::Conflict(_)) => Err(SessionError::AlreadySubscribed),
            Err(e) => Err(e.into()),
        }
    }

    /// Record an interaction now. Callers must check subscription first.
    pub async fn touch(&self, chat_id: &ChatId) -> Result<DateTime<Utc>, SessionError> {
        let now = self.clock.now();
        if self.repo.update_last_interaction(chat_id, now).await? {
            debug!(chat_id = %chat_id, at = %now, "Session touched");
            Ok(now)
        } else {
            Err(SessionError::UnknownSession)
        }
    }

    /// All sessions, in repository order.
    pub async fn list_sessions(&self) -> Result<Vec<Session>, SessionError> {
        Ok(self.repo.list_sessions().await?)
    }
}
