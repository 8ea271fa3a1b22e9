//! Access gate: subscription check in front of every conversation operation.
//!
//! The shared secret is only consulted when subscribing. After that a chat
//! is authorized purely by having a session in the store.

use std::sync::Arc;

use coachbot_types::error::GateError;
use coachbot_types::session::{ChatId, Session, ThreadId};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::backend::AssistantBackend;
use crate::session::repository::SessionRepository;
use crate::session::store::SessionStore;

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Authorized(ThreadId),
    Rejected,
}

pub struct AccessGate<R: SessionRepository> {
    store: Arc<SessionStore<R>>,
    secret: SecretString,
}

impl<R: SessionRepository> AccessGate<R> {
    pub fn new(store: Arc<SessionStore<R>>, secret: SecretString) -> Self {
        Self { store, secret }
    }

    /// Resolve the chat's thread, or reject an unsubscribed chat.
    pub async fn authorize(&self, chat_id: &ChatId) -> Result<Authorization, GateError> {
        match self.store.get_session(chat_id).await? {
            Some(session) => Ok(Authorization::Authorized(session.thread_id)),
            None => {
                debug!(chat_id = %chat_id, "Rejected unsubscribed chat");
                Ok(Authorization::Rejected)
            }
        }
    }

    /// Like [`authorize`](Self::authorize) but maps rejection to
    /// `GateError::Unauthorized`.
    pub async fn require(&self, chat_id: &ChatId) -> Result<ThreadId, GateError> {
        match self.authorize(chat_id).await? {
            Authorization::Authorized(thread_id) => Ok(thread_id),
            Authorization::Rejected => Err(GateError::Unauthorized),
        }
    }

    /// Subscribe a chat: verify the secret, create a backend thread, persist
    /// the binding.
    ///
    /// An already-subscribed chat is refused before the secret is checked
    /// and before any thread is created.
    pub async fn subscribe<B: AssistantBackend>(
        &self,
        chat_id: &ChatId,
        presented_secret: &str,
        backend: &B,
    ) -> Result<Session, GateError> {
        if self.store.is_subscribed(chat_id).await? {
            info!(chat_id = %chat_id, "Duplicate subscription attempt");
            return Err(GateError::AlreadySubscribed);
        }

        if presented_secret != self.secret.expose_secret() {
            info!(chat_id = %chat_id, "Subscription refused: wrong secret");
            return Err(GateError::InvalidCredential);
        }

        let thread_id = backend.create_thread().await.map_err(GateError::Backend)?;
        let session = self.store.create_session(chat_id, thread_id).await?;
        info!(chat_id = %chat_id, thread_id = %session.thread_id, "Chat subscribed");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BackendCall, ManualClock, MemorySessionRepository, MockBackend};

    fn gate() -> AccessGate<MemorySessionRepository> {
        let store = Arc::new(SessionStore::new(
            MemorySessionRepository::default(),
            Arc::new(ManualClock::fixed()),
        ));
        AccessGate::new(store, SecretString::from("open sesame".to_string()))
    }

    #[tokio::test]
    async fn test_unknown_chat_is_rejected_without_mutation() {
        let gate = gate();
        let chat = ChatId::new("stranger");

        assert_eq!(gate.authorize(&chat).await.unwrap(), Authorization::Rejected);
        assert!(matches!(
            gate.require(&chat).await,
            Err(GateError::Unauthorized)
        ));
        assert!(gate.store.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_with_correct_secret() {
        let gate = gate();
        let backend = MockBackend::echo();
        let chat = ChatId::new("42");

        let session = gate.subscribe(&chat, "open sesame", &backend).await.unwrap();

        assert_eq!(
            gate.authorize(&chat).await.unwrap(),
            Authorization::Authorized(session.thread_id)
        );
    }

    #[tokio::test]
    async fn test_secret_is_exact_match() {
        let gate = gate();
        let backend = MockBackend::echo();

        for wrong in ["open sesame ", "Open sesame", "", "open"] {
            let err = gate
                .subscribe(&ChatId::new("42"), wrong, &backend)
                .await
                .unwrap_err();
            assert!(matches!(err, GateError::InvalidCredential), "{wrong:?}");
        }
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_second_subscription_creates_no_thread() {
        let gate = gate();
        let backend = MockBackend::echo();
        let chat = ChatId::new("42");

        let first = gate.subscribe(&chat, "open sesame", &backend).await.unwrap();
        let err = gate
            .subscribe(&chat, "open sesame", &backend)
            .await
            .unwrap_err();

        assert!(matches!(err, GateError::AlreadySubscribed));
        let threads_created = backend
            .calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::CreateThread))
            .count();
        assert_eq!(threads_created, 1);
        assert_eq!(gate.require(&chat).await.unwrap(), first.thread_id);
    }
}
