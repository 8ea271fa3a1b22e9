//! Run dispatcher: drives one envelope through the backend and extracts
//! the reply.
//!
//! The sequence is strictly ordered: append message, then create the run,
//! then poll until terminal, then list the run's messages. Polling has no
//! deadline of its own and cannot be cancelled; callers needing a hard
//! timeout wrap `submit` externally.
//!
//! Two calls to `submit` must not overlap on the same thread. The relay
//! processes one event at a time and the re-engagement scan runs as a
//! separate, temporally disjoint invocation, so no lock is taken here.

use std::sync::Arc;
use std::time::Duration;

use coachbot_types::envelope::ContentEnvelope;
use coachbot_types::error::DispatchError;
use coachbot_types::run::RunStatus;
use coachbot_types::session::ThreadId;
use tracing::{Instrument, debug, error, info_span};

use crate::backend::AssistantBackend;

/// Submits envelopes against a fixed, process-wide assistant.
pub struct RunDispatcher<B: AssistantBackend> {
    backend: Arc<B>,
    assistant_id: String,
    poll_interval: Duration,
}

impl<B: AssistantBackend> RunDispatcher<B> {
    pub fn new(backend: Arc<B>, assistant_id: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            backend,
            assistant_id: assistant_id.into(),
            poll_interval,
        }
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Execute one exchange and return the reply text.
    ///
    /// If the completed run produced no message carrying its id, the reply
    /// is an empty string rather than an error. That degenerate case is
    /// passed through to the user unchanged.
    pub async fn submit(
        &self,
        thread_id: &ThreadId,
        envelope: &ContentEnvelope,
    ) -> Result<String, DispatchError> {
        let span = info_span!(
            "gen_ai.invoke_agent",
            gen_ai.operation.name = "invoke_agent",
            gen_ai.agent.id = %self.assistant_id,
            thread_id = %thread_id,
            parts = envelope.parts().len(),
        );

        self.run_exchange(thread_id, envelope).instrument(span).await
    }

    async fn run_exchange(
        &self,
        thread_id: &ThreadId,
        envelope: &ContentEnvelope,
    ) -> Result<String, DispatchError> {
        let message = self.backend.create_message(thread_id, envelope).await?;
        debug!(message_id = %message.id, "User message appended");

        let mut run = self
            .backend
            .create_run(thread_id, &self.assistant_id)
            .await?;
        debug!(run_id = %run.id, status = %run.status, "Run created");

        while !run.status.is_terminal() {
            tokio::time::sleep(self.poll_interval).await;
            run = self.backend.retrieve_run(thread_id, &run.id).await?;
        }

        if run.status != RunStatus::Completed {
            error!(
                run_id = %run.id,
                status = %run.status,
                reason = ?run.last_error,
                "Run did not complete"
            );
            return Err(DispatchError::RunFailed {
                run_id: run.id,
                status: run.status.to_string(),
                reason: run.last_error,
            });
        }

        let messages = self.backend.list_messages(thread_id, Some(&run.id)).await?;
        let reply = messages
            .iter()
            .find(|m| m.run_id.as_deref() == Some(run.id.as_str()))
            .and_then(|m| m.first_text())
            .unwrap_or_default()
            .to_string();

        if reply.is_empty() {
            debug!(run_id = %run.id, "Run produced no reply text");
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, render_timestamp};
    use crate::normalizer::MessageNormalizer;
    use crate::test_support::{BackendCall, ManualClock, MockBackend, ReplyMode};
    use coachbot_types::envelope::ContentPart;

    fn dispatcher(backend: Arc<MockBackend>) -> RunDispatcher<MockBackend> {
        RunDispatcher::new(backend, "asst_test", Duration::from_millis(1))
    }

    fn envelope(text: &str) -> ContentEnvelope {
        ContentEnvelope::new("T", ContentPart::text(text))
    }

    #[tokio::test]
    async fn test_echo_round_trip() {
        let clock = Arc::new(ManualClock::fixed());
        let t = render_timestamp(clock.now());
        let normalizer = MessageNormalizer::new(clock);
        let backend = Arc::new(MockBackend::echo());

        let envelope = normalizer.text("hello");
        let reply = dispatcher(backend)
            .submit(&ThreadId::new("thread_1"), &envelope)
            .await
            .unwrap();

        assert_eq!(reply, format!("{t} - hello"));
    }

    #[tokio::test]
    async fn test_calls_are_strictly_ordered() {
        let backend = Arc::new(MockBackend::echo().with_polls_before_terminal(2));
        dispatcher(backend.clone())
            .submit(&ThreadId::new("thread_1"), &envelope("x"))
            .await
            .unwrap();

        let calls = backend.calls();
        assert!(matches!(calls[0], BackendCall::CreateMessage { .. }));
        assert!(matches!(
            &calls[1],
            BackendCall::CreateRun { assistant_id, .. } if assistant_id == "asst_test"
        ));
        assert!(matches!(calls[2], BackendCall::RetrieveRun { .. }));
        assert!(matches!(calls[3], BackendCall::RetrieveRun { .. }));
        assert!(matches!(
            &calls[4],
            BackendCall::ListMessages { run_id: Some(_), .. }
        ));
        assert_eq!(calls.len(), 5);
    }

    #[tokio::test]
    async fn test_no_message_for_run_yields_empty_reply() {
        let backend = Arc::new(MockBackend::with_reply(ReplyMode::ForeignRunOnly));
        let reply = dispatcher(backend)
            .submit(&ThreadId::new("thread_1"), &envelope("hello"))
            .await
            .unwrap();

        assert_eq!(reply, "");
    }

    #[tokio::test]
    async fn test_first_matching_message_wins() {
        let backend = Arc::new(MockBackend::with_reply(ReplyMode::Several(vec![
            "first".into(),
            "second".into(),
        ])));
        let reply = dispatcher(backend)
            .submit(&ThreadId::new("thread_1"), &envelope("hello"))
            .await
            .unwrap();

        assert_eq!(reply, "first");
    }

    #[tokio::test]
    async fn test_failed_run_is_run_failed() {
        let backend = Arc::new(MockBackend::echo().with_terminal_status(RunStatus::Failed));
        let err = dispatcher(backend.clone())
            .submit(&ThreadId::new("thread_1"), &envelope("hello"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::RunFailed { ref status, .. } if status == "failed"
        ));
        // No listing after a failed run.
        assert!(
            !backend
                .calls()
                .iter()
                .any(|c| matches!(c, BackendCall::ListMessages { .. }))
        );
    }

    #[tokio::test]
    async fn test_backend_error_before_run_creation() {
        let backend = Arc::new(MockBackend::echo());
        backend.fail_thread("thread_bad");

        let err = dispatcher(backend.clone())
            .submit(&ThreadId::new("thread_bad"), &envelope("hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Backend(_)));
        assert!(
            !backend
                .calls()
                .iter()
                .any(|c| matches!(c, BackendCall::CreateRun { .. }))
        );
    }
}
