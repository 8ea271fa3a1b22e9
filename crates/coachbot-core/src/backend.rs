//! AssistantBackend trait definition.
//!
//! The reasoning backend keeps durable threads, accepts user messages,
//! executes runs against a fixed assistant, and stores uploaded files.
//! Run creation returns immediately; completion is observed by re-reading
//! the run (see `RunDispatcher`).

use coachbot_types::envelope::ContentEnvelope;
use coachbot_types::error::BackendError;
use coachbot_types::run::{FileHandle, Run, ThreadMessage};
use coachbot_types::session::ThreadId;

/// Trait for reasoning backends (OpenAI Assistants, test doubles).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait AssistantBackend: Send + Sync {
    /// Create a new, empty conversation thread.
    fn create_thread(
        &self,
    ) -> impl std::future::Future<Output = Result<ThreadId, BackendError>> + Send;

    /// Append the envelope to the thread as a `user` message.
    fn create_message(
        &self,
        thread_id: &ThreadId,
        envelope: &ContentEnvelope,
    ) -> impl std::future::Future<Output = Result<ThreadMessage, BackendError>> + Send;

    /// Start a run of `assistant_id` on the thread.
    fn create_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &str,
    ) -> impl std::future::Future<Output = Result<Run, BackendError>> + Send;

    /// Re-read a run's current state.
    fn retrieve_run(
        &self,
        thread_id: &ThreadId,
        run_id: &str,
    ) -> impl std::future::Future<Output = Result<Run, BackendError>> + Send;

    /// List thread messages in creation order, optionally restricted to
    /// those produced by one run.
    fn list_messages(
        &self,
        thread_id: &ThreadId,
        run_id: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Vec<ThreadMessage>, BackendError>> + Send;

    /// Upload raw bytes to the backend file store.
    fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> impl std::future::Future<Output = Result<FileHandle, BackendError>> + Send;
}
