//! OpenAiAssistantsBackend -- concrete [`AssistantBackend`] for the OpenAI
//! Assistants v2 API.
//!
//! Every request carries the `OpenAI-Beta: assistants=v2` header. The API
//! key is wrapped in [`SecretString`] and only exposed when building the
//! `Authorization` header.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;

use coachbot_core::backend::AssistantBackend;
use coachbot_types::envelope::ContentEnvelope;
use coachbot_types::error::BackendError;
use coachbot_types::run::{FileHandle, Run, ThreadMessage};
use coachbot_types::session::ThreadId;

use super::types::{
    CreateMessageRequest, CreateRunRequest, ErrorResponse, FileObject, ListResponse, MessageObject,
    RunObject, ThreadObject,
};

/// Page size for message listing (API maximum).
const LIST_PAGE_LIMIT: &str = "100";

pub struct OpenAiAssistantsBackend {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiAssistantsBackend {
    const BETA_HEADER: &'static str = "assistants=v2";

    pub fn new(api_key: SecretString, base_url: impl Into<String>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| BackendError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(self.api_key.expose_secret())
            .header("OpenAI-Beta", Self::BETA_HEADER)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_error_status(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Deserialization(format!("failed to parse response: {e}")))
    }
}

/// Map a non-2xx response to a `BackendError`.
fn map_error_status(status: u16, body: &str) -> BackendError {
    match status {
        401 => BackendError::AuthenticationFailed,
        429 => BackendError::RateLimited,
        _ => {
            let message = serde_json::from_str::<ErrorResponse>(body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.to_string());
            BackendError::Api { status, message }
        }
    }
}

// Not Debug: keeps the client and key out of log output entirely.

impl AssistantBackend for OpenAiAssistantsBackend {
    async fn create_thread(&self) -> Result<ThreadId, BackendError> {
        let thread: ThreadObject = self
            .send(
                self.request(reqwest::Method::POST, "/threads")
                    .json(&serde_json::json!({})),
            )
            .await?;
        debug!(thread_id = %thread.id, "Thread created");
        Ok(ThreadId(thread.id))
    }

    async fn create_message(
        &self,
        thread_id: &ThreadId,
        envelope: &ContentEnvelope,
    ) -> Result<ThreadMessage, BackendError> {
        let body = CreateMessageRequest::from_envelope(envelope);
        let message: MessageObject = self
            .send(
                self.request(
                    reqwest::Method::POST,
                    &format!("/threads/{thread_id}/messages"),
                )
                .json(&body),
            )
            .await?;
        Ok(message.into())
    }

    async fn create_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &str,
    ) -> Result<Run, BackendError> {
        let run: RunObject = self
            .send(
                self.request(reqwest::Method::POST, &format!("/threads/{thread_id}/runs"))
                    .json(&CreateRunRequest { assistant_id }),
            )
            .await?;
        run.into_run()
    }

    async fn retrieve_run(
        &self,
        thread_id: &ThreadId,
        run_id: &str,
    ) -> Result<Run, BackendError> {
        let run: RunObject = self
            .send(self.request(
                reqwest::Method::GET,
                &format!("/threads/{thread_id}/runs/{run_id}"),
            ))
            .await?;
        run.into_run()
    }

    async fn list_messages(
        &self,
        thread_id: &ThreadId,
        run_id: Option<&str>,
    ) -> Result<Vec<ThreadMessage>, BackendError> {
        let path = format!("/threads/{thread_id}/messages");
        let mut messages = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query: Vec<(&str, &str)> = vec![("order", "asc"), ("limit", LIST_PAGE_LIMIT)];
            if let Some(run_id) = run_id {
                query.push(("run_id", run_id));
            }
            if let Some(cursor) = after.as_deref() {
                query.push(("after", cursor));
            }

            let page: ListResponse<MessageObject> = self
                .send(self.request(reqwest::Method::GET, &path).query(&query))
                .await?;

            messages.extend(page.data.into_iter().map(ThreadMessage::from));
            match (page.has_more, page.last_id) {
                (true, Some(last_id)) => after = Some(last_id),
                _ => break,
            }
        }

        Ok(messages)
    }

    async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<FileHandle, BackendError> {
        let size = bytes.len();
        let form = Form::new()
            .text("purpose", "assistants")
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()));

        let file: FileObject = self
            .send(self.request(reqwest::Method::POST, "/files").multipart(form))
            .await?;
        debug!(file_id = %file.id, size, "File uploaded");
        Ok(file.into())
    }
}
