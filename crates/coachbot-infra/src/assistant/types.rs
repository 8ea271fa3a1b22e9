//! OpenAI Assistants v2 wire types.
//!
//! These mirror the JSON shapes of the `/threads`, `/runs` and `/files`
//! endpoints. They are NOT the domain types from coachbot-types; the
//! conversions live at the bottom of this file.

use serde::{Deserialize, Serialize};

use coachbot_types::envelope::{AttachmentTool, ContentEnvelope, ContentPart};
use coachbot_types::error::BackendError;
use coachbot_types::run::{FileHandle, MessageContent, MessageRole, Run, RunStatus, ThreadMessage};
use coachbot_types::session::ThreadId;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /threads/{thread_id}/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageRequest {
    pub role: &'static str,
    pub content: Vec<RequestContentPart>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// A file attached to a message together with the tools allowed to read it.
#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    pub file_id: String,
    pub tools: Vec<AttachmentToolSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachmentToolSpec {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Body of `POST /threads/{thread_id}/runs`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRunRequest<'a> {
    pub assistant_id: &'a str,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadObject {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunObject {
    pub id: String,
    pub thread_id: String,
    pub assistant_id: String,
    pub status: String,
    #[serde(default)]
    pub last_error: Option<RunErrorObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunErrorObject {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageObject {
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub content: Vec<ResponseContentPart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseContentPart {
    Text { text: TextObject },
    ImageFile { image_file: ImageFileObject },
    ImageUrl { image_url: ImageUrl },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextObject {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageFileObject {
    pub file_id: String,
}

/// Cursor-paginated list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub last_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileObject {
    pub id: String,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl CreateMessageRequest {
    /// Text and image parts become message content; file references become
    /// attachments.
    pub fn from_envelope(envelope: &ContentEnvelope) -> Self {
        let mut content = Vec::new();
        let mut attachments = Vec::new();

        for part in envelope.parts() {
            match part {
                ContentPart::Text { text } => {
                    content.push(RequestContentPart::Text { text: text.clone() })
                }
                ContentPart::ImageReference { url } => content.push(RequestContentPart::ImageUrl {
                    image_url: ImageUrl { url: url.clone() },
                }),
                ContentPart::FileReference { file_id, tools } => attachments.push(Attachment {
                    file_id: file_id.clone(),
                    tools: tools
                        .iter()
                        .map(|t| AttachmentToolSpec {
                            kind: tool_name(*t),
                        })
                        .collect(),
                }),
            }
        }

        Self {
            role: "user",
            content,
            attachments,
        }
    }
}

fn tool_name(tool: AttachmentTool) -> &'static str {
    match tool {
        AttachmentTool::FileSearch => "file_search",
    }
}

impl RunObject {
    pub fn into_run(self) -> Result<Run, BackendError> {
        let status: RunStatus = self
            .status
            .parse()
            .map_err(|e: String| BackendError::Deserialization(e))?;

        Ok(Run {
            id: self.id,
            thread_id: ThreadId(self.thread_id),
            assistant_id: self.assistant_id,
            status,
            last_error: self
                .last_error
                .map(|e| format!("{}: {}", e.code, e.message)),
        })
    }
}

impl From<MessageObject> for ThreadMessage {
    fn from(msg: MessageObject) -> Self {
        let content = msg
            .content
            .into_iter()
            .map(|part| match part {
                ResponseContentPart::Text { text } => MessageContent::Text { value: text.value },
                ResponseContentPart::ImageFile { image_file } => MessageContent::ImageFile {
                    file_id: image_file.file_id,
                },
                ResponseContentPart::ImageUrl { image_url } => MessageContent::ImageUrl {
                    url: image_url.url,
                },
                ResponseContentPart::Other => MessageContent::Other,
            })
            .collect();

        ThreadMessage {
            id: msg.id,
            role: msg.role,
            run_id: msg.run_id,
            content,
        }
    }
}

impl From<FileObject> for FileHandle {
    fn from(file: FileObject) -> Self {
        FileHandle { id: file.id }
    }
}
