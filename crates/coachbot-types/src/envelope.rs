//! Content envelope: the normalized, ordered set of content parts submitted
//! to the reasoning backend in one run.
//!
//! Envelopes are ephemeral. Every modality (text, image, voice, document)
//! collapses into the same shape; only the part variants differ.

use serde::{Deserialize, Serialize};

/// Tool a file attachment is made available to on the backend side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentTool {
    /// Retrieval-augmented search over the uploaded file.
    FileSearch,
}

/// A single typed content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageReference { url: String },
    FileReference {
        file_id: String,
        tools: Vec<AttachmentTool>,
    },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        ContentPart::ImageReference { url: url.into() }
    }

    /// A file reference tagged for retrieval-augmented search.
    pub fn file_for_search(file_id: impl Into<String>) -> Self {
        ContentPart::FileReference {
            file_id: file_id.into(),
            tools: vec![AttachmentTool::FileSearch],
        }
    }

    /// The text of a `Text` part, `None` otherwise.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Ordered, non-empty sequence of content parts plus the rendered timestamp
/// that was prepended to its textual content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEnvelope {
    timestamp_prefix: String,
    parts: Vec<ContentPart>,
}

impl ContentEnvelope {
    /// Start an envelope with its first part. An envelope can never be empty.
    pub fn new(timestamp_prefix: impl Into<String>, first: ContentPart) -> Self {
        Self {
            timestamp_prefix: timestamp_prefix.into(),
            parts: vec![first],
        }
    }

    /// Append a part, preserving order.
    pub fn with_part(mut self, part: ContentPart) -> Self {
        self.parts.push(part);
        self
    }

    pub fn timestamp_prefix(&self) -> &str {
        &self.timestamp_prefix
    }

    pub fn parts(&self) -> &[ContentPart] {
        &self.parts
    }

    /// All `Text` parts in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(ContentPart::as_text)
    }

    /// The first `Text` part, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.texts().next()
    }
}
