//! Inbound events handed to the core by the chat transport.
//!
//! The transport resolves everything platform-specific (file downloads,
//! image URLs, command syntax) before building one of these.

use serde::{Deserialize, Serialize};

use crate::session::ChatId;

/// One downloadable size of an inbound photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVariant {
    pub file_id: String,
    /// Size in bytes as reported by the platform.
    pub file_size: u32,
    pub width: u32,
    pub height: u32,
}

/// Modality-tagged inbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPayload {
    /// A slash command such as `/subscribe hunter2`.
    ///
    /// `raw` is the message exactly as sent, for commands that end up
    /// dispatched as ordinary text.
    Command {
        name: String,
        args: String,
        raw: String,
    },
    Text(String),
    /// A photo whose retrievable URL has already been resolved.
    Image { url: String, caption: Option<String> },
    /// Raw voice audio as delivered by the platform (OGG/Opus on Telegram).
    Voice { audio: Vec<u8> },
    /// An uploaded document.
    Document {
        file_name: String,
        bytes: Vec<u8>,
        caption: Option<String>,
    },
    /// Anything else (stickers, locations, ...). Never dispatched.
    Unsupported { kind: String },
}

impl InboundPayload {
    /// Classify a text message as a command or plain text.
    ///
    /// Handles the `/command@botname args` form used in group chats.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim_start();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return InboundPayload::Text(text.to_string());
        };

        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head);

        if name.is_empty() {
            return InboundPayload::Text(text.to_string());
        }

        InboundPayload::Command {
            name: name.to_lowercase(),
            args: args.to_string(),
            raw: text.to_string(),
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &str {
        match self {
            InboundPayload::Command { .. } => "command",
            InboundPayload::Text(_) => "text",
            InboundPayload::Image { .. } => "image",
            InboundPayload::Voice { .. } => "voice",
            InboundPayload::Document { .. } => "document",
            InboundPayload::Unsupported { kind } => kind,
        }
    }
}

/// An inbound event from one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat_id: ChatId,
    /// Platform user id of the sender, used to name temporary artifacts.
    pub sender_id: Option<String>,
    pub payload: InboundPayload,
}
