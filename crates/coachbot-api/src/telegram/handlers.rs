//! Conversion of Telegram messages into relay inbound events.

use teloxide::Bot;
use teloxide::types::{MediaKind, Message, MessageKind};

use coachbot_core::normalizer::largest_variant;
use coachbot_types::error::PreprocessError;
use coachbot_types::inbound::{ImageVariant, InboundEvent, InboundPayload};
use coachbot_types::session::ChatId;

use super::{download_file, resolve_file_url};

/// File name used when a document arrives without one.
const DEFAULT_DOCUMENT_NAME: &str = "document";

/// What a message carries, before anything is downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    Text(String),
    Photo {
        variants: Vec<ImageVariant>,
        caption: Option<String>,
    },
    Voice {
        file_id: String,
    },
    Document {
        file_id: String,
        file_name: String,
        caption: Option<String>,
    },
    Unsupported(&'static str),
}

impl MediaRef {
    /// Payload kind, matching `InboundPayload::kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            MediaRef::Text(_) => "text",
            MediaRef::Photo { .. } => "image",
            MediaRef::Voice { .. } => "voice",
            MediaRef::Document { .. } => "document",
            MediaRef::Unsupported(kind) => *kind,
        }
    }
}

/// Media could not be fetched from Telegram.
#[derive(Debug)]
pub struct MediaFailure {
    pub kind: &'static str,
    pub error: PreprocessError,
}

pub fn classify(msg: &Message) -> MediaRef {
    let MessageKind::Common(common) = &msg.kind else {
        return MediaRef::Unsupported("service");
    };

    match &common.media_kind {
        MediaKind::Text(t) => MediaRef::Text(t.text.clone()),
        MediaKind::Photo(p) => MediaRef::Photo {
            variants: p
                .photo
                .iter()
                .map(|ps| ImageVariant {
                    file_id: ps.file.id.clone(),
                    file_size: ps.file.size,
                    width: ps.width,
                    height: ps.height,
                })
                .collect(),
            caption: p.caption.clone(),
        },
        MediaKind::Voice(v) => MediaRef::Voice {
            file_id: v.voice.file.id.clone(),
        },
        MediaKind::Document(d) => MediaRef::Document {
            file_id: d.document.file.id.clone(),
            file_name: d
                .document
                .file_name
                .clone()
                .unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string()),
            caption: d.caption.clone(),
        },
        MediaKind::Sticker(_) => MediaRef::Unsupported("sticker"),
        MediaKind::Video(_) => MediaRef::Unsupported("video"),
        MediaKind::Audio(_) => MediaRef::Unsupported("audio"),
        MediaKind::Location(_) => MediaRef::Unsupported("location"),
        _ => MediaRef::Unsupported("other"),
    }
}

/// Build the inbound event for a message, downloading media as needed.
pub async fn inbound_event(bot: &Bot, msg: &Message) -> Result<InboundEvent, MediaFailure> {
    let media = classify(msg);
    let kind = media.kind();
    let payload = fetch_payload(bot, media).await.map_err(|e| MediaFailure {
        kind,
        error: PreprocessError::Download(e.to_string()),
    })?;

    Ok(InboundEvent {
        chat_id: ChatId::from(msg.chat.id.0),
        sender_id: msg.from.as_ref().map(|u| u.id.0.to_string()),
        payload,
    })
}

async fn fetch_payload(bot: &Bot, media: MediaRef) -> anyhow::Result<InboundPayload> {
    let payload = match media {
        MediaRef::Text(text) => InboundPayload::from_text(&text),
        MediaRef::Photo { variants, caption } => {
            let largest = largest_variant(&variants)
                .ok_or_else(|| anyhow::anyhow!("photo message without sizes"))?;
            let url = resolve_file_url(bot, &largest.file_id).await?;
            InboundPayload::Image { url, caption }
        }
        MediaRef::Voice { file_id } => InboundPayload::Voice {
            audio: download_file(bot, &file_id).await?,
        },
        MediaRef::Document {
            file_id,
            file_name,
            caption,
        } => InboundPayload::Document {
            bytes: download_file(bot, &file_id).await?,
            file_name,
            caption,
        },
        MediaRef::Unsupported(kind) => InboundPayload::Unsupported {
            kind: kind.to_string(),
        },
    };
    Ok(payload)
}
