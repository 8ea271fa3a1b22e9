//! Message normalizer: turns each inbound modality into a `ContentEnvelope`.
//!
//! All textual content is prefixed with the rendered wall-clock time,
//! `"{timestamp} - {text}"`, so the assistant sees when each message was sent.

use std::sync::Arc;

use coachbot_types::envelope::{ContentEnvelope, ContentPart};
use coachbot_types::inbound::ImageVariant;
use coachbot_types::run::FileHandle;

use crate::clock::{Clock, render_timestamp};

/// Caption used when an image arrives without one.
pub const IMAGE_PLACEHOLDER: &str = "Image received";

/// Caption used when a document arrives without one.
pub const FILE_PLACEHOLDER: &str = "File uploaded";

/// Preprocessed input ready for normalization.
#[derive(Debug, Clone, Copy)]
pub enum NormalizedInput<'a> {
    Text(&'a str),
    Image {
        url: &'a str,
        caption: Option<&'a str>,
    },
    Voice {
        transcript: &'a str,
    },
    Document {
        file: &'a FileHandle,
        caption: Option<&'a str>,
    },
    Unsupported,
}

pub struct MessageNormalizer {
    clock: Arc<dyn Clock>,
}

impl MessageNormalizer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Build the envelope for an input. `Unsupported` yields `None` and the
    /// caller must not dispatch.
    pub fn normalize(&self, input: NormalizedInput<'_>) -> Option<ContentEnvelope> {
        match input {
            NormalizedInput::Text(text) => Some(self.text(text)),
            NormalizedInput::Image { url, caption } => Some(self.image(url, caption)),
            NormalizedInput::Voice { transcript } => Some(self.voice(transcript)),
            NormalizedInput::Document { file, caption } => Some(self.document(file, caption)),
            NormalizedInput::Unsupported => None,
        }
    }

    pub fn text(&self, text: &str) -> ContentEnvelope {
        let prefix = render_timestamp(self.clock.now());
        let part = ContentPart::text(stamp(&prefix, text));
        ContentEnvelope::new(prefix, part)
    }

    /// Caption text followed by the image reference.
    pub fn image(&self, url: &str, caption: Option<&str>) -> ContentEnvelope {
        let prefix = render_timestamp(self.clock.now());
        let caption = non_empty(caption).unwrap_or(IMAGE_PLACEHOLDER);
        let part = ContentPart::text(stamp(&prefix, caption));
        ContentEnvelope::new(prefix, part).with_part(ContentPart::image(url))
    }

    pub fn voice(&self, transcript: &str) -> ContentEnvelope {
        self.text(transcript)
    }

    /// Caption text plus a file reference tagged for file search.
    pub fn document(&self, file: &FileHandle, caption: Option<&str>) -> ContentEnvelope {
        let prefix = render_timestamp(self.clock.now());
        let caption = non_empty(caption).unwrap_or(FILE_PLACEHOLDER);
        let part = ContentPart::text(stamp(&prefix, caption));
        ContentEnvelope::new(prefix, part).with_part(ContentPart::file_for_search(&file.id))
    }
}

/// Pick the photo variant with the largest byte size.
pub fn largest_variant(variants: &[ImageVariant]) -> Option<&ImageVariant> {
    variants.iter().max_by_key(|v| v.file_size)
}

fn stamp(prefix: &str, text: &str) -> String {
    format!("{prefix} - {text}")
}

fn non_empty(caption: Option<&str>) -> Option<&str> {
    caption.filter(|c| !c.is_empty())
}
