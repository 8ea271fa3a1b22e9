//! Outbound delivery of plain-text replies.

use teloxide::Bot;
use teloxide::prelude::*;
use tracing::{debug, warn};

use coachbot_core::transport::OutboundChannel;
use coachbot_types::error::DeliveryError;
use coachbot_types::session::ChatId;

/// Telegram's maximum message length, in characters.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Empty text yields a single empty chunk: an empty reply is still sent.
pub fn split_message(text: &str, max_chars: usize) -> Vec<&str> {
    if text.is_empty() || max_chars == 0 {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let end = rest
            .char_indices()
            .nth(max_chars)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// Send `text` to a chat, chunked to Telegram's limit.
pub async fn deliver(
    bot: &Bot,
    chat_id: teloxide::types::ChatId,
    text: &str,
) -> Result<(), DeliveryError> {
    let chunks = split_message(text, TELEGRAM_MAX_MESSAGE_LEN);
    debug!(chat_id = chat_id.0, chunk_count = chunks.len(), "Sending reply");

    for chunk in chunks {
        if let Err(e) = bot.send_message(chat_id, chunk).await {
            warn!(
                chat_id = chat_id.0,
                error = %e,
                chars = chunk.chars().count(),
                "Telegram rejected message"
            );
            return Err(DeliveryError(e.to_string()));
        }
    }
    Ok(())
}

/// [`OutboundChannel`] over the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn telegram_chat_id(chat_id: &ChatId) -> Result<teloxide::types::ChatId, DeliveryError> {
    chat_id
        .as_str()
        .parse::<i64>()
        .map(teloxide::types::ChatId)
        .map_err(|e| DeliveryError(format!("invalid Telegram chat id '{chat_id}': {e}")))
}

impl OutboundChannel for TelegramOutbound {
    async fn send_text(&self, chat_id: &ChatId, text: &str) -> Result<(), DeliveryError> {
        let chat_id = telegram_chat_id(chat_id)?;
        deliver(&self.bot, chat_id, text).await
    }
}
