//! Telegram transport: long polling in, plain-text replies out.
//!
//! The transport only moves bytes. Every decision about an inbound message
//! is made by the relay; every proactive message comes from the scanner.

pub mod bot;
pub mod handlers;
pub mod outbound;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use teloxide::Bot;
use teloxide::prelude::*;

/// Slack added on top of the long-poll timeout for the HTTP client, so the
/// client never aborts a poll Telegram is still holding open.
const CLIENT_TIMEOUT_SLACK: Duration = Duration::from_secs(15);

/// Build a bot whose HTTP client outlives `poll_timeout_secs`.
pub fn build_bot(token: &SecretString, poll_timeout_secs: u32) -> anyhow::Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(u64::from(poll_timeout_secs)) + CLIENT_TIMEOUT_SLACK)
        .build()?;
    Ok(Bot::with_client(token.expose_secret(), client))
}

/// Download URL of a file previously resolved with `getFile`.
pub fn file_url(token: &str, file_path: &str) -> String {
    format!("https://api.telegram.org/file/bot{token}/{file_path}")
}

/// Resolve a file id to its download URL.
pub async fn resolve_file_url(bot: &Bot, file_id: &str) -> anyhow::Result<String> {
    let file = bot.get_file(file_id).await?;
    Ok(file_url(bot.token(), &file.path))
}

/// Fetch the bytes of a Telegram file.
pub async fn download_file(bot: &Bot, file_id: &str) -> anyhow::Result<Vec<u8>> {
    let url = resolve_file_url(bot, file_id).await?;

    let response = reqwest::get(&url).await?;
    if !response.status().is_success() {
        return Err(anyhow::anyhow!(
            "failed to download file: HTTP {}",
            response.status()
        ));
    }

    Ok(response.bytes().await?.to_vec())
}
