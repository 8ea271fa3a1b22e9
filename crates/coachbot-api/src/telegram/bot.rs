//! Long-polling loop feeding the relay.
//!
//! Updates are handled strictly one at a time: the next `getUpdates` is only
//! issued after the previous batch has been fully relayed and answered.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, BotCommand, UpdateKind};
use teloxide::{ApiError, RequestError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use coachbot_core::relay::apology_for;

use super::handlers;
use super::outbound::deliver;
use crate::state::ConcreteRelay;

/// Pause after a failed `getUpdates` before polling again.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Clear any webhook and register the slash commands.
pub async fn connect(bot: &Bot) -> anyhow::Result<()> {
    let me = bot.get_me().await?;
    bot.delete_webhook().send().await?;

    let commands = vec![
        BotCommand::new("start", "Start the bot"),
        BotCommand::new("help", "Show available commands"),
        BotCommand::new("subscribe", "Subscribe this chat with a code"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("Failed to register bot commands: {e}");
    }

    info!(username = ?me.username, "Telegram bot connected (webhook cleared)");
    Ok(())
}

/// Poll Telegram until `cancel` fires.
///
/// Returns an error only when polling cannot continue, i.e. another
/// instance is already polling with the same token.
pub async fn run_polling(
    bot: Bot,
    relay: ConcreteRelay,
    poll_timeout_secs: u32,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    info!("Starting Telegram polling loop");
    let mut offset: i32 = 0;

    loop {
        let request = bot
            .get_updates()
            .offset(offset)
            .timeout(poll_timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message])
            .send();

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = request => result,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "Got Telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    match update.kind {
                        UpdateKind::Message(msg) => handle_message(&bot, &relay, msg).await,
                        other => debug!("Ignoring non-message update: {other:?}"),
                    }
                }
            }
            Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                return Err(anyhow::anyhow!(
                    "another instance is already polling with this bot token"
                ));
            }
            Err(e) => {
                warn!(error = %e, "Telegram getUpdates failed");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(RETRY_DELAY) => {}
                }
            }
        }
    }

    info!("Telegram polling stopped");
    Ok(())
}

async fn handle_message(bot: &Bot, relay: &ConcreteRelay, msg: Message) {
    let chat_id = msg.chat.id;
    debug!(chat_id = chat_id.0, "Received Telegram message");

    let reply = match handlers::inbound_event(bot, &msg).await {
        Ok(event) => relay.handle(event).await,
        Err(failure) => {
            error!(
                chat_id = chat_id.0,
                kind = failure.kind,
                error = %failure.error,
                "Failed to fetch message media"
            );
            Some(apology_for(failure.kind).to_string())
        }
    };

    if let Some(reply) = reply {
        // Already logged by `deliver`; the exchange itself is complete.
        let _ = deliver(bot, chat_id, &reply).await;
    }
}
