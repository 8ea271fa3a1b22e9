//! `coachbot serve`: run the Telegram relay in the foreground.

use console::style;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;
use crate::telegram::{self, bot};

pub async fn serve(
    state: &AppState,
    shutdown: CancellationToken,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = &state.config;
    let tg = telegram::build_bot(&config.telegram_token, config.telegram_poll_timeout_secs)?;
    bot::connect(&tg).await?;

    let relay = state.relay()?;
    tracing::info!(
        assistant_id = %config.assistant_id,
        data_dir = %state.data_dir.display(),
        voices_dir = %config.voices_dir.display(),
        "Relay ready"
    );

    if !quiet {
        println!();
        println!(
            "  {} Relaying Telegram to assistant {}",
            style("⚡").bold(),
            style(&config.assistant_id).cyan()
        );
        println!("  {}", style("Press Ctrl+C to stop").dim());
    }

    bot::run_polling(tg, relay, config.telegram_poll_timeout_secs, shutdown).await?;

    if !quiet {
        println!("\n  Relay stopped.");
    }
    Ok(())
}
