//! `coachbot sessions`: list subscribed chats.

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use coachbot_core::clock::Clock;
use coachbot_core::scanner::is_idle;
use coachbot_types::session::Session;

use crate::state::AppState;

/// List every session with its thread and recency.
///
/// # Examples
///
/// ```bash
/// coachbot sessions
/// coachbot sessions --json
/// ```
pub async fn list_sessions(state: &AppState, json: bool) -> Result<()> {
    let sessions = state.session_store.list_sessions().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No subscribed chats yet. Send {} to the bot to add one.",
            style("i").blue().bold(),
            style("/subscribe <code>").yellow()
        );
        println!();
        return Ok(());
    }

    let now = state.clock.now();
    println!();
    println!("{}", session_table(&sessions, now));
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

fn session_table(sessions: &[Session], now: DateTime<Utc>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Chat").fg(Color::White),
        Cell::new("Thread").fg(Color::White),
        Cell::new("Subscribed").fg(Color::White),
        Cell::new("Last interaction").fg(Color::White),
        Cell::new("Status").fg(Color::White),
    ]);

    for session in sessions {
        let status = if is_idle(session.last_interaction_at, now) {
            Cell::new("idle").fg(Color::DarkGrey)
        } else {
            Cell::new("active today").fg(Color::Green)
        };

        table.add_row(vec![
            Cell::new(session.chat_id.as_str()).fg(Color::Cyan),
            Cell::new(session.thread_id.as_str()).fg(Color::White),
            Cell::new(local_time(session.created_at)).fg(Color::DarkGrey),
            Cell::new(local_time(session.last_interaction_at)).fg(Color::White),
            status,
        ]);
    }

    table
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
