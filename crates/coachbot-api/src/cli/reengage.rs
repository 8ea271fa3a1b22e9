//! `coachbot reengage`: one re-engagement scan over every session.
//!
//! Meant to be scheduled externally (e.g. a daily cron entry).

use console::style;
use serde::Serialize;

use coachbot_core::scanner::ScanReport;

use crate::state::AppState;
use crate::telegram::{self, outbound::TelegramOutbound};

#[derive(Serialize)]
struct ReportJson {
    attempted: usize,
    succeeded: usize,
    failed: usize,
    skipped: usize,
}

impl From<&ScanReport> for ReportJson {
    fn from(r: &ScanReport) -> Self {
        Self {
            attempted: r.attempted,
            succeeded: r.succeeded,
            failed: r.failed,
            skipped: r.skipped,
        }
    }
}

pub async fn reengage(state: &AppState, json: bool) -> anyhow::Result<()> {
    let config = &state.config;
    let tg = telegram::build_bot(&config.telegram_token, config.telegram_poll_timeout_secs)?;
    let scanner = state.scanner(TelegramOutbound::new(tg));

    let report = scanner.scan().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ReportJson::from(&report))?);
        return Ok(());
    }

    println!();
    println!("  {} Re-engagement scan complete", style("✓").green().bold());
    println!();
    println!("  Attempted: {}", style(report.attempted).bold());
    println!("  Succeeded: {}", style(report.succeeded).green());
    if report.failed > 0 {
        println!("  Failed:    {}", style(report.failed).red());
    } else {
        println!("  Failed:    {}", report.failed);
    }
    println!("  Skipped:   {}", style(report.skipped).dim());
    println!();

    Ok(())
}
