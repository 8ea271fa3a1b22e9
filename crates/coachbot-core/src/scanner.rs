//! Re-engagement scanner: proactively nudges sessions that have been idle
//! since a previous calendar day.
//!
//! Runs as its own batch invocation, outside inbound traffic. It bypasses
//! the gate and the per-modality normalization: every idle session gets the
//! same timestamped prompt. Sessions are processed one at a time and a
//! failure on one session never aborts the rest.
//!
//! The scan must not overlap with live dispatch on the same thread. That is
//! left to external scheduling (e.g. a daily cron entry while the relay is
//! quiet); nothing here locks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use coachbot_types::error::{ScanError, SessionError};
use coachbot_types::session::Session;
use tracing::{info, warn};

use crate::backend::AssistantBackend;
use crate::clock::{Clock, local_date};
use crate::dispatcher::RunDispatcher;
use crate::normalizer::MessageNormalizer;
use crate::session::repository::SessionRepository;
use crate::session::store::SessionStore;
use crate::transport::OutboundChannel;

/// Outcome counts of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Sessions that were idle and got a run submitted.
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Sessions already active today.
    pub skipped: usize,
}

pub struct ReengagementScanner<R, B, O>
where
    R: SessionRepository,
    B: AssistantBackend,
    O: OutboundChannel,
{
    store: Arc<SessionStore<R>>,
    dispatcher: RunDispatcher<B>,
    normalizer: MessageNormalizer,
    outbound: O,
    clock: Arc<dyn Clock>,
    prompt: String,
}

impl<R, B, O> ReengagementScanner<R, B, O>
where
    R: SessionRepository,
    B: AssistantBackend,
    O: OutboundChannel,
{
    pub fn new(
        store: Arc<SessionStore<R>>,
        dispatcher: RunDispatcher<B>,
        outbound: O,
        clock: Arc<dyn Clock>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            normalizer: MessageNormalizer::new(clock.clone()),
            outbound,
            clock,
            prompt: prompt.into(),
        }
    }

    /// Scan every session once.
    ///
    /// Only a failure to list sessions aborts the scan.
    pub async fn scan(&self) -> Result<ScanReport, SessionError> {
        let sessions = self.store.list_sessions().await?;
        let now = self.clock.now();
        let mut report = ScanReport::default();

        info!(sessions = sessions.len(), "Re-engagement scan started");

        for session in &sessions {
            if !is_idle(session.last_interaction_at, now) {
                report.skipped += 1;
                continue;
            }

            report.attempted += 1;
            match self.reengage(session).await {
                Ok(()) => report.succeeded += 1,
                Err(err) => {
                    warn!(
                        chat_id = %session.chat_id,
                        thread_id = %session.thread_id,
                        error = %err,
                        "Re-engagement failed"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "Re-engagement scan finished"
        );
        Ok(report)
    }

    async fn reengage(&self, session: &Session) -> Result<(), ScanError> {
        let envelope = self.normalizer.text(&self.prompt);
        let reply = self.dispatcher.submit(&session.thread_id, &envelope).await?;
        self.outbound.send_text(&session.chat_id, &reply).await?;
        self.store.touch(&session.chat_id).await?;

        info!(chat_id = %session.chat_id, "Session re-engaged");
        Ok(())
    }
}

/// A session is idle when its last interaction fell on an earlier local
/// calendar date than `now`. Elapsed duration is irrelevant.
pub fn is_idle(last_interaction_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    local_date(last_interaction_at) < local_date(now)
}
