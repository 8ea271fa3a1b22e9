//! Application state wiring all components together.
//!
//! Core components are generic over their ports; AppState pins them to the
//! concrete infra adapters and hands out ready-to-run relays and scanners.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use coachbot_core::clock::{Clock, SystemClock};
use coachbot_core::dispatcher::RunDispatcher;
use coachbot_core::preprocess::VoicePreprocessor;
use coachbot_core::relay::RelayService;
use coachbot_core::scanner::ReengagementScanner;
use coachbot_core::session::store::SessionStore;
use coachbot_core::transport::OutboundChannel;
use coachbot_infra::assistant::OpenAiAssistantsBackend;
use coachbot_infra::config::load_relay_config;
use coachbot_infra::filesystem::{ensure_data_dir, resolve_data_dir};
use coachbot_infra::sqlite::pool::DatabasePool;
use coachbot_infra::sqlite::session::SqliteSessionRepository;
use coachbot_infra::voice::{FfmpegTranscoder, WhisperTranscriber};
use coachbot_types::config::RelayConfig;

/// Concrete type aliases for the component generics pinned to infra implementations.
pub type ConcreteSessionStore = SessionStore<SqliteSessionRepository>;

pub type ConcreteRelay = RelayService<
    SqliteSessionRepository,
    OpenAiAssistantsBackend,
    FfmpegTranscoder,
    WhisperTranscriber,
>;

pub type ConcreteScanner<O> =
    ReengagementScanner<SqliteSessionRepository, OpenAiAssistantsBackend, O>;

/// Shared application state used by every CLI command.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub data_dir: PathBuf,
    pub clock: Arc<dyn Clock>,
    pub session_store: Arc<ConcreteSessionStore>,
    pub backend: Arc<OpenAiAssistantsBackend>,
}

impl AppState {
    /// Load configuration, open the database and build the shared adapters.
    pub async fn init(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        ensure_data_dir(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = load_relay_config(config_path, &data_dir)
            .await
            .context("Failed to load configuration")?;
        tracing::debug!(?config, "Configuration loaded");

        let db_pool = DatabasePool::new(&config.database_url)
            .await
            .context("Failed to open session database")?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let session_store = SessionStore::new(
            SqliteSessionRepository::new(db_pool),
            clock.clone(),
        );

        let backend =
            OpenAiAssistantsBackend::new(config.openai_api_key.clone(), &config.openai_base_url)?;

        Ok(Self {
            config: Arc::new(config),
            data_dir,
            clock,
            session_store: Arc::new(session_store),
            backend: Arc::new(backend),
        })
    }

    fn dispatcher(&self) -> RunDispatcher<OpenAiAssistantsBackend> {
        RunDispatcher::new(
            self.backend.clone(),
            self.config.assistant_id.clone(),
            Duration::from_millis(self.config.run_poll_interval_ms),
        )
    }

    /// Build the relay that serves inbound chat traffic.
    pub fn relay(&self) -> anyhow::Result<ConcreteRelay> {
        let stt = WhisperTranscriber::new(
            self.config.openai_api_key.clone(),
            &self.config.openai_base_url,
            &self.config.transcription_model,
        )?;
        let voice = VoicePreprocessor::new(
            FfmpegTranscoder::new(&self.config.ffmpeg_binary),
            stt,
            self.config.voices_dir.clone(),
        );

        Ok(RelayService::new(
            self.session_store.clone(),
            self.config.subscription_secret.clone(),
            self.dispatcher(),
            voice,
            self.clock.clone(),
        ))
    }

    /// Build a re-engagement scanner delivering through `outbound`.
    pub fn scanner<O: OutboundChannel>(&self, outbound: O) -> ConcreteScanner<O> {
        ReengagementScanner::new(
            self.session_store.clone(),
            self.dispatcher(),
            outbound,
            self.clock.clone(),
            self.config.reengagement_prompt.clone(),
        )
    }
}
