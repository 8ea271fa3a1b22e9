//! Process-wide configuration.
//!
//! `RelayConfigFile` mirrors `config.toml` (every field optional so that
//! environment variables can fill the gaps). `RelayConfig` is the validated
//! form constructed once at startup and handed to component constructors.

use std::fmt;
use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";
pub const DEFAULT_RUN_POLL_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_TELEGRAM_POLL_TIMEOUT_SECS: u32 = 30;
pub const DEFAULT_FFMPEG_BINARY: &str = "ffmpeg";
pub const DEFAULT_REENGAGEMENT_PROMPT: &str =
    "A new day has started and we have not talked yet. Check in with me.";

/// Raw `config.toml` contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfigFile {
    pub telegram_token: Option<String>,
    pub openai_api_key: Option<String>,
    pub assistant_id: Option<String>,
    pub subscription_secret: Option<String>,
    pub openai_base_url: Option<String>,
    pub transcription_model: Option<String>,
    pub run_poll_interval_ms: Option<u64>,
    pub reengagement_prompt: Option<String>,
    pub telegram_poll_timeout_secs: Option<u32>,
    pub ffmpeg_binary: Option<String>,
    pub voices_dir: Option<PathBuf>,
    pub database_url: Option<String>,
}

/// Validated configuration. Secrets never appear in `Debug` output.
#[derive(Clone)]
pub struct RelayConfig {
    pub telegram_token: SecretString,
    pub openai_api_key: SecretString,
    /// Fixed assistant every run is created against.
    pub assistant_id: String,
    /// Shared secret gating `/subscribe`.
    pub subscription_secret: SecretString,
    pub openai_base_url: String,
    pub transcription_model: String,
    pub run_poll_interval_ms: u64,
    pub reengagement_prompt: String,
    pub telegram_poll_timeout_secs: u32,
    pub ffmpeg_binary: String,
    pub voices_dir: PathBuf,
    pub database_url: String,
}

impl RelayConfigFile {
    /// Validate and fill defaults. Paths default to locations under `data_dir`.
    pub fn into_config(self, data_dir: &std::path::Path) -> Result<RelayConfig, ConfigError> {
        let telegram_token = require(self.telegram_token, "telegram_token")?;
        let openai_api_key = require(self.openai_api_key, "openai_api_key")?;
        let assistant_id = require(self.assistant_id, "assistant_id")?;
        let subscription_secret = require(self.subscription_secret, "subscription_secret")?;

        let run_poll_interval_ms = self
            .run_poll_interval_ms
            .unwrap_or(DEFAULT_RUN_POLL_INTERVAL_MS);
        if run_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "run_poll_interval_ms must be greater than zero".into(),
            ));
        }

        let database_url = self.database_url.unwrap_or_else(|| {
            format!(
                "sqlite://{}?mode=rwc",
                data_dir.join("coachbot.db").display()
            )
        });

        Ok(RelayConfig {
            telegram_token: SecretString::from(telegram_token),
            openai_api_key: SecretString::from(openai_api_key),
            assistant_id,
            subscription_secret: SecretString::from(subscription_secret),
            openai_base_url: self
                .openai_base_url
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            transcription_model: self
                .transcription_model
                .unwrap_or_else(|| DEFAULT_TRANSCRIPTION_MODEL.to_string()),
            run_poll_interval_ms,
            reengagement_prompt: self
                .reengagement_prompt
                .unwrap_or_else(|| DEFAULT_REENGAGEMENT_PROMPT.to_string()),
            telegram_poll_timeout_secs: self
                .telegram_poll_timeout_secs
                .unwrap_or(DEFAULT_TELEGRAM_POLL_TIMEOUT_SECS),
            ffmpeg_binary: self
                .ffmpeg_binary
                .unwrap_or_else(|| DEFAULT_FFMPEG_BINARY.to_string()),
            voices_dir: self.voices_dir.unwrap_or_else(|| data_dir.join("voices")),
            database_url,
        })
    }
}

fn require(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(field)),
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("telegram_token", &"[REDACTED]")
            .field("openai_api_key", &"[REDACTED]")
            .field("assistant_id", &self.assistant_id)
            .field("subscription_secret", &"[REDACTED]")
            .field("openai_base_url", &self.openai_base_url)
            .field("transcription_model", &self.transcription_model)
            .field("run_poll_interval_ms", &self.run_poll_interval_ms)
            .field("telegram_poll_timeout_secs", &self.telegram_poll_timeout_secs)
            .field("ffmpeg_binary", &self.ffmpeg_binary)
            .field("voices_dir", &self.voices_dir)
            .field("database_url", &self.database_url)
            .finish()
    }
}
