//! Relay configuration loader.
//!
//! Reads `config.toml` (from `--config` or `{data_dir}/config.toml`), lets
//! `COACHBOT_*` environment variables override the secrets and the
//! assistant id, then validates into a [`RelayConfig`].

use std::path::Path;

use coachbot_types::config::{RelayConfig, RelayConfigFile};
use coachbot_types::error::ConfigError;

use crate::filesystem::config_path;

/// Environment overrides, applied on top of the file.
const ENV_OVERRIDES: &[(&str, EnvField)] = &[
    ("COACHBOT_TELEGRAM_TOKEN", EnvField::TelegramToken),
    ("COACHBOT_OPENAI_API_KEY", EnvField::OpenAiApiKey),
    ("COACHBOT_ASSISTANT_ID", EnvField::AssistantId),
    ("COACHBOT_SUBSCRIPTION_SECRET", EnvField::SubscriptionSecret),
];

#[derive(Debug, Clone, Copy)]
enum EnvField {
    TelegramToken,
    OpenAiApiKey,
    AssistantId,
    SubscriptionSecret,
}

/// Load, override and validate the configuration.
///
/// - An explicit `config_path` must exist.
/// - The default `{data_dir}/config.toml` may be absent; everything then
///   comes from the environment.
/// - A file that exists but does not parse is an error, never silently
///   replaced by defaults.
pub async fn load_relay_config(
    explicit_path: Option<&Path>,
    data_dir: &Path,
) -> Result<RelayConfig, ConfigError> {
    let file = read_config_file(explicit_path, data_dir).await?;
    let file = apply_env_overrides(file, |key| std::env::var(key).ok());
    file.into_config(data_dir)
}

async fn read_config_file(
    explicit_path: Option<&Path>,
    data_dir: &Path,
) -> Result<RelayConfigFile, ConfigError> {
    let path = explicit_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config_path(data_dir));

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && explicit_path.is_none() => {
            tracing::debug!("No config.toml found at {}, using environment", path.display());
            return Ok(RelayConfigFile::default());
        }
        Err(err) => {
            return Err(ConfigError::Read(format!("{}: {err}", path.display())));
        }
    };

    toml::from_str::<RelayConfigFile>(&content)
        .map_err(|err| ConfigError::Parse(format!("{}: {err}", path.display())))
}

/// Overlay non-empty environment values onto the file contents.
pub fn apply_env_overrides(
    mut file: RelayConfigFile,
    lookup: impl Fn(&str) -> Option<String>,
) -> RelayConfigFile {
    for (key, field) in ENV_OVERRIDES {
        let Some(value) = lookup(*key).filter(|v| !v.is_empty()) else {
            continue;
        };
        let slot = match field {
            EnvField::TelegramToken => &mut file.telegram_token,
            EnvField::OpenAiApiKey => &mut file.openai_api_key,
            EnvField::AssistantId => &mut file.assistant_id,
            EnvField::SubscriptionSecret => &mut file.subscription_secret,
        };
        *slot = Some(value);
    }
    file
}
