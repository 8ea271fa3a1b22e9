//! Data directory layout.
//!
//! Everything coachbot persists lives under one directory: `config.toml`,
//! the session database and the voice scratch area.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "COACHBOT_DATA_DIR";

/// Resolve the data directory.
///
/// Uses `COACHBOT_DATA_DIR` if set, otherwise `~/.coachbot`.
pub fn resolve_data_dir() -> PathBuf {
    data_dir_from(std::env::var(DATA_DIR_ENV).ok(), dirs::home_dir())
}

fn data_dir_from(env_value: Option<String>, home: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = env_value.filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }

    // Use home directory fallback: ~/.coachbot
    if let Some(home) = home {
        return home.join(".coachbot");
    }

    // Last resort: current directory
    PathBuf::from(".coachbot")
}

/// Path of the default config file inside a data directory.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Create the data directory if it does not exist yet.
pub async fn ensure_data_dir(data_dir: &Path) -> Result<(), std::io::Error> {
    tokio::fs::create_dir_all(data_dir).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_value_wins() {
        let dir = data_dir_from(Some("/srv/coachbot".into()), Some("/home/u".into()));
        assert_eq!(dir, PathBuf::from("/srv/coachbot"));
    }

    #[test]
    fn test_home_fallback() {
        assert_eq!(
            data_dir_from(None, Some("/home/u".into())),
            PathBuf::from("/home/u/.coachbot")
        );
        assert_eq!(
            data_dir_from(Some(String::new()), Some("/home/u".into())),
            PathBuf::from("/home/u/.coachbot")
        );
    }

    #[test]
    fn test_last_resort_is_relative() {
        assert_eq!(data_dir_from(None, None), PathBuf::from(".coachbot"));
    }

    #[tokio::test]
    async fn test_ensure_data_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_data_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(config_path(&nested), nested.join("config.toml"));
    }
}
