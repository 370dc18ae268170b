//! Configuration persistence.
//!
//! A small JSON file with five keys; missing keys are filled from the
//! defaults on load, and a missing file is created with the full default
//! set. Loaded once at startup, persisted on demand.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// BCP-47 language tag for transcription.
    pub language: String,
    /// Preferred voice identifier; `None` lets the heuristic pick.
    pub voice_id: Option<String>,
    /// Resume listening after the assistant finishes speaking.
    pub auto_restart: bool,
    /// Persist the conversation history alongside the config.
    pub save_history: bool,
    /// Entries kept in the conversation history.
    pub max_history: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            voice_id: None,
            auto_restart: true,
            save_history: true,
            max_history: 50,
        }
    }
}

/// Default location: `<config dir>/parley/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parley")
        .join("config.json")
}

impl AppConfig {
    /// Load the config, creating the file with defaults if it does not
    /// exist. A file with only some keys present gets the rest from the
    /// defaults without altering what is there.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            tracing::info!("Created default configuration at {}", path.display());
            return Ok(config);
        }
        let raw = fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Write the config as pretty-printed JSON (2-space indentation).
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut body = serde_json::to_string_pretty(self)?;
        body.push('\n');
        fs::write(path, body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = AppConfig::load_or_create(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        // The created file carries all five keys.
        let raw = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let object = value.as_object().unwrap();
        for key in [
            "language",
            "voice_id",
            "auto_restart",
            "save_history",
            "max_history",
        ] {
            assert!(object.contains_key(key), "missing key {}", key);
        }
        assert_eq!(object.len(), 5);
    }

    #[test]
    fn partial_file_merges_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"language": "fr-FR"}"#).unwrap();

        let config = AppConfig::load_or_create(&path).unwrap();
        assert_eq!(config.language, "fr-FR");
        assert_eq!(config.voice_id, None);
        assert!(config.auto_restart);
        assert!(config.save_history);
        assert_eq!(config.max_history, 50);
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.voice_id = Some("english_f".to_string());
        config.max_history = 10;
        config.save(&path).unwrap();

        let reloaded = AppConfig::load_or_create(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            AppConfig::load_or_create(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
