//! Configuration for warp_intent
//!
//! Loaded from `~/.warp_intent/config.yaml`; every field is optional and a
//! missing file means defaults. `WARP_INTENT_ASSISTANT` and
//! `WARP_INTENT_TIMEOUT_MS` override the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ASSISTANT_ENV: &str = "WARP_INTENT_ASSISTANT";
pub const TIMEOUT_ENV: &str = "WARP_INTENT_TIMEOUT_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IntentConfig {
    /// Assistant executable; `~` is expanded
    pub assistant_path: String,
    pub model: String,
    pub triage_timeout_ms: u64,
    /// 0 disables the cap
    pub max_concurrent_triage: usize,
    pub negative_cache_ttl_secs: u64,
    pub typo_max_distance: usize,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            assistant_path: "claude".to_string(),
            model: crate::triage::client::DEFAULT_MODEL.to_string(),
            triage_timeout_ms: crate::triage::TRIAGE_TIMEOUT.as_millis() as u64,
            max_concurrent_triage: 2,
            negative_cache_ttl_secs: crate::known_commands::DEFAULT_NEGATIVE_TTL.as_secs(),
            typo_max_distance: crate::typo::DEFAULT_MAX_DISTANCE,
        }
    }
}

impl IntentConfig {
    /// `~/.warp_intent/config.yaml`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".warp_intent")
            .join("config.yaml")
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from the default path, then apply environment overrides
    pub fn load_default() -> Result<Self, ConfigError> {
        let mut config = Self::load(Self::default_path())?;
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(
            std::env::var(ASSISTANT_ENV).ok(),
            std::env::var(TIMEOUT_ENV).ok(),
        )
    }

    fn apply_overrides(&mut self, assistant: Option<String>, timeout_ms: Option<String>) -> Result<(), ConfigError> {
        if let Some(assistant) = assistant.filter(|a| !a.trim().is_empty()) {
            self.assistant_path = assistant;
        }
        if let Some(raw) = timeout_ms {
            self.triage_timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: TIMEOUT_ENV,
                value: raw.clone(),
            })?;
        }
        Ok(())
    }

    /// Assistant path with `~` expanded
    pub fn resolved_assistant_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.assistant_path).into_owned())
    }

    /// Serialize as YAML
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
