//! Client configuration.
//!
//! Settings are layered, later layers winning:
//!
//! 1. built-in defaults,
//! 2. the JSON config file (`~/.config/chat-history/config.json`),
//! 3. environment variables (`CHAT_HISTORY_BASE_URL`, `CHAT_HISTORY_REFRESH_SECS`),
//! 4. command-line flags (applied by the front end).

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_BASE_URL: &str = "CHAT_HISTORY_BASE_URL";
pub const ENV_REFRESH_SECS: &str = "CHAT_HISTORY_REFRESH_SECS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Settings for the history manager and its HTTP client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Origin of the conversation API, without the `/api` suffix.
    pub base_url: String,

    /// Seconds between automatic list refreshes.
    pub refresh_interval_secs: u64,

    /// Lifetime of an on-screen error notification.
    pub notification_ttl_ms: u64,

    /// Per-request timeout.
    pub request_timeout_secs: u64,

    /// Directory for the HTTP wire log; disabled when `None`.
    pub wire_log_dir: Option<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            refresh_interval_secs: 30,
            notification_ttl_ms: 3000,
            request_timeout_secs: 10,
            wire_log_dir: None,
        }
    }
}

impl HistoryConfig {
    /// Load settings from a JSON file.
    ///
    /// A missing file yields the defaults. Fields absent from the file keep
    /// their default value.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CHAT_HISTORY_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        if let Ok(secs) = std::env::var(ENV_REFRESH_SECS) {
            self.refresh_interval_secs = secs.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{ENV_REFRESH_SECS} must be a number, got {secs:?}"))
            })?;
        }
        self.validate()
    }

    /// Reject values the manager cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
