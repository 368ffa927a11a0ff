//! Engine settings for Flagforge
//!
//! Loads the deployment-level knobs of the engine (edge store
//! enablement and timeouts, webhook delivery tuning) from environment
//! variables, a `.env` file, or a TOML file, and turns them into the
//! option structs the engine crates are constructed with. Global
//! toggles live here precisely so the resolver never reads ambient
//! process state.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `FLAGFORGE_EDGE_ENABLED` | `true` | Master switch for edge identity reads |
//! | `FLAGFORGE_EDGE_TIMEOUT_SECS` | `2` | Bound on a single edge read |
//! | `FLAGFORGE_WEBHOOK_TIMEOUT_SECS` | `10` | Per-request webhook delivery timeout |
//! | `FLAGFORGE_WEBHOOK_RETRY_ATTEMPTS` | `3` | Webhook delivery retries |

pub mod error;

pub use error::{ConfigError, Result};

use flagforge_core::EngineOptions;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Edge store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeSettings {
    pub enabled: bool,
    pub timeout_secs: u64,
}

impl Default for EdgeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 2,
        }
    }
}

/// Webhook delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    pub timeout_secs: u64,
    pub retry_attempts: u32,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            retry_attempts: 3,
        }
    }
}

/// Deployment-level engine settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub edge: EdgeSettings,
    pub webhooks: WebhookSettings,
}

impl EngineSettings {
    /// Load from `FLAGFORGE_`-prefixed environment variables, falling
    /// back to defaults for anything unset
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();

        if let Some(enabled) = read_env("FLAGFORGE_EDGE_ENABLED")? {
            settings.edge.enabled = parse_bool("FLAGFORGE_EDGE_ENABLED", &enabled)?;
        }
        if let Some(secs) = read_env("FLAGFORGE_EDGE_TIMEOUT_SECS")? {
            settings.edge.timeout_secs = parse_u64("FLAGFORGE_EDGE_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = read_env("FLAGFORGE_WEBHOOK_TIMEOUT_SECS")? {
            settings.webhooks.timeout_secs = parse_u64("FLAGFORGE_WEBHOOK_TIMEOUT_SECS", &secs)?;
        }
        if let Some(attempts) = read_env("FLAGFORGE_WEBHOOK_RETRY_ATTEMPTS")? {
            settings.webhooks.retry_attempts =
                parse_u64("FLAGFORGE_WEBHOOK_RETRY_ATTEMPTS", &attempts)? as u32;
        }

        Ok(settings)
    }

    /// Load a `.env` file (when present), then the environment
    pub fn from_dotenv(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
        } else {
            dotenvy::dotenv().ok();
        }
        Self::from_env()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// The engine construction options these settings describe
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            edge_enabled: self.edge.enabled,
            edge_timeout: Duration::from_secs(self.edge.timeout_secs),
        }
    }
}

fn read_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::ParseError(format!(
            "{} must be a boolean, got {:?}",
            key, other
        ))),
    }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::ParseError(format!("{} must be an integer, got {:?}", key, raw)))
}
