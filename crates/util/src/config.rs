//! Console configuration.
//!
//! Values are resolved in three layers: built-in defaults, an optional JSON
//! file (`~/.config/flytedeck/config.json` on most platforms), and finally
//! environment variables, which always win.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{expand_tilde, formatters::ensure_url_with_protocol};

/// Environment variable allowing callers to override the config file path.
pub const CONFIG_PATH_ENV: &str = "FLYTEDECK_CONFIG_PATH";
/// Base URL of the admin API.
pub const ADMIN_API_BASE_ENV: &str = "FLYTE_ADMIN_API_BASE";
/// Execution polling interval in milliseconds.
pub const EXECUTION_REFRESH_MS_ENV: &str = "FLYTE_EXECUTION_REFRESH_MS";
/// Per-request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS_ENV: &str = "FLYTE_REQUEST_TIMEOUT_SECS";

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_ADMIN_API_BASE: &str = "http://localhost:30081";
pub const DEFAULT_EXECUTION_REFRESH_MS: u64 = 10_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidValue { name: &'static str, value: String, reason: String },
}

/// Shape of the optional JSON file. Every field may be omitted.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default)]
    admin_api_base: Option<String>,
    #[serde(default)]
    execution_refresh_interval_ms: Option<u64>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
}

/// Resolved configuration handed to the API client and the refresh scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub admin_api_base: String,
    pub execution_refresh_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            admin_api_base: DEFAULT_ADMIN_API_BASE.to_string(),
            execution_refresh_interval: Duration::from_millis(DEFAULT_EXECUTION_REFRESH_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ConsoleConfig {
    /// Load the configuration from the default file location and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_config_path())
    }

    /// Load the configuration from `path` (if it exists) and the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let file = read_config_file(path)?;
        let mut config = Self::default();

        if let Some(base) = file.admin_api_base {
            config.admin_api_base = base;
        }
        if let Some(interval_ms) = file.execution_refresh_interval_ms {
            config.execution_refresh_interval = Duration::from_millis(interval_ms);
        }
        if let Some(timeout_secs) = file.request_timeout_secs {
            config.request_timeout = Duration::from_secs(timeout_secs);
        }

        if let Some(base) = env_value(ADMIN_API_BASE_ENV) {
            config.admin_api_base = base;
        }
        if let Some(raw) = env_value(EXECUTION_REFRESH_MS_ENV) {
            config.execution_refresh_interval = Duration::from_millis(parse_positive(EXECUTION_REFRESH_MS_ENV, &raw)?);
        }
        if let Some(raw) = env_value(REQUEST_TIMEOUT_SECS_ENV) {
            config.request_timeout = Duration::from_secs(parse_positive(REQUEST_TIMEOUT_SECS_ENV, &raw)?);
        }

        config.admin_api_base = ensure_url_with_protocol(config.admin_api_base.trim_end_matches('/'));
        if config.execution_refresh_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "executionRefreshIntervalMs",
                value: "0".into(),
                reason: "interval must be greater than zero".into(),
            });
        }

        debug!(
            admin_api_base = %config.admin_api_base,
            refresh_ms = config.execution_refresh_interval.as_millis() as u64,
            "console configuration resolved"
        );
        Ok(config)
    }
}

fn default_config_path() -> PathBuf {
    if let Some(path) = env_value(CONFIG_PATH_ENV) {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flytedeck")
        .join(CONFIG_FILE_NAME)
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    match fs::read_to_string(path) {
        Ok(data) => Ok(serde_json::from_str(&data)?),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(error) => {
            warn!(path = %path.display(), error = %error, "failed to read config file");
            Err(ConfigError::Io(error))
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_positive(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let value: u64 = raw.parse().map_err(|error: std::num::ParseIntError| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
        reason: error.to_string(),
    })?;
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(value)
}
