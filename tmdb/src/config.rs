use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const ENV_API_KEY: &str = "TMDB_API_KEY";
pub const ENV_API_BASE_URL: &str = "TMDB_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TMDB_REQUEST_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "TMDB_MAX_RETRIES";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing {0}: set it in the environment")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Connection settings for the TMDb API.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TmdbConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    pub api_key: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Extra attempts after a rate-limited or failed request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

impl TmdbConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key,
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`; unset and empty values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get(ENV_API_KEY).ok_or(ConfigError::Missing(ENV_API_KEY))?;
        let mut config = Self::new(api_key);

        if let Some(url) = get(ENV_API_BASE_URL) {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout_secs = parse_in_range(ENV_REQUEST_TIMEOUT_SECS, &raw, 1, 600)?;
        }
        if let Some(raw) = get(ENV_MAX_RETRIES) {
            config.max_retries = parse_in_range(ENV_MAX_RETRIES, &raw, 0, 10)? as u32;
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }
}

fn parse_in_range(name: &'static str, raw: &str, min: u64, max: u64) -> Result<u64, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason,
    };
    let value: u64 = raw.parse().map_err(|e| invalid(format!("{}", e)))?;
    if !(min..=max).contains(&value) {
        return Err(invalid(format!("must be between {} and {}", min, max)));
    }
    Ok(value)
}

fn default_api_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    250
}

fn default_retry_max_delay_ms() -> u64 {
    8_000
}
