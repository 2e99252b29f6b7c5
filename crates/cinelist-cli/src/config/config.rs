//! `AppConfig` struct and TOML read/write.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use cinelist_loader::RetryPolicy;
use serde::{Deserialize, Serialize};
use url::Url;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Catalog endpoint settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Automatic retry settings for loaders.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Catalog endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the catalog API (trailing slash required).
    pub base_url: String,
    /// Response language.
    pub language: String,
    /// API key, used when `CINELIST_API_KEY` is not set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Total request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://api.themoviedb.org/3/"),
            language: String::from("en-US"),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Parses [`base_url`](Self::base_url).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed.
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).with_context(|| format!("invalid api.base_url: {}", self.base_url))
    }

    /// Request timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry configuration, in whole seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum automatic retries per page request.
    pub max_retries: u32,
    /// Backoff after a truncated or garbled response.
    pub parse_error_delay_secs: u64,
    /// Backoff after a dropped connection.
    pub connection_lost_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            parse_error_delay_secs: policy.parse_error_delay.as_secs(),
            connection_lost_delay_secs: policy.connection_lost_delay.as_secs(),
        }
    }
}

impl RetryConfig {
    /// Converts to the loader's policy.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            parse_error_delay: Duration::from_secs(self.parse_error_delay_secs),
            connection_lost_delay: Duration::from_secs(self.connection_lost_delay_secs),
        }
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Resolves the API key: `env_key` first, then `api.api_key`.
    ///
    /// Blank values are ignored.
    #[must_use]
    pub fn api_key(&self, env_key: Option<String>) -> Option<String> {
        env_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api.api_key.clone().filter(|k| !k.trim().is_empty()))
    }
}
