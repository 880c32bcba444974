//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (MCP_SEARCH_*)
//! 2. TOML config file (if MCP_SEARCH_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (MCP_SEARCH_*)
/// 2. TOML config file (if MCP_SEARCH_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite store backing the cache and rate limiter.
    ///
    /// Set via MCP_SEARCH_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Pinned User-Agent string for outbound requests.
    ///
    /// When unset, providers rotate through a pool of browser identities.
    /// Set via MCP_SEARCH_USER_AGENT environment variable.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// HTTP request timeout for the scrape backend in milliseconds.
    ///
    /// Set via MCP_SEARCH_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Push-channel connection-establishment timeout in milliseconds.
    ///
    /// Set via MCP_SEARCH_CONNECT_TIMEOUT_MS environment variable.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// End-to-end answer timeout for the realtime backend in milliseconds.
    ///
    /// Set via MCP_SEARCH_RESPONSE_TIMEOUT_MS environment variable.
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,

    /// Requests allowed per rate window against the scrape backend.
    ///
    /// Set via MCP_SEARCH_RATE_LIMIT environment variable.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    /// Rate window length in seconds.
    ///
    /// Set via MCP_SEARCH_RATE_WINDOW_SECS environment variable.
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: i64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./mcp-search-cache.sqlite")
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    6_000
}

fn default_response_timeout_ms() -> u64 {
    20_000
}

fn default_rate_limit() -> u32 {
    20
}

fn default_rate_window_secs() -> i64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: None,
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            response_timeout_ms: default_response_timeout_ms(),
            rate_limit: default_rate_limit(),
            rate_window_secs: default_rate_window_secs(),
        }
    }
}

impl AppConfig {
    /// Scrape request timeout as a Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Connection-establishment timeout as a Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Realtime answer timeout as a Duration.
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `MCP_SEARCH_`
    /// 2. TOML file from `MCP_SEARCH_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("MCP_SEARCH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("MCP_SEARCH_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./mcp-search-cache.sqlite"));
        assert!(config.user_agent.is_none());
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.connect_timeout_ms, 6_000);
        assert_eq!(config.response_timeout_ms, 20_000);
        assert_eq!(config.rate_limit, 20);
        assert_eq!(config.rate_window_secs, 60);
    }

    #[test]
    fn test_timeout_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(10_000));
        assert_eq!(config.connect_timeout(), Duration::from_millis(6_000));
        assert_eq!(config.response_timeout(), Duration::from_millis(20_000));
    }
}
