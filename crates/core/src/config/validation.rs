//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - any timeout is less than 100ms or exceeds 5 minutes
    /// - `rate_limit` is 0
    /// - `rate_window_secs` is outside 1..=3600
    /// - `user_agent` is set but empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("timeout_ms", self.timeout_ms),
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("response_timeout_ms", self.response_timeout_ms),
        ] {
            if value < 100 {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must be at least 100ms".into() });
            }
            if value > 300_000 {
                return Err(ConfigError::Invalid {
                    field: field.into(),
                    reason: "must not exceed 5 minutes (300000ms)".into(),
                });
            }
        }

        if self.rate_limit == 0 {
            return Err(ConfigError::Invalid { field: "rate_limit".into(), reason: "must be greater than 0".into() });
        }

        if self.rate_window_secs < 1 || self.rate_window_secs > 3600 {
            return Err(ConfigError::Invalid {
                field: "rate_window_secs".into(),
                reason: "must be between 1 and 3600 seconds".into(),
            });
        }

        if let Some(ua) = &self.user_agent
            && ua.is_empty()
        {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        Ok(())
    }
}
