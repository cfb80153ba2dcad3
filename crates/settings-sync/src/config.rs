//! Engine configuration.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix, e.g. `SETTINGS_SYNC__RETRY__MAX_ATTEMPTS`.
pub const ENV_PREFIX: &str = "SETTINGS_SYNC";

/// Backoff schedule for revalidation retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    /// Growth factor applied per further failure.
    pub multiplier: f64,
    /// Upper bound for any single delay.
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// A policy that makes exactly one attempt.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Configuration for the synchronization engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Base URL of the settings API, without trailing slash.
    base_url: String,

    /// Per-request timeout.
    #[serde(with = "humantime_serde")]
    request_timeout: Duration,

    /// How long a validated entry is served without revalidation.
    #[serde(with = "humantime_serde")]
    stale_after: Duration,

    /// Revalidation retry schedule.
    retry: RetryConfig,

    /// Whether to revalidate in the background after every mutation.
    reconcile_after_mutation: bool,

    /// Static bearer token (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_stale_after() -> Duration {
    Duration::from_secs(60)
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            stale_after: default_stale_after(),
            retry: RetryConfig::default(),
            reconcile_after_mutation: true,
            auth_token: None,
        }
    }
}

impl SyncConfig {
    /// Creates a new builder for SyncConfig.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Loads configuration from an optional file, then `SETTINGS_SYNC__*`
    /// environment variables. Later sources override earlier ones.
    pub fn load(path: Option<&Path>) -> Result<Self, LoadError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot work.
    pub fn validate(&self) -> Result<(), LoadError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(LoadError::invalid("base_url", "must be an http(s) URL"));
        }
        if self.retry.max_attempts == 0 {
            return Err(LoadError::invalid("retry.max_attempts", "must be at least 1"));
        }
        if self.retry.multiplier < 1.0 {
            return Err(LoadError::invalid("retry.multiplier", "must be at least 1.0"));
        }
        Ok(())
    }

    /// Returns the API base URL.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the freshness window.
    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Returns the retry schedule.
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Returns whether mutations trigger a reconciliation revalidation.
    pub fn reconcile_after_mutation(&self) -> bool {
        self.reconcile_after_mutation
    }

    /// Returns the configured bearer token.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Overrides the base URL.
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    /// Overrides the bearer token.
    pub fn set_auth_token(&mut self, token: impl Into<String>) {
        self.auth_token = Some(token.into());
    }
}

/// Builder for SyncConfig.
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    base_url: Option<String>,
    request_timeout: Option<Duration>,
    stale_after: Option<Duration>,
    retry: Option<RetryConfig>,
    reconcile_after_mutation: Option<bool>,
    auth_token: Option<String>,
}

impl SyncConfigBuilder {
    /// Sets the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the freshness window.
    pub fn stale_after(mut self, window: Duration) -> Self {
        self.stale_after = Some(window);
        self
    }

    /// Sets the retry schedule.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Sets whether mutations trigger reconciliation.
    pub fn reconcile_after_mutation(mut self, enabled: bool) -> Self {
        self.reconcile_after_mutation = Some(enabled);
        self
    }

    /// Sets the bearer token.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<SyncConfig, LoadError> {
        let config = SyncConfig {
            base_url: self.base_url.unwrap_or_else(default_base_url),
            request_timeout: self.request_timeout.unwrap_or_else(default_request_timeout),
            stale_after: self.stale_after.unwrap_or_else(default_stale_after),
            retry: self.retry.unwrap_or_default(),
            reconcile_after_mutation: self.reconcile_after_mutation.unwrap_or(true),
            auth_token: self.auth_token,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();

        assert_eq!(config.base_url(), "http://localhost:8080/api");
        assert_eq!(config.stale_after(), Duration::from_secs(60));
        assert_eq!(config.retry().max_attempts, 3);
        assert!(config.reconcile_after_mutation());
        assert!(config.auth_token().is_none());
    }

    #[test]
    fn test_retry_delays() {
        let retry = RetryConfig::default();

        assert_eq!(retry.delay_for(1), Duration::from_secs(1));
        assert_eq!(retry.delay_for(2), Duration::from_secs(2));
        assert_eq!(retry.delay_for(3), Duration::from_secs(4));
        assert_eq!(retry.delay_for(10), Duration::from_secs(30));
    }

    #[test]
    fn test_builder() {
        let config = SyncConfig::builder()
            .base_url("https://settings.example.com/api/")
            .stale_after(Duration::from_secs(5))
            .retry(RetryConfig::disabled())
            .reconcile_after_mutation(false)
            .auth_token("t0ken")
            .build()
            .unwrap();

        assert_eq!(config.base_url(), "https://settings.example.com/api");
        assert_eq!(config.retry().max_attempts, 1);
        assert!(!config.reconcile_after_mutation());
        assert_eq!(config.auth_token(), Some("t0ken"));
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let err = SyncConfig::builder().base_url("ftp://x").build().unwrap_err();
        assert!(matches!(err, LoadError::Invalid { key: "base_url", .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
base_url = "https://settings.example.com/api"
stale_after = "5m"

[retry]
max_attempts = 5
base_delay = "250ms"
"#
        )
        .unwrap();

        let config = SyncConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.base_url(), "https://settings.example.com/api");
        assert_eq!(config.stale_after(), Duration::from_secs(300));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.retry().max_attempts, 5);
        assert_eq!(config.retry().base_delay, Duration::from_millis(250));
        assert_eq!(config.retry().max_delay, Duration::from_secs(30));
    }

    #[test]
    fn test_load_rejects_zero_attempts() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[retry]\nmax_attempts = 0").unwrap();

        assert!(matches!(
            SyncConfig::load(Some(file.path())),
            Err(LoadError::Invalid { key: "retry.max_attempts", .. })
        ));
    }
}
