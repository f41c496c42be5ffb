//! Configuration management for the client services.

use std::env;
use std::time::Duration;

/// Default device-local database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://lingo.db?mode=rwc";

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the remote API, without trailing slash
    pub api_base_url: String,
    /// SQLite connection URL for device-local storage
    pub database_url: String,
    /// Flat timeout applied to every HTTP request
    pub request_timeout: Duration,
    /// Pause after each knowledge point pushed during a sync run
    pub sync_item_delay: Duration,
    /// Minimum time between two automatic sync runs
    pub auto_sync_interval: Duration,
    /// How long fetched knowledge point lists are served from memory
    pub cache_ttl: Duration,
}

impl ClientConfig {
    /// Configuration with default settings for the given API.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            sync_item_delay: Duration::from_millis(500),
            auto_sync_interval: Duration::from_secs(3600),
            cache_ttl: Duration::from_secs(300),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("LINGO_API_BASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingApiBaseUrl)?;

        let mut config = Self::new(api_base_url);

        if let Some(url) = lookup("LINGO_DATABASE_URL") {
            config.database_url = url;
        }

        let number = |name: &'static str| -> Result<Option<u64>, ConfigError> {
            lookup(name)
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidNumber { name, value })
                })
                .transpose()
        };

        if let Some(secs) = number("LINGO_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = number("LINGO_SYNC_ITEM_DELAY_MS")? {
            config.sync_item_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = number("LINGO_AUTO_SYNC_INTERVAL_SECS")? {
            config.auto_sync_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = number("LINGO_CACHE_TTL_SECS")? {
            config.cache_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("LINGO_API_BASE_URL environment variable is required")]
    MissingApiBaseUrl,

    #[error("Invalid value for {name}: {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config =
            ClientConfig::from_lookup(lookup(&[("LINGO_API_BASE_URL", "https://api.test/")]))
                .unwrap();

        assert_eq!(config.api_base_url, "https://api.test");
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.sync_item_delay, Duration::from_millis(500));
        assert_eq!(config.auto_sync_interval, Duration::from_secs(3600));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("LINGO_API_BASE_URL", "http://localhost:8080"),
            ("LINGO_DATABASE_URL", "sqlite::memory:"),
            ("LINGO_SYNC_ITEM_DELAY_MS", "0"),
            ("LINGO_CACHE_TTL_SECS", " 60 "),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.sync_item_delay, Duration::ZERO);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn missing_base_url() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiBaseUrl));
    }

    #[test]
    fn invalid_number() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("LINGO_API_BASE_URL", "http://localhost"),
            ("LINGO_REQUEST_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Invalid value for LINGO_REQUEST_TIMEOUT_SECS: \"soon\""
        );
    }
}
