//! Configuration for the historical market data layer.

use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `DLMM_CACHE_SIZE`.
pub const ENV_PREFIX: &str = "DLMM";

/// Historical data service configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistoricalDataConfig {
    /// Maximum number of cached datasets.
    pub cache_size: usize,
    /// Time-to-live of a cached dataset, in milliseconds.
    pub cache_ttl_ms: u64,
    /// Optional budget for the summed estimated size of cached datasets.
    pub cache_max_bytes: Option<usize>,
    /// Generate synthetic data when the remote source fails or is absent.
    pub fallback_to_mock: bool,
    /// Base URL of the remote history API.
    pub api_endpoint: Option<String>,
    /// Timeout for a single remote request, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for HistoricalDataConfig {
    fn default() -> Self {
        Self {
            cache_size: 10,
            cache_ttl_ms: 300_000, // 5 minutes
            cache_max_bytes: None,
            fallback_to_mock: true,
            api_endpoint: None,
            request_timeout_ms: 10_000,
        }
    }
}

impl HistoricalDataConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            cache_size: parse_env("DLMM_CACHE_SIZE").unwrap_or(defaults.cache_size),
            cache_ttl_ms: parse_env("DLMM_CACHE_TTL_MS").unwrap_or(defaults.cache_ttl_ms),
            cache_max_bytes: parse_env("DLMM_CACHE_MAX_BYTES"),
            fallback_to_mock: parse_env("DLMM_FALLBACK_TO_MOCK")
                .unwrap_or(defaults.fallback_to_mock),
            api_endpoint: env::var("DLMM_API_ENDPOINT")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            request_timeout_ms: parse_env("DLMM_REQUEST_TIMEOUT_MS")
                .unwrap_or(defaults.request_timeout_ms),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an optional file layered under
    /// `DLMM_`-prefixed environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configured endpoint, if any, is an http(s) URL.
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.api_endpoint {
            let url = url::Url::parse(endpoint)?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Config {
                    message: format!("api_endpoint must be http(s), got {}", url.scheme()),
                });
            }
        }
        Ok(())
    }

    /// Configuration for tests: tiny cache, no remote source.
    pub fn test_config() -> Self {
        Self {
            cache_size: 2,
            cache_ttl_ms: 60_000,
            ..Default::default()
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HistoricalDataConfig::default();
        assert_eq!(config.cache_size, 10);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert!(config.fallback_to_mock);
        assert!(config.api_endpoint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let config = HistoricalDataConfig {
            api_endpoint: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidUrl(_))));

        let config = HistoricalDataConfig {
            api_endpoint: Some("ftp://example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        let config = HistoricalDataConfig {
            api_endpoint: Some("https://api.example.com/v1".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("dlmm-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("history.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "cache_size = 3").unwrap();
        writeln!(file, "cache_ttl_ms = 1500").unwrap();
        writeln!(file, "fallback_to_mock = false").unwrap();

        let config = HistoricalDataConfig::load(Some(&path)).unwrap();
        assert_eq!(config.cache_size, 3);
        assert_eq!(config.cache_ttl_ms, 1500);
        assert!(!config.fallback_to_mock);
        assert_eq!(config.request_timeout_ms, 10_000);

        std::fs::remove_dir_all(&dir).ok();
    }
}
