//! Configuration management

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub apis: ApiConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

/// Upstream API endpoints and timeouts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub osv: OsvApiConfig,
    pub ghsa: GhsaApiConfig,
    pub registries: RegistryApiConfig,
}

/// OSV advisory database endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OsvApiConfig {
    pub base_url: String,
    /// Timeout for the batch endpoint (larger payloads).
    pub batch_timeout_seconds: u64,
    /// Timeout for single-query and by-id requests.
    pub request_timeout_seconds: u64,
}

impl Default for OsvApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.osv.dev/v1".to_string(),
            batch_timeout_seconds: 20,
            request_timeout_seconds: 10,
        }
    }
}

/// GitHub Security Advisories GraphQL endpoint (optional fallback source)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GhsaApiConfig {
    pub graphql_url: String,
    /// Bearer token; without one the GHSA fallback is skipped entirely.
    pub token: Option<String>,
    pub request_timeout_seconds: u64,
}

impl Default for GhsaApiConfig {
    fn default() -> Self {
        Self {
            graphql_url: "https://api.github.com/graphql".to_string(),
            token: None,
            request_timeout_seconds: 10,
        }
    }
}

/// Package registry endpoints used for license lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryApiConfig {
    pub pypi_base_url: String,
    pub packagist_base_url: String,
    pub gopkg_base_url: String,
    pub request_timeout_seconds: u64,
}

impl Default for RegistryApiConfig {
    fn default() -> Self {
        Self {
            pypi_base_url: "https://pypi.org".to_string(),
            packagist_base_url: "https://packagist.org".to_string(),
            gopkg_base_url: "https://api.pkg.go.dev".to_string(),
            request_timeout_seconds: 5,
        }
    }
}

/// Tunables for the analysis pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Unique keys per OSV batch request.
    pub batch_chunk_size: usize,
    /// Attempts per batch chunk before degrading to "no results".
    pub batch_max_attempts: u32,
    /// Linear backoff unit between batch attempts.
    pub batch_backoff_ms: u64,
    /// Timeout for the optional `composer licenses` subprocess.
    pub composer_timeout_seconds: u64,
    /// Capacity of the in-memory advisory/license caches.
    pub cache_max_entries: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            batch_chunk_size: 100,
            batch_max_attempts: 3,
            batch_backoff_ms: 500,
            composer_timeout_seconds: 60,
            cache_max_entries: 10_000,
        }
    }
}

impl AnalysisConfig {
    pub fn batch_backoff(&self) -> Duration {
        Duration::from_millis(self.batch_backoff_ms)
    }

    pub fn composer_timeout(&self) -> Duration {
        Duration::from_secs(self.composer_timeout_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from optional TOML files and the environment.
    ///
    /// Sources, lowest priority first: `config/default.toml`,
    /// `config/{ENV}.toml`, `config/local.toml`, then `REPOLENS__`-prefixed
    /// environment variables with `__` separators. A `GITHUB_TOKEN` variable
    /// overrides the GHSA token, following the common CI convention.
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("REPOLENS").separator("__"));

        let mut config: Config = builder.build()?.try_deserialize()?;

        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            if !token.is_empty() {
                config.apis.ghsa.token = Some(token);
            }
        }

        config.validate()?;

        Ok(config)
    }

    /// Sanity-check values that would otherwise fail deep inside the pipeline.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.apis.osv.base_url.is_empty() {
            return Err(ConfigLoadError::Invalid("apis.osv.base_url is empty".into()));
        }
        if self.analysis.batch_chunk_size == 0 {
            return Err(ConfigLoadError::Invalid(
                "analysis.batch_chunk_size must be at least 1".into(),
            ));
        }
        if self.analysis.batch_max_attempts == 0 {
            return Err(ConfigLoadError::Invalid(
                "analysis.batch_max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.apis.osv.base_url, "https://api.osv.dev/v1");
        assert_eq!(config.analysis.batch_chunk_size, 100);
        assert_eq!(config.analysis.batch_max_attempts, 3);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut config = Config::default();
        config.analysis.batch_chunk_size = 0;
        assert!(config.validate().is_err());
    }
}
