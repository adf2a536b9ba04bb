//! API endpoint configuration.
//!
//! Centralises the environment-driven transport settings so they are
//! validated consistently and can be tested in isolation.

use std::time::Duration;

use mockable::Env;
use tracing::warn;
use url::Url;

const BASE_URL_ENV: &str = "WELFARE_API_BASE_URL";
const TIMEOUT_ENV: &str = "WELFARE_API_TIMEOUT_SECONDS";

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Errors raised while validating API configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The base URL is present but does not parse.
    #[error("invalid value for {BASE_URL_ENV}='{value}': {source}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    /// The timeout is present but not a positive integer.
    #[error("invalid value for {TIMEOUT_ENV}='{value}'; expected seconds >= 1")]
    InvalidTimeout { value: String },
}

/// Transport settings for the API client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    base_url: Url,
    timeout: Duration,
}

impl ApiConfig {
    /// Construct a configuration with an explicit endpoint and timeout.
    ///
    /// The base URL is normalised to end with a slash so relative paths
    /// append rather than replace its last segment.
    #[must_use]
    pub fn new(mut base_url: Url, timeout: Duration) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { base_url, timeout }
    }

    /// Build configuration from environment variables, falling back to the
    /// local development defaults when a variable is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set but invalid.
    ///
    /// # Panics
    ///
    /// Never: the fallback URL is a valid literal.
    pub fn from_env<E: Env>(env: &E) -> Result<Self, ConfigError> {
        let base_url = match env.string(BASE_URL_ENV) {
            Some(value) => {
                Url::parse(&value).map_err(|source| ConfigError::InvalidBaseUrl {
                    value,
                    source,
                })?
            }
            None => {
                warn!("{BASE_URL_ENV} not set; using local development default");
                Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")
            }
        };

        let timeout = match env.string(TIMEOUT_ENV) {
            Some(value) => match value.parse::<u64>() {
                Ok(seconds) if seconds >= 1 => Duration::from_secs(seconds),
                _ => return Err(ConfigError::InvalidTimeout { value }),
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        };

        Ok(Self::new(base_url, timeout))
    }

    /// Endpoint root, guaranteed to end with a slash.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
