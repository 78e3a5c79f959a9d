//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORCHARD_API_BASE_URL` - Base URL of the backend REST API
//!
//! ## Optional
//! - `ORCHARD_REQUEST_TIMEOUT_SECS` - Per-request timeout ceiling (default: 15)
//! - `ORCHARD_DATA_DIR` - Directory for persisted state (default: platform
//!   data dir + `orchard`)
//! - `ORCHARD_CACHE_CAPACITY` - Max entries in the in-memory response cache
//!   (default: 1000)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend REST API. Always ends with a trailing slash
    /// so relative request paths join onto it instead of replacing it.
    pub api_base_url: Url,
    /// Fixed per-request timeout ceiling. A timeout is classified the same
    /// as any other network failure.
    pub request_timeout: Duration,
    /// Directory for persisted state (cache entries, guest cart, credential).
    pub data_dir: PathBuf,
    /// Max entries held by the in-memory response cache front.
    pub cache_capacity: u64,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(
            "ORCHARD_API_BASE_URL",
            &get_required_env("ORCHARD_API_BASE_URL")?,
        )?;

        let timeout_secs = get_env_or_default(
            "ORCHARD_REQUEST_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("ORCHARD_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        let data_dir = match get_optional_env("ORCHARD_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir(),
        };

        let cache_capacity = get_env_or_default(
            "ORCHARD_CACHE_CAPACITY",
            &DEFAULT_CACHE_CAPACITY.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("ORCHARD_CACHE_CAPACITY".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            data_dir,
            cache_capacity,
        })
    }

    /// Build a configuration programmatically (tests, embedding).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_base_url` does not parse as a URL.
    pub fn new(api_base_url: &str, data_dir: PathBuf) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url("api_base_url", api_base_url)?,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            data_dir,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        })
    }
}

/// Parse and normalize a base URL so that `Url::join` treats the final path
/// segment as a directory.
fn parse_base_url(name: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url = value
        .parse::<Url>()
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            name.to_string(),
            "URL cannot be a base".to_string(),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Platform data directory fallback for persisted state.
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("orchard")
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_adds_trailing_slash() {
        let url = parse_base_url("TEST", "https://api.example.com/v1").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/");

        // Relative joins now extend the path instead of replacing it
        let joined = url.join("products").unwrap();
        assert_eq!(joined.as_str(), "https://api.example.com/v1/products");
    }

    #[test]
    fn test_parse_base_url_keeps_existing_slash() {
        let url = parse_base_url("TEST", "https://api.example.com/").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/");
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        let result = parse_base_url("TEST", "not a url");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_new_applies_defaults() {
        let config = ClientConfig::new("http://localhost:4000", PathBuf::from("/tmp/x")).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.cache_capacity, 1000);
    }
}
