//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `SHOPEASE_API_URL` - Storefront REST API base URL (default: `http://localhost:5000/api`)
//! - `SHOPEASE_TOKEN_FILE` - Where the bearer token is persisted
//!   (default: `$HOME/.shopease/token`, or `.shopease/token` without `HOME`)
//! - `SHOPEASE_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SHOPEASE_STORE_NAME` - Merchant name shown in the payment window (default: `ShopEase`)
//! - `SHOPEASE_CURRENCY` - ISO 4217 currency for gateway amounts (default: `INR`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::{Path, PathBuf};
use std::time::Duration;

use shopease_core::CurrencyCode;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STORE_NAME: &str = "ShopEase";
const TOKEN_DIR: &str = ".shopease";
const TOKEN_FILE: &str = "token";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the storefront REST API
    pub api_url: Url,
    /// File the bearer token is persisted to between runs
    pub token_file: PathBuf,
    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
    /// Merchant name shown in the payment window
    pub store_name: String,
    /// Currency used for gateway amounts
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_env_or_default("SHOPEASE_API_URL", DEFAULT_API_URL))?;
        let token_file = get_optional_env("SHOPEASE_TOKEN_FILE").map_or_else(
            || default_token_file(get_optional_env("HOME").as_deref()),
            PathBuf::from,
        );
        let timeout_secs = get_env_or_default(
            "SHOPEASE_HTTP_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("SHOPEASE_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
        })?;
        let currency = get_env_or_default("SHOPEASE_CURRENCY", "INR")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPEASE_CURRENCY".to_string(), e))?;

        Ok(Self {
            api_url,
            token_file,
            http_timeout: Duration::from_secs(timeout_secs),
            store_name: get_env_or_default("SHOPEASE_STORE_NAME", DEFAULT_STORE_NAME),
            currency,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }

    /// Configuration for a given API base URL with every other setting at its
    /// default. Used by tests and embedders that do not read the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is not an absolute http(s) URL.
    pub fn for_api_url(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            token_file: default_token_file(None),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            store_name: DEFAULT_STORE_NAME.to_string(),
            currency: CurrencyCode::default(),
            sentry_dsn: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and normalize the API base URL.
///
/// The path always ends with `/` so endpoint paths can be appended to it.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("SHOPEASE_API_URL".to_string(), reason);

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme: {}", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Default token location under the user's home directory.
fn default_token_file(home: Option<&str>) -> PathBuf {
    home.filter(|h| !h.is_empty())
        .map_or_else(|| PathBuf::from(TOKEN_DIR), |h| Path::new(h).join(TOKEN_DIR))
        .join(TOKEN_FILE)
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
    fn test_api_url_gets_trailing_slash() {
        let url = parse_api_url("http://localhost:5000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/");

        let url = parse_api_url("https://shop.example.com/api/").unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/api/");
    }

    #[test]
    fn test_api_url_rejects_non_http() {
        let err = parse_api_url("ftp://example.com/api").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "SHOPEASE_API_URL"));
        assert!(parse_api_url("not a url").is_err());
    }

    #[test]
    fn test_default_token_file() {
        assert_eq!(
            default_token_file(Some("/home/asha")),
            PathBuf::from("/home/asha/.shopease/token")
        );
        assert_eq!(default_token_file(None), PathBuf::from(".shopease/token"));
        assert_eq!(default_token_file(Some("")), PathBuf::from(".shopease/token"));
    }

    #[test]
    fn test_for_api_url_defaults() {
        let config = ClientConfig::for_api_url("http://127.0.0.1:9999/api").unwrap();
        assert_eq!(config.currency, CurrencyCode::INR);
        assert_eq!(config.store_name, "ShopEase");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }
}
