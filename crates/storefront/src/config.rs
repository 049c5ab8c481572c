//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `FIREBASE_API_KEY` - Web API key of the Firebase project (firebase backend)
//! - `FIREBASE_DATABASE_URL` - Realtime Database URL, e.g.
//!   `https://moon-bling-default-rtdb.firebaseio.com` (firebase backend)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BACKEND` - `firebase` (default) or `memory` for local development
//! - `STOREFRONT_CATALOG_PATH` - Product catalog JSON
//!   (default: `crates/storefront/content/catalog.json`)
//! - `FIREBASE_DATABASE_SECRET` - Database secret / access token sent as `auth=`
//! - `FIREBASE_AUTH_ENDPOINT` - Identity Toolkit base URL (useful for the emulator)
//! - `FIREBASE_REQUEST_TIMEOUT_SECS` - Timeout for non-streaming requests (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_AUTH_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which implementation backs authentication and persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Firebase Authentication + Realtime Database over REST.
    #[default]
    Firebase,
    /// Process-local accounts and data, lost on restart.
    Memory,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" => Ok(Self::Firebase),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected `firebase` or `memory`, got `{other}`")),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Auth/persistence backend
    pub backend: Backend,
    /// Product catalog file
    pub catalog_path: PathBuf,
    /// Firebase project settings (present when `backend` is `Firebase`)
    pub firebase: Option<FirebaseConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Firebase project configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct FirebaseConfig {
    /// Web API key used with the Identity Toolkit REST API
    pub api_key: SecretString,
    /// Realtime Database root URL
    pub database_url: Url,
    /// Credential appended as `auth=` to database requests
    pub database_secret: Option<SecretString>,
    /// Identity Toolkit base URL
    pub auth_endpoint: Url,
    /// Timeout for request/response calls (streams are not limited)
    pub request_timeout: Duration,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("api_key", &"[REDACTED]")
            .field("database_url", &self.database_url.as_str())
            .field(
                "database_secret",
                &self.database_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("auth_endpoint", &self.auth_endpoint.as_str())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let backend: Backend = parse_env("STOREFRONT_BACKEND", "firebase")?;
        let catalog_path = PathBuf::from(get_env_or_default(
            "STOREFRONT_CATALOG_PATH",
            "crates/storefront/content/catalog.json",
        ));

        let firebase = match backend {
            Backend::Firebase => Some(FirebaseConfig::from_env()?),
            Backend::Memory => None,
        };

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            catalog_path,
            firebase,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl FirebaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let database_secret = get_optional_env("FIREBASE_DATABASE_SECRET")
            .map(|value| {
                validate_secret_strength(&value, "FIREBASE_DATABASE_SECRET")?;
                Ok::<_, ConfigError>(SecretString::from(value))
            })
            .transpose()?;
        let timeout_secs: u64 = parse_env("FIREBASE_REQUEST_TIMEOUT_SECS", "10")?;

        Ok(Self {
            api_key: SecretString::from(get_required_env("FIREBASE_API_KEY")?),
            database_url: parse_url("FIREBASE_DATABASE_URL", &get_required_env("FIREBASE_DATABASE_URL")?)?,
            database_secret,
            auth_endpoint: parse_url(
                "FIREBASE_AUTH_ENDPOINT",
                &get_env_or_default("FIREBASE_AUTH_ENDPOINT", DEFAULT_AUTH_ENDPOINT),
            )?,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Expose the API key for request construction.
    #[must_use]
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable (empty values count as unset).
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a URL, normalising it to end with `/` so relative joins append.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("firebase".parse::<Backend>(), Ok(Backend::Firebase));
        assert_eq!(" Memory ".parse::<Backend>(), Ok(Backend::Memory));
        assert!("postgres".parse::<Backend>().is_err());
    }

    #[test]
    fn test_parse_url_appends_trailing_slash() {
        let url = parse_url("X", "https://moon-bling-default-rtdb.firebaseio.com").unwrap();
        assert_eq!(url.as_str(), "https://moon-bling-default-rtdb.firebaseio.com/");

        let url = parse_url("X", "http://127.0.0.1:9099/identitytoolkit.googleapis.com/v1").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9099/identitytoolkit.googleapis.com/v1/"
        );
    }

    #[test]
    fn test_parse_url_rejects_garbage() {
        assert!(matches!(
            parse_url("FIREBASE_DATABASE_URL", "not a url"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(validate_secret_strength("your-database-secret", "T").is_err());
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "T").is_err());
        assert!(validate_secret_strength("Qm9vbkJsaW5nUnRkYjIwMjZ4Kz7Lp", "T").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://moonbling.store".to_string(),
            backend: Backend::Memory,
            catalog_path: PathBuf::from("catalog.json"),
            firebase: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(config.is_https());
    }

    #[test]
    fn test_firebase_config_debug_redacts_secrets() {
        let config = FirebaseConfig {
            api_key: SecretString::from("AIzaSyD-super-private-key"),
            database_url: Url::parse("https://moon-bling.firebaseio.com/").unwrap(),
            database_secret: Some(SecretString::from("db-credential-value")),
            auth_endpoint: Url::parse(DEFAULT_AUTH_ENDPOINT).unwrap(),
            request_timeout: Duration::from_secs(10),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("moon-bling.firebaseio.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-private-key"));
        assert!(!debug_output.contains("db-credential-value"));
    }
}
