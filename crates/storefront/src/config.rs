//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required (firebase backend)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `FIREBASE_PROJECT_ID` - Hosted project holding the `products`, `orders`, `users` collections
//! - `FIREBASE_API_KEY` - Web API key (identifies the project, not a secret)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BACKEND` - `firebase` (default) or `memory` for local demos
//! - `FIRESTORE_DATABASE` - Database id (default: `(default)`)
//! - `FIRESTORE_ENDPOINT` - Document store base URL (emulator override)
//! - `FIRESTORE_ACCESS_TOKEN` - Service bearer token for document store calls
//! - `IDENTITY_TOOLKIT_ENDPOINT` - Auth service base URL (emulator override)
//! - `SECURE_TOKEN_ENDPOINT` - Token refresh base URL (emulator override)
//! - `AUTH_RESOLVE_TIMEOUT_MS` - Bounded wait for auth resolution (default: 4000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default bounded wait before an unanswered auth lookup resolves as signed out.
pub const DEFAULT_AUTH_RESOLVE_TIMEOUT: Duration = Duration::from_millis(4000);

const DEFAULT_FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";
const DEFAULT_IDENTITY_TOOLKIT_ENDPOINT: &str = "https://identitytoolkit.googleapis.com";
const DEFAULT_SECURE_TOKEN_ENDPOINT: &str = "https://securetoken.googleapis.com";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Which hosted services back the storefront
    pub backend: BackendConfig,
    /// Bounded wait for resolving the signed-in user
    pub auth_resolve_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Backing services for documents and identity.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// Hosted Firestore + Identity Toolkit.
    Firebase(FirebaseConfig),
    /// In-process fakes; state is lost on restart.
    Memory,
}

/// Hosted project configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct FirebaseConfig {
    /// Project id
    pub project_id: String,
    /// Web API key
    pub api_key: String,
    /// Firestore database id
    pub database: String,
    /// Firestore REST base URL
    pub firestore_endpoint: String,
    /// Identity Toolkit REST base URL
    pub identity_endpoint: String,
    /// Secure Token REST base URL
    pub secure_token_endpoint: String,
    /// Optional service bearer token for document store calls
    pub access_token: Option<SecretString>,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &self.api_key)
            .field("database", &self.database)
            .field("firestore_endpoint", &self.firestore_endpoint)
            .field("identity_endpoint", &self.identity_endpoint)
            .field("secure_token_endpoint", &self.secure_token_endpoint)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
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

        let backend = match get_env_or_default("STOREFRONT_BACKEND", "firebase").as_str() {
            "firebase" => BackendConfig::Firebase(FirebaseConfig::from_env()?),
            "memory" => BackendConfig::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "STOREFRONT_BACKEND".to_string(),
                    format!("expected `firebase` or `memory`, got `{other}`"),
                ));
            }
        };

        let timeout_ms: u64 = parse_env(
            "AUTH_RESOLVE_TIMEOUT_MS",
            &DEFAULT_AUTH_RESOLVE_TIMEOUT.as_millis().to_string(),
        )?;

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            auth_resolve_timeout: Duration::from_millis(timeout_ms),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must be marked secure.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Configuration for tests and local demos: in-memory backend, loopback bind.
    #[must_use]
    pub fn for_memory_backend(base_url: impl Into<String>) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: base_url.into(),
            backend: BackendConfig::Memory,
            auth_resolve_timeout: DEFAULT_AUTH_RESOLVE_TIMEOUT,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl FirebaseConfig {
    /// Load the hosted project configuration.
    ///
    /// Shared with the operator CLI.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or the access
    /// token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let access_token = get_optional_env("FIRESTORE_ACCESS_TOKEN")
            .map(|token| {
                validate_secret_strength(&token, "FIRESTORE_ACCESS_TOKEN")?;
                Ok::<_, ConfigError>(SecretString::from(token))
            })
            .transpose()?;

        Ok(Self {
            project_id: get_required_env("FIREBASE_PROJECT_ID")?,
            api_key: get_required_env("FIREBASE_API_KEY")?,
            database: get_env_or_default("FIRESTORE_DATABASE", "(default)"),
            firestore_endpoint: get_env_or_default("FIRESTORE_ENDPOINT", DEFAULT_FIRESTORE_ENDPOINT),
            identity_endpoint: get_env_or_default(
                "IDENTITY_TOOLKIT_ENDPOINT",
                DEFAULT_IDENTITY_TOOLKIT_ENDPOINT,
            ),
            secure_token_endpoint: get_env_or_default(
                "SECURE_TOKEN_ENDPOINT",
                DEFAULT_SECURE_TOKEN_ENDPOINT,
            ),
            access_token,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
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
    let len = s.chars().count() as f64;
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

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_shannon_entropy_edges() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("zzzz") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_placeholder_token_rejected() {
        let err = validate_secret_strength("your-token-here", "FIRESTORE_ACCESS_TOKEN").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_low_entropy_token_rejected() {
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaa", "T").is_err());
    }

    #[test]
    fn test_random_token_accepted() {
        assert!(validate_secret_strength("ya29.a0Af8kQ3vZp_1LmN7rT2wX9cB4", "T").is_ok());
    }

    #[test]
    fn test_memory_config_defaults() {
        let config = StorefrontConfig::for_memory_backend("http://localhost:3000");
        assert!(matches!(config.backend, BackendConfig::Memory));
        assert_eq!(config.auth_resolve_timeout, Duration::from_millis(4000));
        assert!(!config.is_https());
        assert_eq!(config.socket_addr().port(), 3000);
    }

    #[test]
    fn test_firebase_config_debug_redacts_token() {
        let config = FirebaseConfig {
            project_id: "liborder-test".to_string(),
            api_key: "AIzaPublicKey".to_string(),
            database: "(default)".to_string(),
            firestore_endpoint: DEFAULT_FIRESTORE_ENDPOINT.to_string(),
            identity_endpoint: DEFAULT_IDENTITY_TOOLKIT_ENDPOINT.to_string(),
            secure_token_endpoint: DEFAULT_SECURE_TOKEN_ENDPOINT.to_string(),
            access_token: Some(SecretString::from("super_private_token_value")),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("liborder-test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_private_token_value"));
        assert_eq!(
            config.access_token.unwrap().expose_secret(),
            "super_private_token_value"
        );
    }
}
