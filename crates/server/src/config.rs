//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults suit a local single-machine run.
//!
//! - `FASHION_DATABASE_URL` - `SQLite` connection string (fallback: `DATABASE_URL`,
//!   default: `sqlite://fashion_users.db?mode=rwc`)
//! - `FASHION_HOST` - Bind address (default: 127.0.0.1)
//! - `FASHION_PORT` - Listen port (default: 5000)
//! - `FASHION_BASE_URL` - Public URL; `https` enables secure cookies
//!   (default: `http://127.0.0.1:5000`)
//! - `FASHION_STATIC_DIR` - Directory served at `/static` (default: `static`)
//! - `FASHION_UPLOAD_SUBDIR` - Upload directory under the static dir (default: `uploads`)
//! - `GEMINI_API_KEY` - Google Gemini API key
//! - `GEMINI_MODEL` - Model name (default: `gemini-2.5-flash`)
//! - `GEMINI_BASE_URL` - API base URL (default: `https://generativelanguage.googleapis.com`)
//! - `GEMINI_TIMEOUT_SECS` - Per-attempt request timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_DATABASE_URL: &str = "sqlite://fashion_users.db?mode=rwc";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 30;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
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
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Upload directory name, relative to `static_dir`
    pub upload_subdir: String,
    /// Gemini API configuration
    pub gemini: GeminiConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Gemini API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key; calls fail (and fall back) when absent
    pub api_key: Option<SecretString>,
    /// Model name (e.g., gemini-2.5-flash)
    pub model: String,
    /// API base URL without trailing slash
    pub base_url: String,
    /// Per-attempt timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_GEMINI_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed. The API key is never
    /// rejected here; see [`GeminiConfig::api_key_warning`].
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("FASHION_DATABASE_URL");
        let host = get_env_or_default("FASHION_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("FASHION_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("FASHION_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("FASHION_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("FASHION_BASE_URL", "http://127.0.0.1:5000");
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("FASHION_BASE_URL".to_string(), e.to_string())
        })?;
        let static_dir = PathBuf::from(get_env_or_default("FASHION_STATIC_DIR", "static"));
        let upload_subdir = get_env_or_default("FASHION_UPLOAD_SUBDIR", "uploads");
        validate_upload_subdir(&upload_subdir)?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            static_dir,
            upload_subdir,
            gemini: GeminiConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        Url::parse(&self.base_url).is_ok_and(|url| url.scheme() == "https")
    }

    /// Directory where uploaded images are written.
    #[must_use]
    pub fn upload_dir(&self) -> PathBuf {
        self.static_dir.join(&self.upload_subdir)
    }

    /// Public URL prefix for uploaded images (no trailing slash).
    #[must_use]
    pub fn upload_url_prefix(&self) -> String {
        format!("/static/{}", self.upload_subdir.trim_matches('/'))
    }
}

impl GeminiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = api_key_from(get_optional_env("GEMINI_API_KEY"));

        let timeout_secs = get_env_or_default(
            "GEMINI_TIMEOUT_SECS",
            &DEFAULT_GEMINI_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar("GEMINI_TIMEOUT_SECS".to_string(), e.to_string()))?;

        Ok(Self {
            api_key,
            model: get_env_or_default("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            base_url: get_env_or_default("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Describe why the configured API key looks implausible, if it does.
    ///
    /// Runs the placeholder and entropy checks. The key is still used; a
    /// rejected key only makes advice requests fall back.
    #[must_use]
    pub fn api_key_warning(&self) -> Option<String> {
        let key = self.api_key.as_ref()?;
        validate_secret_strength(key.expose_secret(), "GEMINI_API_KEY")
            .err()
            .map(|e| e.to_string())
    }
}

/// Load only the database URL, for tools that do not serve HTTP.
///
/// Reads `.env` if present, then `FASHION_DATABASE_URL`, `DATABASE_URL`, or
/// the local file default.
#[must_use]
pub fn database_url_from_env() -> SecretString {
    let _ = dotenvy::dotenv();
    get_database_url("FASHION_DATABASE_URL")
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`, then the local file default.
fn get_database_url(primary_key: &str) -> SecretString {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_or_else(|_| SecretString::from(DEFAULT_DATABASE_URL), SecretString::from)
}

/// Keep any non-blank key, trimmed.
fn api_key_from(raw: Option<String>) -> Option<SecretString> {
    raw.map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .map(SecretString::from)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Upload subdirectory must be a single plain path segment.
fn validate_upload_subdir(subdir: &str) -> Result<(), ConfigError> {
    let valid = !subdir.is_empty()
        && subdir != "."
        && subdir != ".."
        && subdir
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            "FASHION_UPLOAD_SUBDIR".to_string(),
            format!("'{subdir}' must be a single directory name"),
        ))
    }
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by Google AI Studio."
            ),
        ));
    }

    Ok(())
}
