//! Configuration module for R2 Uploadr
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation. Every section is optional,
//! so `Config::default()` is a working configuration for the CLI.

use crate::credentials::Credentials;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}";

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with an uppercase letter or underscore and
/// contain only uppercase letters, digits, and underscores.
///
/// # Examples
///
/// ```ignore
/// std::env::set_var("MY_VAR", "value");
/// let result = expand_env_vars("prefix-${MY_VAR}-suffix");
/// assert_eq!(result, "prefix-value-suffix");
///
/// let result = expand_env_vars("${MISSING:-default}");
/// assert_eq!(result, "default");
/// ```
pub(crate) fn expand_env_vars(s: &str) -> String {
    let re = match regex_lite::Regex::new(ENV_VAR_PATTERN) {
        Ok(re) => re,
        Err(_) => return s.to_string(),
    };
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Keep the original placeholder.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

// ============================================================================
// Validation Helpers
// ============================================================================

/// Name of the first `${VAR}` placeholder expansion left in place
fn unresolved_env_var(s: &str) -> Option<String> {
    let re = regex_lite::Regex::new(ENV_VAR_PATTERN).ok()?;
    re.captures(s)
        .and_then(|cap| cap.get(1))
        .map(|name| name.as_str().to_string())
}

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: Option<ServerConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_http_url(&self.auth.endpoint) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid auth endpoint '{}': must start with http:// or https://",
                self.auth.endpoint
            )));
        }

        if self.storage.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Storage host cannot be empty".into(),
            ));
        }

        if self.storage.region.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Storage region cannot be empty".into(),
            ));
        }

        if let Some(ref endpoint) = self.storage.endpoint {
            if !is_valid_http_url(endpoint) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid storage endpoint '{}': must start with http:// or https://",
                    endpoint
                )));
            }
        }

        if let Some(ref server) = self.server {
            server.validate()?;
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level '{}': must be trace, debug, info, warn or error",
                    other
                )))
            }
        }

        Ok(())
    }
}

/// Credential issuance client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// URL the `login` command posts the API key to
    #[serde(default = "default_auth_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_auth_timeout")]
    pub timeout_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            endpoint: default_auth_endpoint(),
            timeout_seconds: default_auth_timeout(),
        }
    }
}

fn default_auth_endpoint() -> String {
    "http://127.0.0.1:3000/api/upload".to_string()
}

fn default_auth_timeout() -> u64 {
    30
}

/// Object storage endpoint configuration
///
/// The endpoint is templated as `https://<account id>.<host>` unless
/// `endpoint` overrides it, which is how tests point the client at a
/// local S3-compatible server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_host")]
    pub host: String,
    #[serde(default = "default_storage_region")]
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            host: default_storage_host(),
            region: default_storage_region(),
            endpoint: None,
        }
    }
}

fn default_storage_host() -> String {
    "r2.cloudflarestorage.com".to_string()
}

fn default_storage_region() -> String {
    "auto".to_string()
}

/// Local credential persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".r2-uploadr")
}

/// Credential issuance server configuration
///
/// # Example
///
/// ```yaml
/// server:
///   address: "127.0.0.1:3000"
///   credentials:
///     cloudflareAccountId: "${CLOUDFLARE_ACCOUNT_ID}"
///     cloudflareR2AccessKeyId: "${CLOUDFLARE_R2_ACCESS_KEY_ID}"
///     cloudflareR2SecretAccessKey: "${CLOUDFLARE_R2_SECRET_ACCESS_KEY}"
///     cloudflareR2BucketName: "${CLOUDFLARE_R2_BUCKET_NAME}"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_address")]
    pub address: String,
    pub credentials: Credentials,
}

impl ServerConfig {
    /// Check that the served credentials are complete
    ///
    /// A value still holding a `${VAR}` placeholder means the variable was
    /// unset; it is rejected rather than served.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.credentials
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("server.credentials: {}", e)))?;

        let creds = &self.credentials;
        let fields = [
            ("cloudflareAccountId", &creds.account_id),
            ("cloudflareR2AccessKeyId", &creds.access_key_id),
            ("cloudflareR2SecretAccessKey", &creds.secret_access_key),
            ("cloudflareR2BucketName", &creds.bucket_name),
        ];
        for (field, value) in fields {
            if let Some(var) = unresolved_env_var(value) {
                return Err(ConfigError::ValidationError(format!(
                    "server.credentials: {} references unset environment variable {}",
                    field, var
                )));
            }
        }

        Ok(())
    }
}

fn default_server_address() -> String {
    "127.0.0.1:3000".to_string()
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
