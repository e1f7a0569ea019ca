//! Credentials Module
//!
//! The four strings that identify an R2 account and bucket, plus the local
//! store that persists them between CLI invocations.
//!
//! # Example
//!
//! ```
//! use r2_uploadr::credentials::Credentials;
//!
//! let creds = Credentials::new("account", "access-key", "secret-key", "bucket");
//! assert!(creds.validate().is_ok());
//!
//! let missing = Credentials::new("account", "", "secret-key", "bucket");
//! assert!(missing.validate().is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod store;

pub use store::CredentialStore;

/// Credential errors
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Credential store error: {0}")]
    StoreError(#[from] std::io::Error),

    #[error("Failed to encode credentials: {0}")]
    EncodeError(#[from] serde_json::Error),
}

/// Object storage credentials as issued by the credential endpoint
///
/// Field names on the wire follow the issuing service's JSON shape.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "cloudflareAccountId")]
    pub account_id: String,
    #[serde(rename = "cloudflareR2AccessKeyId")]
    pub access_key_id: String,
    #[serde(rename = "cloudflareR2SecretAccessKey")]
    pub secret_access_key: String,
    #[serde(rename = "cloudflareR2BucketName")]
    pub bucket_name: String,
}

impl Credentials {
    /// Create new credentials
    pub fn new(
        account_id: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        bucket_name: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            bucket_name: bucket_name.into(),
        }
    }

    /// Check that every field is present
    ///
    /// Whitespace-only values count as missing. The error names the first
    /// offending field by its wire name.
    pub fn validate(&self) -> Result<(), CredentialsError> {
        let fields = [
            ("cloudflareAccountId", &self.account_id),
            ("cloudflareR2AccessKeyId", &self.access_key_id),
            ("cloudflareR2SecretAccessKey", &self.secret_access_key),
            ("cloudflareR2BucketName", &self.bucket_name),
        ];

        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(CredentialsError::MissingCredentials(format!(
                "{} is empty",
                name
            ))),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .finish()
    }
}
