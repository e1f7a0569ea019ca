//! Authentication bootstrap
//!
//! Exchanges an API key for object storage credentials by posting it, as a
//! bearer token, to the credential issuance endpoint. Nothing is persisted
//! here; the caller hands the result to the credential store.
//!
//! # Example
//!
//! ```no_run
//! use r2_uploadr::auth::AuthClient;
//! use r2_uploadr::config::AuthConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AuthClient::new(&AuthConfig::default())?;
//! let creds = client.get_auth("my-api-key").await?;
//! println!("Bucket: {}", creds.bucket_name);
//! # Ok(())
//! # }
//! ```

use crate::config::AuthConfig;
use crate::credentials::Credentials;
use crate::metrics;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication failed: {status_text}")]
    Rejected { status: u16, status_text: String },

    #[error("Authentication failed: malformed credentials response: {0}")]
    MalformedResponse(String),

    #[error("Authentication failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

/// Client for the credential issuance endpoint
pub struct AuthClient {
    client: reqwest::Client,
    endpoint: String,
}

impl AuthClient {
    /// Create a new auth client
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch credentials for an API key
    #[tracing::instrument(name = "auth.get_auth", skip(self, api_key), fields(endpoint = %self.endpoint))]
    pub async fn get_auth(&self, api_key: &str) -> Result<Credentials, AuthError> {
        tracing::info!("Attempting authentication");

        let result = self.request_credentials(api_key).await;
        metrics::record_auth_attempt(result.is_ok());

        match &result {
            Ok(creds) => tracing::info!(
                account_id = %creds.account_id,
                bucket = %creds.bucket_name,
                "Authentication successful"
            ),
            Err(e) => tracing::error!(error = %e, "Authentication failed"),
        }

        result
    }

    async fn request_credentials(&self, api_key: &str) -> Result<Credentials, AuthError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                status_text: status_text(status),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| AuthError::MalformedResponse(e.to_string()))
    }
}

/// Reason phrase for a status, with the code kept when there is none
fn status_text(status: reqwest::StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => reason.to_string(),
        None => format!("{} Unknown status", status.as_u16()),
    }
}

/// Fetch credentials with a one-off client
pub async fn get_auth(config: &AuthConfig, api_key: &str) -> Result<Credentials, AuthError> {
    AuthClient::new(config)?.get_auth(api_key).await
}
