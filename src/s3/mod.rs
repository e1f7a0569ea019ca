//! S3 Client module
//!
//! Sends a built [`UploadRequest`] to an S3-compatible endpoint. Request
//! signing and the wire protocol are delegated to `aws-sdk-s3`.
//!
//! # Example
//!
//! ```no_run
//! use r2_uploadr::s3::{R2Client, StorageClient};
//! use r2_uploadr::upload::{EndpointConfig, UploadRequest};
//! use bytes::Bytes;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = R2Client::connect(&EndpointConfig {
//!     url: "https://account.r2.cloudflarestorage.com".to_string(),
//!     region: "auto".to_string(),
//!     access_key_id: "access-key".to_string(),
//!     secret_access_key: "secret-key".to_string(),
//! });
//!
//! let body = Bytes::from("Hello, World!");
//! let result = client
//!     .send(UploadRequest {
//!         bucket: "my-bucket".to_string(),
//!         key: "hello.txt".to_string(),
//!         content_length: body.len() as u64,
//!         body,
//!         content_type: "text/plain".to_string(),
//!         if_none_match: "\"65a8e27d8879283831b664bd8b7f0ad4\"".to_string(),
//!     })
//!     .await?;
//! println!("ETag: {}", result.etag);
//! # Ok(())
//! # }
//! ```
//!
//! # Tracing
//!
//! | Operation | Span Name | Attributes |
//! |-----------|-----------|------------|
//! | PutObject | `s3.put_object` | bucket, key, method, bytes, etag, status_code |

use crate::upload::{EndpointConfig, UploadRequest, UploadResult};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials as AwsCredentials;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::RequestChecksumCalculation;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use std::time::Instant;
use thiserror::Error;

/// S3 client errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// The request failed on the wire or the store rejected it
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Failure the client could not classify
    #[error("unrecognized storage failure: {0}")]
    Unknown(String),
}

/// Sends a single upload request
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn send(&self, request: UploadRequest) -> Result<UploadResult, StorageError>;
}

/// Cloudflare R2 client
///
/// Created per upload from the request's endpoint configuration; nothing is
/// cached between calls. Retries are disabled so a failed attempt surfaces
/// immediately.
pub struct R2Client {
    client: aws_sdk_s3::Client,
    endpoint: String,
}

impl R2Client {
    /// Create a client for an endpoint
    pub fn connect(endpoint: &EndpointConfig) -> Self {
        let credentials = AwsCredentials::new(
            endpoint.access_key_id.clone(),
            endpoint.secret_access_key.clone(),
            None,
            None,
            "r2-uploadr",
        );

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&endpoint.url)
            .region(Region::new(endpoint.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(config),
            endpoint: endpoint.url.clone(),
        }
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StorageClient for R2Client {
    /// Upload an object (PutObject) guarded by `if-none-match`
    ///
    /// # Tracing
    ///
    /// Creates a span named `s3.put_object` with attributes:
    /// - `s3.bucket` - Bucket name
    /// - `s3.key` - Object key
    /// - `http.method` - "PUT"
    /// - `upload.bytes` - Size of object
    /// - `s3.etag` - ETag from response (recorded after upload)
    /// - `http.status_code` - HTTP status code (recorded on rejection)
    #[tracing::instrument(
        name = "s3.put_object",
        skip(self, request),
        fields(
            s3.bucket = %request.bucket,
            s3.key = %request.key,
            http.method = "PUT",
            upload.bytes = request.content_length,
            s3.etag = tracing::field::Empty,
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    async fn send(&self, request: UploadRequest) -> Result<UploadResult, StorageError> {
        let bytes_written = request.content_length;
        let start_time = Instant::now();

        let output = self
            .client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .content_length(bytes_written as i64)
            .content_type(&request.content_type)
            .if_none_match(&request.if_none_match)
            .body(ByteStream::from(request.body))
            .send()
            .await
            .map_err(map_sdk_error)?;

        let duration = start_time.elapsed();
        let etag = match output.e_tag() {
            Some(etag) => etag.to_string(),
            None => {
                tracing::warn!("PutObject response carried no ETag");
                String::new()
            }
        };

        let span = tracing::Span::current();
        span.record("s3.etag", etag.as_str());

        tracing::debug!(
            etag = %etag,
            bytes = bytes_written,
            duration_ms = duration.as_millis(),
            "PutObject completed"
        );

        Ok(UploadResult {
            etag,
            bytes_written,
            duration,
        })
    }
}

/// Convert an SDK error, keeping the HTTP status when the store answered
fn map_sdk_error<E>(err: SdkError<E, aws_sdk_s3::config::http::HttpResponse>) -> StorageError
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
{
    let status = err.raw_response().map(|raw| raw.status().as_u16());
    if let Some(code) = status {
        tracing::Span::current().record("http.status_code", code);
    }

    let message = match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        (Some(code), None) => code.to_string(),
        _ => DisplayErrorContext(&err).to_string(),
    };

    match err {
        SdkError::ServiceError(_)
        | SdkError::ResponseError(_)
        | SdkError::DispatchFailure(_)
        | SdkError::TimeoutError(_) => StorageError::Transport { status, message },
        _ => StorageError::Unknown(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(url: &str) -> EndpointConfig {
        EndpointConfig {
            url: url.into(),
            region: "auto".into(),
            access_key_id: "test-key".into(),
            secret_access_key: "test-secret".into(),
        }
    }

    #[test]
    fn test_r2_client_creation() {
        let client = R2Client::connect(&endpoint("https://acct.r2.cloudflarestorage.com"));
        assert_eq!(client.endpoint(), "https://acct.r2.cloudflarestorage.com");
    }

    #[test]
    fn test_transport_error_display() {
        let err = StorageError::Transport {
            status: Some(412),
            message: "PreconditionFailed".into(),
        };
        assert_eq!(err.to_string(), "PreconditionFailed");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client = R2Client::connect(&endpoint("http://127.0.0.1:1"));
        let body = bytes::Bytes::from("test data");
        let result = client
            .send(UploadRequest {
                bucket: "test-bucket".into(),
                key: "test-key".into(),
                content_length: body.len() as u64,
                body,
                content_type: "text/plain".into(),
                if_none_match: "\"abc\"".into(),
            })
            .await;

        match result {
            Err(StorageError::Transport { status, .. }) => assert!(status.is_none()),
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}
