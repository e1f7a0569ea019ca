//! Upload module
//!
//! The single-file upload pipeline: read the file, hash it, build a
//! conditional PutObject, send it, report progress.
//!
//! # Example
//!
//! ```no_run
//! use r2_uploadr::config::StorageConfig;
//! use r2_uploadr::credentials::Credentials;
//! use r2_uploadr::upload::{upload_file, LocalFile};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let creds = Credentials::new("account", "access-key", "secret-key", "bucket");
//! let file = LocalFile::new("report.pdf");
//!
//! let result = upload_file(
//!     &file,
//!     &creds,
//!     &StorageConfig::default(),
//!     Some(Box::new(|pct| println!("{}%", pct))),
//! )
//! .await?;
//! println!("ETag: {}", result.etag);
//! # Ok(())
//! # }
//! ```

use crate::config::StorageConfig;
use crate::credentials::{Credentials, CredentialsError};
use std::time::Duration;
use thiserror::Error;

pub mod digest;
pub mod file;
pub mod orchestrator;
pub mod request;

pub use digest::ContentDigest;
pub use file::{FilePayload, LocalFile};
pub use orchestrator::{R2Uploader, UploadState, Uploader};
pub use request::{build_request, EndpointConfig, UploadCommand, UploadRequest};

/// HTTP status a store answers with when the `if-none-match` precondition fails
pub const PRECONDITION_FAILED: u16 = 412;

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] CredentialsError),

    #[error("Upload failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload failed: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error("Upload failed with unknown error")]
    Unknown,
}

impl UploadError {
    /// HTTP status returned by the store, when it answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            UploadError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// The store already holds these exact bytes under the key
    pub fn is_precondition_failed(&self) -> bool {
        self.status() == Some(PRECONDITION_FAILED)
    }

    /// Short label used for metrics
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            UploadError::Configuration(_) => "configuration",
            UploadError::Io(_) => "io",
            UploadError::Transport { .. } if self.is_precondition_failed() => {
                "precondition_failed"
            }
            UploadError::Transport { .. } => "transport",
            UploadError::Unknown => "unknown",
        }
    }
}

/// Upload result
#[derive(Debug, Clone)]
pub struct UploadResult {
    /// ETag assigned by the store
    pub etag: String,
    pub bytes_written: u64,
    /// Time spent in the storage call
    pub duration: Duration,
}

impl UploadResult {
    /// Average transfer rate in MiB/s, or 0.0 when no time was measured
    pub fn throughput_mib_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        (self.bytes_written as f64 / (1024.0 * 1024.0)) / secs
    }
}

/// Single-shot progress callback: receives 100 on success or 0 on failure
pub type ProgressCallback = Box<dyn FnOnce(u8) + Send>;

/// Upload a local file with a client created for this call
pub async fn upload_file(
    file: &LocalFile,
    credentials: &Credentials,
    storage: &StorageConfig,
    on_progress: Option<ProgressCallback>,
) -> Result<UploadResult, UploadError> {
    R2Uploader::new(storage.clone())
        .upload(file, credentials, on_progress)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_result_throughput() {
        let result = UploadResult {
            etag: "\"abc123\"".into(),
            bytes_written: 2 * 1024 * 1024,
            duration: Duration::from_secs(2),
        };
        assert!((result.throughput_mib_per_sec() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_throughput_without_duration() {
        let result = UploadResult {
            etag: "\"abc123\"".into(),
            bytes_written: 1024,
            duration: Duration::ZERO,
        };
        assert_eq!(result.throughput_mib_per_sec(), 0.0);
    }

    #[test]
    fn test_error_messages() {
        let transport = UploadError::Transport {
            status: Some(500),
            message: "InternalError".into(),
        };
        assert_eq!(transport.to_string(), "Upload failed: InternalError");
        assert_eq!(transport.status(), Some(500));
        assert!(!transport.is_precondition_failed());

        assert_eq!(
            UploadError::Unknown.to_string(),
            "Upload failed with unknown error"
        );
    }

    #[test]
    fn test_precondition_failed_detection() {
        let err = UploadError::Transport {
            status: Some(412),
            message: "PreconditionFailed".into(),
        };
        assert!(err.is_precondition_failed());
        assert_eq!(err.kind(), "precondition_failed");
    }
}
