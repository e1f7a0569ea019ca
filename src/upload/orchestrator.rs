//! Upload orchestration
//!
//! Runs one upload end to end: validate credentials, read the file, hash,
//! build the request, send it, then report progress exactly once. An
//! attempt moves Idle → Preparing → Sending → Succeeded/Failed and never
//! loops back; a retry is a new call.

use super::digest::ContentDigest;
use super::file::LocalFile;
use super::request::{build_request, EndpointConfig};
use super::{ProgressCallback, UploadError, UploadResult};
use crate::config::StorageConfig;
use crate::credentials::Credentials;
use crate::metrics;
use crate::s3::{R2Client, StorageClient, StorageError};
use std::time::Instant;

/// Lifecycle of a single upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Preparing,
    Sending,
    Succeeded,
    Failed,
}

impl UploadState {
    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(self, next: UploadState) -> bool {
        use UploadState::*;
        matches!(
            (self, next),
            (Idle, Preparing)
                | (Idle, Failed)
                | (Preparing, Sending)
                | (Preparing, Failed)
                | (Sending, Succeeded)
                | (Sending, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, UploadState::Succeeded | UploadState::Failed)
    }
}

/// Tracks the state of one attempt for logging
struct Attempt {
    state: UploadState,
}

impl Attempt {
    fn new() -> Self {
        Self {
            state: UploadState::Idle,
        }
    }

    fn advance(&mut self, next: UploadState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal upload transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!(from = ?self.state, to = ?next, "Upload state changed");
        self.state = next;
    }
}

/// Upload pipeline, generic over how storage clients are created
///
/// `connect` is called once per upload with the endpoint derived from that
/// call's credentials.
pub struct Uploader<F> {
    storage: StorageConfig,
    connect: F,
}

/// Uploader wired to the real R2 client
pub type R2Uploader = Uploader<fn(&EndpointConfig) -> R2Client>;

impl R2Uploader {
    pub fn new(storage: StorageConfig) -> Self {
        Self::with_factory(storage, R2Client::connect)
    }
}

impl<F, C> Uploader<F>
where
    F: Fn(&EndpointConfig) -> C + Send + Sync,
    C: StorageClient,
{
    /// Create an uploader with a custom client factory
    pub fn with_factory(storage: StorageConfig, connect: F) -> Self {
        Self { storage, connect }
    }

    /// Upload a file
    ///
    /// `on_progress` receives 100 on success or 0 on failure, once. Errors
    /// are logged here and returned to the caller.
    #[tracing::instrument(
        name = "upload.file",
        skip(self, file, credentials, on_progress),
        fields(path = %file.path().display(), bucket = %credentials.bucket_name)
    )]
    pub async fn upload(
        &self,
        file: &LocalFile,
        credentials: &Credentials,
        on_progress: Option<ProgressCallback>,
    ) -> Result<UploadResult, UploadError> {
        let start_time = Instant::now();
        let mut attempt = Attempt::new();

        let outcome = self.run(&mut attempt, file, credentials).await;

        metrics::record_upload_duration(
            &credentials.bucket_name,
            start_time.elapsed().as_secs_f64(),
        );

        match outcome {
            Ok(result) => {
                attempt.advance(UploadState::Succeeded);
                metrics::record_upload_success(&credentials.bucket_name, result.bytes_written);

                tracing::info!(
                    etag = %result.etag,
                    bytes_written = result.bytes_written,
                    duration_ms = result.duration.as_millis(),
                    "Upload completed"
                );

                report_progress(on_progress, 100);
                Ok(result)
            }
            Err(e) => {
                attempt.advance(UploadState::Failed);
                metrics::record_upload_failure(&credentials.bucket_name);
                metrics::record_error(e.kind());

                tracing::error!(error = %e, status = ?e.status(), "Upload failed");

                report_progress(on_progress, 0);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        attempt: &mut Attempt,
        file: &LocalFile,
        credentials: &Credentials,
    ) -> Result<UploadResult, UploadError> {
        credentials.validate()?;

        attempt.advance(UploadState::Preparing);
        let payload = file.read().await?;
        let digest = ContentDigest::compute(&payload.bytes);

        tracing::debug!(
            name = %payload.name,
            bytes = payload.byte_size(),
            mime_type = %payload.mime_type,
            digest = %digest,
            "File prepared for upload"
        );

        let command = build_request(credentials, payload, &digest, &self.storage);
        let client = (self.connect)(&command.endpoint);

        attempt.advance(UploadState::Sending);
        client.send(command.request).await.map_err(|e| match e {
            StorageError::Transport { status, message } => {
                UploadError::Transport { status, message }
            }
            StorageError::Unknown(detail) => {
                tracing::warn!(detail = %detail, "Unclassified storage failure");
                UploadError::Unknown
            }
        })
    }
}

fn report_progress(on_progress: Option<ProgressCallback>, progress: u8) {
    if let Some(callback) = on_progress {
        callback(progress);
        tracing::debug!(progress, "Upload progress reported");
    }
}
