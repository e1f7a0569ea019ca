//! PutObject request construction
//!
//! Turns credentials, a file payload and its digest into the request the
//! storage client sends, plus the endpoint the client connects to. The
//! digest rides along as an `if-none-match` precondition, so a store that
//! already holds the same bytes under the key answers 412 instead of
//! accepting a duplicate write.
//!
//! # Example
//!
//! ```
//! use r2_uploadr::config::StorageConfig;
//! use r2_uploadr::credentials::Credentials;
//! use r2_uploadr::upload::digest::ContentDigest;
//! use r2_uploadr::upload::file::FilePayload;
//! use r2_uploadr::upload::request::build_request;
//!
//! let creds = Credentials::new("a1", "k1", "s1", "b1");
//! let file = FilePayload::new("x.txt", "text/plain", "hello world");
//! let digest = ContentDigest::compute(&file.bytes);
//!
//! let command = build_request(&creds, file, &digest, &StorageConfig::default());
//! assert_eq!(command.request.bucket, "b1");
//! assert_eq!(command.request.key, "x.txt");
//! assert_eq!(command.endpoint.url, "https://a1.r2.cloudflarestorage.com");
//! ```

use super::digest::ContentDigest;
use super::file::FilePayload;
use crate::config::StorageConfig;
use crate::credentials::Credentials;
use bytes::Bytes;
use std::fmt;

/// Content type used when the source file declares none
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A single conditional PutObject
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bucket: String,
    pub key: String,
    pub body: Bytes,
    pub content_length: u64,
    pub content_type: String,
    /// Quoted entity tag for the `if-none-match` header
    pub if_none_match: String,
}

/// Where and as whom the storage client connects
#[derive(Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub url: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("url", &self.url)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Request plus the endpoint it must be sent to
#[derive(Debug, Clone)]
pub struct UploadCommand {
    pub request: UploadRequest,
    pub endpoint: EndpointConfig,
}

/// Endpoint URL for an account: the configured override, or
/// `https://<account id>.<host>`
pub fn endpoint_url(account_id: &str, storage: &StorageConfig) -> String {
    match &storage.endpoint {
        Some(endpoint) => endpoint.clone(),
        None => format!("https://{}.{}", account_id, storage.host),
    }
}

/// Build the upload command
///
/// The object key is the file name as given; a same-named object is
/// overwritten unless the precondition rejects the write.
pub fn build_request(
    credentials: &Credentials,
    file: FilePayload,
    digest: &ContentDigest,
    storage: &StorageConfig,
) -> UploadCommand {
    let content_type = if file.mime_type.is_empty() {
        DEFAULT_CONTENT_TYPE.to_string()
    } else {
        file.mime_type
    };
    let content_length = file.bytes.len() as u64;

    let request = UploadRequest {
        bucket: credentials.bucket_name.clone(),
        key: file.name,
        body: file.bytes,
        content_length,
        content_type,
        if_none_match: digest.etag(),
    };

    let endpoint = EndpointConfig {
        url: endpoint_url(&credentials.account_id, storage),
        region: storage.region.clone(),
        access_key_id: credentials.access_key_id.clone(),
        secret_access_key: credentials.secret_access_key.clone(),
    };

    UploadCommand { request, endpoint }
}
