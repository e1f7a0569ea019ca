//! R2 Uploadr Library
//!
//! Uploads a single local file to a Cloudflare R2 bucket.
//!
//! # Features
//!
//! - **Conditional Writes**: The MD5 of the content is sent as `if-none-match`,
//!   so unchanged content is not written twice
//! - **S3 Compatible**: Requests are signed and sent with `aws-sdk-s3`
//! - **Credential Bootstrap**: Credentials are fetched with an API key and
//!   persisted locally
//! - **Credential Server**: The issuing endpoint itself, for self-hosting
//!
//! # Example
//!
//! ```no_run
//! use r2_uploadr::{auth::AuthClient, config::Config, upload::{upload_file, LocalFile}};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("r2-uploadr.yaml")?;
//!     let creds = AuthClient::new(&config.auth)?.get_auth("api-key").await?;
//!     let result = upload_file(&LocalFile::new("photo.jpg"), &creds, &config.storage, None).await?;
//!     println!("ETag: {}", result.etag);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod credentials;
pub mod metrics;
pub mod s3;
pub mod server;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use credentials::{CredentialStore, Credentials};
pub use upload::{upload_file, UploadError, UploadResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
