//! Local credential persistence
//!
//! Credentials live as JSON in `<dir>/cloudflareAuth.json`. They are written
//! on login, read once when a command starts, and removed on logout.

use super::{Credentials, CredentialsError};
use std::io;
use std::path::{Path, PathBuf};

/// Fixed storage key the credentials are saved under
pub const STORAGE_KEY: &str = "cloudflareAuth";

/// File-backed credential store
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store rooted at `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", STORAGE_KEY)),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate and persist credentials
    pub fn login(&self, credentials: &Credentials) -> Result<(), CredentialsError> {
        credentials.validate().map_err(|e| {
            CredentialsError::InvalidCredentials(format!("Invalid authentication data: {}", e))
        })?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(credentials)?;
        write_private(&self.path, &json)?;

        tracing::debug!(path = %self.path.display(), "Credentials saved");
        Ok(())
    }

    /// Read persisted credentials
    ///
    /// A missing file means "not logged in". A file that no longer parses is
    /// deleted and treated the same way.
    pub fn load(&self) -> Result<Option<Credentials>, CredentialsError> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Credentials>(&content) {
            Ok(credentials) => Ok(Some(credentials)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to parse stored credentials, discarding"
                );
                self.logout()?;
                Ok(None)
            }
        }
    }

    /// Remove persisted credentials
    pub fn logout(&self) -> Result<(), CredentialsError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Credentials removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    std::fs::write(path, contents)
}
