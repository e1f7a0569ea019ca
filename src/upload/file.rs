//! Local file source and the in-memory payload read from it

use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};

/// A file on local disk, not yet read
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    content_type: Option<String>,
}

impl LocalFile {
    /// Reference a file, letting its MIME type be guessed from the extension
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content_type: None,
        }
    }

    /// Use an explicit MIME type instead of guessing
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file into memory
    ///
    /// The object name is the last path component, which must be valid
    /// UTF-8 so the key matches the file name exactly. An unknown extension
    /// leaves the MIME type empty so the request builder applies its default.
    pub async fn read(&self) -> io::Result<FilePayload> {
        let name = self
            .path
            .file_name()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no file name", self.path.display()),
                )
            })?
            .to_str()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} is not a valid UTF-8 file name", self.path.display()),
                )
            })?
            .to_string();

        let mime_type = match &self.content_type {
            Some(content_type) => content_type.clone(),
            None => mime_guess::from_path(&self.path)
                .first_raw()
                .unwrap_or_default()
                .to_string(),
        };

        let bytes = Bytes::from(tokio::fs::read(&self.path).await?);

        Ok(FilePayload::new(name, mime_type, bytes))
    }
}

/// File contents plus the metadata the upload needs
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_guesses_mime_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt");
        std::fs::write(&path, b"hello world").unwrap();

        let payload = LocalFile::new(&path).read().await.unwrap();
        assert_eq!(payload.name, "x.txt");
        assert_eq!(payload.mime_type, "text/plain");
        assert_eq!(payload.byte_size(), 11);
        assert_eq!(&payload.bytes[..], b"hello world");
    }

    #[tokio::test]
    async fn test_unknown_extension_leaves_mime_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.zzqx");
        std::fs::write(&path, b"\x00\x01").unwrap();

        let payload = LocalFile::new(&path).read().await.unwrap();
        assert_eq!(payload.mime_type, "");
    }

    #[tokio::test]
    async fn test_explicit_content_type_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, b"{}").unwrap();

        let payload = LocalFile::new(&path)
            .with_content_type("application/json")
            .read()
            .await
            .unwrap();
        assert_eq!(payload.mime_type, "application/json");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_non_utf8_file_name_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OsStr::from_bytes(b"bad\xffname.txt"));
        std::fs::write(&path, b"data").unwrap();

        let err = LocalFile::new(&path).read().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = LocalFile::new("/nonexistent/file.bin").read().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();

        let payload = LocalFile::new(&path).read().await.unwrap();
        assert_eq!(payload.byte_size(), 0);
    }
}
