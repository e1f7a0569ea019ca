//! Content digest used as the conditional-write token
//!
//! The digest is the hex MD5 of the payload, which is the ETag an
//! S3-compatible store assigns to a single-part object. It identifies
//! content; it is not used for integrity or authentication.

use md5::{Digest, Md5};
use std::fmt;

/// Hex-encoded MD5 of an upload body
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Hash a buffer. Any input, including an empty one, yields a digest.
    pub fn compute(bytes: &[u8]) -> Self {
        Self(hex::encode(Md5::digest(bytes)))
    }

    /// The bare hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The digest in entity-tag form, as sent in `if-none-match`
    pub fn etag(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
