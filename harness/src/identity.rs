//! Content identity: the MD5 name every snippet is stored and correlated under.

use std::fmt;

use md5::{Digest, Md5};

/// Suffix appended to an identity to form a content store file name.
pub const CONTENT_SUFFIX: &str = ".c";

/// Hex-encoded MD5 digest of a snippet's exact bytes.
///
/// The same value names the snippet's file in the content store and is
/// recovered from the engine's file paths during verification.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentId(String);

impl ContentId {
    /// Computes the identity of a snippet.
    pub fn of(snippet: &str) -> Self {
        Self(format!("{:x}", Md5::digest(snippet.as_bytes())))
    }

    /// Reduces an engine file path to the identity it was materialized under.
    ///
    /// Directory components are dropped, then everything from the first
    /// occurrence of [`CONTENT_SUFFIX`] onwards.
    pub fn from_path(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        let stem = name.split(CONTENT_SUFFIX).next().unwrap_or(name);
        Self(stem.to_string())
    }

    /// Returns true if this looks like an MD5 digest (32 lowercase hex chars).
    ///
    /// Identities reduced from arbitrary engine paths need not be.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 32
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    /// File name of this identity inside a content store.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.0, CONTENT_SUFFIX)
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
