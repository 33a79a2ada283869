//! Version tokens and the canonical blob envelope used to compute them.

use crate::error::{FolioError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque version token identifying a blob's current content.
///
/// Every store hands one out on read and on successful write, and every
/// update or delete must present the token it last saw. Backends choose the
/// format: the GitHub backend uses the git blob SHA, the local backends use a
/// BLAKE3 digest over [`canonical_bytes`]. Callers must treat the value as
/// opaque and only compare it for equality.
///
/// # Examples
///
/// ```
/// use folio_core::ContentHash;
///
/// let a = ContentHash::for_blob(b"hello");
/// let b = ContentHash::for_blob(b"hello");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str().len(), 64);
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Length of a BLAKE3-derived token as a hex string.
    pub const HEX_LEN: usize = 64;

    /// Wraps a token handed out by a store.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the token is empty or contains whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_core::ContentHash;
    ///
    /// let sha = ContentHash::new("95b966ae1c166bd92f8ae7d1c313e738c731dfc3").unwrap();
    /// assert_eq!(sha.to_string(), "95b966ae1c166bd92f8ae7d1c313e738c731dfc3");
    /// assert!(ContentHash::new("  ").is_err());
    /// ```
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let token = token.trim();
        if token.is_empty() {
            return Err(FolioError::InvalidInput("empty version token".to_string()));
        }
        if token.chars().any(char::is_whitespace) {
            return Err(FolioError::InvalidInput(format!(
                "version token contains whitespace: {:?}",
                token
            )));
        }
        Ok(Self(token.to_string()))
    }

    /// Computes the token a local store assigns to `data`.
    pub fn for_blob(data: &[u8]) -> Self {
        let canonical = canonical_bytes(data);
        Self(hex::encode(blake3::hash(&canonical).as_bytes()))
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the first `n` characters, for log lines and listings.
    pub fn short(&self, n: usize) -> &str {
        match self.0.char_indices().nth(n) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({}...)", self.short(12))
    }
}

impl std::str::FromStr for ContentHash {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Canonical envelope magic bytes.
pub(crate) const MAGIC: &[u8; 6] = b"FOLIO1";

/// Constructs canonical bytes for hashing.
///
/// Format:
/// - Magic: "FOLIO1" (6 bytes)
/// - Length: u64 LE (8 bytes)
/// - Payload: variable bytes
pub(crate) fn canonical_bytes(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAGIC.len() + 8 + payload.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    out.extend_from_slice(payload);
    out
}
