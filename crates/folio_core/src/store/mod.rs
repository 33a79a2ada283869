//! The content store boundary and its backends.
//!
//! A store is a key space of blobs addressed by slash-separated paths, each
//! carrying an opaque version token. Directories are implied by paths. Every
//! mutation is compare-and-swap: creates must find the path empty, updates and
//! deletes must present the current token.

mod fs;
mod github;
mod memory;

pub use fs::FsStore;
pub use github::{GitHubConfig, GitHubStore};
pub use memory::MemoryStore;

use crate::config::{Backend, Config};
use crate::error::{FolioError, Result};
use crate::ContentHash;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// A blob.
    File,
    /// A directory containing further entries.
    Directory,
}

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Last path component.
    pub name: String,
    /// Full path from the store root.
    pub path: String,
    /// File or directory.
    pub kind: EntryKind,
}

impl Entry {
    /// Creates a file entry for `path`, deriving the name.
    pub fn file(path: impl Into<String>) -> Self {
        Self::new(path, EntryKind::File)
    }

    /// Creates a directory entry for `path`, deriving the name.
    pub fn directory(path: impl Into<String>) -> Self {
        Self::new(path, EntryKind::Directory)
    }

    fn new(path: impl Into<String>, kind: EntryKind) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self { name, path, kind }
    }

    /// Returns true for directories.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Blob contents together with the version they were read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// Raw contents.
    pub bytes: Vec<u8>,
    /// Version token to present on the next write or delete.
    pub hash: ContentHash,
}

/// Typed access to a remote or local blob store.
///
/// Implementations must honor these contracts:
///
/// - `list` returns children sorted by name; `NotFound` if `dir` is absent.
/// - `read` fails with `NotFound` for absent paths and `IsDirectory` for
///   directories.
/// - `write` without `expected` only creates (`AlreadyExists` if occupied);
///   with `expected` it replaces only if the current token matches
///   (`Conflict` otherwise, `NotFound` if the path is gone).
/// - `delete` removes only if the current token matches.
/// - Network and rate-limit failures surface as `Transient`, and repeating a
///   failed call verbatim is always safe.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Lists the entries directly under `dir` (`""` is the root).
    async fn list(&self, dir: &str) -> Result<Vec<Entry>>;

    /// Reads a blob and its current version token.
    async fn read(&self, path: &str) -> Result<Blob>;

    /// Creates (`expected = None`) or replaces a blob, returning the new token.
    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        expected: Option<&ContentHash>,
    ) -> Result<ContentHash>;

    /// Deletes a blob whose current token is `expected`.
    async fn delete(&self, path: &str, expected: &ContentHash) -> Result<()>;
}

/// Opens the backend selected in `config`.
pub fn open_store(config: &Config) -> Result<Arc<dyn ContentStore>> {
    match config.store.backend {
        Backend::Fs => Ok(Arc::new(FsStore::new(&config.store.root))),
        Backend::Github => {
            let github = GitHubConfig::from_config(&config.github)?;
            Ok(Arc::new(GitHubStore::new(github)?))
        }
    }
}

/// Normalizes a store path: strips leading, trailing and doubled slashes.
///
/// # Errors
///
/// Returns `InvalidInput` for `.` or `..` components and for backslashes.
pub(crate) fn clean_path(path: &str) -> Result<String> {
    let mut parts = Vec::new();
    for part in path.trim().split('/') {
        match part {
            "" => continue,
            "." | ".." => {
                return Err(FolioError::InvalidInput(format!(
                    "relative components are not allowed in store paths: {}",
                    path
                )))
            }
            p if p.contains('\\') => {
                return Err(FolioError::InvalidInput(format!(
                    "backslashes are not allowed in store paths: {}",
                    path
                )))
            }
            p => parts.push(p),
        }
    }
    Ok(parts.join("/"))
}

/// Like [`clean_path`], but the root itself is not a valid blob path.
pub(crate) fn clean_blob_path(path: &str) -> Result<String> {
    let cleaned = clean_path(path)?;
    if cleaned.is_empty() {
        return Err(FolioError::InvalidInput("empty blob path".to_string()));
    }
    Ok(cleaned)
}

/// Joins a directory and a child name.
pub(crate) fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}
