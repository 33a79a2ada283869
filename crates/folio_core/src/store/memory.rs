//! In-process store keyed by path.

use super::{clean_blob_path, clean_path, Blob, ContentStore, Entry, EntryKind};
use crate::error::{FolioError, Result};
use crate::ContentHash;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::debug;

/// A [`ContentStore`] held entirely in memory.
///
/// Tokens are BLAKE3 digests of the content, as with [`super::FsStore`].
/// Besides backing tests and demos, it counts calls and can inject transient
/// failures so retry and validation paths can be observed.
///
/// # Examples
///
/// ```
/// use folio_core::{ContentStore, MemoryStore};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = MemoryStore::new();
/// let h1 = store.write("_posts/a.md", b"one", None).await.unwrap();
/// let h2 = store.write("_posts/a.md", b"two", Some(&h1)).await.unwrap();
///
/// // The stale token is rejected.
/// assert!(store.write("_posts/a.md", b"three", Some(&h1)).await.is_err());
/// assert_eq!(store.read("_posts/a.md").await.unwrap().hash, h2);
/// # });
/// ```
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<BTreeMap<String, (Vec<u8>, ContentHash)>>,
    pending_failures: AtomicU32,
    calls: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` at `path` without any precondition.
    ///
    /// Stands in for edits made outside this system, e.g. a hand edit pushed
    /// straight to the repository.
    pub fn put_unchecked(&self, path: &str, bytes: impl Into<Vec<u8>>) -> ContentHash {
        let bytes = bytes.into();
        let hash = ContentHash::for_blob(&bytes);
        let path = clean_path(path).unwrap_or_else(|_| path.to_string());
        self.blobs.lock().insert(path, (bytes, hash.clone()));
        hash
    }

    /// Returns the stored bytes at `path` without counting a call.
    pub fn raw(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs.lock().get(path).map(|(bytes, _)| bytes.clone())
    }

    /// Makes the next `count` calls fail with `Transient`.
    pub fn fail_next(&self, count: u32) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Number of trait calls served so far, failed ones included.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of blobs stored.
    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn begin(&self, op: &str, path: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            debug!(op, path, "injected transient failure");
            return Err(FolioError::Transient(format!(
                "injected failure during {} of {}",
                op, path
            )));
        }
        Ok(())
    }
}

fn is_directory(blobs: &BTreeMap<String, (Vec<u8>, ContentHash)>, path: &str) -> bool {
    let prefix = format!("{}/", path);
    blobs
        .range(prefix.clone()..)
        .next()
        .is_some_and(|(key, _)| key.starts_with(&prefix))
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list(&self, dir: &str) -> Result<Vec<Entry>> {
        self.begin("list", dir)?;
        let dir = clean_path(dir)?;
        let blobs = self.blobs.lock();

        if blobs.contains_key(&dir) {
            return Err(FolioError::InvalidInput(format!("not a directory: {}", dir)));
        }

        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };

        let mut children: BTreeMap<&str, EntryKind> = BTreeMap::new();
        for key in blobs.keys().filter(|k| k.starts_with(&prefix)) {
            let rest = &key[prefix.len()..];
            match rest.split_once('/') {
                Some((child, _)) => {
                    children.insert(child, EntryKind::Directory);
                }
                None => {
                    children.entry(rest).or_insert(EntryKind::File);
                }
            }
        }

        if children.is_empty() && !dir.is_empty() {
            return Err(FolioError::NotFound(dir));
        }

        Ok(children
            .into_iter()
            .map(|(name, kind)| Entry {
                name: name.to_string(),
                path: format!("{}{}", prefix, name),
                kind,
            })
            .collect())
    }

    async fn read(&self, path: &str) -> Result<Blob> {
        self.begin("read", path)?;
        let path = clean_blob_path(path)?;
        let blobs = self.blobs.lock();
        match blobs.get(&path) {
            Some((bytes, hash)) => Ok(Blob {
                bytes: bytes.clone(),
                hash: hash.clone(),
            }),
            None if is_directory(&blobs, &path) => Err(FolioError::IsDirectory(path)),
            None => Err(FolioError::NotFound(path)),
        }
    }

    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        expected: Option<&ContentHash>,
    ) -> Result<ContentHash> {
        self.begin("write", path)?;
        let path = clean_blob_path(path)?;
        let mut blobs = self.blobs.lock();

        if is_directory(&blobs, &path) {
            return Err(FolioError::IsDirectory(path));
        }

        match (blobs.get(&path), expected) {
            (Some(_), None) => return Err(FolioError::AlreadyExists(path)),
            (None, Some(_)) => return Err(FolioError::NotFound(path)),
            (Some((_, current)), Some(expected)) if current != expected => {
                return Err(FolioError::Conflict {
                    path,
                    expected: expected.to_string(),
                })
            }
            _ => {}
        }

        let hash = ContentHash::for_blob(bytes);
        blobs.insert(path, (bytes.to_vec(), hash.clone()));
        Ok(hash)
    }

    async fn delete(&self, path: &str, expected: &ContentHash) -> Result<()> {
        self.begin("delete", path)?;
        let path = clean_blob_path(path)?;
        let mut blobs = self.blobs.lock();

        match blobs.get(&path) {
            None if is_directory(&blobs, &path) => Err(FolioError::IsDirectory(path)),
            None => Err(FolioError::NotFound(path)),
            Some((_, current)) if current != expected => Err(FolioError::Conflict {
                path,
                expected: expected.to_string(),
            }),
            Some(_) => {
                blobs.remove(&path);
                Ok(())
            }
        }
    }
}
