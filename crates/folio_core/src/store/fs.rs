//! Local directory backend.
//!
//! Blobs are plain files under a root directory, so a checked-out site can be
//! edited in place. Version tokens are BLAKE3 digests of file contents.
//! Mutations serialize on an exclusive lock over `.folio.lock` in the root,
//! which makes the compare and the swap one step even across processes.

use super::{clean_blob_path, clean_path, join, Blob, ContentStore, Entry, EntryKind};
use crate::error::{FolioError, Result};
use crate::ContentHash;
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const LOCK_FILE: &str = ".folio.lock";

/// A [`ContentStore`] over a local directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|p| !p.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(FsStore) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(store))
            .await
            .map_err(|e| FolioError::Io(std::io::Error::other(e)))?
    }

    fn lock(&self) -> Result<LockGuard> {
        fs::create_dir_all(&self.root)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.root.join(LOCK_FILE))?;
        file.lock_exclusive()?;
        Ok(LockGuard { file })
    }

    fn list_sync(&self, dir: &str) -> Result<Vec<Entry>> {
        let dir = clean_path(dir)?;
        let full = self.resolve(&dir);

        let read_dir = match fs::read_dir(&full) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if dir.is_empty() {
                    return Ok(Vec::new());
                }
                return Err(FolioError::NotFound(dir));
            }
            Err(_) if full.is_file() => {
                return Err(FolioError::InvalidInput(format!("not a directory: {}", dir)))
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_internal(&name) {
                continue;
            }
            let kind = if entry.file_type()?.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(Entry {
                path: join(&dir, &name),
                name,
                kind,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn current(&self, path: &str) -> Result<Option<Blob>> {
        let full = self.resolve(path);
        if full.is_dir() {
            return Err(FolioError::IsDirectory(path.to_string()));
        }
        match fs::read(&full) {
            Ok(bytes) => {
                let hash = ContentHash::for_blob(&bytes);
                Ok(Some(Blob { bytes, hash }))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_sync(&self, path: &str) -> Result<Blob> {
        let path = clean_blob_path(path)?;
        self.current(&path)?.ok_or(FolioError::NotFound(path))
    }

    fn write_sync(
        &self,
        path: &str,
        bytes: &[u8],
        expected: Option<&ContentHash>,
    ) -> Result<ContentHash> {
        let path = clean_blob_path(path)?;
        let _lock = self.lock()?;

        match (self.current(&path)?, expected) {
            (Some(_), None) => return Err(FolioError::AlreadyExists(path)),
            (None, Some(_)) => return Err(FolioError::NotFound(path)),
            (Some(blob), Some(expected)) if &blob.hash != expected => {
                return Err(FolioError::Conflict {
                    path,
                    expected: expected.to_string(),
                })
            }
            _ => {}
        }

        let full = self.resolve(&path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&full, bytes)?;
        debug!(path = %path, len = bytes.len(), "wrote blob");
        Ok(ContentHash::for_blob(bytes))
    }

    fn delete_sync(&self, path: &str, expected: &ContentHash) -> Result<()> {
        let path = clean_blob_path(path)?;
        let _lock = self.lock()?;

        match self.current(&path)? {
            None => Err(FolioError::NotFound(path)),
            Some(blob) if &blob.hash != expected => Err(FolioError::Conflict {
                path,
                expected: expected.to_string(),
            }),
            Some(_) => {
                fs::remove_file(self.resolve(&path))?;
                debug!(path = %path, "deleted blob");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ContentStore for FsStore {
    async fn list(&self, dir: &str) -> Result<Vec<Entry>> {
        let dir = dir.to_string();
        self.blocking(move |s| s.list_sync(&dir)).await
    }

    async fn read(&self, path: &str) -> Result<Blob> {
        let path = path.to_string();
        self.blocking(move |s| s.read_sync(&path)).await
    }

    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        expected: Option<&ContentHash>,
    ) -> Result<ContentHash> {
        let path = path.to_string();
        let bytes = bytes.to_vec();
        let expected = expected.cloned();
        self.blocking(move |s| s.write_sync(&path, &bytes, expected.as_ref()))
            .await
    }

    async fn delete(&self, path: &str, expected: &ContentHash) -> Result<()> {
        let path = path.to_string();
        let expected = expected.clone();
        self.blocking(move |s| s.delete_sync(&path, &expected)).await
    }
}

/// Holds the store lock until dropped.
struct LockGuard {
    file: File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn is_internal(name: &str) -> bool {
    name == LOCK_FILE || (name.starts_with('.') && name.ends_with(".tmp"))
}

/// Writes `bytes` to `path` via temp file, fsync and rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("blob");
    let tmp_path = path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()));

    let written = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    #[cfg(unix)]
    {
        if let Some(parent) = path.parent() {
            if let Ok(dir_file) = File::open(parent) {
                let _ = dir_file.sync_all();
            }
        }
    }

    Ok(())
}
