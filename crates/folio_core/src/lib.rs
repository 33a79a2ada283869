//! Folio Core Library
//!
//! A document store for static-site articles kept in a content-addressed
//! blob store, providing:
//! - A front matter codec for Markdown documents
//! - A compare-and-swap store boundary with GitHub, local and in-memory backends
//! - Document operations that never silently overwrite
//! - A derived tag and author index
//! - Write-once image assets
//!
//! # Quick Start
//!
//! ```
//! use folio_core::{DocumentFields, DocumentRepository, MemoryStore};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let repo = DocumentRepository::new(Arc::new(MemoryStore::new()));
//!
//! let mut fields = DocumentFields::new("Club Meeting", "Hello");
//! fields.author = "Alice".to_string();
//! fields.tags = vec!["meetup".to_string()];
//! let created = repo.create_document(fields).await.unwrap();
//!
//! let read = repo.get_document(&created.path).await.unwrap();
//! assert_eq!(read.hash, created.hash);
//! assert_eq!(read.document.meta.author, "Alice");
//! # });
//! ```
//!
//! # Features
//!
//! ## Front Matter Codec
//!
//! Documents are a YAML header between `---` lines followed by the body:
//!
//! ```
//! use folio_core::codec;
//!
//! let doc = codec::parse(b"---\ntitle: Hi\ntags: solo\n---\nBody").unwrap();
//! assert_eq!(doc.meta.tags, ["solo"]);
//! assert!(doc.meta.published);
//! assert_eq!(doc.body, "Body");
//! ```
//!
//! ## Optimistic Concurrency
//!
//! Every read hands out a [`ContentHash`]; updates and deletes must present
//! the one they read, or fail with [`FolioError::Conflict`]:
//!
//! ```
//! use folio_core::{ContentStore, FolioError, MemoryStore};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = MemoryStore::new();
//! let h1 = store.write("_posts/a.md", b"v1", None).await.unwrap();
//! store.write("_posts/a.md", b"v2", Some(&h1)).await.unwrap();
//!
//! let stale = store.delete("_posts/a.md", &h1).await;
//! assert!(matches!(stale, Err(FolioError::Conflict { .. })));
//! # });
//! ```

pub mod assets;
mod auth;
pub mod codec;
mod config;
mod content_hash;
mod editor;
mod error;
mod index;
mod repository;
mod retry;
mod store;
mod types;

pub use assets::AssetStore;
pub use auth::{AccessGate, AllowAll, AllowList, Identity};
pub use config::{
    AccessSection, Backend, Config, FetchSection, GithubSection, LayoutSection, RetrySection,
    StoreSection, ALLOWED_ENV, CONFIG_FILE, DEFAULT_CONFIG_TEMPLATE,
};
pub use content_hash::ContentHash;
pub use editor::Editor;
pub use error::{FolioError, Result};
pub use index::MetadataIndex;
pub use repository::{sort_summaries, DocumentRepository, RepositoryConfig, DOCUMENT_EXTENSION};
pub use retry::RetryPolicy;
pub use store::{
    open_store, Blob, ContentStore, Entry, EntryKind, FsStore, GitHubConfig, GitHubStore,
    MemoryStore,
};
pub use types::*;

/// Time provider trait for testing.
///
/// Allows injecting controlled time into repositories and asset stores.
/// Only used when explicitly set via `with_time_provider()`; otherwise the
/// system clock applies.
pub trait TimeProvider: Send + Sync {
    /// Returns the current Unix timestamp in milliseconds.
    fn now_millis(&self) -> i64;
}

impl<F> TimeProvider for F
where
    F: Fn() -> i64 + Send + Sync,
{
    fn now_millis(&self) -> i64 {
        self()
    }
}

pub(crate) fn now_millis(provider: Option<&dyn TimeProvider>) -> i64 {
    match provider {
        Some(p) => p.now_millis(),
        None => chrono::Utc::now().timestamp_millis(),
    }
}

/// UTC calendar date of an epoch-millisecond timestamp.
pub(crate) fn date_from_millis(millis: i64) -> Result<chrono::NaiveDate> {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(millis)
        .map(|t| t.date_naive())
        .ok_or_else(|| FolioError::InvalidInput(format!("timestamp out of range: {}", millis)))
}
