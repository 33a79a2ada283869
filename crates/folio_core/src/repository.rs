//! Document-level operations over a [`ContentStore`].
//!
//! The repository composes the codec with a store. It owns no cache: every
//! call goes to the store, and the version token a caller holds is the only
//! thing tying an update to what was read.

use crate::codec::{self, normalize_tags};
use crate::config::Config;
use crate::error::{FolioError, Result};
use crate::index::MetadataIndex;
use crate::retry::RetryPolicy;
use crate::store::{join, ContentStore, Entry};
use crate::types::{Document, DocumentFields, DocumentMeta, DocumentSummary, VersionedDocument};
use crate::{date_from_millis, now_millis, ContentHash, TimeProvider};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Extension of document blobs.
pub const DOCUMENT_EXTENSION: &str = ".md";

/// Where documents live and how they are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Store directory holding one blob per document.
    pub posts_dir: String,
    /// Literal written to every header's `layout` key.
    pub layout: String,
    /// Reads in flight at once while listing.
    pub max_concurrent_reads: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            posts_dir: "_posts".to_string(),
            layout: codec::DEFAULT_LAYOUT.to_string(),
            max_concurrent_reads: 8,
        }
    }
}

impl RepositoryConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            posts_dir: config.layout.posts_dir.trim_matches('/').to_string(),
            layout: config.layout.layout.clone(),
            max_concurrent_reads: config.fetch.max_concurrent_reads.max(1),
        }
    }
}

/// Documents stored as `{posts_dir}/{YYYY-MM-DD}-{slug}.md` blobs.
///
/// # Examples
///
/// ```
/// use folio_core::{DocumentFields, DocumentRepository, FolioError, MemoryStore};
/// use std::sync::Arc;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let repo = DocumentRepository::new(Arc::new(MemoryStore::new()));
///
/// let mut fields = DocumentFields::new("Club Meeting", "Hello");
/// fields.date = chrono::NaiveDate::from_ymd_opt(2024, 6, 1);
/// let created = repo.create_document(fields.clone()).await.unwrap();
/// assert_eq!(created.path, "2024-06-01-Club-Meeting.md");
///
/// fields.tags = vec!["social".to_string()];
/// let updated = repo
///     .update_document(&created.path, fields.clone(), &created.hash)
///     .await
///     .unwrap();
///
/// // The first token is stale now.
/// let stale = repo.update_document(&created.path, fields, &created.hash).await;
/// assert!(matches!(stale, Err(FolioError::Conflict { .. })));
///
/// repo.delete_document(&updated.path, &updated.hash).await.unwrap();
/// # });
/// ```
pub struct DocumentRepository<S: ContentStore + ?Sized = dyn ContentStore> {
    store: Arc<S>,
    config: RepositoryConfig,
    retry: RetryPolicy,
    time_provider: Option<Arc<dyn TimeProvider>>,
}

impl<S: ContentStore + ?Sized> DocumentRepository<S> {
    /// Creates a repository with default layout and retry policy.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: RepositoryConfig::default(),
            retry: RetryPolicy::default(),
            time_provider: None,
        }
    }

    /// Creates a repository using the layout, fetch and retry sections of `config`.
    pub fn from_config(store: Arc<S>, config: &Config) -> Self {
        Self::new(store)
            .with_config(RepositoryConfig::from_config(config))
            .with_retry_policy(config.retry.to_policy())
    }

    #[must_use]
    pub fn with_config(mut self, config: RepositoryConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets a custom time provider, in epoch milliseconds, for creation dates.
    #[must_use]
    pub fn with_time_provider(mut self, provider: impl TimeProvider + 'static) -> Self {
        self.time_provider = Some(Arc::new(provider));
        self
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the layout in use.
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Returns the store key of a document path.
    pub fn store_path(&self, path: &str) -> String {
        join(&self.config.posts_dir, path)
    }

    /// Reads and parses every document.
    ///
    /// Sorted by date descending; equal or missing dates fall back to path
    /// descending, and undated documents come last. Documents that fail to
    /// parse stay in the listing with `meta: None`. Documents deleted between
    /// the directory listing and their read are skipped.
    ///
    /// # Errors
    ///
    /// `AccessDenied`, and `Transient` once retries are exhausted. A missing
    /// posts directory is an empty listing.
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let dir = self.config.posts_dir.as_str();
        let entries = match self.retry.run("list", || self.store.list(dir)).await {
            Ok(entries) => entries,
            Err(FolioError::NotFound(_)) => {
                debug!(dir, "posts directory missing, listing is empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let files: Vec<Entry> = entries
            .into_iter()
            .filter(|e| !e.is_dir() && e.name.ends_with(DOCUMENT_EXTENSION))
            .collect();
        debug!(dir, count = files.len(), "fetching documents");

        let fetched: Vec<Result<Option<DocumentSummary>>> = stream::iter(files)
            .map(|entry| self.summarize(entry))
            .buffer_unordered(self.config.max_concurrent_reads.max(1))
            .collect()
            .await;

        let mut summaries = Vec::with_capacity(fetched.len());
        for summary in fetched {
            if let Some(summary) = summary? {
                summaries.push(summary);
            }
        }
        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    /// Lists documents carrying `tag`.
    pub async fn list_by_tag(&self, tag: &str) -> Result<Vec<DocumentSummary>> {
        let tag = tag.trim();
        let mut summaries = self.list_documents().await?;
        summaries.retain(|s| s.tags().iter().any(|t| t == tag));
        Ok(summaries)
    }

    /// Builds the tag and author index from a fresh listing.
    pub async fn build_index(&self) -> Result<MetadataIndex> {
        let summaries = self.list_documents().await?;
        Ok(MetadataIndex::from_summaries(&summaries))
    }

    async fn summarize(&self, entry: Entry) -> Result<Option<DocumentSummary>> {
        let blob = match self.retry.run("read", || self.store.read(&entry.path)).await {
            Ok(blob) => blob,
            Err(FolioError::NotFound(_)) => {
                debug!(path = %entry.path, "document vanished during listing");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let (meta, parse_error) = match codec::parse(&blob.bytes) {
            Ok(doc) => (Some(doc.meta), None),
            Err(e) => {
                warn!(path = %entry.path, "listing unparseable document: {}", e);
                (None, Some(e.to_string()))
            }
        };

        Ok(Some(DocumentSummary {
            path: entry.name,
            store_path: entry.path,
            hash: blob.hash,
            meta,
            parse_error,
        }))
    }

    /// Reads one document with the token it was read at.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `MalformedDocument` if its header does not decode.
    pub async fn get_document(&self, path: &str) -> Result<VersionedDocument> {
        check_document_path(path)?;
        let store_path = self.store_path(path);
        let blob = self
            .retry
            .run("read", || self.store.read(&store_path))
            .await?;
        let document = codec::parse(&blob.bytes).map_err(|e| e.at(&store_path))?;
        Ok(VersionedDocument {
            path: path.to_string(),
            hash: blob.hash,
            document,
        })
    }

    /// Creates a document at `{date}-{slug(title)}.md`.
    ///
    /// A missing date means today. Never overwrites: a same-day same-title
    /// document fails with `AlreadyExists`.
    pub async fn create_document(&self, fields: DocumentFields) -> Result<VersionedDocument> {
        let mut document = validate(fields)?;
        let date = match document.meta.date {
            Some(date) => date,
            None => self.today()?,
        };
        document.meta.date = Some(date);
        let path = codec::document_path(date, &document.meta.title);
        check_document_path(&path)?;

        let hash = self.put(&path, &document, None).await?;
        info!(path = %path, hash = %hash.short(12), "created document");
        Ok(VersionedDocument {
            path,
            hash,
            document,
        })
    }

    /// Replaces a document wholesale if `expected` is still current.
    ///
    /// Every field is rewritten. A missing date falls back to the one in the
    /// path, so the document keeps its place in listings.
    ///
    /// # Errors
    ///
    /// `Conflict` if someone else wrote in between, `NotFound` if it was
    /// deleted, `InvalidInput` before any store call.
    pub async fn update_document(
        &self,
        path: &str,
        fields: DocumentFields,
        expected: &ContentHash,
    ) -> Result<VersionedDocument> {
        check_document_path(path)?;
        let mut document = validate(fields)?;
        if document.meta.date.is_none() {
            document.meta.date = date_from_path(path);
        }

        let hash = self.put(path, &document, Some(expected)).await?;
        info!(path, from = %expected.short(12), to = %hash.short(12), "updated document");
        Ok(VersionedDocument {
            path: path.to_string(),
            hash,
            document,
        })
    }

    /// Deletes a document if `expected` is still current.
    pub async fn delete_document(&self, path: &str, expected: &ContentHash) -> Result<()> {
        check_document_path(path)?;
        let store_path = self.store_path(path);
        self.retry
            .run("delete", || self.store.delete(&store_path, expected))
            .await?;
        info!(path, hash = %expected.short(12), "deleted document");
        Ok(())
    }

    /// Moves a document to the path its (new) date and title derive, writing
    /// `fields` there.
    ///
    /// Creates the new blob first, then deletes the old one under `expected`.
    /// If that delete fails the new blob is removed again and the delete's
    /// error is returned, so a stale token never leaves two copies behind.
    /// An old path that is already gone counts as deleted, so a delete whose
    /// reply was lost never triggers the rollback.
    /// When the path does not change this is a plain update.
    pub async fn rename_document(
        &self,
        path: &str,
        fields: DocumentFields,
        expected: &ContentHash,
    ) -> Result<VersionedDocument> {
        check_document_path(path)?;
        let mut document = validate(fields)?;
        let date = match document.meta.date {
            Some(date) => date,
            None => self.today()?,
        };
        document.meta.date = Some(date);
        let new_path = codec::document_path(date, &document.meta.title);
        check_document_path(&new_path)?;

        if new_path == path {
            let hash = self.put(path, &document, Some(expected)).await?;
            return Ok(VersionedDocument {
                path: new_path,
                hash,
                document,
            });
        }

        let hash = self.create_or_adopt(&new_path, &document).await?;
        let old_store_path = self.store_path(path);
        let removed = match self
            .retry
            .run("delete", || self.store.delete(&old_store_path, expected))
            .await
        {
            // An earlier attempt landed before its reply was lost.
            Err(FolioError::NotFound(_)) => {
                debug!(path, "old copy already gone");
                Ok(())
            }
            other => other,
        };

        if let Err(e) = removed {
            warn!(from = path, to = %new_path, "rename aborted, removing new copy: {}", e);
            let new_store_path = self.store_path(&new_path);
            if let Err(cleanup) = self
                .retry
                .run("delete", || self.store.delete(&new_store_path, &hash))
                .await
            {
                warn!(path = %new_path, "failed to remove new copy after aborted rename: {}", cleanup);
            }
            return Err(e);
        }

        info!(from = path, to = %new_path, hash = %hash.short(12), "renamed document");
        Ok(VersionedDocument {
            path: new_path,
            hash,
            document,
        })
    }

    /// Creates `path`, treating an existing blob with exactly these bytes as
    /// an earlier attempt of this same create.
    async fn create_or_adopt(&self, path: &str, document: &Document) -> Result<ContentHash> {
        let bytes = codec::serialize(document, &self.config.layout)?;
        let store_path = self.store_path(path);
        match self
            .retry
            .run("write", || self.store.write(&store_path, &bytes, None))
            .await
        {
            Err(FolioError::AlreadyExists(existing)) => {
                let blob = self
                    .retry
                    .run("read", || self.store.read(&store_path))
                    .await?;
                if blob.bytes != bytes {
                    return Err(FolioError::AlreadyExists(existing));
                }
                debug!(path, "create already landed");
                Ok(blob.hash)
            }
            other => other,
        }
    }

    async fn put(
        &self,
        path: &str,
        document: &Document,
        expected: Option<&ContentHash>,
    ) -> Result<ContentHash> {
        let bytes = codec::serialize(document, &self.config.layout)?;
        let store_path = self.store_path(path);
        self.retry
            .run("write", || self.store.write(&store_path, &bytes, expected))
            .await
    }

    fn today(&self) -> Result<chrono::NaiveDate> {
        date_from_millis(now_millis(self.time_provider.as_deref()))
    }
}

/// Sorts by date descending, then path descending; undated documents last.
pub fn sort_summaries(summaries: &mut [DocumentSummary]) {
    summaries.sort_by(|a, b| b.date().cmp(&a.date()).then_with(|| b.path.cmp(&a.path)));
}

/// Checks fields and turns them into the document that will be stored.
///
/// Runs before any store call.
fn validate(fields: DocumentFields) -> Result<Document> {
    let title = fields.title.trim();
    if title.is_empty() {
        return Err(FolioError::InvalidInput("title must not be empty".to_string()));
    }
    if fields.body.trim().is_empty() {
        return Err(FolioError::InvalidInput("body must not be empty".to_string()));
    }

    Ok(Document {
        meta: DocumentMeta {
            title: title.to_string(),
            author: fields.author.trim().to_string(),
            tags: normalize_tags(&fields.tags),
            date: fields.date,
            published: fields.published,
            thumbnail: fields
                .thumbnail
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        },
        body: fields.body,
    })
}

/// Date prefix of a `YYYY-MM-DD-slug.md` path.
fn date_from_path(path: &str) -> Option<chrono::NaiveDate> {
    if path.get(10..11) != Some("-") {
        return None;
    }
    chrono::NaiveDate::parse_from_str(path.get(..10)?, "%Y-%m-%d").ok()
}

/// A document path is a single `.md` file name inside the posts directory.
fn check_document_path(path: &str) -> Result<()> {
    let invalid = |why: &str| Err(FolioError::InvalidInput(format!("{}: {:?}", why, path)));
    if path.is_empty() || path == "." || path == ".." {
        return invalid("invalid document path");
    }
    if path.contains('/') || path.contains('\\') {
        return invalid("document paths must not contain separators");
    }
    if !path.ends_with(DOCUMENT_EXTENSION) || path.len() == DOCUMENT_EXTENSION.len() {
        return invalid("document paths must name a .md file");
    }
    Ok(())
}
