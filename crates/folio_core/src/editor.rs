//! Gated front door over the repository and asset store.

use crate::assets::AssetStore;
use crate::auth::{AccessGate, Identity};
use crate::error::{FolioError, Result};
use crate::index::MetadataIndex;
use crate::repository::DocumentRepository;
use crate::store::ContentStore;
use crate::types::{Asset, DocumentFields, DocumentSummary, VersionedDocument};
use crate::ContentHash;
use std::sync::Arc;
use tracing::warn;

/// One caller's handle on the collection.
///
/// Every mutation first asks the gate about the bound identity and fails
/// with `AccessDenied`, before touching the store, if the answer is no.
/// Reads are not gated.
pub struct Editor<S: ContentStore + ?Sized = dyn ContentStore> {
    documents: DocumentRepository<S>,
    assets: AssetStore<S>,
    gate: Arc<dyn AccessGate>,
    identity: Identity,
}

impl<S: ContentStore + ?Sized> Editor<S> {
    pub fn new(
        documents: DocumentRepository<S>,
        assets: AssetStore<S>,
        gate: Arc<dyn AccessGate>,
        identity: Identity,
    ) -> Self {
        Self {
            documents,
            assets,
            gate,
            identity,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn documents(&self) -> &DocumentRepository<S> {
        &self.documents
    }

    pub fn assets(&self) -> &AssetStore<S> {
        &self.assets
    }

    /// Returns true if the bound identity may mutate.
    pub fn can_edit(&self) -> bool {
        self.gate.is_authorized(&self.identity)
    }

    fn authorize(&self, action: &str) -> Result<()> {
        if self.can_edit() {
            return Ok(());
        }
        warn!(identity = %self.identity, action, "access denied");
        Err(FolioError::AccessDenied(format!(
            "{:?} may not {}",
            self.identity.as_str(),
            action
        )))
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        self.documents.list_documents().await
    }

    pub async fn list_by_tag(&self, tag: &str) -> Result<Vec<DocumentSummary>> {
        self.documents.list_by_tag(tag).await
    }

    pub async fn get_document(&self, path: &str) -> Result<VersionedDocument> {
        self.documents.get_document(path).await
    }

    pub async fn build_index(&self) -> Result<MetadataIndex> {
        self.documents.build_index().await
    }

    pub async fn list_assets(&self) -> Result<Vec<Asset>> {
        self.assets.list_assets().await
    }

    pub async fn create_document(&self, fields: DocumentFields) -> Result<VersionedDocument> {
        self.authorize("create documents")?;
        self.documents.create_document(fields).await
    }

    pub async fn update_document(
        &self,
        path: &str,
        fields: DocumentFields,
        expected: &ContentHash,
    ) -> Result<VersionedDocument> {
        self.authorize("update documents")?;
        self.documents.update_document(path, fields, expected).await
    }

    pub async fn rename_document(
        &self,
        path: &str,
        fields: DocumentFields,
        expected: &ContentHash,
    ) -> Result<VersionedDocument> {
        self.authorize("rename documents")?;
        self.documents.rename_document(path, fields, expected).await
    }

    pub async fn delete_document(&self, path: &str, expected: &ContentHash) -> Result<()> {
        self.authorize("delete documents")?;
        self.documents.delete_document(path, expected).await
    }

    pub async fn upload_asset(&self, name: &str, bytes: &[u8]) -> Result<Asset> {
        self.authorize("upload assets")?;
        self.assets.upload_asset(name, bytes).await
    }
}
