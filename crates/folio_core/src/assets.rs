//! Write-once image assets.
//!
//! Uploads are named `{epoch-millis}-{sanitized-name}` and created
//! unconditionally. Nothing here updates or deletes an asset.

use crate::config::Config;
use crate::error::{FolioError, Result};
use crate::retry::RetryPolicy;
use crate::store::{join, ContentStore};
use crate::types::Asset;
use crate::{now_millis, TimeProvider};
use std::sync::Arc;
use tracing::{debug, info};

/// File extensions listed as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];

/// Image assets under one store directory.
pub struct AssetStore<S: ContentStore + ?Sized = dyn ContentStore> {
    store: Arc<S>,
    assets_dir: String,
    retry: RetryPolicy,
    time_provider: Option<Arc<dyn TimeProvider>>,
}

impl<S: ContentStore + ?Sized> AssetStore<S> {
    /// Creates an asset store over `assets/images`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            assets_dir: "assets/images".to_string(),
            retry: RetryPolicy::default(),
            time_provider: None,
        }
    }

    pub fn from_config(store: Arc<S>, config: &Config) -> Self {
        Self::new(store)
            .with_assets_dir(config.layout.assets_dir.clone())
            .with_retry_policy(config.retry.to_policy())
    }

    #[must_use]
    pub fn with_assets_dir(mut self, dir: impl Into<String>) -> Self {
        self.assets_dir = dir.into().trim_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets a custom time provider, in epoch milliseconds, for asset names.
    #[must_use]
    pub fn with_time_provider(mut self, provider: impl TimeProvider + 'static) -> Self {
        self.time_provider = Some(Arc::new(provider));
        self
    }

    pub fn assets_dir(&self) -> &str {
        &self.assets_dir
    }

    /// Stores `bytes` as a new asset.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if nothing of `name` survives sanitizing. Two uploads of
    /// the same name in the same millisecond collide with `AlreadyExists`.
    pub async fn upload_asset(&self, name: &str, bytes: &[u8]) -> Result<Asset> {
        let sanitized = sanitize_asset_name(name);
        if sanitized.is_empty() {
            return Err(FolioError::InvalidInput(format!(
                "asset name has no usable characters: {:?}",
                name
            )));
        }

        let file_name = format!("{}-{}", now_millis(self.time_provider.as_deref()), sanitized);
        let path = join(&self.assets_dir, &file_name);
        self.retry
            .run("write", || self.store.write(&path, bytes, None))
            .await?;
        info!(path = %path, len = bytes.len(), "uploaded asset");
        Ok(Asset::from_path(file_name, path))
    }

    /// Lists image assets, newest first.
    ///
    /// A missing assets directory is an empty listing.
    pub async fn list_assets(&self) -> Result<Vec<Asset>> {
        let dir = self.assets_dir.as_str();
        let entries = match self.retry.run("list", || self.store.list(dir)).await {
            Ok(entries) => entries,
            Err(FolioError::NotFound(_)) => {
                debug!(dir, "assets directory missing, listing is empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut assets: Vec<Asset> = entries
            .into_iter()
            .filter(|e| !e.is_dir() && is_image(&e.name))
            .map(|e| Asset::from_path(e.name, e.path))
            .collect();
        assets.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(assets)
    }
}

/// Keeps ASCII letters, digits, `.` and `-`; drops everything else.
///
/// # Examples
///
/// ```
/// use folio_core::assets::sanitize_asset_name;
///
/// assert_eq!(sanitize_asset_name("My Photo (1).PNG"), "MyPhoto1.PNG");
/// assert_eq!(sanitize_asset_name("../../etc/passwd"), "....etcpasswd");
/// ```
pub fn sanitize_asset_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
        .collect()
}

/// Returns true if `name` has an image extension.
pub fn is_image(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(stem, ext)| {
        !stem.is_empty()
            && IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
    })
}
