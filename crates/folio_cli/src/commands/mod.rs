//! CLI commands.

pub mod assets;
pub mod edit;
pub mod index;
pub mod init;
pub mod list;
pub mod show;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use folio_core::{
    open_store, AllowList, AssetStore, Config, ContentHash, DocumentFields, DocumentRepository,
    Editor, Identity,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Configuration plus an editor bound to the caller's identity.
pub struct Workspace {
    pub config: Config,
    pub editor: Editor,
}

impl Workspace {
    pub fn open(dir: &Path, identity: Option<&str>) -> Result<Self> {
        let config = Config::load(dir).context("Failed to load folio.toml")?;
        let store = open_store(&config).context("Failed to open the content store")?;
        tracing::debug!(backend = ?config.store.backend, posts_dir = %config.layout.posts_dir, "opened store");

        let documents = DocumentRepository::from_config(store.clone(), &config);
        let assets = AssetStore::from_config(store, &config);
        let gate = Arc::new(AllowList::new(config.access.allowed_identities()));
        let identity = Identity::new(identity.unwrap_or_default());

        Ok(Self {
            editor: Editor::new(documents, assets, gate, identity),
            config,
        })
    }
}

/// Document fields shared by create, update and rename.
#[derive(Args, Debug, Default)]
pub struct DocumentArgs {
    /// Title; also names the file
    #[arg(long)]
    pub title: Option<String>,
    /// Author name
    #[arg(long)]
    pub author: Option<String>,
    /// Tag (repeatable); replaces all existing tags when given
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Remove all tags
    #[arg(long, conflicts_with = "tags")]
    pub clear_tags: bool,
    /// Body text
    #[arg(long, conflicts_with = "body_file")]
    pub body: Option<String>,
    /// Read the body from a file ("-" for stdin)
    #[arg(long)]
    pub body_file: Option<PathBuf>,
    /// Publication date (YYYY-MM-DD); defaults to today on create
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Mark as draft
    #[arg(long, conflicts_with = "publish")]
    pub draft: bool,
    /// Mark as published
    #[arg(long)]
    pub publish: bool,
    /// Cover image path or URL ("" removes it)
    #[arg(long)]
    pub thumbnail: Option<String>,
}

impl DocumentArgs {
    /// Overlays the given arguments on `fields`.
    pub fn apply(self, mut fields: DocumentFields) -> Result<DocumentFields> {
        if let Some(title) = self.title {
            fields.title = title;
        }
        if let Some(author) = self.author {
            fields.author = author;
        }
        if self.clear_tags {
            fields.tags.clear();
        } else if !self.tags.is_empty() {
            fields.tags = self.tags;
        }
        if let Some(body) = self.body {
            fields.body = body;
        } else if let Some(path) = self.body_file {
            fields.body = read_body(&path)?;
        }
        if self.date.is_some() {
            fields.date = self.date;
        }
        if self.draft {
            fields.published = false;
        } else if self.publish {
            fields.published = true;
        }
        if let Some(thumbnail) = self.thumbnail {
            fields.thumbnail = Some(thumbnail);
        }
        Ok(fields)
    }
}

fn read_body(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut body = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut body)
            .context("Failed to read body from stdin")?;
        return Ok(body);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read body from {}", path.display()))
}

/// Parses a `--hash` argument.
pub fn parse_hash(raw: &str) -> Result<ContentHash> {
    ContentHash::new(raw).context("Invalid --hash value")
}

/// Spinner shown while the store is being fanned out over.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
