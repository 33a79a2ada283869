//! Core data types for folio.

use crate::ContentHash;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Metadata carried in a document's front matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Article title. Empty only for documents without a header.
    pub title: String,

    /// Author display name or handle.
    pub author: String,

    /// Tags in display order, without duplicates.
    pub tags: Vec<String>,

    /// Publication date.
    pub date: Option<NaiveDate>,

    /// False for drafts.
    pub published: bool,

    /// Asset path or URL of the cover image.
    pub thumbnail: Option<String>,
}

impl Default for DocumentMeta {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            tags: Vec::new(),
            date: None,
            published: true,
            thumbnail: None,
        }
    }
}

/// A parsed document: front matter plus verbatim body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Header fields.
    pub meta: DocumentMeta,
    /// Everything after the header, byte for byte.
    pub body: String,
}

/// A document together with where it lives and the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedDocument {
    /// Document path inside the posts directory, e.g. `2024-06-01-Club-Meeting.md`.
    pub path: String,
    /// Version token to present on the next update or delete.
    pub hash: ContentHash,
    /// Parsed content.
    pub document: Document,
}

/// One row of a document listing.
///
/// `meta` is `None` when the blob could not be parsed; the row then only
/// carries what the store itself knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Document path inside the posts directory.
    pub path: String,
    /// Full key in the backing store.
    pub store_path: String,
    /// Version token at listing time.
    pub hash: ContentHash,
    /// Parsed header, if the blob parsed.
    pub meta: Option<DocumentMeta>,
    /// Why parsing failed, if it did.
    pub parse_error: Option<String>,
}

impl DocumentSummary {
    /// Returns the publication date, if the document parsed and has one.
    pub fn date(&self) -> Option<NaiveDate> {
        self.meta.as_ref().and_then(|m| m.date)
    }

    /// Returns true if the blob failed to parse.
    pub fn is_malformed(&self) -> bool {
        self.meta.is_none()
    }

    /// Returns the title, or the path for malformed documents.
    pub fn display_title(&self) -> &str {
        match &self.meta {
            Some(meta) if !meta.title.is_empty() => &meta.title,
            _ => &self.path,
        }
    }

    /// Returns the document's tags (empty for malformed documents).
    pub fn tags(&self) -> &[String] {
        self.meta.as_ref().map(|m| m.tags.as_slice()).unwrap_or(&[])
    }

    /// Returns false only for parsed drafts.
    pub fn is_published(&self) -> bool {
        self.meta.as_ref().map(|m| m.published).unwrap_or(true)
    }
}

/// Caller-supplied fields for create, update and rename.
///
/// Updates re-serialize the whole document, so every field must be filled
/// in even if unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFields {
    /// Required, non-blank.
    pub title: String,
    /// May be empty.
    pub author: String,
    /// Trimmed and de-duplicated before storing.
    pub tags: Vec<String>,
    /// Required, non-blank.
    pub body: String,
    /// When absent, creation uses today and updates use the date in the path.
    pub date: Option<NaiveDate>,
    /// Defaults to true.
    pub published: bool,
    /// Blank values are dropped.
    pub thumbnail: Option<String>,
}

impl Default for DocumentFields {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            tags: Vec::new(),
            body: String::new(),
            date: None,
            published: true,
            thumbnail: None,
        }
    }
}

impl DocumentFields {
    /// Creates fields with the two required values set.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    /// Copies the fields of an existing document, for read-modify-write updates.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            title: doc.meta.title.clone(),
            author: doc.meta.author.clone(),
            tags: doc.meta.tags.clone(),
            body: doc.body.clone(),
            date: doc.meta.date,
            published: doc.meta.published,
            thumbnail: doc.meta.thumbnail.clone(),
        }
    }
}

/// A stored image asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// File name, `{epoch-millis}-{sanitized-name}` for uploads.
    pub name: String,
    /// Full key in the backing store.
    pub path: String,
    /// Site-relative URL, `/{path}`.
    pub url: String,
}

impl Asset {
    pub(crate) fn from_path(name: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: name.into(),
            url: format!("/{}", path.trim_start_matches('/')),
            path,
        }
    }
}
