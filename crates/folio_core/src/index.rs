//! Derived tag and author index.
//!
//! Never stored. Built from a listing each time it is needed.

use crate::codec::normalize_tags;
use crate::types::DocumentSummary;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Distinct tags, with the documents carrying them, and distinct authors.
///
/// # Examples
///
/// ```
/// use folio_core::{ContentHash, DocumentMeta, DocumentSummary, MetadataIndex};
///
/// let summary = DocumentSummary {
///     path: "2024-06-01-a.md".to_string(),
///     store_path: "_posts/2024-06-01-a.md".to_string(),
///     hash: ContentHash::for_blob(b"a"),
///     meta: Some(DocumentMeta {
///         author: "Alice".to_string(),
///         tags: vec!["meetup".to_string()],
///         ..Default::default()
///     }),
///     parse_error: None,
/// };
///
/// let index = MetadataIndex::from_summaries(&[summary]);
/// assert_eq!(index.paths_for_tag("meetup"), ["2024-06-01-a.md"]);
/// assert!(index.has_author("Alice"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataIndex {
    tags: BTreeMap<String, BTreeSet<String>>,
    authors: BTreeSet<String>,
}

impl MetadataIndex {
    /// Builds the index. Malformed summaries contribute nothing.
    pub fn from_summaries(summaries: &[DocumentSummary]) -> Self {
        let mut index = Self::default();
        for summary in summaries {
            let Some(meta) = &summary.meta else {
                continue;
            };
            for tag in normalize_tags(&meta.tags) {
                index
                    .tags
                    .entry(tag)
                    .or_default()
                    .insert(summary.path.clone());
            }
            let author = meta.author.trim();
            if !author.is_empty() {
                index.authors.insert(author.to_string());
            }
        }
        index
    }

    /// Distinct tags.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    /// Distinct tags with the number of documents carrying each.
    pub fn tag_counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.tags.iter().map(|(tag, paths)| (tag.as_str(), paths.len()))
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Distinct non-empty authors.
    pub fn authors(&self) -> impl Iterator<Item = &str> {
        self.authors.iter().map(String::as_str)
    }

    pub fn has_author(&self, author: &str) -> bool {
        self.authors.contains(author.trim())
    }

    /// Paths of the documents tagged `tag`; empty for unknown tags.
    pub fn paths_for_tag(&self, tag: &str) -> Vec<&str> {
        self.tags
            .get(tag.trim())
            .map(|paths| paths.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.authors.is_empty()
    }
}
