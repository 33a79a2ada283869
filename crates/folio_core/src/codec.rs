//! Front matter codec for article blobs.
//!
//! A serialized document is a YAML header between two `---` lines followed
//! by the body, verbatim:
//!
//! ```text
//! ---
//! layout: article
//! title: Club Meeting
//! author: Alice
//! tags:
//! - meetup
//! date: 2024-06-01
//! ---
//! Hello
//! ```
//!
//! `published` only appears for drafts, and blobs without a header parse as
//! body-only documents.

use crate::error::{FolioError, Result};
use crate::types::{Document, DocumentMeta};
use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

/// Line that opens and closes the header.
pub const MARKER: &str = "---";

/// Layout literal written into every header unless configured otherwise.
pub const DEFAULT_LAYOUT: &str = "article";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Serialize)]
struct Header<'a> {
    layout: &'a str,
    title: &'a str,
    author: &'a str,
    tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "is_true")]
    published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<&'a str>,
}

fn is_true(value: &bool) -> bool {
    *value
}

/// Serializes a document into blob bytes.
///
/// # Examples
///
/// ```
/// use folio_core::codec;
/// use folio_core::{Document, DocumentMeta};
///
/// let doc = Document {
///     meta: DocumentMeta { title: "Hi".into(), ..Default::default() },
///     body: "Body\n".into(),
/// };
/// let bytes = codec::serialize(&doc, codec::DEFAULT_LAYOUT).unwrap();
/// let text = String::from_utf8(bytes.clone()).unwrap();
/// assert!(text.starts_with("---\nlayout: article\n"));
/// assert!(!text.contains("published"));
/// assert_eq!(codec::parse(&bytes).unwrap(), doc);
/// ```
pub fn serialize(doc: &Document, layout: &str) -> Result<Vec<u8>> {
    let meta = &doc.meta;
    let header = Header {
        layout,
        title: &meta.title,
        author: &meta.author,
        tags: &meta.tags,
        date: meta.date.map(|d| d.format(DATE_FORMAT).to_string()),
        published: meta.published,
        thumbnail: meta.thumbnail.as_deref(),
    };
    let yaml = serde_yaml::to_string(&header)
        .map_err(|e| FolioError::Serialization(format!("failed to encode header: {}", e)))?;

    let mut out = String::with_capacity(yaml.len() + doc.body.len() + 8);
    out.push_str(MARKER);
    out.push('\n');
    out.push_str(&yaml);
    if !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(MARKER);
    out.push('\n');
    out.push_str(&doc.body);
    Ok(out.into_bytes())
}

/// Parses blob bytes into a document.
///
/// # Errors
///
/// Returns `MalformedDocument` (without a path) if the bytes are not UTF-8,
/// the header is never closed, or the header is not a YAML mapping of
/// scalar fields.
pub fn parse(bytes: &[u8]) -> Result<Document> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| malformed(format!("not valid UTF-8: {}", e)))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let Some((header, body)) = split_header(text)? else {
        return Ok(Document {
            meta: DocumentMeta::default(),
            body: text.to_string(),
        });
    };

    let meta = parse_header(header)?;
    Ok(Document {
        meta,
        body: body.to_string(),
    })
}

/// Splits `text` into `(header, body)`.
///
/// Returns `None` when the text does not open with a marker line.
fn split_header(text: &str) -> Result<Option<(&str, &str)>> {
    let rest = match text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    {
        Some(rest) => rest,
        None if text == MARKER => return Err(malformed("unterminated header")),
        None => return Ok(None),
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == MARKER {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok(Some((header, body)));
        }
        offset += line.len();
    }

    Err(malformed("unterminated header"))
}

fn parse_header(header: &str) -> Result<DocumentMeta> {
    if header.trim().is_empty() {
        return Ok(DocumentMeta::default());
    }
    let value: Value = serde_yaml::from_str(header)
        .map_err(|e| malformed(format!("header is not valid YAML: {}", e)))?;
    let map = match value {
        Value::Mapping(map) => map,
        Value::Null => Mapping::new(),
        _ => return Err(malformed("header is not a key/value mapping")),
    };

    let title = scalar_field(&map, "title")?.unwrap_or_default();
    let author = scalar_field(&map, "author")?.unwrap_or_default();
    let tags = tags_field(&map)?;
    let published = published_field(&map)?;
    let thumbnail = scalar_field(&map, "thumbnail")?
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    let date = match scalar_field(&map, "date")? {
        Some(raw) => {
            let parsed = parse_date(&raw);
            if parsed.is_none() {
                debug!(date = %raw, "ignoring unparseable date");
            }
            parsed
        }
        None => None,
    };

    Ok(DocumentMeta {
        title,
        author,
        tags,
        date,
        published,
        thumbnail,
    })
}

fn field<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    match map.get(key) {
        Some(Value::Tagged(tagged)) => Some(&tagged.value),
        other => other,
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar(&tagged.value),
        _ => None,
    }
}

fn scalar_field(map: &Mapping, key: &str) -> Result<Option<String>> {
    match field(map, key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar(value)
            .map(Some)
            .ok_or_else(|| malformed(format!("`{}` must be a scalar", key))),
    }
}

/// Tags may be a sequence, a lone scalar from a hand edit, or absent.
fn tags_field(map: &Mapping) -> Result<Vec<String>> {
    let raw = match field(map, "tags") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| scalar(item).ok_or_else(|| malformed("`tags` entries must be scalars")))
            .collect::<Result<Vec<_>>>()?,
        Some(value) => vec![scalar(value).ok_or_else(|| malformed("`tags` must be a list"))?],
    };
    Ok(normalize_tags(raw))
}

fn published_field(map: &Mapping) -> Result<bool> {
    match field(map, "published") {
        None | Some(Value::Null) => Ok(true),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(true),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(false),
        Some(_) => Err(malformed("`published` must be true or false")),
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and Jekyll-style
/// `YYYY-MM-DD HH:MM:SS +ZZZZ`.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc().date());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, DATE_FORMAT).ok())
}

fn malformed(reason: impl Into<String>) -> FolioError {
    FolioError::MalformedDocument {
        path: None,
        reason: reason.into(),
    }
}

/// Trims tags, drops empty ones and removes duplicates, keeping first-seen order.
pub fn normalize_tags<I, T>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Replaces every character that is not path-safe with `-`.
///
/// ASCII letters and digits, `-`, `_` and the CJK blocks used for Japanese
/// titles are kept as they are.
///
/// # Examples
///
/// ```
/// use folio_core::codec::slugify;
///
/// assert_eq!(slugify("Club Meeting"), "Club-Meeting");
/// assert_eq!(slugify("勉強会 2024!"), "勉強会-2024-");
/// ```
pub fn slugify(title: &str) -> String {
    title
        .chars()
        .map(|c| if is_slug_char(c) { c } else { '-' })
        .collect()
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == '-'
        || c == '_'
        || matches!(
            c as u32,
            0x3000..=0x303F | 0x3040..=0x309F | 0x30A0..=0x30FF | 0xFF00..=0xFF9F | 0x4E00..=0x9FAF
        )
}

/// Builds the document path `YYYY-MM-DD-{slug}.md`.
pub fn document_path(date: NaiveDate, title: &str) -> String {
    format!("{}-{}.md", date.format(DATE_FORMAT), slugify(title))
}
