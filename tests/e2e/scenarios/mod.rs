mod access;
mod concurrent_edits;
mod on_disk;

use folio_core::DocumentFields;

/// Fields for a published post with an author and tags
pub fn post(title: &str, author: &str, tags: &[&str], body: &str) -> DocumentFields {
    DocumentFields {
        title: title.to_string(),
        author: author.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        body: body.to_string(),
        ..Default::default()
    }
}
