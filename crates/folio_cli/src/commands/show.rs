//! Show one document.

use super::Workspace;
use anyhow::{Context, Result};
use console::style;

/// Print a document's header fields, version hash and body.
pub async fn run(ws: &Workspace, path: &str, json: bool) -> Result<()> {
    let doc = ws
        .editor
        .get_document(path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    let meta = &doc.document.meta;
    println!("{}", style(&meta.title).bold());
    println!("  Path:      {}", doc.path);
    println!("  Hash:      {}", style(&doc.hash).cyan());
    if !meta.author.is_empty() {
        println!("  Author:    {}", meta.author);
    }
    if let Some(date) = meta.date {
        println!("  Date:      {}", date);
    }
    if !meta.tags.is_empty() {
        println!("  Tags:      {}", meta.tags.join(", "));
    }
    if !meta.published {
        println!("  Status:    {}", style("draft").yellow());
    }
    if let Some(thumbnail) = &meta.thumbnail {
        println!("  Thumbnail: {}", thumbnail);
    }
    println!();
    print!("{}", doc.document.body);
    if !doc.document.body.ends_with('\n') {
        println!();
    }
    Ok(())
}
