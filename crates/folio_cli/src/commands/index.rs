//! Tag and author summaries.

use super::{spinner, Workspace};
use anyhow::{Context, Result};
use console::style;
use folio_core::MetadataIndex;

async fn build(ws: &Workspace) -> Result<MetadataIndex> {
    let pb = spinner("Indexing documents...");
    let index = ws.editor.build_index().await;
    pb.finish_and_clear();
    index.context("Failed to build the tag index")
}

/// Print distinct tags with how many documents carry each.
pub async fn tags(ws: &Workspace) -> Result<()> {
    let index = build(ws).await?;
    if index.tag_count() == 0 {
        println!("{}", style("No tags.").dim());
        return Ok(());
    }
    for (tag, count) in index.tag_counts() {
        println!("{:>4}  {}", style(count).cyan(), tag);
    }
    Ok(())
}

/// Print distinct authors.
pub async fn authors(ws: &Workspace) -> Result<()> {
    let index = build(ws).await?;
    let mut any = false;
    for author in index.authors() {
        println!("{}", author);
        any = true;
    }
    if !any {
        println!("{}", style("No authors.").dim());
    }
    Ok(())
}
