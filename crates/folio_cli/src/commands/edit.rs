//! Create, update, rename and delete documents.

use super::{parse_hash, DocumentArgs, Workspace};
use anyhow::{bail, Context, Result};
use console::style;
use folio_core::{DocumentFields, VersionedDocument};

/// Create a new document from the given fields.
pub async fn create(ws: &Workspace, args: DocumentArgs) -> Result<()> {
    if args.title.is_none() {
        bail!("--title is required to create a document");
    }
    let fields = args.apply(DocumentFields::default())?;
    let created = ws
        .editor
        .create_document(fields)
        .await
        .context("Failed to create document")?;
    report("Created", &created);
    Ok(())
}

/// Rewrite a document, filling unspecified fields from its current version.
pub async fn update(ws: &Workspace, path: &str, hash: &str, args: DocumentArgs) -> Result<()> {
    let expected = parse_hash(hash)?;
    let fields = args.apply(current_fields(ws, path).await?)?;
    let updated = ws
        .editor
        .update_document(path, fields, &expected)
        .await
        .with_context(|| format!("Failed to update {}", path))?;
    report("Updated", &updated);
    Ok(())
}

/// Move a document to the path derived from its (new) title and date.
pub async fn rename(ws: &Workspace, path: &str, hash: &str, args: DocumentArgs) -> Result<()> {
    let expected = parse_hash(hash)?;
    let fields = args.apply(current_fields(ws, path).await?)?;
    let renamed = ws
        .editor
        .rename_document(path, fields, &expected)
        .await
        .with_context(|| format!("Failed to rename {}", path))?;
    println!("{} {} -> {}", style("✓").green(), path, renamed.path);
    println!("  Hash: {}", style(&renamed.hash).cyan());
    Ok(())
}

/// Delete a document at the given version.
pub async fn delete(ws: &Workspace, path: &str, hash: &str) -> Result<()> {
    let expected = parse_hash(hash)?;
    ws.editor
        .delete_document(path, &expected)
        .await
        .with_context(|| format!("Failed to delete {}", path))?;
    println!("{} Deleted {}", style("✓").green(), path);
    Ok(())
}

async fn current_fields(ws: &Workspace, path: &str) -> Result<DocumentFields> {
    let current = ws
        .editor
        .get_document(path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;
    Ok(DocumentFields::from_document(&current.document))
}

fn report(verb: &str, doc: &VersionedDocument) {
    println!("{} {} {}", style("✓").green(), verb, style(&doc.path).bold());
    println!("  Hash: {}", style(&doc.hash).cyan());
    println!(
        "  {} pass this hash with --hash on the next update or delete",
        style("Tip:").cyan()
    );
}
