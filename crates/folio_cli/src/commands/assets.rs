//! Upload and list images.

use super::{spinner, Workspace};
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

/// Upload a local file as a new asset.
pub async fn upload(ws: &Workspace, file: &Path, name: Option<&str>) -> Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let name = match name {
        Some(name) => name.to_string(),
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let pb = spinner("Uploading...");
    let uploaded = ws.editor.upload_asset(&name, &bytes).await;
    pb.finish_and_clear();
    let asset = uploaded.context("Failed to upload asset")?;

    println!("{} Uploaded {}", style("✓").green(), style(&asset.name).bold());
    println!("  URL: {}", style(&asset.url).cyan());
    println!("  Markdown: ![{}]({})", name, asset.url);
    Ok(())
}

/// List uploaded images, newest first.
pub async fn images(ws: &Workspace) -> Result<()> {
    let assets = ws
        .editor
        .list_assets()
        .await
        .context("Failed to list assets")?;
    if assets.is_empty() {
        println!("{}", style("No images.").dim());
        return Ok(());
    }
    for asset in &assets {
        println!("{}", asset.url);
    }
    Ok(())
}
