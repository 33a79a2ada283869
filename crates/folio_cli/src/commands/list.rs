//! List documents.

use super::{spinner, Workspace};
use anyhow::{Context, Result};
use console::style;
use folio_core::DocumentSummary;

/// Print documents newest first, optionally filtered by tag or draft state.
pub async fn run(ws: &Workspace, tag: Option<&str>, drafts_only: bool, json: bool) -> Result<()> {
    let pb = spinner("Fetching documents...");
    let listing = match tag {
        Some(tag) => ws.editor.list_by_tag(tag).await,
        None => ws.editor.list_documents().await,
    };
    pb.finish_and_clear();

    let mut summaries = listing.context("Failed to list documents")?;
    if drafts_only {
        summaries.retain(|s| !s.is_published());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("{}", style("No documents.").dim());
        return Ok(());
    }

    for summary in &summaries {
        print_row(summary);
    }

    let malformed = summaries.iter().filter(|s| s.is_malformed()).count();
    println!();
    println!(
        "{} document(s){}",
        style(summaries.len()).cyan(),
        if malformed > 0 {
            format!(", {} unreadable", style(malformed).red())
        } else {
            String::new()
        }
    );
    Ok(())
}

fn print_row(summary: &DocumentSummary) {
    let date = summary
        .date()
        .map(|d| d.to_string())
        .unwrap_or_else(|| "----------".to_string());

    let Some(meta) = &summary.meta else {
        println!(
            "{}  {}  {} {}",
            style(date).dim(),
            style(summary.hash.short(8)).dim(),
            style(&summary.path).red(),
            style("(unreadable header)").red()
        );
        return;
    };

    let draft = if meta.published {
        String::new()
    } else {
        format!(" {}", style("[draft]").yellow())
    };
    let tags = if meta.tags.is_empty() {
        String::new()
    } else {
        format!(" {}", style(format!("#{}", meta.tags.join(" #"))).cyan())
    };
    let author = if meta.author.is_empty() {
        String::new()
    } else {
        format!(" by {}", meta.author)
    };

    println!(
        "{}  {}  {}{}{}{}",
        style(date).dim(),
        style(summary.hash.short(8)).dim(),
        style(summary.display_title()).bold(),
        author,
        draft,
        tags
    );
    println!("    {}", style(&summary.path).dim());
}
