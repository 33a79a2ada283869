//! Write a default folio.toml.

use anyhow::{bail, Context, Result};
use console::style;
use folio_core::{Backend, Config, CONFIG_FILE, DEFAULT_CONFIG_TEMPLATE};
use std::path::Path;

/// Write a configuration file into `dir`.
///
/// Without options the commented template is written verbatim.
pub fn run(dir: &Path, allow: &[String], github: Option<&str>, force: bool) -> Result<()> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    if allow.is_empty() && github.is_none() {
        std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    } else {
        let mut config = Config::from_toml(DEFAULT_CONFIG_TEMPLATE)?;
        config.access.allowed = allow.to_vec();
        if let Some(target) = github {
            let Some((owner, repo)) = target.split_once('/') else {
                bail!("--github expects OWNER/REPO, got {:?}", target);
            };
            config.store.backend = Backend::Github;
            config.github.owner = owner.to_string();
            config.github.repo = repo.to_string();
        }
        config.save(dir).context("Failed to write configuration")?;
    }

    println!("{} Wrote {}", style("✓").green(), path.display());
    if allow.is_empty() {
        println!(
            "  {} No identities are allowed to make changes yet. Add them to [access] allowed",
            style("Note:").yellow()
        );
        println!("  or set ALLOWED_EMAILS, then pass --as <identity>.");
    }
    Ok(())
}
