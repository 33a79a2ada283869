//! Folio CLI - Command-line interface for folio document stores.

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use folio_core::FolioError;
use std::path::PathBuf;

mod commands;

use commands::{DocumentArgs, Workspace};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Manage articles and images in a content-addressed store", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding folio.toml
    #[arg(long, global = true, default_value = ".")]
    dir: PathBuf,

    /// Identity checked against the [access] allow list for changes
    #[arg(long = "as", global = true, env = "FOLIO_IDENTITY")]
    identity: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default folio.toml
    Init {
        /// Identity allowed to make changes (repeatable)
        #[arg(long = "allow")]
        allow: Vec<String>,
        /// Use the GitHub backend for OWNER/REPO
        #[arg(long, value_name = "OWNER/REPO")]
        github: Option<String>,
        /// Overwrite an existing folio.toml
        #[arg(long)]
        force: bool,
    },
    /// List documents, newest first
    List {
        /// Only documents carrying this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Only unpublished documents
        #[arg(long)]
        drafts_only: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one document and its version hash
    Show {
        /// Document path, e.g. 2024-06-01-Club-Meeting.md
        path: String,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a document
    Create {
        #[command(flatten)]
        fields: DocumentArgs,
    },
    /// Rewrite a document, keeping fields that are not given
    Update {
        path: String,
        /// Version hash the edit is based on
        #[arg(long)]
        hash: String,
        #[command(flatten)]
        fields: DocumentArgs,
    },
    /// Move a document to the path its title and date derive
    Rename {
        path: String,
        /// Version hash the edit is based on
        #[arg(long)]
        hash: String,
        #[command(flatten)]
        fields: DocumentArgs,
    },
    /// Delete a document
    Delete {
        path: String,
        /// Version hash the deletion is based on
        #[arg(long)]
        hash: String,
    },
    /// List distinct tags with document counts
    Tags,
    /// List distinct authors
    Authors,
    /// Upload an image
    Upload {
        /// Local file to upload
        file: PathBuf,
        /// Name to store it under instead of the file name
        #[arg(long)]
        name: Option<String>,
    },
    /// List uploaded images, newest first
    Images,
}

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber
    // Respects RUST_LOG environment variable (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("{} {:#}", style("error:").red().bold(), err);
        let hint = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<FolioError>())
            .and_then(FolioError::recovery_suggestion);
        if let Some(hint) = hint {
            eprintln!("  {} {}", style("hint:").cyan(), hint);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Init {
        allow,
        github,
        force,
    } = &cli.command
    {
        return commands::init::run(&cli.dir, allow, github.as_deref(), *force);
    }

    let ws = Workspace::open(&cli.dir, cli.identity.as_deref())?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::List {
            tag,
            drafts_only,
            json,
        } => commands::list::run(&ws, tag.as_deref(), drafts_only, json).await,
        Commands::Show { path, json } => commands::show::run(&ws, &path, json).await,
        Commands::Create { fields } => commands::edit::create(&ws, fields).await,
        Commands::Update { path, hash, fields } => {
            commands::edit::update(&ws, &path, &hash, fields).await
        }
        Commands::Rename { path, hash, fields } => {
            commands::edit::rename(&ws, &path, &hash, fields).await
        }
        Commands::Delete { path, hash } => commands::edit::delete(&ws, &path, &hash).await,
        Commands::Tags => commands::index::tags(&ws).await,
        Commands::Authors => commands::index::authors(&ws).await,
        Commands::Upload { file, name } => {
            commands::assets::upload(&ws, &file, name.as_deref()).await
        }
        Commands::Images => commands::assets::images(&ws).await,
    }
}
