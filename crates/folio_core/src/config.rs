//! Configuration loaded from `folio.toml`.

use crate::error::{FolioError, Result};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up by [`Config::load`].
pub const CONFIG_FILE: &str = "folio.toml";

/// Environment variable consulted when `[access] allowed` is empty.
pub const ALLOWED_ENV: &str = "ALLOWED_EMAILS";

/// Top-level configuration. Every section falls back to its defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Which backend holds the documents.
    #[serde(default)]
    pub store: StoreSection,

    /// GitHub backend settings.
    #[serde(default)]
    pub github: GithubSection,

    /// Where documents and assets live inside the store.
    #[serde(default)]
    pub layout: LayoutSection,

    /// Listing fan-out.
    #[serde(default)]
    pub fetch: FetchSection,

    /// Retries for transient store failures.
    #[serde(default)]
    pub retry: RetrySection,

    /// Who may mutate the store.
    #[serde(default)]
    pub access: AccessSection,
}

impl Config {
    /// Loads `folio.toml` from `dir`, or the defaults if there is none.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load_file(&path)
        } else {
            Ok(Config::default())
        }
    }

    /// Loads and validates a configuration file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FolioError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| FolioError::ConfigError(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration to `dir/folio.toml`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self)
            .map_err(|e| FolioError::ConfigError(format!("failed to serialize config: {}", e)))?;
        fs::write(&path, content)
            .map_err(|e| FolioError::ConfigError(format!("failed to write config: {}", e)))?;
        Ok(())
    }

    /// Rejects values no component can work with.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.max_concurrent_reads == 0 {
            return Err(FolioError::ConfigError(
                "fetch.max_concurrent_reads must be at least 1".to_string(),
            ));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(FolioError::ConfigError(
                "retry.initial_backoff_ms exceeds retry.max_backoff_ms".to_string(),
            ));
        }
        for (key, dir) in [
            ("layout.posts_dir", &self.layout.posts_dir),
            ("layout.assets_dir", &self.layout.assets_dir),
        ] {
            let trimmed = dir.trim_matches('/');
            if trimmed.is_empty() || trimmed.split('/').any(|p| p == "..") {
                return Err(FolioError::ConfigError(format!(
                    "{} must be a relative directory, got {:?}",
                    key, dir
                )));
            }
        }
        Ok(())
    }
}

/// Commented configuration written by `folio init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# folio configuration

[store]
# "fs" keeps documents in a local directory, "github" talks to a repository.
backend = "fs"
root = "."

[github]
owner = ""
repo = ""
branch = "main"
api_base = "https://api.github.com"
# Name of the environment variable holding the API token.
token_env = "GITHUB_TOKEN"
# committer_name = "Club Bot"
# committer_email = "bot@example.com"
user_agent = "folio"

[layout]
posts_dir = "_posts"
assets_dir = "assets/images"
layout = "article"

[fetch]
max_concurrent_reads = 8

[retry]
max_retries = 3
initial_backoff_ms = 200
max_backoff_ms = 2000
# attempt_timeout_ms = 10000

[access]
# Identities allowed to create, edit and delete. Falls back to the
# comma-separated ALLOWED_EMAILS variable when empty.
allowed = []
"#;

/// Available store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Local directory tree.
    #[default]
    Fs,
    /// GitHub repository contents API.
    Github,
}

/// `[store]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub backend: Backend,
    /// Root directory for the fs backend.
    pub root: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: Backend::Fs,
            root: PathBuf::from("."),
        }
    }
}

/// `[github]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSection {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub api_base: String,
    /// Name of the environment variable holding the token, not the token.
    pub token_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committer_email: Option<String>,
    pub user_agent: String,
}

impl Default for GithubSection {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: "main".to_string(),
            api_base: "https://api.github.com".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            committer_name: None,
            committer_email: None,
            user_agent: concat!("folio/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// `[layout]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSection {
    /// Directory holding one blob per document.
    pub posts_dir: String,
    /// Directory holding uploaded images.
    pub assets_dir: String,
    /// Literal written to every header's `layout` key.
    pub layout: String,
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            posts_dir: "_posts".to_string(),
            assets_dir: "assets/images".to_string(),
            layout: crate::codec::DEFAULT_LAYOUT.to_string(),
        }
    }
}

/// `[fetch]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    /// Reads in flight at once while listing.
    pub max_concurrent_reads: usize,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            max_concurrent_reads: 8,
        }
    }
}

/// `[retry]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_timeout_ms: Option<u64>,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 2000,
            attempt_timeout_ms: None,
        }
    }
}

impl RetrySection {
    /// Converts to the policy the repository runs store calls under.
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            attempt_timeout: self.attempt_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// `[access]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AccessSection {
    pub allowed: Vec<String>,
}

impl AccessSection {
    /// Returns the configured identities, falling back to `ALLOWED_EMAILS`.
    pub fn allowed_identities(&self) -> Vec<String> {
        self.allowed_or(std::env::var(ALLOWED_ENV).ok())
    }

    fn allowed_or(&self, fallback: Option<String>) -> Vec<String> {
        let listed: Vec<String> = self
            .allowed
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !listed.is_empty() {
            return listed;
        }
        fallback
            .map(|csv| crate::auth::split_identities(&csv))
            .unwrap_or_default()
    }
}
