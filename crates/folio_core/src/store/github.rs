//! GitHub repository contents backend.
//!
//! Maps the four store operations onto the REST contents endpoints of one
//! branch. The git blob SHA returned by the API is the version token, and
//! every mutation becomes one commit.

use super::{clean_blob_path, clean_path, Blob, ContentStore, Entry, EntryKind};
use crate::config::GithubSection;
use crate::error::{FolioError, Result};
use crate::ContentHash;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const API_VERSION: &str = "2022-11-28";

/// Name and email recorded on commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

/// Resolved connection settings for [`GitHubStore`].
#[derive(Clone, PartialEq, Eq)]
pub struct GitHubConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub api_base: String,
    pub token: Option<String>,
    pub committer: Option<Committer>,
    pub user_agent: String,
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("api_base", &self.api_base)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("committer", &self.committer)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl GitHubConfig {
    /// Resolves the `[github]` section, reading the token from the environment
    /// variable it names.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `owner` or `repo` is empty or `api_base` is not
    /// a URL.
    pub fn from_config(section: &GithubSection) -> Result<Self> {
        if section.owner.trim().is_empty() || section.repo.trim().is_empty() {
            return Err(FolioError::ConfigError(
                "github backend needs [github] owner and repo".to_string(),
            ));
        }
        Url::parse(&section.api_base).map_err(|e| {
            FolioError::ConfigError(format!("invalid api_base {:?}: {}", section.api_base, e))
        })?;

        let token = std::env::var(&section.token_env)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if token.is_none() {
            debug!(var = %section.token_env, "no API token set, requests are anonymous");
        }

        let committer = match (&section.committer_name, &section.committer_email) {
            (Some(name), Some(email)) => Some(Committer {
                name: name.clone(),
                email: email.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            owner: section.owner.trim().to_string(),
            repo: section.repo.trim().to_string(),
            branch: section.branch.clone(),
            api_base: section.api_base.clone(),
            token,
            committer,
            user_agent: section.user_agent.clone(),
        })
    }

    /// Builds the contents endpoint URL for `path`, pinned to the branch when
    /// `with_ref` is set.
    pub fn contents_url(&self, path: &str, with_ref: bool) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| FolioError::ConfigError(format!("invalid api_base: {}", e)))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                FolioError::ConfigError(format!("api_base cannot be a base: {}", self.api_base))
            })?;
            segments
                .pop_if_empty()
                .extend(["repos", self.owner.as_str(), self.repo.as_str(), "contents"])
                .extend(path.split('/').filter(|p| !p.is_empty()));
        }
        if with_ref {
            url.query_pairs_mut().append_pair("ref", &self.branch);
        }
        Ok(url)
    }
}

/// A [`ContentStore`] backed by a GitHub repository branch.
pub struct GitHubStore {
    client: Client,
    config: GitHubConfig,
}

impl GitHubStore {
    /// Creates a store with its own HTTP client.
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FolioError::ConfigError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Returns the resolved configuration.
    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    fn request(&self, builder: RequestBuilder, accept: &str) -> RequestBuilder {
        let builder = builder
            .header(ACCEPT, accept)
            .header("X-GitHub-Api-Version", API_VERSION);
        match &self.config.token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn get_contents(&self, path: &str, op: Op) -> Result<ContentsResponse> {
        let url = self.config.contents_url(path, true)?;
        debug!(%url, "GET contents");
        let response = send(self.request(self.client.get(url), JSON_MEDIA_TYPE)).await?;
        let response = check(response, op, path, None).await?;
        response
            .json::<ContentsResponse>()
            .await
            .map_err(|e| FolioError::Serialization(format!("contents of {}: {}", path, e)))
    }

    async fn get_raw(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.config.contents_url(path, true)?;
        debug!(%url, "GET raw contents");
        let response = send(self.request(self.client.get(url), RAW_MEDIA_TYPE)).await?;
        let response = check(response, Op::Read, path, None).await?;
        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }

    fn message(&self, verb: &str, path: &str) -> String {
        format!("{} {}", verb, path)
    }
}

#[async_trait]
impl ContentStore for GitHubStore {
    async fn list(&self, dir: &str) -> Result<Vec<Entry>> {
        let dir = clean_path(dir)?;
        match self.get_contents(&dir, Op::List).await? {
            ContentsResponse::Directory(items) => {
                let mut entries: Vec<Entry> = items.into_iter().map(ContentItem::into_entry).collect();
                entries.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(entries)
            }
            ContentsResponse::File(_) => {
                Err(FolioError::InvalidInput(format!("not a directory: {}", dir)))
            }
        }
    }

    async fn read(&self, path: &str) -> Result<Blob> {
        let path = clean_blob_path(path)?;
        let item = match self.get_contents(&path, Op::Read).await? {
            ContentsResponse::Directory(_) => return Err(FolioError::IsDirectory(path)),
            ContentsResponse::File(item) if item.kind == "dir" => {
                return Err(FolioError::IsDirectory(path))
            }
            ContentsResponse::File(item) => item,
        };

        let hash = ContentHash::new(item.sha.clone())?;
        let bytes = match item.inline_bytes()? {
            Some(bytes) => bytes,
            // Files over 1 MB come back without inline content.
            None => self.get_raw(&path).await?,
        };
        Ok(Blob { bytes, hash })
    }

    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        expected: Option<&ContentHash>,
    ) -> Result<ContentHash> {
        let path = clean_blob_path(path)?;
        let (op, verb) = match expected {
            Some(_) => (Op::Update, "Update"),
            None => (Op::Create, "Create"),
        };
        let body = PutBody {
            message: self.message(verb, &path),
            content: BASE64.encode(bytes),
            sha: expected.map(ContentHash::as_str),
            branch: &self.config.branch,
            committer: self.config.committer.as_ref(),
        };

        let url = self.config.contents_url(&path, false)?;
        debug!(%url, len = bytes.len(), "PUT contents");
        let response = send(self.request(self.client.put(url), JSON_MEDIA_TYPE).json(&body)).await?;
        let response = check(response, op, &path, expected).await?;
        let written: WriteResponse = response
            .json()
            .await
            .map_err(|e| FolioError::Serialization(format!("write response for {}: {}", path, e)))?;
        ContentHash::new(written.content.sha)
    }

    async fn delete(&self, path: &str, expected: &ContentHash) -> Result<()> {
        let path = clean_blob_path(path)?;
        let body = DeleteBody {
            message: self.message("Delete", &path),
            sha: expected.as_str(),
            branch: &self.config.branch,
            committer: self.config.committer.as_ref(),
        };

        let url = self.config.contents_url(&path, false)?;
        debug!(%url, "DELETE contents");
        let response =
            send(self.request(self.client.delete(url), JSON_MEDIA_TYPE).json(&body)).await?;
        check(response, Op::Delete, &path, Some(expected)).await?;
        Ok(())
    }
}

/// Which store call a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    List,
    Read,
    Create,
    Update,
    Delete,
}

async fn send(builder: RequestBuilder) -> Result<Response> {
    builder.send().await.map_err(transport_error)
}

fn transport_error(e: reqwest::Error) -> FolioError {
    FolioError::Transient(format!("request failed: {}", e))
}

async fn check(
    response: Response,
    op: Op,
    path: &str,
    expected: Option<&ContentHash>,
) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let rate_limited = is_rate_limited(response.headers());
    let message = response
        .json::<ApiError>()
        .await
        .map(|e| e.message)
        .unwrap_or_default();
    Err(status_error(status, rate_limited, op, path, expected, &message))
}

fn is_rate_limited(headers: &HeaderMap) -> bool {
    let exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");
    exhausted || headers.contains_key("retry-after")
}

/// Maps a failed response onto the error taxonomy.
fn status_error(
    status: StatusCode,
    rate_limited: bool,
    op: Op,
    path: &str,
    expected: Option<&ContentHash>,
    message: &str,
) -> FolioError {
    let detail = if message.is_empty() {
        format!("{} ({})", path, status)
    } else {
        format!("{} ({}: {})", path, status, message)
    };
    let conflict = || FolioError::Conflict {
        path: path.to_string(),
        expected: expected.map(ToString::to_string).unwrap_or_default(),
    };

    match status.as_u16() {
        404 => FolioError::NotFound(path.to_string()),
        401 => FolioError::AccessDenied(detail),
        403 | 429 if rate_limited => FolioError::Transient(format!("rate limited: {}", detail)),
        403 => FolioError::AccessDenied(detail),
        429 => FolioError::Transient(format!("rate limited: {}", detail)),
        409 | 422 if op == Op::Create => FolioError::AlreadyExists(path.to_string()),
        409 | 422 if matches!(op, Op::Update | Op::Delete) => conflict(),
        s if s >= 500 => FolioError::Transient(detail),
        _ => FolioError::InvalidInput(detail),
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Directory(Vec<ContentItem>),
    File(ContentItem),
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

impl ContentItem {
    fn into_entry(self) -> Entry {
        let kind = if self.kind == "dir" {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        Entry {
            name: self.name,
            path: self.path,
            kind,
        }
    }

    /// Decodes inline base64 content; `None` when the API left it out.
    fn inline_bytes(&self) -> Result<Option<Vec<u8>>> {
        match (self.encoding.as_deref(), self.content.as_deref()) {
            (Some("base64"), Some(content)) => {
                let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
                BASE64
                    .decode(compact)
                    .map(Some)
                    .map_err(|e| FolioError::Serialization(format!("base64 content of {}: {}", self.path, e)))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    content: ShaOnly,
}

#[derive(Debug, Deserialize)]
struct ShaOnly {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutBody<'a> {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    committer: Option<&'a Committer>,
}

#[derive(Debug, Serialize)]
struct DeleteBody<'a> {
    message: String,
    sha: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    committer: Option<&'a Committer>,
}
