//! GitHub contents API source.
//!
//! Walks a repository through `GET /repos/{owner}/{repo}/contents/{path}`.
//! One request answers both "is this a file or a directory?" and, for
//! directories, "what is inside?". File contents arrive base64-encoded in the
//! same response (decoded lazily), except for large files where the API
//! omits the content and a second request to `download_url` is needed.
//!
//! # Credentials
//!
//! A personal access token is sent as a bearer token on every request,
//! including raw downloads (needed for private repositories).

use crate::error::{ErrorKind, Result};
use crate::{ContentSource, FileBody, InlineBody, RemoteFile, RemotePath, TreeNode};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use exn::ResultExt;
use reqwest::header::{ACCEPT, HeaderMap};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

/// Public GitHub API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com/";
const API_VERSION: &str = "2022-11-28";
const MEDIA_TYPE: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("canopy/", env!("CARGO_PKG_VERSION"));

/// GitHub repository content source.
///
/// # Examples
///
/// ```no_run
/// use canopy_source::backend::GitHubSource;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let source = GitHubSource::new("whosonfirst-data", "whosonfirst-data-admin-us", None, "ghp_...")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GitHubSource {
    name: String,
    client: Client,
    api: Url,
    owner: String,
    repo: String,
    /// `None` means the repository's default branch.
    branch: Option<String>,
    token: String,
}

impl GitHubSource {
    /// Create a new GitHub source.
    ///
    /// # Arguments
    /// * `owner` - User or organisation owning the repository
    /// * `repo` - Repository name
    /// * `branch` - Branch (or any git ref) to walk, defaults to the repository's default branch
    /// * `token` - Personal access token
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: Option<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let owner = owner.into();
        let repo = repo.into();
        let token = token.into();
        if token.is_empty() {
            exn::bail!(ErrorKind::PermissionDenied("missing access token".to_string()));
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .or_raise(|| ErrorKind::Network("could not build HTTP client".to_string()))?;
        let api = Url::parse(DEFAULT_API_URL).or_raise(|| ErrorKind::Network(DEFAULT_API_URL.to_string()))?;
        Ok(Self {
            name: format!("github:{owner}/{repo}"),
            client,
            api,
            owner,
            repo,
            branch,
            token,
        })
    }

    /// Point the source at a different API root (GitHub Enterprise).
    pub fn with_api_url(mut self, api: Url) -> Self {
        self.api = api;
        self
    }

    /// Build the contents endpoint URL for a path, percent-encoding every segment.
    fn contents_url(&self, path: &RemotePath) -> Result<Url> {
        let mut url = self.api.clone();
        {
            let Ok(mut segments) = url.path_segments_mut() else {
                exn::bail!(ErrorKind::InvalidPath(self.api.to_string()));
            };
            segments
                .pop_if_empty()
                .extend(["repos", self.owner.as_str(), self.repo.as_str(), "contents"])
                .extend(path.as_str().split('/'));
        }
        if let Some(branch) = &self.branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }
        Ok(url)
    }

    fn status_error(status: StatusCode, headers: &HeaderMap, path: &RemotePath) -> ErrorKind {
        let exhausted = headers
            .get("x-ratelimit-remaining")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim() == "0");
        match status {
            StatusCode::NOT_FOUND => ErrorKind::NotFound(path.to_string()),
            StatusCode::UNAUTHORIZED => ErrorKind::PermissionDenied(path.to_string()),
            StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited(path.to_string()),
            StatusCode::FORBIDDEN if exhausted => ErrorKind::RateLimited(path.to_string()),
            StatusCode::FORBIDDEN => ErrorKind::PermissionDenied(path.to_string()),
            other => ErrorKind::Network(format!("unexpected status {other} for {path}")),
        }
    }

    /// Turn a decoded API response into a tree node.
    fn node(&self, contents: Contents) -> Result<TreeNode> {
        let entry = match contents {
            Contents::Listing(entries) => {
                let children = entries.into_iter().map(|entry| RemotePath::new(entry.path)).collect::<Result<_>>()?;
                return Ok(TreeNode::Directory(children));
            },
            Contents::Single(entry) => entry,
        };
        if entry.kind != EntryKind::File {
            tracing::debug!(source = %self.name, path = %entry.path, kind = ?entry.kind, "Skipping non-file entry");
            return Ok(TreeNode::Empty);
        }
        let path = RemotePath::new(&entry.path)?;
        let body: Box<dyn FileBody> = match (entry.encoding.as_deref(), entry.content, entry.download_url) {
            (Some("base64"), Some(content), _) => Box::new(Base64Body(content)),
            (_, _, Some(url)) => Box::new(DownloadBody {
                client: self.client.clone(),
                url,
                token: self.token.clone(),
                path: path.clone(),
            }),
            _ if entry.size == 0 => Box::new(InlineBody::new(Vec::new())),
            _ => exn::bail!(ErrorKind::InvalidResponse(format!("no content or download URL for {path}"))),
        };
        Ok(TreeNode::File(RemoteFile::from_boxed(path, body).with_name(entry.name)))
    }
}

#[async_trait]
impl ContentSource for GitHubSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, path: &RemotePath) -> Result<TreeNode> {
        let url = self.contents_url(path)?;
        tracing::debug!(source = %self.name, %url, "Fetching contents");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header(ACCEPT, MEDIA_TYPE)
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await
            .or_raise(|| ErrorKind::Network(format!("request failed for {path}")))?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(Self::status_error(status, response.headers(), path));
        }
        let bytes = response.bytes().await.or_raise(|| ErrorKind::Network(format!("truncated response for {path}")))?;
        let contents: Contents = serde_json::from_slice(&bytes)
            .or_raise(|| ErrorKind::InvalidResponse(format!("malformed contents response for {path}")))?;
        self.node(contents)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Contents {
    Listing(Vec<Entry>),
    Single(Entry),
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(rename = "type")]
    kind: EntryKind,
    name: String,
    path: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// File content embedded in the contents response.
struct Base64Body(String);

#[async_trait]
impl FileBody for Base64Body {
    async fn load(&self) -> Result<Vec<u8>> {
        // GitHub wraps the encoded content at 60 columns.
        let compact: String = self.0.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        BASE64.decode(compact).or_raise(|| ErrorKind::InvalidResponse("invalid base64 content".to_string()))
    }
}

/// File content that needs a second request (files over 1MB).
struct DownloadBody {
    client: Client,
    url: String,
    token: String,
    path: RemotePath,
}

#[async_trait]
impl FileBody for DownloadBody {
    async fn load(&self) -> Result<Vec<u8>> {
        let path = &self.path;
        let response = self
            .client
            .get(&self.url)
            .bearer_auth(&self.token)
            .send()
            .await
            .or_raise(|| ErrorKind::Network(format!("download failed for {path}")))?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(GitHubSource::status_error(status, response.headers(), path));
        }
        let bytes = response.bytes().await.or_raise(|| ErrorKind::Network(format!("truncated download for {path}")))?;
        Ok(bytes.to_vec())
    }

    fn is_remote(&self) -> bool {
        true
    }
}
