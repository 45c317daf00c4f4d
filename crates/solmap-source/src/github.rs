//! GitHub content source
//!
//! Uses the REST contents, branches and recursive trees endpoints for
//! listings, and the raw-content host for file bodies. An access token is
//! optional; without one, requests are subject to anonymous rate limits.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let source = GitHubSource::from_config(&config.github)?;
//! let repo = RepositoryRef::parse("Azure/Azure-Sentinel")?;
//! let solutions = list_solutions(&source, &repo, "Solutions").await?;
//! ```

use crate::adapter::{
    ContentSource, DirectoryEntry, EntryKind, FetchError, FetchStage, RepositoryRef, TreeEntry, TreeListing,
};
use serde::Deserialize;
use serde_json::Value;
use solmap_core::GitHubConfig;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ContentsItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<RawTreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct RawTreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

fn entry_kind(kind: &str) -> EntryKind {
    match kind {
        "file" | "blob" => EntryKind::File,
        "dir" | "tree" => EntryKind::Directory,
        _ => EntryKind::Other,
    }
}

/// Percent-encode each segment of a `/`-separated path
fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// GitHub content source
pub struct GitHubSource {
    http_client: reqwest::Client,
    api_base_url: String,
    raw_base_url: String,
    token: Option<String>,
}

impl GitHubSource {
    /// Create a source from the `[github]` configuration section.
    /// The token is read from the configured environment variable.
    pub fn from_config(config: &GitHubConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::ConfigError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            raw_base_url: config.raw_base_url.trim_end_matches('/').to_string(),
            token: config.token(),
        })
    }

    /// Override the access token
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn repo_url(&self, repo: &RepositoryRef) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_base_url,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name)
        )
    }

    /// GET `url`, failing with a stage-labelled error on non-success status
    async fn get(&self, stage: FetchStage, url: &str) -> Result<reqwest::Response, FetchError> {
        tracing::debug!(stage = %stage, url = %url, "GET");

        let mut request = self.http_client.get(url);
        if let Some(token) = &self.token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("token {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("").to_string()
            } else {
                body
            };
            return Err(FetchError::Status {
                stage,
                status: status.as_u16(),
                detail,
            });
        }

        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, stage: FetchStage, url: &str) -> Result<T, FetchError> {
        self.get(stage, url)
            .await?
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(format!("{}: {}", stage, e)))
    }
}

#[async_trait::async_trait]
impl ContentSource for GitHubSource {
    fn name(&self) -> &'static str {
        "GitHub"
    }

    async fn list_directories(&self, repo: &RepositoryRef, path: &str) -> Result<Vec<DirectoryEntry>, FetchError> {
        let url = format!("{}/contents/{}", self.repo_url(repo), encode_path(path));
        let items: Vec<ContentsItem> = self.get_json(FetchStage::GitHubApi, &url).await?;

        Ok(items
            .into_iter()
            .map(|item| DirectoryEntry {
                kind: entry_kind(&item.kind),
                name: item.name,
                path: item.path,
            })
            .collect())
    }

    async fn resolve_tree_root(&self, repo: &RepositoryRef, branch: &str) -> Result<String, FetchError> {
        let url = format!("{}/branches/{}", self.repo_url(repo), urlencoding::encode(branch));
        let body: Value = self.get_json(FetchStage::BranchApi, &url).await?;

        body.pointer("/commit/commit/tree/sha")
            .and_then(Value::as_str)
            .filter(|sha| !sha.is_empty())
            .map(str::to_string)
            .ok_or_else(|| FetchError::InvalidResponse("Could not resolve branch tree SHA.".to_string()))
    }

    async fn list_tree(&self, repo: &RepositoryRef, tree_root: &str) -> Result<TreeListing, FetchError> {
        let url = format!(
            "{}/git/trees/{}?recursive=1",
            self.repo_url(repo),
            urlencoding::encode(tree_root)
        );
        let tree: TreeResponse = self.get_json(FetchStage::TreesApi, &url).await?;

        if tree.truncated {
            tracing::warn!(repo = %repo, "recursive tree listing was truncated by the host");
        }

        Ok(TreeListing {
            entries: tree
                .tree
                .into_iter()
                .map(|e| TreeEntry {
                    kind: entry_kind(&e.kind),
                    path: e.path,
                })
                .collect(),
            truncated: tree.truncated,
        })
    }

    async fn fetch_raw(&self, repo: &RepositoryRef, branch: &str, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = format!(
            "{}/{}/{}/{}/{}",
            self.raw_base_url,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            urlencoding::encode(branch),
            encode_path(path)
        );

        let bytes = self
            .get(FetchStage::RawContent, &url)
            .await?
            .bytes()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}
