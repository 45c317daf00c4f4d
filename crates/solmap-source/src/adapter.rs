//! Content source trait for reading a solutions repository

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a repository as `owner/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `owner/name`. Both halves must be non-empty and there must be
    /// exactly one separator.
    pub fn parse(s: &str) -> Result<Self, FetchError> {
        let invalid = || FetchError::ConfigError(format!("Repo must be like Azure/Azure-Sentinel, got '{}'", s));

        let (owner, name) = s.trim().split_once('/').ok_or_else(invalid)?;
        let (owner, name) = (owner.trim(), name.trim());
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self::new(owner, name))
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

/// Kind of repository entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
}

impl DirectoryEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// One entry of a recursive tree listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the repository root, `/`-separated
    pub path: String,
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
        }
    }

    pub fn is_blob(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Recursive tree listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeListing {
    pub entries: Vec<TreeEntry>,

    /// The host cut the listing short
    #[serde(default)]
    pub truncated: bool,
}

/// Step of a fetch, used to label errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchStage {
    /// Directory listing
    GitHubApi,
    /// Branch to tree id resolution
    BranchApi,
    /// Recursive tree listing
    TreesApi,
    /// Raw file content
    RawContent,
}

impl FetchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitHubApi => "GitHub API",
            Self::BranchApi => "Branch API",
            Self::TreesApi => "Trees API",
            Self::RawContent => "Raw content",
        }
    }
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur when reading from a content source
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("{stage} error {status}: {detail}")]
    Status {
        stage: FetchStage,
        status: u16,
        detail: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl FetchError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Trait for sources that can list and read a solutions repository
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    /// Get the source name (e.g., "GitHub", "Local")
    fn name(&self) -> &'static str;

    /// List the immediate entries of a directory
    async fn list_directories(&self, repo: &RepositoryRef, path: &str) -> Result<Vec<DirectoryEntry>, FetchError>;

    /// Resolve a branch to the id of its root tree
    async fn resolve_tree_root(&self, repo: &RepositoryRef, branch: &str) -> Result<String, FetchError>;

    /// List every entry under a tree, recursively
    async fn list_tree(&self, repo: &RepositoryRef, tree_root: &str) -> Result<TreeListing, FetchError>;

    /// Fetch the raw bytes of one file
    async fn fetch_raw(&self, repo: &RepositoryRef, branch: &str, path: &str) -> Result<Vec<u8>, FetchError>;
}

/// JSON files of one solution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionPaths {
    pub paths: Vec<String>,

    /// The underlying tree listing was incomplete
    pub truncated: bool,
}

/// List solution directory names under `root`, sorted
pub async fn list_solutions<S>(source: &S, repo: &RepositoryRef, root: &str) -> Result<Vec<String>, FetchError>
where
    S: ContentSource + ?Sized,
{
    let mut names: Vec<String> = source
        .list_directories(repo, root)
        .await?
        .into_iter()
        .filter(DirectoryEntry::is_dir)
        .map(|e| e.name)
        .collect();

    names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    Ok(names)
}

/// List the `.json` blobs under `<root>/<solution>/`
pub async fn list_solution_json_paths<S>(
    source: &S,
    repo: &RepositoryRef,
    branch: &str,
    root: &str,
    solution: &str,
) -> Result<SolutionPaths, FetchError>
where
    S: ContentSource + ?Sized,
{
    let tree_root = source.resolve_tree_root(repo, branch).await?;
    tracing::debug!(repo = %repo, branch = %branch, tree = %tree_root, "resolved tree root");

    let listing = source.list_tree(repo, &tree_root).await?;
    let prefix = solution_prefix(root, solution);

    let paths = listing
        .entries
        .into_iter()
        .filter(|e| e.is_blob() && e.path.starts_with(&prefix) && e.path.to_lowercase().ends_with(".json"))
        .map(|e| e.path)
        .collect();

    Ok(SolutionPaths {
        paths,
        truncated: listing.truncated,
    })
}

fn solution_prefix(root: &str, solution: &str) -> String {
    let root = root.trim_matches('/');
    if root.is_empty() {
        format!("{}/", solution)
    } else {
        format!("{}/{}/", root, solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_ref_parse() {
        let repo = RepositoryRef::parse("Azure/Azure-Sentinel").unwrap();
        assert_eq!(repo.owner, "Azure");
        assert_eq!(repo.name, "Azure-Sentinel");
        assert_eq!(repo.to_string(), "Azure/Azure-Sentinel");
    }

    #[test]
    fn test_repository_ref_rejects_bad_shapes() {
        for bad in ["", "Azure", "/repo", "owner/", "a/b/c"] {
            assert!(matches!(RepositoryRef::parse(bad), Err(FetchError::ConfigError(_))), "{}", bad);
        }
    }

    #[test]
    fn test_status_error_message_names_stage() {
        let err = FetchError::Status {
            stage: FetchStage::TreesApi,
            status: 403,
            detail: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "Trees API error 403: rate limited");
        assert_eq!(err.status(), Some(403));
        assert_eq!(FetchError::NotFound("x".into()).status(), None);
    }

    #[test]
    fn test_solution_prefix() {
        assert_eq!(solution_prefix("Solutions", "Syslog"), "Solutions/Syslog/");
        assert_eq!(solution_prefix("/Solutions/", "Syslog"), "Solutions/Syslog/");
        assert_eq!(solution_prefix("", "Syslog"), "Syslog/");
    }
}
