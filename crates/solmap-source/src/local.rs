//! Local checkout content source
//!
//! Reads a cloned repository from disk. Branches are ignored: the checkout
//! is whatever is on disk, and its tree root is the checkout directory.

use crate::adapter::{ContentSource, DirectoryEntry, EntryKind, FetchError, RepositoryRef, TreeEntry, TreeListing};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Tree id reported for a local checkout
pub const LOCAL_TREE_ROOT: &str = ".";

/// Content source over a local checkout
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a repository-relative path, refusing to leave the checkout
    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative.components().any(|c| matches!(c, Component::ParentDir | Component::Prefix(_))) {
            return Err(FetchError::NotFound(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        (!parts.is_empty()).then(|| parts.join("/"))
    }
}

fn io_error(path: &str, err: std::io::Error) -> FetchError {
    if err.kind() == std::io::ErrorKind::NotFound {
        FetchError::NotFound(path.to_string())
    } else {
        FetchError::IoError(format!("{}: {}", path, err))
    }
}

fn walk_error(err: walkdir::Error) -> FetchError {
    let path = err.path().map(|p| p.display().to_string()).unwrap_or_default();
    match err.into_io_error() {
        Some(io) => io_error(&path, io),
        None => FetchError::IoError(format!("{}: filesystem loop", path)),
    }
}

fn kind_of(file_type: std::fs::FileType) -> EntryKind {
    if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

#[async_trait::async_trait]
impl ContentSource for LocalSource {
    fn name(&self) -> &'static str {
        "Local"
    }

    async fn list_directories(&self, _repo: &RepositoryRef, path: &str) -> Result<Vec<DirectoryEntry>, FetchError> {
        let dir = self.resolve(path)?;
        if !dir.is_dir() {
            return Err(FetchError::NotFound(path.to_string()));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(walk_error)?;
            let Some(relative) = self.relative_path(entry.path()) else {
                continue;
            };
            entries.push(DirectoryEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: relative,
                kind: kind_of(entry.file_type()),
            });
        }

        Ok(entries)
    }

    async fn resolve_tree_root(&self, _repo: &RepositoryRef, _branch: &str) -> Result<String, FetchError> {
        if self.root.is_dir() {
            Ok(LOCAL_TREE_ROOT.to_string())
        } else {
            Err(FetchError::NotFound(self.root.display().to_string()))
        }
    }

    async fn list_tree(&self, _repo: &RepositoryRef, _tree_root: &str) -> Result<TreeListing, FetchError> {
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git");

        let mut entries = Vec::new();
        for entry in walker {
            let entry = entry.map_err(walk_error)?;
            if let Some(path) = self.relative_path(entry.path()) {
                entries.push(TreeEntry {
                    path,
                    kind: kind_of(entry.file_type()),
                });
            }
        }

        tracing::debug!(root = %self.root.display(), entries = entries.len(), "walked local checkout");
        Ok(TreeListing {
            entries,
            truncated: false,
        })
    }

    async fn fetch_raw(&self, _repo: &RepositoryRef, _branch: &str, path: &str) -> Result<Vec<u8>, FetchError> {
        let file = self.resolve(path)?;
        std::fs::read(&file).map_err(|e| io_error(path, e))
    }
}
