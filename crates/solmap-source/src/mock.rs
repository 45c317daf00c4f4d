//! In-memory content source for testing
//!
//! Files live in a map keyed by repository-relative path. Directory
//! listings and the recursive tree are derived from those keys, so a mock
//! only needs its files. Repository and branch arguments are ignored.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let source = MockSourceBuilder::new()
//!     .with_json("Solutions/Contoso/Data Connectors/conn.json", json!({"kind": "Customizable"}))
//!     .with_error("Solutions/Contoso/broken.json", FetchError::NotFound("gone".into()))
//!     .build();
//!
//! let bytes = source.fetch_raw(&repo, "master", "Solutions/Contoso/Data Connectors/conn.json").await?;
//! ```

use crate::adapter::{ContentSource, DirectoryEntry, EntryKind, FetchError, FetchStage, RepositoryRef, TreeEntry, TreeListing};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Tree id reported by the mock
pub const MOCK_TREE_ROOT: &str = "mock-tree";

/// In-memory content source
///
/// Clones share state, so a test can keep a handle and inspect fetch
/// counts after handing a clone to the code under test.
#[derive(Clone)]
pub struct MockSource {
    /// File contents by path
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,

    /// Errors to return for specific paths
    errors: Arc<RwLock<HashMap<String, FetchError>>>,

    /// Errors to return for every call of a stage
    stage_failures: Arc<RwLock<HashMap<FetchStage, FetchError>>>,

    /// Number of `fetch_raw` calls per path
    fetches: Arc<RwLock<HashMap<String, usize>>>,

    total_fetches: Arc<AtomicUsize>,

    /// Report the tree listing as truncated
    truncated: bool,

    /// Simulate latency (milliseconds)
    latency_ms: u64,

    source_name: &'static str,
}

impl MockSource {
    pub fn new() -> Self {
        MockSourceBuilder::new().build()
    }

    /// Add or replace a file
    pub async fn add_file(&self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.write().await.insert(path.into(), contents.into());
    }

    /// Add or replace a JSON file
    pub async fn add_json(&self, path: impl Into<String>, value: &Value) {
        self.add_file(path, value.to_string()).await;
    }

    /// Configure an error to be returned when fetching `path`
    pub async fn add_error_for_path(&self, path: impl Into<String>, error: FetchError) {
        self.errors.write().await.insert(path.into(), error);
    }

    /// Configure an error for every call of `stage`
    pub async fn fail_stage(&self, stage: FetchStage, error: FetchError) {
        self.stage_failures.write().await.insert(stage, error);
    }

    pub async fn file_count(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn clear_errors(&self) {
        self.errors.write().await.clear();
        self.stage_failures.write().await.clear();
    }

    /// How many times `path` was fetched
    pub async fn fetch_count(&self, path: &str) -> usize {
        self.fetches.read().await.get(path).copied().unwrap_or(0)
    }

    /// Total number of `fetch_raw` calls
    pub fn total_fetches(&self) -> usize {
        self.total_fetches.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
    }

    async fn check_stage(&self, stage: FetchStage) -> Result<(), FetchError> {
        self.simulate_latency().await;
        match self.stage_failures.read().await.get(&stage) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// Every directory implied by the stored file paths
    fn directories(files: &BTreeMap<String, Vec<u8>>) -> BTreeSet<String> {
        let mut dirs = BTreeSet::new();
        for path in files.keys() {
            let mut current = path.as_str();
            while let Some((parent, _)) = current.rsplit_once('/') {
                dirs.insert(parent.to_string());
                current = parent;
            }
        }
        dirs
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ContentSource for MockSource {
    fn name(&self) -> &'static str {
        self.source_name
    }

    async fn list_directories(&self, _repo: &RepositoryRef, path: &str) -> Result<Vec<DirectoryEntry>, FetchError> {
        self.check_stage(FetchStage::GitHubApi).await?;

        let files = self.files.read().await;
        let dirs = Self::directories(&files);
        let base = path.trim_matches('/');
        if !base.is_empty() && !dirs.contains(base) {
            return Err(FetchError::Status {
                stage: FetchStage::GitHubApi,
                status: 404,
                detail: "Not Found".to_string(),
            });
        }

        let child_of = |candidate: &str| -> Option<String> {
            let rest = if base.is_empty() {
                candidate
            } else {
                candidate.strip_prefix(base)?.strip_prefix('/')?
            };
            (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
        };

        let mut entries: Vec<DirectoryEntry> = dirs
            .iter()
            .filter_map(|d| child_of(d.as_str()).map(|name| (d, name, EntryKind::Directory)))
            .chain(files.keys().filter_map(|f| child_of(f.as_str()).map(|name| (f, name, EntryKind::File))))
            .map(|(path, name, kind)| DirectoryEntry {
                name,
                path: path.clone(),
                kind,
            })
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(entries)
    }

    async fn resolve_tree_root(&self, _repo: &RepositoryRef, _branch: &str) -> Result<String, FetchError> {
        self.check_stage(FetchStage::BranchApi).await?;
        Ok(MOCK_TREE_ROOT.to_string())
    }

    async fn list_tree(&self, _repo: &RepositoryRef, _tree_root: &str) -> Result<TreeListing, FetchError> {
        self.check_stage(FetchStage::TreesApi).await?;

        let files = self.files.read().await;
        let mut entries: Vec<TreeEntry> = Self::directories(&files)
            .into_iter()
            .map(|path| TreeEntry {
                path,
                kind: EntryKind::Directory,
            })
            .chain(files.keys().cloned().map(TreeEntry::blob))
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(TreeListing {
            entries,
            truncated: self.truncated,
        })
    }

    async fn fetch_raw(&self, _repo: &RepositoryRef, _branch: &str, path: &str) -> Result<Vec<u8>, FetchError> {
        self.total_fetches.fetch_add(1, Ordering::SeqCst);
        *self.fetches.write().await.entry(path.to_string()).or_insert(0) += 1;

        self.check_stage(FetchStage::RawContent).await?;

        if let Some(error) = self.errors.read().await.get(path) {
            return Err(error.clone());
        }

        self.files
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                stage: FetchStage::RawContent,
                status: 404,
                detail: format!("404: Not Found ({})", path),
            })
    }
}

/// Builder for creating a MockSource with predefined files
pub struct MockSourceBuilder {
    files: BTreeMap<String, Vec<u8>>,
    errors: HashMap<String, FetchError>,
    stage_failures: HashMap<FetchStage, FetchError>,
    truncated: bool,
    latency_ms: u64,
    source_name: &'static str,
}

impl MockSourceBuilder {
    pub fn new() -> Self {
        Self {
            files: BTreeMap::new(),
            errors: HashMap::new(),
            stage_failures: HashMap::new(),
            truncated: false,
            latency_ms: 0,
            source_name: "Mock",
        }
    }

    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    pub fn with_json(self, path: impl Into<String>, value: Value) -> Self {
        self.with_file(path, value.to_string())
    }

    /// Fail fetches of `path` with `error`
    pub fn with_error(mut self, path: impl Into<String>, error: FetchError) -> Self {
        self.errors.insert(path.into(), error);
        self
    }

    /// Fail every call of `stage` with `error`
    pub fn with_stage_failure(mut self, stage: FetchStage, error: FetchError) -> Self {
        self.stage_failures.insert(stage, error);
        self
    }

    pub fn with_truncated_tree(mut self) -> Self {
        self.truncated = true;
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.source_name = name;
        self
    }

    pub fn build(self) -> MockSource {
        MockSource {
            files: Arc::new(RwLock::new(self.files)),
            errors: Arc::new(RwLock::new(self.errors)),
            stage_failures: Arc::new(RwLock::new(self.stage_failures)),
            fetches: Arc::new(RwLock::new(HashMap::new())),
            total_fetches: Arc::new(AtomicUsize::new(0)),
            truncated: self.truncated,
            latency_ms: self.latency_ms,
            source_name: self.source_name,
        }
    }
}

impl Default for MockSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
