//! Content sources for reading a solutions repository
//!
//! This module provides sources that list and fetch the files of a
//! solutions repository:
//! - `GitHubSource` - GitHub REST API and raw-content host
//! - `LocalSource` - a local checkout on disk
//! - `MockSource` - in-memory files for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use solmap_source::{list_solution_json_paths, GitHubSource, RepositoryRef};
//!
//! let source = GitHubSource::from_config(&config.github)?;
//! let repo = RepositoryRef::parse("Azure/Azure-Sentinel")?;
//! let files = list_solution_json_paths(&source, &repo, "master", "Solutions", "Syslog").await?;
//! ```

pub mod adapter;
pub mod github;
pub mod local;
pub mod mock;

pub use adapter::{
    list_solution_json_paths, list_solutions, ContentSource, DirectoryEntry, EntryKind, FetchError, FetchStage,
    RepositoryRef, SolutionPaths, TreeEntry, TreeListing,
};
pub use github::GitHubSource;
pub use local::{LocalSource, LOCAL_TREE_ROOT};
pub use mock::{MockSource, MockSourceBuilder, MOCK_TREE_ROOT};
