//! Detection query artifacts

use crate::artifact::{first_text, Artifact};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a path looks like a detection query file.
///
/// Matches a `hunting` or `hunting queries` directory anywhere in the path,
/// or `hunting` mentioned in the last two segments.
pub fn is_query_path(path: &str) -> bool {
    let lowered = path.to_lowercase();
    if lowered.contains("/hunting/") || lowered.contains("/hunting queries/") {
        return true;
    }

    let segments: Vec<&str> = lowered.rsplit('/').take(2).collect();
    segments.iter().any(|s| s.contains("hunting"))
}

/// A detection query: display name, source path and body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryArtifact {
    pub name: String,
    pub path: String,
    pub query: String,
}

impl QueryArtifact {
    pub fn new(name: impl Into<String>, path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            query: query.into(),
        }
    }

    /// Extract a query from an artifact. `None` when the body is missing or blank.
    pub fn from_artifact(artifact: &Artifact) -> Option<Self> {
        let query = [
            artifact.property("query"),
            artifact.field("query"),
            artifact.property("kql"),
        ]
        .into_iter()
        .flatten()
        .find_map(Value::as_str)
        .filter(|q| !q.trim().is_empty())?;

        let name = first_text([
            artifact.property("displayName"),
            artifact.property("title"),
            artifact.field("name"),
        ])
        .unwrap_or_else(|| artifact.file_name().to_string());

        Some(Self::new(name, artifact.path(), query))
    }
}
