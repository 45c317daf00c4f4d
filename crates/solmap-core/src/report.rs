//! Report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use crate::diagnostic::{Diagnostic, Severity};
use crate::graph::Graph;

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// JSON files listed for the solution
    pub files_listed: usize,

    /// Files fetched and parsed successfully
    pub files_processed: usize,

    /// Files skipped after a fetch or parse failure
    pub files_skipped: usize,

    /// Connector records after de-duplication
    pub connectors: usize,

    /// Data-collection-rule records
    pub dependencies: usize,

    /// Detection-query artifacts collected
    pub queries: usize,

    /// Query hits summed over all connectors
    pub query_hits: usize,

    /// Graph node count
    pub nodes: usize,

    /// Graph edge count
    pub edges: usize,

    /// Total number of diagnostics
    pub total: usize,

    /// Number of errors
    pub errors: usize,

    /// Number of warnings
    pub warnings: usize,

    /// Number of info messages
    pub info: usize,
}

/// Visualization report (report.json v1)
///
/// This is the stable output format consumed by the rendering surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Solution directory the report describes
    pub solution: String,

    /// Summary statistics
    pub summary: ReportSummary,

    /// All diagnostics
    pub diagnostics: Vec<Diagnostic>,

    /// Assembled graph
    pub graph: Graph,

    /// Solution template metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    /// Version of the mechanism rule table that classified the connectors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruleset: Option<u32>,
}

impl Report {
    /// Create a new empty report for a solution
    pub fn new(solution: impl Into<String>) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            solution: solution.into(),
            summary: ReportSummary::default(),
            diagnostics: Vec::new(),
            graph: Graph::default(),
            metadata: None,
            ruleset: None,
        }
    }

    /// Add a diagnostic to the report
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.summary.errors += 1,
            Severity::Warn => self.summary.warnings += 1,
            Severity::Info => self.summary.info += 1,
        }

        self.summary.total += 1;
        self.diagnostics.push(diagnostic);
    }

    /// Attach the assembled graph and refresh node/edge counts
    pub fn set_graph(&mut self, graph: Graph) {
        self.summary.nodes = graph.nodes.len();
        self.summary.edges = graph.edges.len();
        self.graph = graph;
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// One-line status in the style shown to users after a run
    pub fn status_line(&self) -> String {
        format!(
            "Done. Files processed: {}. Rendered {} nodes / {} links.",
            self.summary.files_processed, self.summary.nodes, self.summary.edges
        )
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
