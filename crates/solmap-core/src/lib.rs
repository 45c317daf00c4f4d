//! Solmap Core
//!
//! Core domain model with stable, versioned types.
//! Never rename diagnostic codes - they are part of the public API.

pub mod diagnostic;
pub mod graph;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, Location};
pub use graph::{Graph, GraphNode, GraphEdge, NodeKind, EdgeRelation, NodeId, NodeIdStyle};
pub use report::{Report, ReportSummary, ReportVersion};
pub use config::{Config, RepositoryConfig, GitHubConfig, GraphConfig, PathFilter, SeverityThreshold, ConfigError};
