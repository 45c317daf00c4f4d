//! Artifact parsing and per-artifact heuristics
//!
//! This crate handles:
//! - Parsing solution JSON documents
//! - Classifying connectors by direction and ingestion mechanism
//! - Inferring destination tables of data collection rules
//! - Routing artifacts into connector and dependency records
//! - Extracting detection queries and solution template metadata

pub mod artifact;
pub mod mechanism;
pub mod tables;
pub mod router;
pub mod query;
pub mod solution;

pub use artifact::{Artifact, ArtifactError, DCR_RESOURCE_TYPE};
pub use mechanism::{classify, Classification, Direction, Mechanism, MechanismClassifier, MechanismRule, RULES_V1, RULESET_VERSION};
pub use tables::{infer_streams, infer_tables, map_stream_to_table};
pub use router::{route_all, ArtifactRouter, ConnectorRecord, DependencyRecord, QueryHit, RouteOutcome, RoutedArtifacts};
pub use query::{is_query_path, QueryArtifact};
pub use solution::{is_main_template_path, SolutionMetadata, TemplateAlertRule, TemplateConnector, TemplateWorkbook};
