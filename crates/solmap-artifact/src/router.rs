//! Routing artifacts into connector and dependency records
//!
//! Each artifact becomes at most one record: dependency detection runs
//! first, and a dependency is never also a connector. Once every artifact of
//! a solution has been routed, every dependency is associated with every
//! connector. The input carries no reliable per-connector link, so this
//! solution-wide fan-out is an over-approximation.

use crate::artifact::{first_text, Artifact};
use crate::mechanism::{Direction, Mechanism, MechanismClassifier};
use crate::tables::{infer_streams, infer_tables};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Role placeholder attached to every dependency
pub const DEFAULT_DCR_ROLE: &str = "Monitoring Metrics Publisher";

/// Data-collection-rule shaped artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub name: String,
    pub path: String,
    pub streams: BTreeSet<String>,
    pub tables: BTreeSet<String>,
    pub destinations: Vec<String>,
    pub roles: Vec<String>,
}

impl DependencyRecord {
    /// Build a dependency record from a data-collection-rule shaped artifact
    pub fn from_artifact(artifact: &Artifact) -> Self {
        let name = first_text([artifact.field("name")])
            .unwrap_or_else(|| artifact.file_name().to_string());

        let destinations = artifact
            .property("destinations")
            .and_then(Value::as_object)
            .map(|d| d.keys().cloned().collect())
            .unwrap_or_default();

        Self {
            name,
            path: artifact.path().to_string(),
            streams: infer_streams(artifact),
            tables: infer_tables(artifact),
            destinations,
            roles: vec![DEFAULT_DCR_ROLE.to_string()],
        }
    }
}

/// A detection query that references a connector's tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHit {
    pub name: String,
    pub path: String,
}

/// Connector-like artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorRecord {
    pub name: String,
    pub data_source: String,
    pub direction: Direction,
    pub mechanism: Mechanism,
    pub is_ccf: bool,
    pub path: String,

    /// Dependencies found anywhere in the solution
    #[serde(default)]
    pub dependencies: Vec<DependencyRecord>,

    /// Queries that use one of this connector's tables
    #[serde(default)]
    pub hits: Vec<QueryHit>,

    /// Normalization tokens found in matching queries
    #[serde(default)]
    pub normalization: BTreeSet<String>,
}

impl ConnectorRecord {
    /// Number of query hits
    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }
}

/// Where an artifact ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Dependency,
    Connector,
    Unclassified,
}

/// Connector and dependency records of one solution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutedArtifacts {
    pub connectors: Vec<ConnectorRecord>,
    pub dependencies: Vec<DependencyRecord>,
}

/// Routes the artifacts of one solution
#[derive(Debug, Clone)]
pub struct ArtifactRouter {
    solution_name: String,
    classifier: MechanismClassifier,
    connectors: Vec<ConnectorRecord>,
    dependencies: Vec<DependencyRecord>,
}

impl ArtifactRouter {
    pub fn new(solution_name: impl Into<String>) -> Self {
        Self::with_classifier(solution_name, MechanismClassifier::default())
    }

    pub fn with_classifier(solution_name: impl Into<String>, classifier: MechanismClassifier) -> Self {
        Self {
            solution_name: solution_name.into(),
            classifier,
            connectors: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Route one artifact
    pub fn route(&mut self, artifact: &Artifact) -> RouteOutcome {
        if artifact.has_dcr_shape() {
            let record = DependencyRecord::from_artifact(artifact);
            tracing::debug!(
                path = %artifact.path(),
                name = %record.name,
                tables = record.tables.len(),
                "routed as dependency"
            );
            self.dependencies.push(record);
            return RouteOutcome::Dependency;
        }

        if artifact.has_connector_signals() {
            let record = self.connector_record(artifact);
            tracing::debug!(
                path = %artifact.path(),
                name = %record.name,
                mechanism = %record.mechanism,
                "routed as connector"
            );
            self.connectors.push(record);
            return RouteOutcome::Connector;
        }

        tracing::debug!(path = %artifact.path(), "no connector or dependency signals");
        RouteOutcome::Unclassified
    }

    fn connector_record(&self, artifact: &Artifact) -> ConnectorRecord {
        let classification = self.classifier.classify(artifact);
        let ui = artifact.ui_config();

        let name = first_text([
            ui.and_then(|u| u.get("title")),
            ui.and_then(|u| u.get("displayName")),
            artifact.field("name"),
        ])
        .or_else(|| non_blank(artifact.file_name()))
        .unwrap_or_else(|| "Unnamed Connector".to_string());

        let data_source = first_text([
            ui.and_then(|u| u.get("publisherName")),
            ui.and_then(|u| u.get("publisher")),
        ])
        .or_else(|| non_blank(&self.solution_name))
        .or_else(|| non_blank(artifact.file_stem()))
        .unwrap_or_else(|| "Unknown".to_string());

        ConnectorRecord {
            name,
            data_source,
            direction: classification.direction,
            mechanism: classification.mechanism,
            is_ccf: classification.is_ccf,
            path: artifact.path().to_string(),
            dependencies: Vec::new(),
            hits: Vec::new(),
            normalization: BTreeSet::new(),
        }
    }

    /// Finish routing and fan dependencies out to every connector
    pub fn finish(self) -> RoutedArtifacts {
        let mut connectors = self.connectors;
        for connector in &mut connectors {
            connector.dependencies = self.dependencies.clone();
        }

        RoutedArtifacts {
            connectors,
            dependencies: self.dependencies,
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Route an already-parsed artifact collection
pub fn route_all<'a>(
    solution_name: &str,
    artifacts: impl IntoIterator<Item = &'a Artifact>,
) -> RoutedArtifacts {
    let mut router = ArtifactRouter::new(solution_name);
    for artifact in artifacts {
        router.route(artifact);
    }
    router.finish()
}
