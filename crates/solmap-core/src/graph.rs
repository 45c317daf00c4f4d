//! Graph model handed to the rendering surface
//!
//! Nodes are unique by id and edges are unique by their
//! (source, target, relation) triple. Every edge endpoint must name a node
//! of the same graph.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Node identifier
pub type NodeId = String;

/// Kind of entity a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Solution,
    Source,
    Connector,
    Dependency,
    Table,
    Normalization,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solution => "solution",
            Self::Source => "source",
            Self::Connector => "connector",
            Self::Dependency => "dependency",
            Self::Table => "table",
            Self::Normalization => "normalization",
        }
    }

    /// Layer in the solution -> source -> connector -> dependency -> endpoint cascade
    pub fn layer(&self) -> u8 {
        match self {
            Self::Solution => 0,
            Self::Source => 1,
            Self::Connector => 2,
            Self::Dependency => 3,
            Self::Table | Self::Normalization => 4,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Relation carried by a directed edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeRelation {
    /// solution -> connector
    SolutionToConnector,

    /// source -> connector
    Ingests,

    /// connector -> dependency
    ConnectorToDcr,

    /// dependency -> table
    WritesTo,

    /// connector -> normalization
    UsesNorm,
}

impl EdgeRelation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SolutionToConnector => "solution-to-connector",
            Self::Ingests => "ingests",
            Self::ConnectorToDcr => "connector-to-dcr",
            Self::WritesTo => "writes-to",
            Self::UsesNorm => "uses-norm",
        }
    }
}

impl std::fmt::Display for EdgeRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How node identity keys are derived from display names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeIdStyle {
    /// `<kind>:<name>`; same-named entities of different kinds stay distinct
    Namespaced,

    /// Bare names, with `DCR: ` and `Norm: ` prefixes for dependency and
    /// normalization nodes. A table and a connector sharing a name collapse
    /// into one node.
    Legacy,
}

impl Default for NodeIdStyle {
    fn default() -> Self {
        Self::Namespaced
    }
}

impl NodeIdStyle {
    /// Build the identity key for a node of `kind` named `name`
    pub fn node_id(&self, kind: NodeKind, name: &str) -> NodeId {
        match self {
            Self::Namespaced => format!("{}:{}", kind.as_str(), name),
            Self::Legacy => match kind {
                NodeKind::Dependency => format!("DCR: {}", name),
                NodeKind::Normalization => format!("Norm: {}", name),
                _ => name.to_string(),
            },
        }
    }
}

/// A graph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Identity key (never empty)
    pub id: NodeId,

    /// Node kind
    #[serde(rename = "type")]
    pub kind: NodeKind,

    /// Display name
    pub label: String,

    /// Open metadata mapping
    #[serde(default)]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

/// A directed, relation-labeled edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type")]
    pub relation: EdgeRelation,
}

/// Node/edge graph for one solution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,

    #[serde(rename = "links")]
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// All nodes of one kind, in insertion order
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<&GraphNode> {
        self.nodes.iter().filter(|n| n.kind == kind).collect()
    }

    /// Outgoing edges of a node
    pub fn edges_from(&self, id: &str) -> Vec<&GraphEdge> {
        self.edges.iter().filter(|e| e.source == id).collect()
    }

    /// Edges whose source or target is not a node of this graph
    pub fn dangling_edges(&self) -> Vec<&GraphEdge> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .filter(|e| !ids.contains(e.source.as_str()) || !ids.contains(e.target.as_str()))
            .collect()
    }

    /// Edges repeating an earlier (source, target, relation) triple
    pub fn duplicate_edges(&self) -> Vec<&GraphEdge> {
        let mut seen = HashSet::new();
        self.edges.iter().filter(|e| !seen.insert(*e)).collect()
    }

    /// Nodes sorted by cascade layer, stable within a layer
    pub fn layered_nodes(&self) -> Vec<&GraphNode> {
        let mut nodes: Vec<&GraphNode> = self.nodes.iter().collect();
        nodes.sort_by_key(|n| n.kind.layer());
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, kind: NodeKind) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            kind,
            label: id.to_string(),
            meta: serde_json::Map::new(),
        }
    }

    fn edge(source: &str, target: &str, relation: EdgeRelation) -> GraphEdge {
        GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            relation,
        }
    }

    #[test]
    fn namespaced_ids_keep_kinds_apart() {
        let style = NodeIdStyle::Namespaced;
        assert_eq!(style.node_id(NodeKind::Table, "Syslog"), "table:Syslog");
        assert_ne!(
            style.node_id(NodeKind::Table, "Syslog"),
            style.node_id(NodeKind::Connector, "Syslog")
        );
    }

    #[test]
    fn legacy_ids_match_bare_names() {
        let style = NodeIdStyle::Legacy;
        assert_eq!(style.node_id(NodeKind::Dependency, "dcr1"), "DCR: dcr1");
        assert_eq!(style.node_id(NodeKind::Normalization, "Conn"), "Norm: Conn");
        assert_eq!(
            style.node_id(NodeKind::Table, "Syslog"),
            style.node_id(NodeKind::Connector, "Syslog")
        );
    }

    #[test]
    fn detects_dangling_and_duplicate_edges() {
        let graph = Graph {
            nodes: vec![node("a", NodeKind::Connector), node("b", NodeKind::Table)],
            edges: vec![
                edge("a", "b", EdgeRelation::ConnectorToDcr),
                edge("a", "b", EdgeRelation::ConnectorToDcr),
                edge("a", "missing", EdgeRelation::UsesNorm),
            ],
        };

        assert_eq!(graph.dangling_edges().len(), 1);
        assert_eq!(graph.duplicate_edges().len(), 1);
        assert_eq!(graph.edges_from("a").len(), 3);
    }

    #[test]
    fn serializes_with_renderer_field_names() {
        let graph = Graph {
            nodes: vec![node("a", NodeKind::Solution)],
            edges: vec![edge("a", "a", EdgeRelation::WritesTo)],
        };
        let json = serde_json::to_value(&graph).unwrap();

        assert_eq!(json["nodes"][0]["type"], "solution");
        assert_eq!(json["links"][0]["type"], "writes-to");
    }

    #[test]
    fn layered_order() {
        let graph = Graph {
            nodes: vec![
                node("t", NodeKind::Table),
                node("c", NodeKind::Connector),
                node("s", NodeKind::Solution),
            ],
            edges: Vec::new(),
        };
        let kinds: Vec<NodeKind> = graph.layered_nodes().iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NodeKind::Solution, NodeKind::Connector, NodeKind::Table]);
    }
}
