//! Graph assembly
//!
//! Folds enriched connector records into one node/edge graph:
//!
//! ```text
//! solution -> connector <- source
//!             connector -> dependency -> table
//!             connector -> normalization
//! ```
//!
//! Node creation is idempotent by id: re-adding a node merges its metadata
//! (shallow, later keys overwrite). Edge creation is idempotent by the
//! (source, target, relation) triple. Edges are only added between admitted
//! nodes, so every edge endpoint exists in the node set.

use serde_json::{json, Map, Value};
use solmap_artifact::{ConnectorRecord, DependencyRecord, SolutionMetadata};
use solmap_core::{EdgeRelation, Graph, GraphEdge, GraphNode, NodeId, NodeIdStyle, NodeKind};
use std::collections::{HashMap, HashSet};

/// Solution node name used when nothing better is known
pub const DEFAULT_SOLUTION_NAME: &str = "Solution";

/// Keep the first connector of each name, preserving order
pub fn dedup_connectors(connectors: Vec<ConnectorRecord>) -> Vec<ConnectorRecord> {
    partition_duplicates(connectors).0
}

/// Split connectors into first occurrences by name and the later duplicates
pub fn partition_duplicates(connectors: Vec<ConnectorRecord>) -> (Vec<ConnectorRecord>, Vec<ConnectorRecord>) {
    let mut seen = HashSet::new();
    connectors.into_iter().partition(|c| {
        let first = seen.insert(c.name.clone());
        if !first {
            tracing::debug!(name = %c.name, path = %c.path, "dropping duplicate connector");
        }
        first
    })
}

/// Assembles graphs in one node identity style
#[derive(Debug, Clone)]
pub struct GraphAssembler {
    style: NodeIdStyle,
    default_solution_name: String,
}

impl Default for GraphAssembler {
    fn default() -> Self {
        Self::new(NodeIdStyle::default())
    }
}

impl GraphAssembler {
    pub fn new(style: NodeIdStyle) -> Self {
        Self {
            style,
            default_solution_name: DEFAULT_SOLUTION_NAME.to_string(),
        }
    }

    /// Solution node name used when the metadata carries none
    pub fn with_default_solution_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.default_solution_name = name.trim().to_string();
        }
        self
    }

    pub fn style(&self) -> NodeIdStyle {
        self.style
    }

    /// Build the graph for one solution
    pub fn assemble(&self, connectors: &[ConnectorRecord], metadata: Option<&SolutionMetadata>) -> Graph {
        let mut builder = GraphBuilder::new(self.style);

        let solution_name = metadata
            .and_then(SolutionMetadata::name)
            .unwrap_or(self.default_solution_name.as_str());
        let solution_id = builder.add_node(NodeKind::Solution, solution_name, solution_meta(metadata));

        for connector in connectors {
            let connector_id = builder.add_node(NodeKind::Connector, &connector.name, connector_meta(connector));
            let source_id = builder.add_node(NodeKind::Source, &connector.data_source, Map::new());

            builder.add_edge(solution_id.as_ref(), connector_id.as_ref(), EdgeRelation::SolutionToConnector);
            builder.add_edge(source_id.as_ref(), connector_id.as_ref(), EdgeRelation::Ingests);

            for dependency in &connector.dependencies {
                let dependency_id = builder.add_node(NodeKind::Dependency, &dependency.name, dependency_meta(dependency));
                builder.add_edge(connector_id.as_ref(), dependency_id.as_ref(), EdgeRelation::ConnectorToDcr);

                for table in &dependency.tables {
                    let table_id = builder.add_node(NodeKind::Table, table, Map::new());
                    builder.add_edge(dependency_id.as_ref(), table_id.as_ref(), EdgeRelation::WritesTo);
                }
            }

            if !connector.normalization.is_empty() {
                let mut meta = Map::new();
                meta.insert("tokens".to_string(), json!(connector.normalization));
                let norm_id = builder.add_node(NodeKind::Normalization, &connector.name, meta);
                builder.add_edge(connector_id.as_ref(), norm_id.as_ref(), EdgeRelation::UsesNorm);
            }
        }

        let graph = builder.finish();
        tracing::debug!(nodes = graph.nodes.len(), edges = graph.edges.len(), "assembled graph");
        graph
    }
}

fn solution_meta(metadata: Option<&SolutionMetadata>) -> Map<String, Value> {
    let mut meta = Map::new();
    if let Some(m) = metadata {
        meta.insert("contactEmail".to_string(), json!(m.contact_email));
        meta.insert("publisher".to_string(), json!(m.publisher));
        meta.insert("connectors".to_string(), json!(m.connectors.len()));
        meta.insert("workbooks".to_string(), json!(m.workbooks.len()));
        meta.insert("analyticRules".to_string(), json!(m.analytic_rules.len()));
    }
    meta
}

fn connector_meta(connector: &ConnectorRecord) -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert("dataSource".to_string(), json!(connector.data_source));
    meta.insert("direction".to_string(), json!(connector.direction));
    meta.insert("mechanism".to_string(), json!(connector.mechanism));
    meta.insert("isCCF".to_string(), json!(connector.is_ccf));
    meta.insert("hitCount".to_string(), json!(connector.hit_count()));
    meta.insert("hits".to_string(), json!(connector.hits));
    meta.insert("normalization".to_string(), json!(connector.normalization));
    meta.insert("path".to_string(), json!(connector.path));
    meta
}

fn dependency_meta(dependency: &DependencyRecord) -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert("streams".to_string(), json!(dependency.streams));
    meta.insert("tables".to_string(), json!(dependency.tables));
    meta.insert("destinations".to_string(), json!(dependency.destinations));
    meta.insert("roles".to_string(), json!(dependency.roles));
    meta.insert("path".to_string(), json!(dependency.path));
    meta
}

/// Node and edge accumulator owned by one `assemble` call
struct GraphBuilder {
    style: NodeIdStyle,
    nodes: Vec<GraphNode>,
    index: HashMap<NodeId, usize>,
    edges: Vec<GraphEdge>,
    seen_edges: HashSet<GraphEdge>,
}

impl GraphBuilder {
    fn new(style: NodeIdStyle) -> Self {
        Self {
            style,
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            seen_edges: HashSet::new(),
        }
    }

    /// Add or merge a node. Blank names are not admitted.
    fn add_node(&mut self, kind: NodeKind, name: &str, meta: Map<String, Value>) -> Option<NodeId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let id = self.style.node_id(kind, name);
        match self.index.get(&id) {
            Some(&i) => self.nodes[i].meta.extend(meta),
            None => {
                self.index.insert(id.clone(), self.nodes.len());
                self.nodes.push(GraphNode {
                    id: id.clone(),
                    kind,
                    label: name.to_string(),
                    meta,
                });
            }
        }
        Some(id)
    }

    /// Add an edge unless an endpoint is missing or the triple exists
    fn add_edge(&mut self, source: Option<&NodeId>, target: Option<&NodeId>, relation: EdgeRelation) {
        let (Some(source), Some(target)) = (source, target) else {
            return;
        };
        if !self.index.contains_key(source) || !self.index.contains_key(target) {
            return;
        }

        let edge = GraphEdge {
            source: source.clone(),
            target: target.clone(),
            relation,
        };
        if self.seen_edges.insert(edge.clone()) {
            self.edges.push(edge);
        }
    }

    fn finish(self) -> Graph {
        Graph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}
