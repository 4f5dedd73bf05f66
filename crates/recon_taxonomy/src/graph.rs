//! Materialized graph entities.
//!
//! Nodes are keyed by `(type, identity)`; edges refer to nodes by the same
//! pair. Both lists keep first-encounter order.

use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};
use recon_core::Hash;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A materialized graph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node type
    #[serde(rename = "type")]
    pub node_type: String,
    /// Deduplication key within the type
    pub identity: String,
    /// Copied properties in first-write order
    pub properties: IndexMap<String, Value>,
}

impl Node {
    /// Create a node with no properties
    #[must_use]
    pub fn new(node_type: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            identity: identity.into(),
            properties: IndexMap::new(),
        }
    }

    /// Property by name
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// A materialized edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Edge type
    #[serde(rename = "type")]
    pub relationship: String,
    /// Source node type
    pub from_type: String,
    /// Source node identity
    pub from_identity: String,
    /// Target node type
    pub to_type: String,
    /// Target node identity
    pub to_identity: String,
    /// Whether either endpoint is absent from the node list
    #[serde(default)]
    pub dangling: bool,
}

/// Counters describing one materialization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializeStats {
    /// Distinct nodes emitted
    pub nodes: usize,
    /// Node derivations that merged into an existing node
    pub nodes_merged: usize,
    /// Mapping positions whose identity did not resolve
    pub nodes_dropped: usize,
    /// Property copies whose source did not resolve
    pub properties_omitted: usize,
    /// Edges emitted
    pub edges: usize,
    /// Relationship instances with an unresolved endpoint
    pub edges_dropped: usize,
    /// Repeated edges suppressed
    pub edges_deduplicated: usize,
    /// Emitted edges with a missing endpoint node
    pub dangling_edges: usize,
    /// Document values whose kind did not match the schema
    pub kind_mismatches: usize,
    /// Expansions cut short by the fan-out cap
    pub fanout_truncated: usize,
}

/// Nodes and edges produced from one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterializedGraph {
    /// Nodes, unique by `(type, identity)`
    pub nodes: Vec<Node>,
    /// Edges
    pub edges: Vec<Edge>,
    /// Counters
    pub stats: MaterializeStats,
}

impl MaterializedGraph {
    /// Node by type and identity
    #[must_use]
    pub fn node(&self, node_type: &str, identity: &str) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|n| n.node_type == node_type && n.identity == identity)
    }

    /// Nodes of one type
    pub fn nodes_of_type<'a>(&'a self, node_type: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.iter().filter(move |n| n.node_type == node_type)
    }

    /// Edges of one type
    pub fn edges_of_type<'a>(&'a self, relationship: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.relationship == relationship)
    }

    /// Whether nothing was materialized
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// BLAKE3 digest of the canonical JSON of nodes and edges
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn digest(&self) -> Result<Hash, serde_json::Error> {
        let bytes = serde_json::to_vec(&(&self.nodes, &self.edges))?;
        Ok(Hash::compute(&bytes))
    }
}

/// Running node and edge sets for one materialization
#[derive(Debug, Default)]
pub(crate) struct GraphBuilder {
    nodes: IndexMap<(String, String), Node>,
    edges: Vec<Edge>,
    seen_edges: IndexSet<Edge>,
    pub(crate) stats: MaterializeStats,
}

impl GraphBuilder {
    /// Insert or update a node. Later values overwrite earlier ones key by
    /// key; properties absent from this write are kept.
    pub(crate) fn upsert_node(
        &mut self,
        node_type: &str,
        identity: &str,
        properties: impl IntoIterator<Item = (String, Value)>,
    ) {
        let key = (node_type.to_string(), identity.to_string());
        let node = match self.nodes.entry(key) {
            Entry::Occupied(existing) => {
                self.stats.nodes_merged += 1;
                existing.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(Node::new(node_type, identity)),
        };
        for (name, value) in properties {
            if !value.is_null() {
                node.properties.insert(name, value);
            }
        }
    }

    pub(crate) fn push_edge(&mut self, edge: Edge, dedup: bool) {
        if dedup && !self.seen_edges.insert(edge.clone()) {
            self.stats.edges_deduplicated += 1;
            return;
        }
        self.edges.push(edge);
    }

    pub(crate) fn finish(mut self, flag_dangling: bool) -> MaterializedGraph {
        if flag_dangling {
            for edge in &mut self.edges {
                let from = (edge.from_type.clone(), edge.from_identity.clone());
                let to = (edge.to_type.clone(), edge.to_identity.clone());
                edge.dangling = !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to);
                if edge.dangling {
                    self.stats.dangling_edges += 1;
                }
            }
        }
        self.stats.nodes = self.nodes.len();
        self.stats.edges = self.edges.len();
        MaterializedGraph {
            nodes: self.nodes.into_values().collect(),
            edges: self.edges,
            stats: self.stats,
        }
    }
}
