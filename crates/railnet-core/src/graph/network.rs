//! The railway graph container.
//!
//! [`RailNetworkGraph`] wraps a petgraph [`StableUnGraph`] so node indices
//! survive removals (the simulator deletes nodes one at a time from its
//! working copy) and keeps an id → index map alongside it.
//!
//! Invariants maintained by every mutating method:
//!
//! - node ids are unique,
//! - every edge references two existing nodes,
//! - there are no self-loops and at most one edge per node pair.
//!
//! The graph may be disconnected.

use std::collections::{BTreeSet, HashMap};

use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::model::{GraphEdge, GraphNode};

/// Whether [`RailNetworkGraph::add_or_merge_edge`] created or merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    Added,
    Merged,
}

/// Plain node/edge lists: the read-only export shape and the serde form of
/// [`RailNetworkGraph`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<EdgeExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeExport {
    pub source: String,
    pub target: String,
    pub attributes: GraphEdge,
}

/// Simple undirected railway graph keyed by node id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "GraphExport", try_from = "GraphExport")]
pub struct RailNetworkGraph {
    graph: StableUnGraph<GraphNode, GraphEdge>,
    node_map: HashMap<String, NodeIndex>,
}

impl RailNetworkGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateNode`] if the id is already present.
    pub fn add_node(&mut self, node: GraphNode) -> Result<NodeIndex, GraphError> {
        if self.node_map.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_map.insert(id, idx);
        Ok(idx)
    }

    /// Add an edge between `a` and `b`, or merge `edge` into the existing
    /// one so the graph stays simple.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] for a missing endpoint and
    /// [`GraphError::SelfLoop`] when `a == b`.
    pub fn add_or_merge_edge(
        &mut self,
        a: &str,
        b: &str,
        edge: GraphEdge,
    ) -> Result<EdgeInsert, GraphError> {
        if a == b {
            return Err(GraphError::SelfLoop(a.to_string()));
        }
        let ia = self.require(a)?;
        let ib = self.require(b)?;
        if let Some(existing) = self.graph.find_edge(ia, ib) {
            if let Some(weight) = self.graph.edge_weight_mut(existing) {
                weight.merge(edge);
            }
            return Ok(EdgeInsert::Merged);
        }
        self.graph.add_edge(ia, ib, edge);
        Ok(EdgeInsert::Added)
    }

    /// Remove a node and its incident edges.
    pub fn remove_node(&mut self, id: &str) -> Option<GraphNode> {
        let idx = self.node_map.remove(id)?;
        self.graph.remove_node(idx)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }

    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index(id).and_then(|idx| self.graph.node_weight(idx))
    }

    #[must_use]
    pub fn node_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(|n| n.id.as_str())
    }

    /// Edge attributes between `a` and `b`, in either direction.
    #[must_use]
    pub fn edge(&self, a: &str, b: &str) -> Option<&GraphEdge> {
        let ia = self.node_index(a)?;
        let ib = self.node_index(b)?;
        self.graph
            .find_edge(ia, ib)
            .and_then(|e| self.graph.edge_weight(e))
    }

    #[must_use]
    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.edge(a, b).is_some()
    }

    /// Number of incident edges; `None` for unknown ids.
    #[must_use]
    pub fn degree(&self, id: &str) -> Option<usize> {
        self.node_index(id)
            .map(|idx| self.graph.neighbors(idx).count())
    }

    /// Neighbour ids of `id`, sorted.
    #[must_use]
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let Some(idx) = self.node_index(id) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors(idx)
            .filter_map(|n| self.node_id(n))
            .collect();
        out.sort_unstable();
        out
    }

    /// Node ids, sorted.
    #[must_use]
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.node_map.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Nodes in index (insertion) order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_indices().filter_map(|i| self.graph.node_weight(i))
    }

    /// Edges as `(a, b, attributes)` with `a < b`, in index order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &GraphEdge)> {
        self.graph.edge_references().filter_map(|e| {
            let a = self.node_id(e.source())?;
            let b = self.node_id(e.target())?;
            let (a, b) = if a <= b { (a, b) } else { (b, a) };
            Some((a, b, e.weight()))
        })
    }

    /// Read-only access to the underlying petgraph structure for analysis.
    #[must_use]
    pub const fn inner(&self) -> &StableUnGraph<GraphNode, GraphEdge> {
        &self.graph
    }

    /// BLAKE3 hash of the sorted node ids and the sorted canonical edge
    /// list. Changes only when the topology changes.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut edges: Vec<(&str, &str)> = self.edges().map(|(a, b, _)| (a, b)).collect();
        edges.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        for id in self.node_ids() {
            hasher.update(b"n\x00");
            hasher.update(id.as_bytes());
            hasher.update(b"\x00");
        }
        for (a, b) in edges {
            hasher.update(b"e\x00");
            hasher.update(a.as_bytes());
            hasher.update(b"\x00");
            hasher.update(b.as_bytes());
            hasher.update(b"\x00");
        }
        format!("blake3:{}", hasher.finalize())
    }

    /// BLAKE3 hash of the canonical edge list together with each edge's
    /// usable length (`-` for edges without one). Complements
    /// [`content_hash`](Self::content_hash) wherever results depend on edge
    /// weights.
    #[must_use]
    pub fn weights_hash(&self) -> String {
        let mut edges: Vec<(&str, &str, Option<f64>)> =
            self.edges().map(|(a, b, e)| (a, b, e.weight())).collect();
        edges.sort_unstable_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));

        let mut hasher = blake3::Hasher::new();
        for (a, b, w) in edges {
            hasher.update(a.as_bytes());
            hasher.update(b"\x00");
            hasher.update(b.as_bytes());
            hasher.update(b"\x00");
            match w {
                Some(w) => hasher.update(&w.to_bits().to_le_bytes()),
                None => hasher.update(b"-"),
            };
            hasher.update(b"\x00");
        }
        format!("blake3:{}", hasher.finalize())
    }

    /// Re-verify every structural invariant. Used by the simulator before
    /// trusting a working copy and by snapshot loading.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Invariant`] describing the first violation.
    pub fn check_invariants(&self) -> Result<(), GraphError> {
        if self.node_map.len() != self.graph.node_count() {
            return Err(GraphError::Invariant(format!(
                "id map has {} entries for {} nodes",
                self.node_map.len(),
                self.graph.node_count()
            )));
        }
        for (id, &idx) in &self.node_map {
            match self.graph.node_weight(idx) {
                Some(node) if node.id == *id => {}
                _ => {
                    return Err(GraphError::Invariant(format!(
                        "id '{id}' maps to a missing or mismatched node"
                    )));
                }
            }
        }
        let mut pairs: BTreeSet<(NodeIndex, NodeIndex)> = BTreeSet::new();
        for e in self.graph.edge_references() {
            let (s, t) = (e.source(), e.target());
            if s == t {
                return Err(GraphError::Invariant(format!(
                    "self-loop on '{}'",
                    self.node_id(s).unwrap_or("?")
                )));
            }
            if !pairs.insert((s.min(t), s.max(t))) {
                return Err(GraphError::Invariant(format!(
                    "parallel edge between '{}' and '{}'",
                    self.node_id(s).unwrap_or("?"),
                    self.node_id(t).unwrap_or("?")
                )));
            }
            if let Some(len) = e.weight().length_m.filter(|l| !(l.is_finite() && *l > 0.0)) {
                return Err(GraphError::Invariant(format!(
                    "edge {} has invalid length {len}",
                    e.id().index()
                )));
            }
        }
        Ok(())
    }

    /// Export as plain node/edge lists.
    #[must_use]
    pub fn to_export(&self) -> GraphExport {
        GraphExport {
            nodes: self.nodes().cloned().collect(),
            edges: self
                .edges()
                .map(|(a, b, e)| EdgeExport {
                    source: a.to_string(),
                    target: b.to_string(),
                    attributes: e.clone(),
                })
                .collect(),
        }
    }

    fn require(&self, id: &str) -> Result<NodeIndex, GraphError> {
        self.node_index(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))
    }
}

impl PartialEq for RailNetworkGraph {
    fn eq(&self, other: &Self) -> bool {
        self.to_export() == other.to_export()
    }
}

impl From<RailNetworkGraph> for GraphExport {
    fn from(graph: RailNetworkGraph) -> Self {
        graph.to_export()
    }
}

impl TryFrom<GraphExport> for RailNetworkGraph {
    type Error = GraphError;

    /// Rebuild a graph, rejecting duplicate ids, dangling edges, self-loops
    /// and parallel edges.
    fn try_from(export: GraphExport) -> Result<Self, Self::Error> {
        let mut graph = Self::new();
        for node in export.nodes {
            graph.add_node(node)?;
        }
        for edge in export.edges {
            if graph.has_edge(&edge.source, &edge.target) {
                return Err(GraphError::Invariant(format!(
                    "parallel edge between '{}' and '{}'",
                    edge.source, edge.target
                )));
            }
            graph.add_or_merge_edge(&edge.source, &edge.target, edge.attributes)?;
        }
        Ok(graph)
    }
}
