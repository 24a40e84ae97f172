//! Compact adjacency view used by every metric.
//!
//! # Overview
//!
//! [`Topology`] flattens a [`RailNetworkGraph`] into dense `0..n` indices
//! assigned in ascending node-id order. Metrics run over plain vectors, and
//! any "ties by smallest id" rule reduces to "ties by smallest index".
//!
//! # Path metric
//!
//! Shortest paths are hop counts unless [`PathMetric::Auto`] finds that
//! every edge carries a valid positive `length_m`, in which case edge
//! lengths are used as weights. A graph where only some edges have a length
//! is treated as unweighted.

use std::collections::HashMap;

use petgraph::stable_graph::NodeIndex;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use railnet_core::RailNetworkGraph;
use serde::{Deserialize, Serialize};

/// How shortest-path lengths are measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMetric {
    /// Edge lengths when every edge has one, hops otherwise.
    #[default]
    Auto,
    /// Always count hops.
    Hops,
}

#[derive(Debug, Clone)]
pub struct Topology {
    ids: Vec<String>,
    adjacency: Vec<Vec<(usize, f64)>>,
    weighted: bool,
    edge_count: usize,
}

impl Topology {
    /// Flatten `graph` using `metric` to decide on edge weights.
    #[must_use]
    pub fn from_graph(graph: &RailNetworkGraph, metric: PathMetric) -> Self {
        let inner = graph.inner();
        let mut nodes: Vec<(&str, NodeIndex)> = inner
            .node_indices()
            .filter_map(|idx| graph.node_id(idx).map(|id| (id, idx)))
            .collect();
        nodes.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let dense: HashMap<NodeIndex, usize> =
            nodes.iter().enumerate().map(|(i, (_, idx))| (*idx, i)).collect();

        let weighted = metric == PathMetric::Auto
            && inner.edge_count() > 0
            && inner.edge_references().all(|e| e.weight().weight().is_some());

        let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); nodes.len()];
        let mut edge_count = 0;
        for e in inner.edge_references() {
            let (Some(&a), Some(&b)) = (dense.get(&e.source()), dense.get(&e.target())) else {
                continue;
            };
            let w = if weighted {
                e.weight().weight().unwrap_or(1.0)
            } else {
                1.0
            };
            adjacency[a].push((b, w));
            adjacency[b].push((a, w));
            edge_count += 1;
        }
        for list in &mut adjacency {
            list.sort_unstable_by(|x, y| x.0.cmp(&y.0));
        }

        Self {
            ids: nodes.into_iter().map(|(id, _)| id.to_string()).collect(),
            adjacency,
            weighted,
            edge_count,
        }
    }

    /// Build directly from ids and undirected edges (test fixtures,
    /// benchmarks). Ids are sorted; duplicate and self-loop edges ignored.
    #[must_use]
    pub fn from_edges(ids: &[&str], edges: &[(&str, &str)]) -> Self {
        let mut sorted: Vec<String> = ids.iter().map(|s| (*s).to_string()).collect();
        sorted.sort();
        sorted.dedup();
        let index: HashMap<&str, usize> = sorted
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); sorted.len()];
        let mut edge_count = 0;
        for (a, b) in edges {
            let (Some(&ia), Some(&ib)) = (index.get(a), index.get(b)) else {
                continue;
            };
            if ia == ib || adjacency[ia].iter().any(|&(n, _)| n == ib) {
                continue;
            }
            adjacency[ia].push((ib, 1.0));
            adjacency[ib].push((ia, 1.0));
            edge_count += 1;
        }
        for list in &mut adjacency {
            list.sort_unstable_by(|x, y| x.0.cmp(&y.0));
        }
        Self {
            ids: sorted,
            adjacency,
            weighted: false,
            edge_count,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[must_use]
    pub const fn is_weighted(&self) -> bool {
        self.weighted
    }

    #[must_use]
    pub fn id(&self, i: usize) -> &str {
        &self.ids[i]
    }

    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.binary_search_by(|candidate| candidate.as_str().cmp(id)).ok()
    }

    /// `(neighbour, weight)` pairs, sorted by neighbour index.
    #[must_use]
    pub fn neighbors(&self, i: usize) -> &[(usize, f64)] {
        &self.adjacency[i]
    }

    #[must_use]
    pub fn degree(&self, i: usize) -> usize {
        self.adjacency[i].len()
    }

    #[must_use]
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.adjacency[a]
            .binary_search_by(|candidate| candidate.0.cmp(&b))
            .is_ok()
    }

    /// Subgraph induced by `members` (sorted dense indices of `self`).
    /// Weights are kept.
    #[must_use]
    pub fn induced(&self, members: &[usize]) -> Self {
        let local: HashMap<usize, usize> =
            members.iter().enumerate().map(|(l, &g)| (g, l)).collect();
        let mut edge_count = 0;
        let adjacency: Vec<Vec<(usize, f64)>> = members
            .iter()
            .map(|&g| {
                self.adjacency[g]
                    .iter()
                    .filter_map(|&(n, w)| local.get(&n).map(|&l| (l, w)))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (l, list) in adjacency.iter().enumerate() {
            edge_count += list.iter().filter(|&&(n, _)| n > l).count();
        }
        Self {
            ids: members.iter().map(|&g| self.ids[g].clone()).collect(),
            adjacency,
            weighted: self.weighted,
            edge_count,
        }
    }
}
