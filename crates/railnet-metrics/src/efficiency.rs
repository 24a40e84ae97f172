//! Global and local efficiency.
//!
//! # Overview
//!
//! Global efficiency is the mean of `1 / d(u, v)` over all ordered pairs of
//! distinct nodes, where unreachable pairs contribute 0:
//!
//! ```text
//! E = 1 / (n (n - 1)) * Σ_{u ≠ v} 1 / d(u, v)
//! ```
//!
//! so a disconnected graph is handled without special cases and an empty or
//! single-node graph has efficiency 0. Local efficiency is the average, over
//! all nodes, of the global efficiency of the subgraph induced by each
//! node's neighbours (hop distances).
//!
//! Complexity: one BFS/Dijkstra per node, O(n (n + m)) for hop distances.

use tracing::instrument;

use crate::paths::distances_from;
use crate::topology::Topology;

/// Global efficiency of `topo`.
#[must_use]
#[instrument(skip(topo), fields(nodes = topo.node_count()))]
pub fn global_efficiency(topo: &Topology) -> f64 {
    efficiency_over(topo, topo.node_count())
}

/// Sum of `1 / d(u, v)` over ordered reachable pairs, divided by
/// `n (n - 1)` for a caller-chosen `n`.
///
/// With `n` fixed to the size of an original graph, the value can only
/// fall as nodes are removed: surviving distances never shrink and lost
/// pairs contribute nothing. 0 when `n < 2`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn efficiency_over(topo: &Topology, n: usize) -> f64 {
    if n < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    for s in 0..topo.node_count() {
        sum += distances_from(topo, s)
            .iter()
            .enumerate()
            .filter(|&(t, _)| t != s)
            .filter_map(|(_, d)| d.filter(|d| *d > 0.0))
            .map(|d| 1.0 / d)
            .sum::<f64>();
    }
    sum / (n as f64 * (n as f64 - 1.0))
}

/// Mean local efficiency over all nodes (hop distances).
#[must_use]
#[instrument(skip(topo), fields(nodes = topo.node_count()))]
#[allow(clippy::cast_precision_loss)]
pub fn local_efficiency(topo: &Topology) -> f64 {
    let n = topo.node_count();
    if n == 0 {
        return 0.0;
    }
    let total: f64 = (0..n)
        .map(|v| {
            let neighbours: Vec<usize> = topo.neighbors(v).iter().map(|&(w, _)| w).collect();
            if neighbours.len() < 2 {
                return 0.0;
            }
            let sub = topo.induced(&neighbours);
            global_efficiency(&unweighted(&sub))
        })
        .sum();
    total / n as f64
}

fn unweighted(topo: &Topology) -> Topology {
    let ids: Vec<&str> = topo.ids().iter().map(String::as_str).collect();
    let mut edges = Vec::with_capacity(topo.edge_count());
    for a in 0..topo.node_count() {
        for &(b, _) in topo.neighbors(a) {
            if a < b {
                edges.push((topo.id(a), topo.id(b)));
            }
        }
    }
    Topology::from_edges(&ids, &edges)
}
