//! Degree distribution and degree centrality.

use std::collections::BTreeMap;

use crate::topology::Topology;

/// Node id → degree.
#[must_use]
pub fn degree_distribution(topo: &Topology) -> BTreeMap<String, usize> {
    (0..topo.node_count())
        .map(|i| (topo.id(i).to_string(), topo.degree(i)))
        .collect()
}

/// Degree → number of nodes with that degree.
#[must_use]
pub fn degree_histogram(topo: &Topology) -> BTreeMap<usize, usize> {
    let mut hist = BTreeMap::new();
    for i in 0..topo.node_count() {
        *hist.entry(topo.degree(i)).or_insert(0) += 1;
    }
    hist
}

/// Mean degree, `2m / n`; 0 for an empty graph.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_degree(topo: &Topology) -> f64 {
    let n = topo.node_count();
    if n == 0 {
        return 0.0;
    }
    2.0 * topo.edge_count() as f64 / n as f64
}

/// Degree centrality, `degree / (n - 1)`, dense-index aligned. A single
/// node scores 1.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn degree_centrality(topo: &Topology) -> Vec<f64> {
    let n = topo.node_count();
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let scale = 1.0 / (n as f64 - 1.0);
            (0..n).map(|i| topo.degree(i) as f64 * scale).collect()
        }
    }
}
