//! Structural descriptors: clustering, average path length, diameter.

use crate::paths::distances_from;
use crate::topology::Topology;

/// Mean local clustering coefficient over all nodes; nodes with degree
/// below 2 count as 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_clustering(topo: &Topology) -> f64 {
    let n = topo.node_count();
    if n == 0 {
        return 0.0;
    }
    let total: f64 = (0..n)
        .map(|v| {
            let neigh = topo.neighbors(v);
            let k = neigh.len();
            if k < 2 {
                return 0.0;
            }
            let mut links = 0usize;
            for (i, &(a, _)) in neigh.iter().enumerate() {
                for &(b, _) in &neigh[i + 1..] {
                    if topo.has_edge(a, b) {
                        links += 1;
                    }
                }
            }
            2.0 * links as f64 / (k as f64 * (k as f64 - 1.0))
        })
        .sum();
    total / n as f64
}

/// Average shortest-path length and diameter of a connected topology.
/// `None` when fewer than two nodes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn path_length_stats(topo: &Topology) -> Option<(f64, f64)> {
    let n = topo.node_count();
    if n < 2 {
        return None;
    }
    let mut sum = 0.0;
    let mut pairs = 0usize;
    let mut diameter: f64 = 0.0;
    for s in 0..n {
        for (t, d) in distances_from(topo, s).into_iter().enumerate() {
            if t == s {
                continue;
            }
            if let Some(d) = d {
                sum += d;
                pairs += 1;
                diameter = diameter.max(d);
            }
        }
    }
    (pairs > 0).then(|| (sum / pairs as f64, diameter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_with_tail() {
        // a-b-c triangle, d hangs off c.
        let t = Topology::from_edges(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")],
        );
        // a, b: 1; c: 1 of 3 possible links; d: 0.
        let expected = (1.0 + 1.0 + 1.0 / 3.0) / 4.0;
        assert!((average_clustering(&t) - expected).abs() < 1e-12);
    }

    #[test]
    fn path_stats_on_four_path() {
        let t = Topology::from_edges(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d")]);
        let (avg, diam) = path_length_stats(&t).expect("connected");
        // Unordered distances: 1,1,1,2,2,3 → mean 10/6.
        assert!((avg - 10.0 / 6.0).abs() < 1e-12);
        assert!((diam - 3.0).abs() < 1e-12);
    }

    #[test]
    fn single_node_has_no_path_stats() {
        assert!(path_length_stats(&Topology::from_edges(&["a"], &[])).is_none());
    }
}
