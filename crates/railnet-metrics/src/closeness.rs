//! Closeness centrality (Wasserman–Faust variant for disconnected graphs).
//!
//! For a node `u` that reaches `r - 1` other nodes with total distance `D`:
//!
//! ```text
//! C(u) = (r - 1) / D  ·  (r - 1) / (n - 1)
//! ```
//!
//! The second factor scales the score down for nodes stuck in small
//! components, so a hub of a large component always outranks a hub of a
//! fragment. Isolated nodes score 0.

use tracing::instrument;

use crate::paths::distances_from;
use crate::topology::Topology;

/// Closeness centrality, dense-index aligned.
#[must_use]
#[instrument(skip(topo), fields(nodes = topo.node_count()))]
#[allow(clippy::cast_precision_loss)]
pub fn closeness_centrality(topo: &Topology) -> Vec<f64> {
    let n = topo.node_count();
    if n < 2 {
        return vec![0.0; n];
    }
    (0..n)
        .map(|u| {
            let (reached, total) = distances_from(topo, u)
                .iter()
                .enumerate()
                .filter(|&(v, _)| v != u)
                .filter_map(|(_, d)| *d)
                .fold((0usize, 0.0), |(r, t), d| (r + 1, t + d));
            if total > 0.0 {
                let r = reached as f64;
                (r / total) * (r / (n as f64 - 1.0))
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_of_three() {
        let t = Topology::from_edges(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let c = closeness_centrality(&t);
        assert!((c[1] - 1.0).abs() < 1e-12);
        assert!((c[0] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn fragments_are_scaled_down() {
        // a-b-c plus an isolated pair d-e.
        let t = Topology::from_edges(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("b", "c"), ("d", "e")],
        );
        let c = closeness_centrality(&t);
        // b: reaches 2 at total 2 → 1 · 2/4 = 0.5
        assert!((c[1] - 0.5).abs() < 1e-12);
        // d: reaches 1 at total 1 → 1 · 1/4 = 0.25
        assert!((c[3] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn isolated_node_scores_zero() {
        let t = Topology::from_edges(&["a", "b", "z"], &[("a", "b")]);
        assert!(closeness_centrality(&t)[2].abs() < 1e-12);
    }
}
