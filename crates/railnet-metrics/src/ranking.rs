//! Node rankings used to order targeted removals.
//!
//! Scores are sorted descending (ascending for inverse rankings); equal
//! scores always fall back to ascending node id so every ranking is a total,
//! reproducible order.

use std::cmp::Ordering;

use railnet_core::{RailNetworkGraph, RankingMeasure};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::betweenness::betweenness_centrality;
use crate::closeness::closeness_centrality;
use crate::components::articulation_points;
use crate::degree::degree_centrality;
use crate::error::MetricsError;
use crate::topology::{PathMetric, Topology};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedNode {
    pub id: String,
    pub score: f64,
}

/// Raw scores for `measure`, dense-index aligned.
#[must_use]
pub fn centrality_scores(topo: &Topology, measure: RankingMeasure) -> Vec<f64> {
    match measure {
        RankingMeasure::Degree => degree_centrality(topo),
        RankingMeasure::Betweenness => betweenness_centrality(topo),
        RankingMeasure::Closeness => closeness_centrality(topo),
    }
}

/// Rank every node of `topo` by `measure`.
///
/// # Errors
///
/// [`MetricsError::NonFiniteScore`] if any score is NaN or infinite.
pub fn rank_topology(
    topo: &Topology,
    measure: RankingMeasure,
    inverse: bool,
) -> Result<Vec<RankedNode>, MetricsError> {
    let scores = centrality_scores(topo, measure);
    if let Some(bad) = scores.iter().position(|s| !s.is_finite()) {
        return Err(MetricsError::non_finite(topo.id(bad).to_string(), measure));
    }
    let mut order: Vec<usize> = (0..topo.node_count()).collect();
    order.sort_by(|&a, &b| {
        let by_score = if inverse {
            scores[a].total_cmp(&scores[b])
        } else {
            scores[b].total_cmp(&scores[a])
        };
        by_score.then(a.cmp(&b))
    });
    Ok(order
        .into_iter()
        .map(|i| RankedNode {
            id: topo.id(i).to_string(),
            score: scores[i],
        })
        .collect())
}

/// Check `graph` and rank its nodes by `measure`.
///
/// # Errors
///
/// [`MetricsError::Graph`] when the graph violates its structural
/// invariants, [`MetricsError::NonFiniteScore`] when a score is not finite.
#[instrument(skip(graph), fields(nodes = graph.node_count()))]
pub fn rank_nodes(
    graph: &RailNetworkGraph,
    measure: RankingMeasure,
    inverse: bool,
    metric: PathMetric,
) -> Result<Vec<RankedNode>, MetricsError> {
    graph.check_invariants()?;
    let topo = Topology::from_graph(graph, metric);
    let ranking = rank_topology(&topo, measure, inverse)?;
    debug!(
        top = ranking.first().map(|r| r.id.as_str()),
        "ranked nodes"
    );
    Ok(ranking)
}

/// Articulation points first, then the remaining nodes; each group by
/// descending degree, ties by id. Scores are raw degrees.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn articulation_ranking(topo: &Topology) -> Vec<RankedNode> {
    let mut is_cut = vec![false; topo.node_count()];
    for i in articulation_points(topo) {
        is_cut[i] = true;
    }
    let mut order: Vec<usize> = (0..topo.node_count()).collect();
    order.sort_by(|&a, &b| {
        match (is_cut[a], is_cut[b]) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => topo.degree(b).cmp(&topo.degree(a)),
        }
        .then(a.cmp(&b))
    });
    order
        .into_iter()
        .map(|i| RankedNode {
            id: topo.id(i).to_string(),
            score: topo.degree(i) as f64,
        })
        .collect()
}
