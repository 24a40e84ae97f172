//! Baseline metrics report for a built network.
//!
//! # Report fields
//!
//! - **Size**: node, edge, station and infrastructure counts.
//! - **Connectivity**: component count; node and edge counts of the largest
//!   component and the fraction of nodes it holds.
//! - **Degree**: per-node degree, degree histogram, average degree.
//! - **Efficiency**: global efficiency (path metric per [`PathMetric`]) and
//!   hop-based local efficiency.
//! - **Structure**: average clustering coefficient; average shortest-path
//!   length and diameter measured on the largest component only.
//! - **Ranking**: the top nodes by the engine's centrality measure and the
//!   articulation points of the whole graph.
//!
//! Disconnected graphs are reported, never rejected.

use std::collections::BTreeMap;

use railnet_core::{RailNetworkGraph, RankingMeasure};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::components::{articulation_points, connected_components};
use crate::degree::{average_degree, degree_distribution, degree_histogram};
use crate::efficiency::{global_efficiency, local_efficiency};
use crate::error::MetricsError;
use crate::ranking::{RankedNode, rank_topology};
use crate::structure::{average_clustering, path_length_stats};
use crate::topology::{PathMetric, Topology};

/// Default number of ranked nodes kept in a report.
pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub content_hash: String,
    pub path_metric: PathMetric,
    /// True when shortest paths used edge lengths.
    pub weighted: bool,
    pub node_count: usize,
    pub edge_count: usize,
    pub station_count: usize,
    pub infrastructure_count: usize,
    pub component_count: usize,
    pub largest_component_nodes: usize,
    pub largest_component_edges: usize,
    /// Largest component size over node count; 0 for an empty graph.
    pub largest_component_fraction: f64,
    pub average_degree: f64,
    pub degree_distribution: BTreeMap<String, usize>,
    pub degree_histogram: BTreeMap<usize, usize>,
    pub global_efficiency: f64,
    pub local_efficiency: f64,
    pub average_clustering: f64,
    /// `None` when the largest component has fewer than two nodes.
    pub average_path_length: Option<f64>,
    pub diameter: Option<f64>,
    pub centrality_measure: Option<RankingMeasure>,
    pub centrality_top: Vec<RankedNode>,
    pub articulation_points: Vec<String>,
}

/// Computes topological descriptors on a read-only graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsEngine {
    pub metric: PathMetric,
    /// Centrality measure included in reports; `None` skips ranking.
    pub centrality: Option<RankingMeasure>,
    pub top_k: usize,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self {
            metric: PathMetric::Auto,
            centrality: Some(RankingMeasure::Betweenness),
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl MetricsEngine {
    #[must_use]
    pub fn new(metric: PathMetric) -> Self {
        Self {
            metric,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_centrality(mut self, measure: Option<RankingMeasure>) -> Self {
        self.centrality = measure;
        self
    }

    #[must_use]
    pub const fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub fn topology(&self, graph: &RailNetworkGraph) -> Topology {
        Topology::from_graph(graph, self.metric)
    }

    /// Node id → degree.
    #[must_use]
    pub fn degree_distribution(&self, graph: &RailNetworkGraph) -> BTreeMap<String, usize> {
        degree_distribution(&self.topology(graph))
    }

    #[must_use]
    pub fn global_efficiency(&self, graph: &RailNetworkGraph) -> f64 {
        global_efficiency(&self.topology(graph))
    }

    /// Full ranking of every node by `measure`, descending.
    ///
    /// # Errors
    ///
    /// See [`crate::ranking::rank_nodes`].
    pub fn centrality(
        &self,
        graph: &RailNetworkGraph,
        measure: RankingMeasure,
    ) -> Result<Vec<RankedNode>, MetricsError> {
        crate::ranking::rank_nodes(graph, measure, false, self.metric)
    }

    /// Compute the full baseline report.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] when the graph violates its invariants or a
    /// centrality score is not finite.
    #[instrument(skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count()))]
    #[allow(clippy::cast_precision_loss)]
    pub fn report(&self, graph: &RailNetworkGraph) -> Result<MetricsReport, MetricsError> {
        graph.check_invariants()?;
        let topo = self.topology(graph);
        let n = topo.node_count();

        let components = connected_components(&topo);
        let lcc = topo.induced(components.first().map_or(&[][..], Vec::as_slice));
        let path_stats = path_length_stats(&lcc);

        let centrality_top = match self.centrality {
            Some(measure) => {
                let mut ranked = rank_topology(&topo, measure, false)?;
                ranked.truncate(self.top_k);
                ranked
            }
            None => Vec::new(),
        };

        let station_count = graph.nodes().filter(|node| node.is_station()).count();
        let report = MetricsReport {
            content_hash: graph.content_hash(),
            path_metric: self.metric,
            weighted: topo.is_weighted(),
            node_count: n,
            edge_count: topo.edge_count(),
            station_count,
            infrastructure_count: n - station_count,
            component_count: components.len(),
            largest_component_nodes: lcc.node_count(),
            largest_component_edges: lcc.edge_count(),
            largest_component_fraction: if n == 0 {
                0.0
            } else {
                lcc.node_count() as f64 / n as f64
            },
            average_degree: average_degree(&topo),
            degree_distribution: degree_distribution(&topo),
            degree_histogram: degree_histogram(&topo),
            global_efficiency: global_efficiency(&topo),
            local_efficiency: local_efficiency(&topo),
            average_clustering: average_clustering(&topo),
            average_path_length: path_stats.map(|(avg, _)| avg),
            diameter: path_stats.map(|(_, d)| d),
            centrality_measure: self.centrality,
            centrality_top,
            articulation_points: articulation_points(&topo)
                .into_iter()
                .map(|i| topo.id(i).to_string())
                .collect(),
        };
        info!(
            components = report.component_count,
            efficiency = report.global_efficiency,
            "metrics report computed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railnet_core::{Coord, GraphEdge, GraphNode};

    fn cycle(ids: &[&str]) -> RailNetworkGraph {
        let mut g = RailNetworkGraph::new();
        for (i, id) in ids.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let coord = Coord::new(0.0, i as f64 * 0.01);
            g.add_node(GraphNode::infrastructure(*id, coord)).expect("node");
        }
        for (i, a) in ids.iter().enumerate() {
            let b = ids[(i + 1) % ids.len()];
            g.add_or_merge_edge(a, b, GraphEdge::default()).expect("edge");
        }
        g
    }

    #[test]
    fn five_cycle_report() {
        let g = cycle(&["A", "B", "C", "D", "E"]);
        let report = MetricsEngine::default().report(&g).expect("report");
        assert_eq!(report.node_count, 5);
        assert_eq!(report.edge_count, 5);
        assert_eq!(report.component_count, 1);
        assert_eq!(report.largest_component_nodes, 5);
        assert!((report.largest_component_fraction - 1.0).abs() < 1e-12);
        assert!((report.global_efficiency - 0.75).abs() < 1e-12);
        assert!((report.average_degree - 2.0).abs() < 1e-12);
        assert_eq!(report.diameter, Some(2.0));
        assert!(report.articulation_points.is_empty());
        assert_eq!(report.centrality_top.len(), 5);
        assert_eq!(report.centrality_top[0].id, "A");
        assert!(!report.weighted);
        assert_eq!(report.content_hash, g.content_hash());
    }

    #[test]
    fn disconnected_graph_is_reported() {
        let mut g = cycle(&["a", "b", "c"]);
        g.add_node(GraphNode::infrastructure("z", Coord::new(1.0, 1.0)))
            .expect("node");
        let report = MetricsEngine::default()
            .with_top_k(2)
            .report(&g)
            .expect("report");
        assert_eq!(report.component_count, 2);
        assert_eq!(report.largest_component_nodes, 3);
        assert!((report.largest_component_fraction - 0.75).abs() < 1e-12);
        assert_eq!(report.centrality_top.len(), 2);
        assert_eq!(report.degree_distribution["z"], 0);
    }

    #[test]
    fn empty_graph_reports_zeros() {
        let report = MetricsEngine::default()
            .report(&RailNetworkGraph::new())
            .expect("report");
        assert_eq!(report.node_count, 0);
        assert_eq!(report.component_count, 0);
        assert!(report.global_efficiency.abs() < 1e-12);
        assert!(report.average_path_length.is_none());
    }

    #[test]
    fn ranking_can_be_skipped() {
        let report = MetricsEngine::default()
            .with_centrality(None)
            .report(&cycle(&["a", "b", "c"]))
            .expect("report");
        assert!(report.centrality_top.is_empty());
        assert!(report.centrality_measure.is_none());
    }
}
