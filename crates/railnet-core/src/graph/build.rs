//! Graph assembly from station clusters and raw segments.
//!
//! # Overview
//!
//! Every station cluster becomes a `Station` node, whether or not any
//! segment touches it. Each segment endpoint is then resolved to a node:
//!
//! 1. the nearest station within ε, matching against cluster centroids
//!    **and** every member coordinate (nearest first, ties by id);
//! 2. otherwise the nearest infrastructure node created earlier within ε;
//! 3. otherwise a new `Infrastructure` node `INFRA_<n>` at the endpoint,
//!    numbered in creation order.
//!
//! A segment then becomes an edge between its two resolved nodes. A second
//! segment between the same pair is merged into the existing edge, so the
//! output is a simple graph. Segments collapsing to a single node are
//! dropped.
//!
//! ε is in degrees and is used as given, in the matcher's distance mode.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::network::{EdgeInsert, RailNetworkGraph};
use crate::config::MatchingConfig;
use crate::error::{ConfigError, Diagnostics, ErrorCode, GraphError};
use crate::model::{Coord, GraphEdge, GraphNode, RawSegment, StationCluster};
use crate::spatial::{DistanceMode, SpatialMatcher};

/// Prefix of generated infrastructure node ids.
pub const INFRA_PREFIX: &str = "INFRA_";

/// Counters describing one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub stations: usize,
    pub infrastructure_nodes: usize,
    pub segments: usize,
    pub edges_added: usize,
    pub edges_merged: usize,
    pub self_loops_dropped: usize,
    pub invalid_segments: usize,
    pub endpoints_on_stations: usize,
    pub endpoints_on_infrastructure: usize,
}

/// Output of [`GraphBuilder::build`]: the graph plus everything that was
/// skipped or unmatched along the way.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub graph: RailNetworkGraph,
    pub stats: BuildStats,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder {
    tolerance_deg: f64,
    mode: DistanceMode,
}

/// Mutable state for one build.
struct BuildState {
    graph: RailNetworkGraph,
    infra: SpatialMatcher,
    stats: BuildStats,
    diagnostics: Diagnostics,
}

impl GraphBuilder {
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositive`] for a non-finite or non-positive
    /// tolerance.
    pub fn new(tolerance_deg: f64, mode: DistanceMode) -> Result<Self, ConfigError> {
        if !(tolerance_deg.is_finite() && tolerance_deg > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "matching.snap_tolerance_deg",
                value: tolerance_deg,
            });
        }
        Ok(Self {
            tolerance_deg,
            mode,
        })
    }

    /// # Errors
    ///
    /// See [`GraphBuilder::new`].
    pub fn from_config(config: &MatchingConfig) -> Result<Self, ConfigError> {
        Self::new(config.snap_tolerance_deg, config.distance)
    }

    #[must_use]
    pub const fn tolerance_deg(&self) -> f64 {
        self.tolerance_deg
    }

    /// Assemble the graph.
    ///
    /// # Errors
    ///
    /// Only on an internal invariant violation; bad input is reported in
    /// [`BuildOutcome::diagnostics`].
    #[instrument(skip_all, fields(clusters = clusters.len(), segments = segments.len()))]
    pub fn build(
        &self,
        clusters: &[StationCluster],
        segments: &[RawSegment],
    ) -> Result<BuildOutcome, GraphError> {
        let mut state = BuildState {
            graph: RailNetworkGraph::new(),
            infra: SpatialMatcher::new(self.mode),
            stats: BuildStats::default(),
            diagnostics: Diagnostics::new(),
        };

        let mut accepted: Vec<&StationCluster> = Vec::with_capacity(clusters.len());
        for cluster in clusters {
            match state.graph.add_node(GraphNode::station(cluster)) {
                Ok(_) => {
                    state.stats.stations += 1;
                    accepted.push(cluster);
                }
                Err(GraphError::DuplicateNode(id)) => {
                    state.diagnostics.record(
                        ErrorCode::InvalidRecord,
                        id,
                        "duplicate station cluster id; later cluster ignored",
                    );
                }
                Err(e) => return Err(e),
            }
        }
        let stations = self.station_index(&accepted);

        for segment in segments {
            state.stats.segments += 1;
            if !(segment.start.is_valid() && segment.end.is_valid()) {
                state.stats.invalid_segments += 1;
                state.diagnostics.record(
                    ErrorCode::InvalidRecord,
                    segment.id.clone(),
                    "segment endpoint out of range or not finite",
                );
                continue;
            }

            let a = self.resolve(&stations, &mut state, &segment.id, segment.start)?;
            let b = self.resolve(&stations, &mut state, &segment.id, segment.end)?;
            if a == b {
                state.stats.self_loops_dropped += 1;
                state.diagnostics.record(
                    ErrorCode::InvalidRecord,
                    segment.id.clone(),
                    format!("both endpoints resolve to '{a}'; self-loop dropped"),
                );
                continue;
            }

            match state
                .graph
                .add_or_merge_edge(&a, &b, GraphEdge::from_segment(segment))?
            {
                EdgeInsert::Added => state.stats.edges_added += 1,
                EdgeInsert::Merged => state.stats.edges_merged += 1,
            }
        }

        info!(
            nodes = state.graph.node_count(),
            edges = state.graph.edge_count(),
            infrastructure = state.stats.infrastructure_nodes,
            self_loops = state.stats.self_loops_dropped,
            "graph build complete"
        );
        Ok(BuildOutcome {
            graph: state.graph,
            stats: state.stats,
            diagnostics: state.diagnostics,
        })
    }

    /// Index of every centroid and member coordinate of the clusters that
    /// made it into the graph, keyed by the owning cluster's id.
    fn station_index(&self, clusters: &[&StationCluster]) -> SpatialMatcher {
        let points = clusters.iter().flat_map(|c| {
            std::iter::once((c.id.as_str(), c.coord))
                .chain(c.member_coords.iter().map(move |m| (c.id.as_str(), *m)))
        });
        SpatialMatcher::from_points(self.mode, points)
    }

    fn resolve(
        &self,
        stations: &SpatialMatcher,
        state: &mut BuildState,
        segment_id: &str,
        coord: Coord,
    ) -> Result<String, GraphError> {
        if let Some(hit) = stations.nearest_within(&coord, self.tolerance_deg) {
            state.stats.endpoints_on_stations += 1;
            return Ok(hit.id.to_string());
        }
        if let Some(hit) = state.infra.nearest_within(&coord, self.tolerance_deg) {
            state.stats.endpoints_on_infrastructure += 1;
            return Ok(hit.id.to_string());
        }

        let id = format!("{INFRA_PREFIX}{}", state.stats.infrastructure_nodes);
        state
            .graph
            .add_node(GraphNode::infrastructure(id.clone(), coord))?;
        state.infra.insert(id.clone(), coord);
        state.stats.infrastructure_nodes += 1;
        state.stats.endpoints_on_infrastructure += 1;
        debug!(segment = segment_id, node = %id, "no station within tolerance");
        state.diagnostics.record(
            ErrorCode::NoMatchFound,
            segment_id,
            format!(
                "endpoint ({}, {}) matched no station; created {id}",
                coord.lat, coord.lon
            ),
        );
        Ok(id)
    }
}
