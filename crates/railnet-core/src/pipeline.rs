//! End-to-end construction: records + segments → graph.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::RailnetConfig;
use crate::error::{ConfigError, Diagnostics, ErrorCode, GraphError};
use crate::graph::{BuildStats, GraphBuilder, RailNetworkGraph, link_nearby_nodes};
use crate::grouping::StationGrouper;
use crate::model::{RawPointRecord, RawSegment, StationCluster};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl PipelineError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Config(e) => e.code(),
            Self::Graph(e) => e.code(),
        }
    }
}

/// Everything one construction run produced.
#[derive(Debug, Clone)]
pub struct NetworkBuild {
    pub graph: RailNetworkGraph,
    pub clusters: Vec<StationCluster>,
    pub summary: BuildSummary,
    pub diagnostics: Diagnostics,
}

/// Counters reported to callers next to the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub records: usize,
    pub skipped_records: usize,
    pub clusters: usize,
    pub build: BuildStats,
    pub synthetic_links: usize,
}

/// Group stations, assemble the graph and optionally run proximity linking.
///
/// # Errors
///
/// Fails fast with [`PipelineError::Config`] before any work if `config`
/// is invalid. Per-record problems never fail the run; they are returned
/// in [`NetworkBuild::diagnostics`].
#[instrument(skip_all, fields(records = records.len(), segments = segments.len()))]
pub fn build_network(
    config: &RailnetConfig,
    records: &[RawPointRecord],
    segments: &[RawSegment],
) -> Result<NetworkBuild, PipelineError> {
    config.validate()?;
    let builder = GraphBuilder::from_config(&config.matching)?;

    let grouping = StationGrouper::new(config.grouping.clone(), config.matching.distance)
        .group(records);
    let mut diagnostics = grouping.diagnostics;

    let outcome = builder.build(&grouping.clusters, segments)?;
    diagnostics.extend(outcome.diagnostics);
    let mut graph = outcome.graph;

    let synthetic_links = if config.linking.enabled {
        link_nearby_nodes(&mut graph, config.linking.link_radius_m)?
    } else {
        0
    };

    let summary = BuildSummary {
        records: records.len(),
        skipped_records: grouping.skipped.len(),
        clusters: grouping.clusters.len(),
        build: outcome.stats,
        synthetic_links,
    };
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        diagnostics = diagnostics.len(),
        "network build complete"
    );
    Ok(NetworkBuild {
        graph,
        clusters: grouping.clusters,
        summary,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coord;

    #[test]
    fn invalid_config_fails_before_work() {
        let mut config = RailnetConfig::default();
        config.matching.snap_tolerance_deg = -1.0;
        let err = build_network(&config, &[], &[]).expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::ConfigurationError);
    }

    #[test]
    fn partial_input_still_builds() {
        let mut broken = RawPointRecord::new("broken", "Broken", 0.0, 0.0);
        broken.lat = None;
        let records = vec![
            RawPointRecord::new("a", "A", 0.0, 0.0),
            RawPointRecord::new("b", "B", 0.0, 0.01),
            broken,
        ];
        let segments = vec![RawSegment::new("s", Coord::new(0.0, 0.0), Coord::new(0.0, 0.01))];
        let built = build_network(&RailnetConfig::default(), &records, &segments).expect("build");
        assert_eq!(built.graph.node_count(), 2);
        assert_eq!(built.graph.edge_count(), 1);
        assert_eq!(built.summary.skipped_records, 1);
        assert_eq!(built.diagnostics.subjects(ErrorCode::InvalidRecord), vec!["broken"]);
    }

    #[test]
    fn linking_runs_when_enabled() {
        let records = vec![
            RawPointRecord::new("a", "A", 0.0, 0.0),
            RawPointRecord::new("b", "B", 0.0, 0.002),
        ];
        let mut config = RailnetConfig::default();
        config.linking.enabled = true;
        let built = build_network(&config, &records, &[]).expect("build");
        assert_eq!(built.summary.synthetic_links, 1);
        assert!(built.graph.has_edge("a", "b"));
    }
}
