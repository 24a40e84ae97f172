#![forbid(unsafe_code)]
//! railnet-core library.
//!
//! Turns normalized geospatial records into a simple undirected railway
//! graph:
//!
//! ```text
//! RawPointRecord[]  ──► StationGrouper (union-find) ──► StationCluster[]
//!                                                            │
//! RawSegment[]  ──► GraphBuilder (SpatialMatcher snapping) ◄─┘
//!                         │
//!                         ▼
//!                 RailNetworkGraph ──► snapshot (bincode + blake3)
//! ```
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums for fatal failures, [`error::Diagnostics`]
//!   for per-record outcomes that never abort the pipeline.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod error;
pub mod graph;
pub mod grouping;
pub mod model;
pub mod pipeline;
pub mod spatial;
pub mod strategy;
pub mod union_find;

pub use config::RailnetConfig;
pub use error::{ConfigError, Diagnostic, Diagnostics, ErrorCode, GraphError};
pub use graph::{BuildOutcome, GraphBuilder, RailNetworkGraph};
pub use grouping::{GroupingOutcome, StationGrouper};
pub use pipeline::{BuildSummary, NetworkBuild, PipelineError, build_network};
pub use model::{
    Coord, GraphEdge, GraphNode, NodeKind, RawPointRecord, RawSegment, RecordTags,
    StationCluster,
};
pub use spatial::{DistanceMode, SpatialMatcher};
pub use strategy::{AttackStrategy, RankingMeasure, RankingMode};
