#![forbid(unsafe_code)]
//! railnet-metrics: topological descriptors of a built rail network.
//!
//! # Overview
//!
//! Every metric runs on a [`Topology`], a dense adjacency view of a
//! [`railnet_core::RailNetworkGraph`] with nodes indexed in ascending id
//! order. [`MetricsEngine`] bundles the individual measures into a single
//! baseline [`MetricsReport`]; the robustness simulator calls the
//! lower-level functions directly on its shrinking working copy.
//!
//! - [`degree`]: degree distribution, histogram, degree centrality.
//! - [`efficiency`]: global and local efficiency.
//! - [`betweenness`], [`closeness`]: centrality measures.
//! - [`components`]: connected components and articulation points.
//! - [`structure`]: clustering coefficient, path length, diameter.
//! - [`ranking`]: total orders over nodes for targeted attacks.
//! - [`cache`]: rankings persisted by graph content hash.
//!
//! # Conventions
//!
//! - **Disconnected graphs** are normal input. Unreachable pairs contribute
//!   nothing to efficiency and path statistics.
//! - **Errors**: [`MetricsError`] for invariant violations; `anyhow::Result`
//!   at the cache's filesystem boundary.
//! - **Logging**: `tracing` spans on the expensive entry points.

pub mod betweenness;
pub mod cache;
pub mod closeness;
pub mod components;
pub mod degree;
pub mod efficiency;
pub mod error;
pub mod paths;
pub mod ranking;
pub mod report;
pub mod structure;
pub mod topology;

pub use cache::{CacheSource, CentralityCache};
pub use error::MetricsError;
pub use ranking::{RankedNode, articulation_ranking, rank_nodes, rank_topology};
pub use report::{MetricsEngine, MetricsReport};
pub use topology::{PathMetric, Topology};
