//! Railway graph construction and persistence.
//!
//! # Pipeline
//!
//! ```text
//! StationCluster[] + RawSegment[]
//!        ↓  build::GraphBuilder::build()
//! RailNetworkGraph (simple, undirected, possibly disconnected)
//!        ↓  link::link_nearby_nodes()          (optional)
//! RailNetworkGraph + synthetic links
//!        ↓  snapshot::save_snapshot()
//! graph.bin (bincode envelope with BLAKE3 content hash)
//! ```
//!
//! ## Cache Invalidation
//!
//! [`RailNetworkGraph::content_hash`] is a BLAKE3 hash of the node ids and
//! edge list. Snapshots embed it and derived artefacts (centrality caches)
//! are keyed by it.

pub mod build;
pub mod link;
pub mod network;
pub mod snapshot;

pub use build::{BuildOutcome, BuildStats, GraphBuilder};
pub use link::{SYNTHETIC_LINK, link_nearby_nodes};
pub use network::{EdgeExport, EdgeInsert, GraphExport, RailNetworkGraph};
pub use snapshot::{SnapshotError, load_snapshot, save_snapshot};
