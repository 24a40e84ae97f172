//! Binary graph snapshots.
//!
//! Layout: an 8-byte magic (`RAILNET\0`) followed by a bincode (standard
//! config, serde bridge) encoding of [`GraphSnapshot`]. The envelope
//! carries a format version and the graph's [`content_hash`] at save time;
//! both are checked on load.
//!
//! [`content_hash`]: RailNetworkGraph::content_hash

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::network::RailNetworkGraph;
use crate::error::ErrorCode;

pub const SNAPSHOT_MAGIC: &[u8; 8] = b"RAILNET\0";
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub format_version: u32,
    pub content_hash: String,
    pub graph: RailNetworkGraph,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode snapshot: {0}")]
    Encode(String),

    #[error("failed to decode snapshot: {0}")]
    Decode(String),

    #[error("not a railnet snapshot (bad magic)")]
    BadMagic,

    #[error("unsupported snapshot format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("snapshot content hash mismatch: stored {stored}, computed {computed}")]
    HashMismatch { stored: String, computed: String },

    #[error("{0} trailing bytes after snapshot payload")]
    TrailingBytes(usize),
}

impl SnapshotError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } | Self::Encode(_) => ErrorCode::SnapshotIo,
            Self::Decode(_)
            | Self::BadMagic
            | Self::UnsupportedVersion { .. }
            | Self::HashMismatch { .. }
            | Self::TrailingBytes(_) => ErrorCode::SnapshotCorrupt,
        }
    }
}

/// Encode `graph` into snapshot bytes.
///
/// # Errors
///
/// Returns [`SnapshotError::Encode`] if serialization fails.
pub fn encode_snapshot(graph: &RailNetworkGraph) -> Result<Vec<u8>, SnapshotError> {
    let envelope = GraphSnapshot {
        format_version: SNAPSHOT_FORMAT_VERSION,
        content_hash: graph.content_hash(),
        graph: graph.clone(),
    };
    let payload = bincode::serde::encode_to_vec(&envelope, bincode::config::standard())
        .map_err(|e| SnapshotError::Encode(e.to_string()))?;
    let mut bytes = Vec::with_capacity(SNAPSHOT_MAGIC.len() + payload.len());
    bytes.extend_from_slice(SNAPSHOT_MAGIC);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode snapshot bytes, verifying magic, version and content hash.
///
/// # Errors
///
/// Returns a [`SnapshotError`] describing the first check that failed.
pub fn decode_snapshot(bytes: &[u8]) -> Result<RailNetworkGraph, SnapshotError> {
    let payload = bytes
        .strip_prefix(SNAPSHOT_MAGIC.as_slice())
        .ok_or(SnapshotError::BadMagic)?;
    let (envelope, read): (GraphSnapshot, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .map_err(|e| SnapshotError::Decode(e.to_string()))?;
    if read != payload.len() {
        return Err(SnapshotError::TrailingBytes(payload.len() - read));
    }
    if envelope.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: envelope.format_version,
            expected: SNAPSHOT_FORMAT_VERSION,
        });
    }
    let computed = envelope.graph.content_hash();
    if computed != envelope.content_hash {
        return Err(SnapshotError::HashMismatch {
            stored: envelope.content_hash,
            computed,
        });
    }
    Ok(envelope.graph)
}

/// Write a snapshot to `path` (via a temporary sibling file and rename).
///
/// # Errors
///
/// Returns [`SnapshotError::Io`] on filesystem failures.
#[instrument(skip_all, fields(path = %path.display(), nodes = graph.node_count()))]
pub fn save_snapshot(path: &Path, graph: &RailNetworkGraph) -> Result<(), SnapshotError> {
    let bytes = encode_snapshot(graph)?;
    let io_err = |source: std::io::Error| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &bytes).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    debug!(bytes = bytes.len(), "snapshot written");
    Ok(())
}

/// Read and verify a snapshot from `path`.
///
/// # Errors
///
/// Returns [`SnapshotError::Io`] if the file cannot be read, or a decode
/// error as in [`decode_snapshot`].
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_snapshot(path: &Path) -> Result<RailNetworkGraph, SnapshotError> {
    let bytes = std::fs::read(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = decode_snapshot(&bytes)?;
    debug!(nodes = graph.node_count(), edges = graph.edge_count(), "snapshot loaded");
    Ok(graph)
}
