pub mod build;
pub mod campaign;
pub mod compare;
pub mod completions;
pub mod metrics;
pub mod simulate;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use railnet_core::RailNetworkGraph;
use railnet_core::graph::load_snapshot;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Read and parse a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("failed to parse {}", path.display()))
}

/// Write `value` as pretty JSON, creating parent directories.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(value)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

pub(crate) fn load_graph(path: &Path) -> Result<RailNetworkGraph> {
    let graph = load_snapshot(path)
        .with_context(|| format!("failed to load graph snapshot {}", path.display()))?;
    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph loaded"
    );
    Ok(graph)
}
