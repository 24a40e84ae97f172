//! `railnet build`: group station records, assemble the graph, save a
//! snapshot.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use railnet_core::config::load_config;
use railnet_core::graph::save_snapshot;
use railnet_core::{
    BuildSummary, Diagnostics, ErrorCode, RawPointRecord, RawSegment, build_network,
};
use serde::Serialize;
use tracing::info;

use crate::cmd::{read_json, write_json};
use crate::output::{OutputMode, kv, print_json, section};

/// Arguments for `railnet build`.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// JSON array of station/platform records.
    #[arg(long, value_name = "FILE")]
    pub stations: PathBuf,

    /// JSON array of track segments.
    #[arg(long, value_name = "FILE")]
    pub segments: PathBuf,

    /// Where to write the binary graph snapshot.
    #[arg(long, short, value_name = "FILE")]
    pub out: PathBuf,

    /// Also write the graph as plain JSON node/edge lists.
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Enable the proximity linking pass regardless of config.
    #[arg(long)]
    pub link: bool,
}

#[derive(Debug, Serialize)]
struct BuildOutput<'a> {
    snapshot: &'a Path,
    content_hash: String,
    nodes: usize,
    edges: usize,
    summary: BuildSummary,
    skipped_records: Vec<&'a str>,
    unmatched_endpoints: usize,
    diagnostics: &'a Diagnostics,
}

/// Execute `railnet build`.
///
/// # Errors
///
/// Unreadable inputs, invalid configuration, or a snapshot write failure.
pub fn run_build(args: &BuildArgs, config_path: Option<&Path>, output: OutputMode) -> Result<()> {
    let mut config = load_config(config_path)?;
    if args.link {
        config.linking.enabled = true;
    }
    let records: Vec<RawPointRecord> = read_json(&args.stations)?;
    let segments: Vec<RawSegment> = read_json(&args.segments)?;
    info!(
        records = records.len(),
        segments = segments.len(),
        "inputs loaded"
    );

    let built = build_network(&config, &records, &segments).context("graph construction failed")?;
    save_snapshot(&args.out, &built.graph)?;
    if let Some(path) = &args.export {
        write_json(path, &built.graph.to_export())?;
    }

    let out = BuildOutput {
        snapshot: &args.out,
        content_hash: built.graph.content_hash(),
        nodes: built.graph.node_count(),
        edges: built.graph.edge_count(),
        summary: built.summary,
        skipped_records: built.diagnostics.subjects(ErrorCode::InvalidRecord),
        unmatched_endpoints: built.diagnostics.count(ErrorCode::NoMatchFound),
        diagnostics: &built.diagnostics,
    };

    if output.is_json() {
        return print_json(&out);
    }
    let mut w = io::stdout().lock();
    section(&mut w, "Network build")?;
    kv(&mut w, "snapshot", out.snapshot.display().to_string())?;
    kv(&mut w, "content hash", &out.content_hash)?;
    kv(&mut w, "records", out.summary.records.to_string())?;
    kv(&mut w, "skipped records", out.summary.skipped_records.to_string())?;
    kv(&mut w, "stations", out.summary.build.stations.to_string())?;
    kv(
        &mut w,
        "infrastructure nodes",
        out.summary.build.infrastructure_nodes.to_string(),
    )?;
    kv(&mut w, "edges", out.edges.to_string())?;
    kv(&mut w, "merged segments", out.summary.build.edges_merged.to_string())?;
    kv(&mut w, "synthetic links", out.summary.synthetic_links.to_string())?;
    if !built.diagnostics.is_empty() {
        writeln!(w)?;
        section(&mut w, "Diagnostics")?;
        for d in &built.diagnostics {
            writeln!(w, "{d}")?;
        }
    }
    Ok(())
}
