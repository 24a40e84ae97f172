//! `railnet metrics`: baseline topology report for a graph snapshot.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use railnet_core::RankingMeasure;
use railnet_metrics::report::DEFAULT_TOP_K;
use railnet_metrics::{CacheSource, CentralityCache, MetricsEngine, MetricsReport, PathMetric};
use serde::Serialize;

use crate::cmd::load_graph;
use crate::output::{OutputMode, kv, opt, print_json, section};

/// Arguments for `railnet metrics`.
#[derive(Args, Debug)]
pub struct MetricsArgs {
    /// Graph snapshot written by `railnet build`.
    #[arg(long, short, value_name = "FILE")]
    pub graph: PathBuf,

    /// Path length used by efficiency and centrality.
    #[arg(long, value_enum, default_value = "auto")]
    pub metric: MetricArg,

    /// Centrality measure to rank by.
    #[arg(long, value_enum, default_value = "betweenness")]
    pub centrality: CentralityArg,

    /// Number of ranked nodes to show.
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    pub top: usize,

    /// Cache full rankings in this directory.
    #[arg(long, value_name = "DIR", conflicts_with = "no_cache")]
    pub cache_dir: Option<PathBuf>,

    /// Skip the ranking cache entirely.
    #[arg(long)]
    pub no_cache: bool,

    /// Recompute the ranking even when a cached one exists.
    #[arg(long)]
    pub force: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum MetricArg {
    Auto,
    Hops,
}

impl From<MetricArg> for PathMetric {
    fn from(value: MetricArg) -> Self {
        match value {
            MetricArg::Auto => Self::Auto,
            MetricArg::Hops => Self::Hops,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CentralityArg {
    Degree,
    Betweenness,
    Closeness,
    None,
}

impl CentralityArg {
    const fn measure(self) -> Option<RankingMeasure> {
        match self {
            Self::Degree => Some(RankingMeasure::Degree),
            Self::Betweenness => Some(RankingMeasure::Betweenness),
            Self::Closeness => Some(RankingMeasure::Closeness),
            Self::None => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct MetricsOutput<'a> {
    #[serde(flatten)]
    report: &'a MetricsReport,
    ranking_cached: bool,
}

/// Execute `railnet metrics`.
///
/// # Errors
///
/// Unreadable snapshot, graph invariant violations, or cache I/O failure.
pub fn run_metrics(args: &MetricsArgs, output: OutputMode) -> Result<()> {
    let graph = load_graph(&args.graph)?;
    let metric = PathMetric::from(args.metric);
    let measure = args.centrality.measure();

    // The report itself never ranks; the (cached) full ranking is truncated
    // into it afterwards.
    let engine = MetricsEngine::new(metric).with_centrality(None);
    let mut report = engine.report(&graph).context("metrics computation failed")?;

    let mut ranking_cached = false;
    if let Some(measure) = measure {
        let ranking = if args.no_cache {
            engine.centrality(&graph, measure)?
        } else {
            let cache = match &args.cache_dir {
                Some(dir) => CentralityCache::new(dir, metric),
                None => CentralityCache::in_user_cache(metric)?,
            };
            let (ranking, source) = cache.get_or_compute(&graph, measure, args.force)?;
            ranking_cached = source == CacheSource::Hit;
            ranking
        };
        report.centrality_measure = Some(measure);
        report.centrality_top = ranking.into_iter().take(args.top).collect();
    }

    if output.is_json() {
        return print_json(&MetricsOutput {
            report: &report,
            ranking_cached,
        });
    }
    print_report(&mut io::stdout().lock(), &report, &args.graph, ranking_cached)?;
    Ok(())
}

fn print_report(
    w: &mut dyn Write,
    report: &MetricsReport,
    path: &Path,
    ranking_cached: bool,
) -> io::Result<()> {
    section(w, &format!("Metrics for {}", path.display()))?;
    kv(w, "content hash", &report.content_hash)?;
    kv(
        w,
        "path metric",
        if report.weighted { "length (m)" } else { "hops" },
    )?;
    kv(w, "nodes", report.node_count.to_string())?;
    kv(w, "edges", report.edge_count.to_string())?;
    kv(w, "stations", report.station_count.to_string())?;
    kv(w, "components", report.component_count.to_string())?;
    kv(
        w,
        "largest component",
        format!(
            "{} nodes ({:.1}%)",
            report.largest_component_nodes,
            report.largest_component_fraction * 100.0
        ),
    )?;
    kv(w, "average degree", format!("{:.4}", report.average_degree))?;
    kv(w, "global efficiency", format!("{:.4}", report.global_efficiency))?;
    kv(w, "local efficiency", format!("{:.4}", report.local_efficiency))?;
    kv(w, "average clustering", format!("{:.4}", report.average_clustering))?;
    kv(w, "average path length", opt(report.average_path_length))?;
    kv(w, "diameter", opt(report.diameter))?;
    kv(w, "articulation points", report.articulation_points.len().to_string())?;

    if let Some(measure) = report.centrality_measure {
        writeln!(w)?;
        let suffix = if ranking_cached { " (cached)" } else { "" };
        section(w, &format!("Top {measure}{suffix}"))?;
        for (rank, node) in report.centrality_top.iter().enumerate() {
            writeln!(w, "{:>3}. {:<40} {:.6}", rank + 1, node.id, node.score)?;
        }
    }
    Ok(())
}
