//! `railnet simulate`: one node-removal run with a full step trace.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::Args;
use railnet_core::config::{SimulationSettings, load_config};
use railnet_metrics::PathMetric;
use railnet_sim::{
    FractionPoint, RobustnessSimulator, SimulationConfig, SimulationOutcome, SimulationState,
    SimulationTrace, TraceSummary, fraction_curve,
};
use serde::Serialize;

use crate::cmd::metrics::MetricArg;
use crate::cmd::{load_graph, write_json};
use crate::output::{OutputMode, kv, opt, print_json, section};

/// Arguments for `railnet simulate`.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Graph snapshot written by `railnet build`.
    #[arg(long, short, value_name = "FILE")]
    pub graph: PathBuf,

    /// Attack strategy, e.g. `random`, `degree`, `betweenness_adaptive`,
    /// `inverse_closeness`, `articulation`. Defaults to the config value.
    #[arg(long, short)]
    pub strategy: Option<String>,

    /// Seed for the random order. Defaults to the config value.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop after this many removals.
    #[arg(long, value_name = "STEPS")]
    pub budget: Option<usize>,

    /// Path length used by efficiency and centrality.
    #[arg(long, value_enum, default_value = "auto")]
    pub metric: MetricArg,

    /// Write the full trace as JSON.
    #[arg(long, short, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

impl SimulateArgs {
    /// Config file settings with command-line overrides applied.
    pub(crate) fn settings(&self, base: &SimulationSettings) -> SimulationSettings {
        let mut settings = base.clone();
        if let Some(strategy) = &self.strategy {
            settings.strategy.clone_from(strategy);
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if self.budget.is_some() {
            settings.step_budget = self.budget;
        }
        settings
    }
}

#[derive(Debug, Serialize)]
struct SimulateOutput<'a> {
    state: SimulationState,
    error: Option<String>,
    summary: TraceSummary,
    fractions: Vec<FractionPoint>,
    trace_file: Option<&'a Path>,
    trace: &'a SimulationTrace,
}

/// Execute `railnet simulate`.
///
/// An aborted run still prints (and writes) its partial trace before the
/// command fails.
///
/// # Errors
///
/// Invalid strategy or config, unreadable snapshot, or an aborted run.
pub fn run_simulate(
    args: &SimulateArgs,
    config_path: Option<&Path>,
    output: OutputMode,
) -> Result<()> {
    let config = load_config(config_path)?;
    let settings = args.settings(&config.simulation);
    let sim_config =
        SimulationConfig::from_settings(&settings)?.with_metric(PathMetric::from(args.metric));
    let graph = load_graph(&args.graph)?;

    let SimulationOutcome {
        state,
        trace,
        error,
    } = RobustnessSimulator::new(&graph, sim_config)?.run();

    if let Some(path) = &args.out {
        write_json(path, &trace)?;
    }
    let out = SimulateOutput {
        state,
        error: error.as_ref().map(ToString::to_string),
        summary: trace.summary(),
        fractions: fraction_curve(&trace, &settings.fractions),
        trace_file: args.out.as_deref(),
        trace: &trace,
    };
    if output.is_json() {
        print_json(&out)?;
    } else {
        print_human(&mut io::stdout().lock(), &out)?;
    }

    if let Some(error) = error {
        bail!("{error} ({})", error.code().code());
    }
    Ok(())
}

fn print_human(w: &mut dyn Write, out: &SimulateOutput<'_>) -> io::Result<()> {
    let trace = out.trace;
    section(w, &format!("Simulation: {}", trace.strategy))?;
    if let Some(seed) = trace.seed {
        kv(w, "seed", seed.to_string())?;
    }
    kv(w, "nodes", trace.original_nodes.to_string())?;
    kv(w, "steps", out.summary.steps.to_string())?;
    kv(w, "state", format!("{:?}", out.state).to_lowercase())?;
    kv(w, "baseline efficiency", format!("{:.4}", trace.baseline.efficiency))?;
    kv(w, "auc efficiency", format!("{:.4}", out.summary.auc_efficiency))?;
    kv(w, "auc lcc", format!("{:.4}", out.summary.auc_lcc))?;
    kv(w, "critical fraction", opt(out.summary.critical_fraction))?;
    if let Some(path) = out.trace_file {
        kv(w, "trace", path.display().to_string())?;
    }

    if !out.fractions.is_empty() {
        writeln!(w)?;
        section(w, "Removed fraction")?;
        writeln!(
            w,
            "{:>8} {:>8} {:>12} {:>12}",
            "fraction", "removed", "lcc", "efficiency"
        )?;
        for p in &out.fractions {
            writeln!(
                w,
                "{:>8.2} {:>8} {:>12.4} {:>12.4}",
                p.fraction, p.removed, p.lcc_fraction, p.efficiency
            )?;
        }
    }
    if let Some(error) = &out.error {
        writeln!(w)?;
        writeln!(w, "aborted: {error}")?;
    }
    Ok(())
}
