//! `railnet campaign`: repeated runs and multi-strategy sweeps.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use railnet_core::AttackStrategy;
use railnet_core::config::load_config;
use railnet_metrics::PathMetric;
use railnet_sim::{CampaignConfig, CampaignReport, CancelToken, run_campaign, sweep_strategies};
use tracing::warn;

use crate::cmd::metrics::MetricArg;
use crate::cmd::{load_graph, write_json};
use crate::output::{OutputMode, print_json, section};

/// Arguments for `railnet campaign`.
#[derive(Args, Debug)]
pub struct CampaignArgs {
    /// Graph snapshot written by `railnet build`.
    #[arg(long, short, value_name = "FILE")]
    pub graph: PathBuf,

    /// Strategy to run; repeat to sweep several. Defaults to the config
    /// value.
    #[arg(long = "strategy", short, value_name = "NAME")]
    pub strategies: Vec<String>,

    /// Sweep every known strategy.
    #[arg(long, conflicts_with = "strategies")]
    pub all: bool,

    /// Runs per random strategy. Deterministic strategies run once.
    #[arg(long, short)]
    pub repetitions: Option<usize>,

    /// First seed; run `i` uses `seed + i`.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop every run after this many removals.
    #[arg(long, value_name = "STEPS")]
    pub budget: Option<usize>,

    /// Path length used by efficiency and centrality.
    #[arg(long, value_enum, default_value = "auto")]
    pub metric: MetricArg,

    /// Write the campaign reports as JSON.
    #[arg(long, short, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

impl CampaignArgs {
    fn strategies(&self, fallback: AttackStrategy) -> Result<Vec<AttackStrategy>> {
        if self.all {
            return AttackStrategy::all_names()
                .iter()
                .map(|name| name.parse().map_err(anyhow::Error::from))
                .collect();
        }
        if self.strategies.is_empty() {
            return Ok(vec![fallback]);
        }
        self.strategies
            .iter()
            .map(|name| {
                name.parse::<AttackStrategy>()
                    .with_context(|| format!("invalid --strategy '{name}'"))
            })
            .collect()
    }
}

/// Execute `railnet campaign`.
///
/// # Errors
///
/// Invalid strategy or config, unreadable snapshot, or an output write
/// failure. Aborted runs are reported, not returned as errors.
pub fn run_campaign_cmd(
    args: &CampaignArgs,
    config_path: Option<&Path>,
    output: OutputMode,
) -> Result<()> {
    let config = load_config(config_path)?;
    let mut settings = config.simulation;
    if let Some(repetitions) = args.repetitions {
        settings.repetitions = repetitions;
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if args.budget.is_some() {
        settings.step_budget = args.budget;
    }
    let mut base = CampaignConfig::from_settings(&settings)?;
    base.metric = PathMetric::from(args.metric);
    let strategies = args.strategies(base.strategy)?;
    let graph = load_graph(&args.graph)?;

    let cancel = CancelToken::new();
    let reports = match strategies.as_slice() {
        [single] => {
            let config = CampaignConfig {
                strategy: *single,
                ..base
            };
            vec![run_campaign(&graph, &config, &cancel)?]
        }
        many => sweep_strategies(&graph, &base, many, &cancel)?,
    };
    let aborted: usize = reports.iter().map(|r| r.aborted).sum();
    if aborted > 0 {
        warn!(aborted, "some runs were aborted; their partial traces are included");
    }

    if let Some(path) = &args.out {
        write_json(path, &reports)?;
    }
    if output.is_json() {
        return print_json(&reports);
    }
    print_table(&mut io::stdout().lock(), &reports)?;
    if let Some(path) = &args.out {
        writeln!(io::stdout(), "\nreports written to {}", path.display())?;
    }
    Ok(())
}

fn print_table(w: &mut dyn Write, reports: &[CampaignReport]) -> io::Result<()> {
    section(w, "Campaign")?;
    writeln!(
        w,
        "{:<28} {:>5} {:>8} {:>10} {:>10} {:>10}",
        "strategy", "runs", "aborted", "auc eff", "± sd", "auc lcc"
    )?;
    for r in reports {
        writeln!(
            w,
            "{:<28} {:>5} {:>8} {:>10.4} {:>10.4} {:>10.4}",
            r.strategy.to_string(),
            r.runs.len(),
            r.aborted,
            r.auc_efficiency.mean,
            r.auc_efficiency.variance.sqrt(),
            r.auc_lcc.mean
        )?;
    }

    for r in reports.iter().filter(|r| !r.fractions.is_empty()) {
        writeln!(w)?;
        section(w, &format!("{} by removed fraction", r.strategy))?;
        writeln!(w, "{:>8} {:>8} {:>12} {:>12}", "fraction", "runs", "lcc", "efficiency")?;
        for f in &r.fractions {
            writeln!(
                w,
                "{:>8.2} {:>8} {:>12.4} {:>12.4}",
                f.fraction, f.runs, f.lcc_fraction.mean, f.efficiency.mean
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use railnet_core::{RankingMeasure, RankingMode};

    fn args(strategies: &[&str], all: bool) -> CampaignArgs {
        CampaignArgs {
            graph: PathBuf::from("graph.bin"),
            strategies: strategies.iter().map(ToString::to_string).collect(),
            all,
            repetitions: None,
            seed: None,
            budget: None,
            metric: MetricArg::Auto,
            out: None,
        }
    }

    #[test]
    fn falls_back_to_config_strategy() {
        let got = args(&[], false)
            .strategies(AttackStrategy::Random)
            .expect("strategies");
        assert_eq!(got, vec![AttackStrategy::Random]);
    }

    #[test]
    fn parses_repeated_strategies() {
        let got = args(&["random", "degree_adaptive"], false)
            .strategies(AttackStrategy::Random)
            .expect("strategies");
        assert_eq!(
            got,
            vec![
                AttackStrategy::Random,
                AttackStrategy::targeted(RankingMeasure::Degree, RankingMode::Adaptive),
            ]
        );
    }

    #[test]
    fn all_lists_every_strategy() {
        let got = args(&[], true)
            .strategies(AttackStrategy::Random)
            .expect("strategies");
        assert_eq!(got.len(), AttackStrategy::all_names().len());
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let err = args(&["pagerank"], false)
            .strategies(AttackStrategy::Random)
            .expect_err("unknown");
        assert!(err.to_string().contains("pagerank"));
    }
}
