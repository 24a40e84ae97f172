//! Multi-run campaigns: random repetitions and strategy sweeps.
//!
//! Random removal is stochastic, so a single trace says little. A campaign
//! runs `repetitions` independent simulations with seeds `base_seed + i`
//! and reports the mean and variance of the decay curves, both per removal
//! step and per requested removed fraction. Deterministic strategies run
//! once regardless of `repetitions`.
//!
//! Runs execute in parallel on the rayon pool. Each run clones the shared
//! read-only graph; results are collected in seed order, so a campaign is
//! reproducible regardless of thread scheduling.

use railnet_core::config::SimulationSettings;
use railnet_core::{AttackStrategy, ConfigError, RailNetworkGraph};
use railnet_metrics::PathMetric;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::cancel::CancelToken;
use crate::simulator::{RobustnessSimulator, SimulationConfig};
use crate::trace::{FractionPoint, SimulationTrace, TraceSummary, fraction_curve};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignConfig {
    pub strategy: AttackStrategy,
    pub repetitions: usize,
    pub base_seed: u64,
    pub step_budget: Option<usize>,
    pub metric: PathMetric,
    pub fractions: Vec<f64>,
}

impl CampaignConfig {
    /// Build from the `[simulation]` config section.
    ///
    /// # Errors
    ///
    /// Unknown strategy, zero repetitions, zero step budget, or a fraction
    /// outside `[0, 1]`.
    pub fn from_settings(settings: &SimulationSettings) -> Result<Self, ConfigError> {
        let config = Self {
            strategy: settings.attack_strategy()?,
            repetitions: settings.repetitions,
            base_seed: settings.seed,
            step_budget: settings.step_budget,
            metric: PathMetric::Auto,
            fractions: settings.fractions.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// See [`CampaignConfig::from_settings`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repetitions == 0 {
            return Err(ConfigError::ZeroRepetitions);
        }
        if let Some(&f) = self
            .fractions
            .iter()
            .find(|f| !(f.is_finite() && (0.0..=1.0).contains(*f)))
        {
            return Err(ConfigError::FractionOutOfRange(f));
        }
        self.simulation(self.base_seed).validate()
    }

    /// Number of runs actually executed.
    #[must_use]
    pub const fn effective_repetitions(&self) -> usize {
        match self.strategy {
            AttackStrategy::Random => self.repetitions,
            _ => 1,
        }
    }

    #[must_use]
    pub const fn simulation(&self, seed: u64) -> SimulationConfig {
        SimulationConfig {
            strategy: self.strategy,
            seed,
            step_budget: self.step_budget,
            metric: self.metric,
        }
    }
}

/// Population mean and variance of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanVariance {
    pub mean: f64,
    pub variance: f64,
}

impl MeanVariance {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                variance: 0.0,
            };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self { mean, variance }
    }
}

/// Aggregate after `removed` removals, over the runs that got that far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepStats {
    pub removed: usize,
    pub runs: usize,
    pub lcc_fraction: MeanVariance,
    pub efficiency: MeanVariance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractionStats {
    pub fraction: f64,
    pub removed: usize,
    pub runs: usize,
    pub lcc_fraction: MeanVariance,
    pub efficiency: MeanVariance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: Option<u64>,
    pub complete: bool,
    pub summary: TraceSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignReport {
    pub strategy: AttackStrategy,
    pub original_nodes: usize,
    pub runs: Vec<RunSummary>,
    pub aborted: usize,
    pub auc_efficiency: MeanVariance,
    pub auc_lcc: MeanVariance,
    pub steps: Vec<StepStats>,
    pub fractions: Vec<FractionStats>,
}

/// Run every repetition of `config` against `graph`.
///
/// Aborted runs (cancellation, ranking failure) still contribute their
/// partial traces and are counted in [`CampaignReport::aborted`].
///
/// # Errors
///
/// Configuration errors, before any run starts.
#[instrument(skip_all, fields(strategy = %config.strategy, repetitions = config.repetitions))]
pub fn run_campaign(
    graph: &RailNetworkGraph,
    config: &CampaignConfig,
    cancel: &CancelToken,
) -> Result<CampaignReport, ConfigError> {
    config.validate()?;
    let seeds: Vec<u64> = (0..config.effective_repetitions() as u64)
        .map(|i| config.base_seed.wrapping_add(i))
        .collect();

    let results: Vec<(SimulationTrace, bool)> = seeds
        .par_iter()
        .map(|&seed| -> Result<(SimulationTrace, bool), ConfigError> {
            let mut sim = RobustnessSimulator::new(graph, config.simulation(seed))?
                .with_cancel(cancel.clone());
            let outcome = sim.run();
            Ok((outcome.trace, outcome.error.is_none()))
        })
        .collect::<Result<_, _>>()?;

    let aborted = results.iter().filter(|(_, complete)| !complete).count();
    if aborted > 0 {
        warn!(aborted, "campaign finished with aborted runs");
    }
    let traces: Vec<&SimulationTrace> = results.iter().map(|(t, _)| t).collect();
    let report = CampaignReport {
        strategy: config.strategy,
        original_nodes: graph.node_count(),
        runs: results
            .iter()
            .map(|(trace, complete)| RunSummary {
                seed: trace.seed,
                complete: *complete,
                summary: trace.summary(),
            })
            .collect(),
        aborted,
        auc_efficiency: MeanVariance::of(
            &traces.iter().map(|t| t.summary().auc_efficiency).collect::<Vec<_>>(),
        ),
        auc_lcc: MeanVariance::of(&traces.iter().map(|t| t.summary().auc_lcc).collect::<Vec<_>>()),
        steps: step_stats(&traces),
        fractions: fraction_stats(&traces, &config.fractions),
    };
    info!(
        runs = report.runs.len(),
        auc_efficiency = report.auc_efficiency.mean,
        "campaign complete"
    );
    Ok(report)
}

/// One campaign per strategy, run in parallel; results follow the order of
/// `strategies`.
///
/// # Errors
///
/// The first configuration error, before any run starts.
pub fn sweep_strategies(
    graph: &RailNetworkGraph,
    base: &CampaignConfig,
    strategies: &[AttackStrategy],
    cancel: &CancelToken,
) -> Result<Vec<CampaignReport>, ConfigError> {
    let configs: Vec<CampaignConfig> = strategies
        .iter()
        .map(|&strategy| CampaignConfig {
            strategy,
            ..base.clone()
        })
        .collect();
    for config in &configs {
        config.validate()?;
    }
    configs
        .par_iter()
        .map(|config| run_campaign(graph, config, cancel))
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn lcc_fraction(lcc: usize, n: usize) -> f64 {
    if n == 0 { 0.0 } else { lcc as f64 / n as f64 }
}

fn step_stats(traces: &[&SimulationTrace]) -> Vec<StepStats> {
    let longest = traces.iter().map(|t| t.len()).max().unwrap_or(0);
    if traces.is_empty() {
        return Vec::new();
    }
    (0..=longest)
        .map(|k| {
            let (lcc, eff): (Vec<f64>, Vec<f64>) = traces
                .iter()
                .filter_map(|t| {
                    t.after(k)
                        .map(|m| (lcc_fraction(m.lcc_size, t.original_nodes), m.efficiency))
                })
                .unzip();
            StepStats {
                removed: k,
                runs: lcc.len(),
                lcc_fraction: MeanVariance::of(&lcc),
                efficiency: MeanVariance::of(&eff),
            }
        })
        .collect()
}

fn fraction_stats(traces: &[&SimulationTrace], fractions: &[f64]) -> Vec<FractionStats> {
    let curves: Vec<Vec<FractionPoint>> =
        traces.iter().map(|t| fraction_curve(t, fractions)).collect();
    fractions
        .iter()
        .filter_map(|&fraction| {
            let points: Vec<&FractionPoint> = curves
                .iter()
                .filter_map(|curve| curve.iter().find(|p| p.fraction.total_cmp(&fraction).is_eq()))
                .collect();
            let first = points.first()?;
            let lcc: Vec<f64> = points.iter().map(|p| p.lcc_fraction).collect();
            let eff: Vec<f64> = points.iter().map(|p| p.efficiency).collect();
            Some(FractionStats {
                fraction,
                removed: first.removed,
                runs: points.len(),
                lcc_fraction: MeanVariance::of(&lcc),
                efficiency: MeanVariance::of(&eff),
            })
        })
        .collect()
}
