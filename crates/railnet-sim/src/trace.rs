//! Simulation traces and the summary statistics derived from them.
//!
//! # Trace
//!
//! A [`SimulationTrace`] holds the baseline measurements of the intact graph
//! followed by one [`TraceRecord`] per removal. `remaining` drops by exactly
//! one per record.
//!
//! `efficiency` is the global efficiency of the reduced graph, averaged over
//! its own `n (n - 1)` ordered pairs. `retained_efficiency` divides the same
//! sum by the original `N (N - 1)` instead, so it is non-increasing under
//! any removal order.
//!
//! # Summary statistics
//!
//! Curves are plotted against the removed fraction `k / N`:
//!
//! - `auc_efficiency`: trapezoidal area under `E_k / E_0`. Zero when the
//!   baseline efficiency is zero.
//! - `auc_lcc`: trapezoidal area under `lcc_k / N`.
//! - `critical_fraction`: first `k / N` at which the graph is empty or split
//!   into more than one component.
//!
//! A trace cut short by a step budget only covers `[0, k_max / N]`; the
//! areas are taken over that range.

use railnet_core::AttackStrategy;
use serde::{Deserialize, Serialize};

/// Connectivity snapshot of the working graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub remaining: usize,
    pub lcc_size: usize,
    pub components: usize,
    pub efficiency: f64,
    pub retained_efficiency: f64,
}

impl Measurement {
    /// Connected means exactly one non-empty component.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.components == 1
    }
}

/// One removal step. `step` counts from 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub step: usize,
    pub removed: String,
    pub remaining: usize,
    pub lcc_size: usize,
    pub components: usize,
    pub efficiency: f64,
    pub retained_efficiency: f64,
}

impl TraceRecord {
    #[must_use]
    pub fn new(step: usize, removed: impl Into<String>, m: Measurement) -> Self {
        Self {
            step,
            removed: removed.into(),
            remaining: m.remaining,
            lcc_size: m.lcc_size,
            components: m.components,
            efficiency: m.efficiency,
            retained_efficiency: m.retained_efficiency,
        }
    }

    #[must_use]
    pub const fn measurement(&self) -> Measurement {
        Measurement {
            remaining: self.remaining,
            lcc_size: self.lcc_size,
            components: self.components,
            efficiency: self.efficiency,
            retained_efficiency: self.retained_efficiency,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationTrace {
    pub strategy: AttackStrategy,
    /// Seed of the random order; `None` for deterministic strategies.
    pub seed: Option<u64>,
    pub original_nodes: usize,
    pub baseline: Measurement,
    pub records: Vec<TraceRecord>,
}

impl SimulationTrace {
    #[must_use]
    pub const fn new(
        strategy: AttackStrategy,
        seed: Option<u64>,
        original_nodes: usize,
        baseline: Measurement,
    ) -> Self {
        Self {
            strategy,
            seed,
            original_nodes,
            baseline,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Step index of the last record, 0 when nothing was removed.
    #[must_use]
    pub fn last_step(&self) -> usize {
        self.records.last().map_or(0, |r| r.step)
    }

    /// Removed node ids in removal order.
    #[must_use]
    pub fn removal_order(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.removed.as_str()).collect()
    }

    /// Measurement after `k` removals; `k = 0` is the baseline.
    #[must_use]
    pub fn after(&self, k: usize) -> Option<Measurement> {
        if k == 0 {
            Some(self.baseline)
        } else {
            self.records.get(k - 1).map(TraceRecord::measurement)
        }
    }

    fn measurements(&self) -> impl Iterator<Item = Measurement> + '_ {
        std::iter::once(self.baseline).chain(self.records.iter().map(TraceRecord::measurement))
    }

    #[must_use]
    pub fn summary(&self) -> TraceSummary {
        TraceSummary::from_trace(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub steps: usize,
    pub auc_efficiency: f64,
    pub auc_lcc: f64,
    pub critical_fraction: Option<f64>,
}

impl TraceSummary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_trace(trace: &SimulationTrace) -> Self {
        let n = trace.original_nodes;
        if n == 0 {
            return Self {
                steps: trace.len(),
                auc_efficiency: 0.0,
                auc_lcc: 0.0,
                critical_fraction: None,
            };
        }
        let nf = n as f64;
        let e0 = trace.baseline.efficiency;
        let eff: Vec<f64> = trace
            .measurements()
            .map(|m| if e0 > 0.0 { m.efficiency / e0 } else { 0.0 })
            .collect();
        let lcc: Vec<f64> = trace
            .measurements()
            .map(|m| m.lcc_size as f64 / nf)
            .collect();
        let critical_fraction = trace
            .measurements()
            .position(|m| !m.is_connected())
            .map(|k| k as f64 / nf);

        Self {
            steps: trace.len(),
            auc_efficiency: trapezoid(&eff, 1.0 / nf),
            auc_lcc: trapezoid(&lcc, 1.0 / nf),
            critical_fraction,
        }
    }
}

/// Area under evenly spaced samples.
fn trapezoid(values: &[f64], dx: f64) -> f64 {
    values.windows(2).map(|w| (w[0] + w[1]) * 0.5 * dx).sum()
}

/// A trace sampled at one removed fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractionPoint {
    pub fraction: f64,
    pub removed: usize,
    pub lcc_fraction: f64,
    pub efficiency: f64,
}

/// Sample `trace` at each of `fractions`, using `floor(N · f)` removals.
/// Fractions the trace never reached are skipped.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn fraction_curve(trace: &SimulationTrace, fractions: &[f64]) -> Vec<FractionPoint> {
    let n = trace.original_nodes;
    fractions
        .iter()
        .filter_map(|&fraction| {
            let removed = (n as f64 * fraction).floor() as usize;
            let m = trace.after(removed)?;
            Some(FractionPoint {
                fraction,
                removed,
                lcc_fraction: if n == 0 {
                    0.0
                } else {
                    m.lcc_size as f64 / n as f64
                },
                efficiency: m.efficiency,
            })
        })
        .collect()
}
