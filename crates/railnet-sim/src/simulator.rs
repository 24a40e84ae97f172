//! Node-removal simulation over a private copy of a network.
//!
//! # State machine
//!
//! ```text
//! Ready ──run()──▶ Running ──graph empty / budget reached──▶ Complete
//!                     │
//!                     └──cancelled / ranking failed──▶ Aborted
//! ```
//!
//! The canonical graph is borrowed read-only; every run clones it and
//! removes nodes from the clone, so any number of simulators may share one
//! graph across threads.
//!
//! # Removal order
//!
//! - `Random`: ascending node ids shuffled by a seeded [`SimRng`].
//! - Static targeted and `Articulation`: ranked once on the intact graph.
//! - Adaptive targeted: re-ranked from scratch before every removal.
//!
//! Each step removes one node, then measures component count, largest
//! component size and global efficiency of what is left. Next to it the
//! trace keeps `retained_efficiency`, the same pair sum over the original
//! `N (N - 1)` pairs, which never rises as nodes are removed.

use std::collections::VecDeque;

use railnet_core::config::SimulationSettings;
use railnet_core::{
    AttackStrategy, ConfigError, GraphError, RailNetworkGraph, RankingMeasure, RankingMode,
};
use railnet_metrics::components::connected_components;
use railnet_metrics::efficiency::global_efficiency;
use railnet_metrics::{
    MetricsError, PathMetric, RankedNode, Topology, articulation_ranking, rank_nodes,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cancel::CancelToken;
use crate::error::{AbortedRun, SimulationError};
use crate::rng::{DEFAULT_SEED, SimRng};
use crate::trace::{Measurement, SimulationTrace, TraceRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationState {
    Ready,
    Running,
    Complete,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub strategy: AttackStrategy,
    pub seed: u64,
    /// Stop after this many removals; `None` runs until the graph is empty.
    pub step_budget: Option<usize>,
    pub metric: PathMetric,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(strategy: AttackStrategy) -> Self {
        Self {
            strategy,
            seed: DEFAULT_SEED,
            step_budget: None,
            metric: PathMetric::Auto,
        }
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub const fn with_step_budget(mut self, budget: Option<usize>) -> Self {
        self.step_budget = budget;
        self
    }

    #[must_use]
    pub const fn with_metric(mut self, metric: PathMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Build from the `[simulation]` config section.
    ///
    /// # Errors
    ///
    /// Unknown strategy name or zero step budget.
    pub fn from_settings(settings: &SimulationSettings) -> Result<Self, ConfigError> {
        let config = Self {
            strategy: settings.attack_strategy()?,
            seed: settings.seed,
            step_budget: settings.step_budget,
            metric: PathMetric::Auto,
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// [`ConfigError::ZeroStepBudget`] when the budget is `Some(0)`.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if matches!(self.step_budget, Some(0)) {
            return Err(ConfigError::ZeroStepBudget);
        }
        Ok(())
    }
}

/// Produces a ranking of the nodes of a graph, most important first.
///
/// The simulator calls this once for static strategies and before every
/// removal for adaptive ones.
pub trait NodeRanker {
    /// # Errors
    ///
    /// Any [`MetricsError`]; the simulator aborts with the partial trace.
    fn rank(
        &self,
        graph: &RailNetworkGraph,
        measure: RankingMeasure,
        inverse: bool,
    ) -> Result<Vec<RankedNode>, MetricsError>;
}

/// Full recomputation of the requested centrality.
#[derive(Debug, Clone, Copy, Default)]
pub struct CentralityRanker {
    pub metric: PathMetric,
}

impl NodeRanker for CentralityRanker {
    fn rank(
        &self,
        graph: &RailNetworkGraph,
        measure: RankingMeasure,
        inverse: bool,
    ) -> Result<Vec<RankedNode>, MetricsError> {
        rank_nodes(graph, measure, inverse, self.metric)
    }
}

/// Result of one run. The trace is kept whether or not the run completed.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub state: SimulationState,
    pub trace: SimulationTrace,
    pub error: Option<SimulationError>,
}

impl SimulationOutcome {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.state, SimulationState::Complete)
    }

    /// The complete trace, or the abort cause with the partial trace.
    ///
    /// # Errors
    ///
    /// [`AbortedRun`] when the run did not complete.
    pub fn into_result(self) -> Result<SimulationTrace, Box<AbortedRun>> {
        match self.error {
            None => Ok(self.trace),
            Some(error) => Err(Box::new(AbortedRun {
                error,
                partial: self.trace,
            })),
        }
    }
}

/// Connectivity and efficiency of `graph`.
///
/// `efficiency` is the global efficiency of `graph` itself;
/// `retained_efficiency` rescales it to the `original_nodes` the run started
/// from.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn measure(graph: &RailNetworkGraph, metric: PathMetric, original_nodes: usize) -> Measurement {
    let topo = Topology::from_graph(graph, metric);
    let components = connected_components(&topo);
    let n = topo.node_count();
    let efficiency = global_efficiency(&topo);
    let retained_efficiency = if original_nodes < 2 {
        0.0
    } else {
        efficiency * (n as f64 * (n as f64 - 1.0))
            / (original_nodes as f64 * (original_nodes as f64 - 1.0))
    };
    Measurement {
        remaining: n,
        lcc_size: components.first().map_or(0, Vec::len),
        components: components.len(),
        efficiency,
        retained_efficiency,
    }
}

pub struct RobustnessSimulator<'g, R = CentralityRanker> {
    graph: &'g RailNetworkGraph,
    config: SimulationConfig,
    ranker: R,
    cancel: CancelToken,
    state: SimulationState,
}

impl<'g> RobustnessSimulator<'g> {
    /// # Errors
    ///
    /// Rejects an invalid configuration before any work starts.
    pub fn new(graph: &'g RailNetworkGraph, config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            graph,
            config,
            ranker: CentralityRanker {
                metric: config.metric,
            },
            cancel: CancelToken::new(),
            state: SimulationState::Ready,
        })
    }
}

impl<'g, R: NodeRanker> RobustnessSimulator<'g, R> {
    /// Replace the ranking implementation.
    #[must_use]
    pub fn with_ranker<R2: NodeRanker>(self, ranker: R2) -> RobustnessSimulator<'g, R2> {
        RobustnessSimulator {
            graph: self.graph,
            config: self.config,
            ranker,
            cancel: self.cancel,
            state: self.state,
        }
    }

    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub const fn state(&self) -> SimulationState {
        self.state
    }

    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run the removal loop on a fresh copy of the graph.
    #[instrument(skip_all, fields(strategy = %self.config.strategy, nodes = self.graph.node_count()))]
    pub fn run(&mut self) -> SimulationOutcome {
        self.state = SimulationState::Running;
        let config = self.config;
        let mut working = self.graph.clone();
        let seed = matches!(config.strategy, AttackStrategy::Random).then_some(config.seed);
        let total = working.node_count();
        let mut trace = SimulationTrace::new(
            config.strategy,
            seed,
            total,
            measure(&working, config.metric, total),
        );

        let mut queue = match self.initial_order(&working) {
            Ok(order) => order,
            Err(source) => {
                return self.abort(trace, SimulationError::Ranking {
                    last_step: 0,
                    source,
                });
            }
        };

        let budget = config.step_budget.unwrap_or(usize::MAX);
        while !working.is_empty() && trace.len() < budget {
            let last_step = trace.last_step();
            if self.cancel.is_cancelled() {
                return self.abort(trace, SimulationError::Cancelled { last_step });
            }

            let next = if let AttackStrategy::Targeted {
                measure: m,
                mode: RankingMode::Adaptive,
                inverse,
            } = config.strategy
            {
                match self.ranker.rank(&working, m, inverse) {
                    Ok(ranking) => ranking.into_iter().next().map(|r| r.id),
                    Err(source) => {
                        return self.abort(trace, SimulationError::Ranking { last_step, source });
                    }
                }
            } else {
                queue.pop_front()
            };
            let Some(next) = next else {
                break;
            };

            if working.remove_node(&next).is_none() {
                let source = GraphError::UnknownNode(next);
                return self.abort(trace, SimulationError::Graph { last_step, source });
            }
            let m = measure(&working, config.metric, total);
            debug!(
                step = last_step + 1,
                removed = %next,
                lcc = m.lcc_size,
                efficiency = m.efficiency,
                "node removed"
            );
            trace.records.push(TraceRecord::new(last_step + 1, next, m));
        }

        self.state = SimulationState::Complete;
        info!(steps = trace.len(), "simulation complete");
        SimulationOutcome {
            state: self.state,
            trace,
            error: None,
        }
    }

    /// Removal order fixed before the loop starts. Empty for adaptive
    /// strategies, which rank inside the loop.
    fn initial_order(&self, graph: &RailNetworkGraph) -> Result<VecDeque<String>, MetricsError> {
        let ids: Vec<String> = match self.config.strategy {
            AttackStrategy::Random => {
                let mut ids: Vec<String> =
                    graph.node_ids().into_iter().map(str::to_string).collect();
                SimRng::new(self.config.seed).shuffle(&mut ids);
                ids
            }
            AttackStrategy::Targeted {
                mode: RankingMode::Adaptive,
                ..
            } => Vec::new(),
            AttackStrategy::Targeted {
                measure,
                mode: RankingMode::Static,
                inverse,
            } => self
                .ranker
                .rank(graph, measure, inverse)?
                .into_iter()
                .map(|r| r.id)
                .collect(),
            AttackStrategy::Articulation => {
                graph.check_invariants()?;
                let topo = Topology::from_graph(graph, self.config.metric);
                articulation_ranking(&topo).into_iter().map(|r| r.id).collect()
            }
        };
        Ok(ids.into())
    }

    fn abort(&mut self, trace: SimulationTrace, error: SimulationError) -> SimulationOutcome {
        warn!(error = %error, steps = trace.len(), "simulation aborted");
        self.state = SimulationState::Aborted;
        SimulationOutcome {
            state: self.state,
            trace,
            error: Some(error),
        }
    }
}
