#![forbid(unsafe_code)]
//! railnet-sim: robustness of rail networks under node removal.
//!
//! # Overview
//!
//! [`RobustnessSimulator`] removes nodes one at a time from a private copy
//! of a [`railnet_core::RailNetworkGraph`] and records a
//! [`SimulationTrace`] of remaining size, largest component and global
//! efficiency. [`run_campaign`] repeats random runs across seeds and
//! aggregates the decay curves; [`sweep_strategies`] compares strategies on
//! the same graph.
//!
//! # Conventions
//!
//! - **Determinism**: a seed fully determines a random removal order; ties
//!   in every ranking break on ascending node id.
//! - **Errors**: configuration problems are rejected up front with
//!   [`railnet_core::ConfigError`]. A run that stops early returns its
//!   partial trace alongside a [`SimulationError`].
//! - **Logging**: `tracing` spans per run and per campaign; per-step detail
//!   at `debug`.

pub mod campaign;
pub mod cancel;
pub mod error;
pub mod rng;
pub mod simulator;
pub mod trace;

pub use campaign::{CampaignConfig, CampaignReport, MeanVariance, run_campaign, sweep_strategies};
pub use cancel::CancelToken;
pub use error::{AbortedRun, SimulationError};
pub use rng::SimRng;
pub use simulator::{
    CentralityRanker, NodeRanker, RobustnessSimulator, SimulationConfig, SimulationOutcome,
    SimulationState, measure,
};
pub use trace::{
    FractionPoint, Measurement, SimulationTrace, TraceRecord, TraceSummary, fraction_curve,
};
