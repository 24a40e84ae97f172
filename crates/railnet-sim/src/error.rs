use railnet_core::{ConfigError, ErrorCode, GraphError};
use railnet_metrics::MetricsError;
use thiserror::Error;

use crate::trace::SimulationTrace;

/// Why a simulation stopped before the graph was exhausted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error("invalid simulation config: {0}")]
    Config(#[from] ConfigError),

    #[error("simulation cancelled after step {last_step}")]
    Cancelled { last_step: usize },

    #[error("ranking failed after step {last_step}: {source}")]
    Ranking {
        last_step: usize,
        source: MetricsError,
    },

    #[error("working graph corrupted after step {last_step}: {source}")]
    Graph {
        last_step: usize,
        source: GraphError,
    },
}

impl SimulationError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Config(_) => ErrorCode::ConfigurationError,
            Self::Cancelled { .. } | Self::Ranking { .. } | Self::Graph { .. } => {
                ErrorCode::SimulationAborted
            }
        }
    }

    /// Last step whose record is in the partial trace (0 = baseline only).
    #[must_use]
    pub const fn last_step(&self) -> Option<usize> {
        match self {
            Self::Config(_) => None,
            Self::Cancelled { last_step }
            | Self::Ranking { last_step, .. }
            | Self::Graph { last_step, .. } => Some(*last_step),
        }
    }
}

/// An aborted run: the cause plus every record produced before it.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{error}")]
pub struct AbortedRun {
    pub error: SimulationError,
    pub partial: SimulationTrace,
}
