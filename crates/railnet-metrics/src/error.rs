use railnet_core::{ErrorCode, GraphError, RankingMeasure};
use thiserror::Error;

/// Failures while computing metrics on a graph.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MetricsError {
    #[error("graph invariant violated: {0}")]
    Graph(#[from] GraphError),

    #[error("{measure} score for node {node} is not finite")]
    NonFiniteScore {
        node: String,
        measure: &'static str,
    },
}

impl MetricsError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Graph(e) => e.code(),
            Self::NonFiniteScore { .. } => ErrorCode::InternalUnexpected,
        }
    }

    pub(crate) const fn non_finite(node: String, measure: RankingMeasure) -> Self {
        Self::NonFiniteScore {
            node,
            measure: measure.as_str(),
        }
    }
}
