//! Error taxonomy and structured diagnostics.
//!
//! Two kinds of failure flow through the pipeline:
//!
//! - **Recoverable outcomes** (a malformed record, an endpoint with no
//!   station nearby, a graph that falls apart during an attack) are not
//!   errors. They are collected as [`Diagnostic`] entries and returned next
//!   to whatever output was produced.
//! - **Fatal failures** (bad configuration, unreadable snapshots, a broken
//!   graph invariant) are typed `thiserror` enums returned through `Result`.
//!
//! Both carry an [`ErrorCode`] so callers can branch on a stable identifier
//! instead of parsing messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable error codes shared by every railnet crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRecord,
    NoMatchFound,
    DisconnectedGraph,
    SimulationAborted,
    ConfigurationError,
    SnapshotIo,
    SnapshotCorrupt,
    UnknownNode,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidRecord => "E1001",
            Self::NoMatchFound => "E1002",
            Self::DisconnectedGraph => "E2001",
            Self::SimulationAborted => "E2002",
            Self::ConfigurationError => "E3001",
            Self::SnapshotIo => "E4001",
            Self::SnapshotCorrupt => "E4002",
            Self::UnknownNode => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidRecord => "Invalid input record",
            Self::NoMatchFound => "No spatial match within tolerance",
            Self::DisconnectedGraph => "Graph is disconnected",
            Self::SimulationAborted => "Simulation aborted",
            Self::ConfigurationError => "Invalid configuration",
            Self::SnapshotIo => "Snapshot read/write failed",
            Self::SnapshotCorrupt => "Snapshot is corrupt",
            Self::UnknownNode => "Unknown node id",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Whether the code describes an outcome the pipeline recovers from.
    #[must_use]
    pub const fn is_recoverable(self) -> bool {
        matches!(
            self,
            Self::InvalidRecord | Self::NoMatchFound | Self::DisconnectedGraph
        )
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidRecord => {
                Some("Check the record's latitude/longitude; it was skipped.")
            }
            Self::NoMatchFound | Self::DisconnectedGraph => None,
            Self::SimulationAborted => {
                Some("The partial trace is still valid up to the last recorded step.")
            }
            Self::ConfigurationError => Some("Fix the offending value in railnet.toml and retry."),
            Self::SnapshotIo => Some("Check the path and file permissions."),
            Self::SnapshotCorrupt => Some("Rebuild the graph snapshot with `railnet build`."),
            Self::UnknownNode => Some("Use a node id present in the graph snapshot."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One non-fatal finding attached to a pipeline result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: ErrorCode,
    /// Id of the record, segment or node the finding is about.
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(code: ErrorCode, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.code, self.subject, self.message)
    }
}

/// Accumulated diagnostics for one pipeline invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn record(
        &mut self,
        code: ErrorCode,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(Diagnostic::new(code, subject, message));
    }

    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries carrying `code`.
    #[must_use]
    pub fn count(&self, code: ErrorCode) -> usize {
        self.entries.iter().filter(|d| d.code == code).count()
    }

    /// Subjects of all entries carrying `code`, in insertion order.
    #[must_use]
    pub fn subjects(&self, code: ErrorCode) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|d| d.code == code)
            .map(|d| d.subject.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Configuration rejected before any work begins.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be a finite positive number, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("unknown attack strategy '{0}'")]
    UnknownStrategy(String),

    #[error("step budget must be greater than zero")]
    ZeroStepBudget,

    #[error("repetitions must be greater than zero")]
    ZeroRepetitions,

    #[error("fraction {0} is outside [0, 1]")]
    FractionOutOfRange(f64),

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::ConfigurationError
    }
}

/// Structural graph errors: violated invariants of [`crate::graph::RailNetworkGraph`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("node id '{0}' already exists")]
    DuplicateNode(String),

    #[error("node id '{0}' does not exist")]
    UnknownNode(String),

    #[error("edge would connect node '{0}' to itself")]
    SelfLoop(String),

    #[error("graph invariant violated: {0}")]
    Invariant(String),
}

impl GraphError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownNode(_) => ErrorCode::UnknownNode,
            Self::DuplicateNode(_) | Self::SelfLoop(_) | Self::Invariant(_) => {
                ErrorCode::InternalUnexpected
            }
        }
    }
}
