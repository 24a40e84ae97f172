//! Attack strategy names.
//!
//! Strategies are configured by name (`random`, `betweenness_adaptive`,
//! `inverse_degree`, ...). Parsing lives here rather than in the simulator
//! crate so configuration can be validated before any graph work starts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Structural score used to order targeted removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMeasure {
    Degree,
    Betweenness,
    Closeness,
}

impl RankingMeasure {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Degree => "degree",
            Self::Betweenness => "betweenness",
            Self::Closeness => "closeness",
        }
    }
}

impl fmt::Display for RankingMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When the ranking is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    /// Once, on the original graph.
    Static,
    /// After every removal.
    Adaptive,
}

/// Node removal order for a robustness run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AttackStrategy {
    /// Uniformly random order from a seeded RNG.
    Random,
    /// Descending score (ascending when `inverse`), ties by ascending id.
    Targeted {
        measure: RankingMeasure,
        mode: RankingMode,
        inverse: bool,
    },
    /// Articulation points first, then everything else, both by descending
    /// degree. Computed once.
    Articulation,
}

impl AttackStrategy {
    #[must_use]
    pub const fn targeted(measure: RankingMeasure, mode: RankingMode) -> Self {
        Self::Targeted {
            measure,
            mode,
            inverse: false,
        }
    }

    #[must_use]
    pub const fn is_adaptive(&self) -> bool {
        matches!(
            self,
            Self::Targeted {
                mode: RankingMode::Adaptive,
                ..
            }
        )
    }

    /// All strategy names accepted by [`FromStr`].
    #[must_use]
    pub fn all_names() -> Vec<String> {
        let mut names = vec!["random".to_string(), "articulation".to_string()];
        for inverse in [false, true] {
            for measure in [
                RankingMeasure::Degree,
                RankingMeasure::Betweenness,
                RankingMeasure::Closeness,
            ] {
                for mode in [RankingMode::Static, RankingMode::Adaptive] {
                    names.push(
                        Self::Targeted {
                            measure,
                            mode,
                            inverse,
                        }
                        .to_string(),
                    );
                }
            }
        }
        names
    }
}

impl fmt::Display for AttackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => f.write_str("random"),
            Self::Articulation => f.write_str("articulation"),
            Self::Targeted {
                measure,
                mode,
                inverse,
            } => {
                if *inverse {
                    f.write_str("inverse_")?;
                }
                f.write_str(measure.as_str())?;
                if *mode == RankingMode::Adaptive {
                    f.write_str("_adaptive")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for AttackStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        match raw.as_str() {
            "random" => return Ok(Self::Random),
            "articulation" => return Ok(Self::Articulation),
            _ => {}
        }

        let (rest, mode) = raw
            .strip_suffix("_adaptive")
            .map_or((raw.as_str(), RankingMode::Static), |r| {
                (r, RankingMode::Adaptive)
            });
        let (rest, inverse) = rest
            .strip_prefix("inverse_")
            .map_or((rest, false), |r| (r, true));
        let measure = match rest {
            "degree" => RankingMeasure::Degree,
            "betweenness" => RankingMeasure::Betweenness,
            "closeness" => RankingMeasure::Closeness,
            _ => return Err(ConfigError::UnknownStrategy(s.to_string())),
        };
        Ok(Self::Targeted {
            measure,
            mode,
            inverse,
        })
    }
}

impl TryFrom<String> for AttackStrategy {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AttackStrategy> for String {
    fn from(value: AttackStrategy) -> Self {
        value.to_string()
    }
}
