use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::spatial::DistanceMode;
use crate::strategy::AttackStrategy;

/// Default snap tolerance in degrees (about 20 cm at mid latitudes).
pub const DEFAULT_SNAP_TOLERANCE_DEG: f64 = 2e-6;

/// Top-level configuration, loaded from `railnet.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RailnetConfig {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub linking: LinkingConfig,
    #[serde(default)]
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_snap_tolerance")]
    pub snap_tolerance_deg: f64,
    #[serde(default)]
    pub distance: DistanceMode,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            snap_tolerance_deg: default_snap_tolerance(),
            distance: DistanceMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingConfig {
    #[serde(default = "default_name_group_radius")]
    pub name_group_radius_m: f64,
    #[serde(default = "default_true")]
    pub merge_exact_coordinates: bool,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            name_group_radius_m: default_name_group_radius(),
            merge_exact_coordinates: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_link_radius")]
    pub link_radius_m: f64,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            link_radius_m: default_link_radius(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_repetitions")]
    pub repetitions: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub step_budget: Option<usize>,
    #[serde(default = "default_fractions")]
    pub fractions: Vec<f64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            repetitions: default_repetitions(),
            seed: default_seed(),
            step_budget: None,
            fractions: default_fractions(),
        }
    }
}

impl SimulationSettings {
    /// Parse the configured strategy name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownStrategy`] for unrecognised names.
    pub fn attack_strategy(&self) -> Result<AttackStrategy, ConfigError> {
        self.strategy.parse()
    }
}

const fn default_true() -> bool {
    true
}

const fn default_snap_tolerance() -> f64 {
    DEFAULT_SNAP_TOLERANCE_DEG
}

const fn default_name_group_radius() -> f64 {
    300.0
}

const fn default_link_radius() -> f64 {
    500.0
}

fn default_strategy() -> String {
    "random".to_string()
}

const fn default_repetitions() -> usize {
    10
}

const fn default_seed() -> u64 {
    42
}

fn default_fractions() -> Vec<f64> {
    vec![0.0, 0.01, 0.02, 0.05, 0.1, 0.2, 0.3, 0.5]
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

impl RailnetConfig {
    /// Reject invalid values before any work begins.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("matching.snap_tolerance_deg", self.matching.snap_tolerance_deg)?;
        check_positive("grouping.name_group_radius_m", self.grouping.name_group_radius_m)?;
        check_positive("linking.link_radius_m", self.linking.link_radius_m)?;

        let sim = &self.simulation;
        sim.attack_strategy()?;
        if sim.repetitions == 0 {
            return Err(ConfigError::ZeroRepetitions);
        }
        if sim.step_budget == Some(0) {
            return Err(ConfigError::ZeroStepBudget);
        }
        if let Some(&bad) = sim
            .fractions
            .iter()
            .find(|f| !(0.0..=1.0).contains(*f))
        {
            return Err(ConfigError::FractionOutOfRange(bad));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML, or the validation
    /// error for well-formed but invalid values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Load configuration from `path`, falling back to defaults when no path is
/// given or the file does not exist.
///
/// # Errors
///
/// Returns an error if the file cannot be read, fails to parse, or fails
/// validation.
pub fn load_config(path: Option<&Path>) -> Result<RailnetConfig> {
    let Some(path) = path else {
        return Ok(RailnetConfig::default());
    };
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file missing, using defaults");
        return Ok(RailnetConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    RailnetConfig::from_toml_str(&content)
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let config = RailnetConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.matching.snap_tolerance_deg - 2e-6).abs() < 1e-15);
        assert!((config.grouping.name_group_radius_m - 300.0).abs() < 1e-9);
        assert!(!config.linking.enabled);
        assert_eq!(config.simulation.repetitions, 10);
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.simulation.step_budget, None);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = RailnetConfig::from_toml_str(
            r#"
            [simulation]
            strategy = "betweenness_adaptive"
            step_budget = 25
            "#,
        )
        .expect("parse");
        assert_eq!(config.simulation.strategy, "betweenness_adaptive");
        assert_eq!(config.simulation.step_budget, Some(25));
        assert_eq!(config.simulation.repetitions, 10);
        assert_eq!(config.matching.distance, DistanceMode::Planar);
    }

    #[test]
    fn rejects_non_positive_tolerance() {
        let err = RailnetConfig::from_toml_str("[matching]\nsnap_tolerance_deg = 0.0\n")
            .expect_err("zero tolerance");
        assert!(matches!(err, ConfigError::NonPositive { .. }));
        assert_eq!(err.code().code(), "E3001");
    }

    #[test]
    fn rejects_nan_radius() {
        let mut config = RailnetConfig::default();
        config.grouping.name_group_radius_m = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { field: "grouping.name_group_radius_m", .. })
        ));
    }

    #[test]
    fn rejects_unknown_strategy() {
        let err = RailnetConfig::from_toml_str("[simulation]\nstrategy = \"pagerank\"\n")
            .expect_err("unknown strategy");
        assert_eq!(err, ConfigError::UnknownStrategy("pagerank".to_string()));
    }

    #[test]
    fn rejects_zero_budget_and_repetitions() {
        let mut config = RailnetConfig::default();
        config.simulation.step_budget = Some(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroStepBudget));

        let mut config = RailnetConfig::default();
        config.simulation.repetitions = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroRepetitions));
    }

    #[test]
    fn rejects_fraction_out_of_range() {
        let mut config = RailnetConfig::default();
        config.simulation.fractions = vec![0.0, 1.5];
        assert_eq!(config.validate(), Err(ConfigError::FractionOutOfRange(1.5)));
    }

    #[test]
    fn load_config_missing_file_returns_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let config = load_config(Some(&dir.path().join("nope.toml"))).expect("load");
        assert_eq!(config, RailnetConfig::default());
        assert_eq!(load_config(None).expect("load"), RailnetConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("railnet.toml");
        std::fs::write(
            &path,
            "[matching]\ndistance = \"haversine\"\n[linking]\nenabled = true\n",
        )
        .expect("write");
        let config = load_config(Some(&path)).expect("load");
        assert_eq!(config.matching.distance, DistanceMode::Haversine);
        assert!(config.linking.enabled);
    }

    #[test]
    fn load_config_reports_invalid_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("railnet.toml");
        std::fs::write(&path, "[simulation]\nrepetitions = 0\n").expect("write");
        let err = load_config(Some(&path)).expect_err("invalid");
        assert!(format!("{err:#}").contains("repetitions"));
    }
}
