//! Estimation settings, built in code or read from TOML.

use serde::Deserialize;

use crate::error::EstimationError;
use crate::minimizer::MinimizerOptions;

/// How the parameter subsets are optimised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One joint minimisation over every parameter.
    Direct,
    /// Alternate base and noise minimisations for `rounds` rounds, then
    /// finish with a joint minimisation.
    Staged {
        /// Number of base/noise rounds.
        rounds: usize,
    },
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Staged { rounds: 5 }
    }
}

/// Configuration for [`MixedEstimation`](crate::MixedEstimation).
///
/// # Example
///
/// ```
/// use strata_estimate::{EstimationConfig, Strategy};
///
/// let config = EstimationConfig::new()
///     .with_strategy(Strategy::Staged { rounds: 3 })
///     .with_max_iter(500);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationConfig {
    strategy: Strategy,
    direct_tolerance: f64,
    stage_tolerance: f64,
    final_tolerance: f64,
    max_iter: u64,
    simplex_step: f64,
}

impl EstimationConfig {
    /// Defaults: staged with 5 rounds, tolerances `1e-12` (direct and
    /// final) and `1e-6` (stages), `max_iter = 2000`, `simplex_step = 0.5`.
    pub fn new() -> Self {
        Self {
            strategy: Strategy::default(),
            direct_tolerance: 1e-12,
            stage_tolerance: 1e-6,
            final_tolerance: 1e-12,
            max_iter: 2000,
            simplex_step: 0.5,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_direct_tolerance(mut self, tolerance: f64) -> Self {
        self.direct_tolerance = tolerance;
        self
    }

    pub fn with_stage_tolerance(mut self, tolerance: f64) -> Self {
        self.stage_tolerance = tolerance;
        self
    }

    pub fn with_final_tolerance(mut self, tolerance: f64) -> Self {
        self.final_tolerance = tolerance;
        self
    }

    /// Sets the iteration cap of every single minimisation.
    pub fn with_max_iter(mut self, max_iter: u64) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the edge length of the initial simplex.
    pub fn with_simplex_step(mut self, step: f64) -> Self {
        self.simplex_step = step;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn direct_tolerance(&self) -> f64 {
        self.direct_tolerance
    }

    pub fn stage_tolerance(&self) -> f64 {
        self.stage_tolerance
    }

    pub fn final_tolerance(&self) -> f64 {
        self.final_tolerance
    }

    pub fn max_iter(&self) -> u64 {
        self.max_iter
    }

    pub fn simplex_step(&self) -> f64 {
        self.simplex_step
    }

    /// Minimizer options for one minimisation at `tolerance`.
    pub fn options(&self, tolerance: f64) -> MinimizerOptions {
        MinimizerOptions {
            tolerance,
            max_iter: self.max_iter,
            simplex_step: self.simplex_step,
        }
    }

    /// Validates this configuration.
    ///
    /// Rejects non-positive or non-finite tolerances and simplex step,
    /// `max_iter == 0` and a staged strategy without rounds.
    pub fn validate(&self) -> Result<(), EstimationError> {
        let positive = [
            ("direct_tolerance", self.direct_tolerance),
            ("stage_tolerance", self.stage_tolerance),
            ("final_tolerance", self.final_tolerance),
            ("simplex_step", self.simplex_step),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(EstimationError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if self.max_iter == 0 {
            return Err(EstimationError::InvalidConfig(
                "max_iter must be positive".to_string(),
            ));
        }
        if self.strategy == (Strategy::Staged { rounds: 0 }) {
            return Err(EstimationError::InvalidConfig(
                "staged strategy needs at least one round".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// ```toml
    /// strategy = "staged"
    /// rounds = 5
    /// stage_tolerance = 1e-6
    /// ```
    ///
    /// Every key is optional; unknown keys are rejected.
    pub fn from_toml_str(s: &str) -> Result<Self, EstimationError> {
        let raw: EstimationToml =
            toml::from_str(s).map_err(|e| EstimationError::Config(e.to_string()))?;
        let config = Self::from(raw);
        config.validate()?;
        Ok(config)
    }
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
enum StrategyKind {
    Direct,
    #[default]
    Staged,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EstimationToml {
    #[serde(default)]
    strategy: StrategyKind,
    #[serde(default = "default_rounds")]
    rounds: usize,
    #[serde(default = "default_tight_tolerance")]
    direct_tolerance: f64,
    #[serde(default = "default_stage_tolerance")]
    stage_tolerance: f64,
    #[serde(default = "default_tight_tolerance")]
    final_tolerance: f64,
    #[serde(default = "default_max_iter")]
    max_iter: u64,
    #[serde(default = "default_simplex_step")]
    simplex_step: f64,
}

fn default_rounds() -> usize {
    5
}
fn default_tight_tolerance() -> f64 {
    1e-12
}
fn default_stage_tolerance() -> f64 {
    1e-6
}
fn default_max_iter() -> u64 {
    2000
}
fn default_simplex_step() -> f64 {
    0.5
}

impl From<EstimationToml> for EstimationConfig {
    fn from(raw: EstimationToml) -> Self {
        let strategy = match raw.strategy {
            StrategyKind::Direct => Strategy::Direct,
            StrategyKind::Staged => Strategy::Staged { rounds: raw.rounds },
        };
        Self {
            strategy,
            direct_tolerance: raw.direct_tolerance,
            stage_tolerance: raw.stage_tolerance,
            final_tolerance: raw.final_tolerance,
            max_iter: raw.max_iter,
            simplex_step: raw.simplex_step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EstimationConfig::default();
        assert_eq!(cfg.strategy(), Strategy::Staged { rounds: 5 });
        assert_eq!(cfg.direct_tolerance(), 1e-12);
        assert_eq!(cfg.stage_tolerance(), 1e-6);
        assert_eq!(cfg.final_tolerance(), 1e-12);
        assert_eq!(cfg.max_iter(), 2000);
        assert_eq!(cfg.simplex_step(), 0.5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_builder_chaining() {
        let cfg = EstimationConfig::new()
            .with_strategy(Strategy::Direct)
            .with_direct_tolerance(1e-9)
            .with_max_iter(100)
            .with_simplex_step(0.1);
        assert_eq!(cfg.strategy(), Strategy::Direct);
        assert_eq!(cfg.direct_tolerance(), 1e-9);
        let options = cfg.options(1e-4);
        assert_eq!(options.tolerance, 1e-4);
        assert_eq!(options.max_iter, 100);
        assert_eq!(options.simplex_step, 0.1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            EstimationConfig::new().with_stage_tolerance(0.0),
            EstimationConfig::new().with_final_tolerance(f64::NAN),
            EstimationConfig::new().with_direct_tolerance(-1.0),
            EstimationConfig::new().with_simplex_step(f64::INFINITY),
            EstimationConfig::new().with_max_iter(0),
            EstimationConfig::new().with_strategy(Strategy::Staged { rounds: 0 }),
        ];
        for cfg in bad {
            assert!(
                matches!(cfg.validate(), Err(EstimationError::InvalidConfig(_))),
                "{cfg:?}"
            );
        }
    }

    #[test]
    fn test_toml_empty_is_default() {
        let cfg = EstimationConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, EstimationConfig::default());
    }

    #[test]
    fn test_toml_direct() {
        let cfg = EstimationConfig::from_toml_str(
            r#"
            strategy = "direct"
            direct_tolerance = 1e-10
            max_iter = 300
            "#,
        )
        .unwrap();
        assert_eq!(cfg.strategy(), Strategy::Direct);
        assert_eq!(cfg.direct_tolerance(), 1e-10);
        assert_eq!(cfg.max_iter(), 300);
    }

    #[test]
    fn test_toml_staged_rounds() {
        let cfg = EstimationConfig::from_toml_str("rounds = 2\nstage_tolerance = 1e-4").unwrap();
        assert_eq!(cfg.strategy(), Strategy::Staged { rounds: 2 });
        assert_eq!(cfg.stage_tolerance(), 1e-4);
    }

    #[test]
    fn test_toml_unknown_key() {
        let err = EstimationConfig::from_toml_str("tolerance = 1e-3").unwrap_err();
        assert!(matches!(err, EstimationError::Config(_)));
    }

    #[test]
    fn test_toml_unknown_strategy() {
        let err = EstimationConfig::from_toml_str("strategy = \"annealing\"").unwrap_err();
        assert!(matches!(err, EstimationError::Config(_)));
    }

    #[test]
    fn test_toml_is_validated() {
        let err = EstimationConfig::from_toml_str("max_iter = 0").unwrap_err();
        assert!(matches!(err, EstimationError::InvalidConfig(_)));
    }
}
