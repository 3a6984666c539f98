//! Run configuration, stored as YAML.
//!
//! ```yaml
//! time:
//!   start: 0.0
//!   end: 86400.0
//!   desired_delta_t: 900.0
//! solver:
//!   tolerance: 1.0e-8
//!   maximal_iterations: 50
//! desired_delta_x: 1000.0
//! seed: 42
//! ```
//!
//! Missing sections and fields take their defaults.

use std::path::Path;

use gp_components::Pipe;
use gp_solver::NewtonConfig;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub time: TimeConfig,
    pub solver: SolverConfig,
    /// Spacing pipes are discretized with, in meters.
    pub desired_delta_x: f64,
    /// Seed of the stochastic loads.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            time: TimeConfig::default(),
            solver: SolverConfig::default(),
            desired_delta_x: 1000.0,
            seed: 0,
        }
    }
}

/// Simulated interval in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    pub start: f64,
    pub end: f64,
    pub desired_delta_t: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 3600.0,
            desired_delta_t: 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub tolerance: f64,
    pub maximal_iterations: usize,
    pub minimal_stepsize: f64,
    /// Refactor the Jacobian at every Newton iteration instead of reusing the
    /// first factorization of a solve.
    pub use_full_jacobian: bool,
    /// Rebuild the Jacobian pattern from triplets at every time step.
    pub rebuild_jacobian_every_step: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let newton = NewtonConfig::default();
        Self {
            tolerance: newton.tolerance,
            maximal_iterations: newton.maximal_iterations,
            minimal_stepsize: newton.minimal_stepsize,
            use_full_jacobian: true,
            rebuild_jacobian_every_step: false,
        }
    }
}

impl SolverConfig {
    pub fn newton_config(&self) -> NewtonConfig {
        NewtonConfig {
            tolerance: self.tolerance,
            maximal_iterations: self.maximal_iterations,
            minimal_stepsize: self.minimal_stepsize,
        }
    }
}

impl SimConfig {
    pub fn load_yaml(path: &Path) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> SimResult<Self> {
        let config: SimConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_yaml(&self, path: &Path) -> SimResult<()> {
        self.validate()?;
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// A pipe discretized with the configured `desired_delta_x`.
    pub fn pipe(&self, length: f64, diameter: f64, roughness: f64) -> SimResult<Pipe> {
        Ok(Pipe::new(length, diameter, roughness, self.desired_delta_x)?)
    }

    pub fn validate(&self) -> SimResult<()> {
        let time = &self.time;
        if !(time.start.is_finite() && time.end.is_finite()) {
            return Err(SimError::config("time.start and time.end must be finite"));
        }
        if time.end <= time.start {
            return Err(SimError::config(format!(
                "time.end ({}) must lie after time.start ({})",
                time.end, time.start
            )));
        }
        positive("time.desired_delta_t", time.desired_delta_t)?;
        positive("desired_delta_x", self.desired_delta_x)?;
        positive("solver.tolerance", self.solver.tolerance)?;
        positive("solver.minimal_stepsize", self.solver.minimal_stepsize)?;
        if self.solver.maximal_iterations == 0 {
            return Err(SimError::config("solver.maximal_iterations must be at least 1"));
        }
        Ok(())
    }
}

fn positive(field: &str, value: f64) -> SimResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SimError::config(format!("{field} must be positive, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = SimConfig::from_yaml_str(
            "time:\n  end: 7200.0\nsolver:\n  maximal_iterations: 20\nseed: 7\n",
        )
        .unwrap();
        assert_eq!(config.time.end, 7200.0);
        assert_eq!(config.time.desired_delta_t, 60.0);
        assert_eq!(config.solver.maximal_iterations, 20);
        assert_eq!(config.solver.tolerance, 1e-8);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn non_positive_steps_are_rejected() {
        let mut config = SimConfig::default();
        config.time.desired_delta_t = 0.0;
        assert!(matches!(config.validate(), Err(SimError::Config { .. })));

        let mut config = SimConfig::default();
        config.solver.tolerance = -1.0;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.time.end = config.time.start;
        assert!(config.validate().is_err());
    }

    #[test]
    fn yaml_file_round_trip() {
        let path = std::env::temp_dir().join(format!("gp-sim-config-{}.yaml", std::process::id()));
        let mut config = SimConfig::default();
        config.seed = 99;
        config.solver.use_full_jacobian = false;
        config.save_yaml(&path).unwrap();
        let loaded = SimConfig::load_yaml(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn pipes_follow_the_configured_spacing() {
        let mut config = SimConfig::default();
        config.desired_delta_x = 2_500.0;
        let pipe = config.pipe(10_000.0, 0.5, 1e-5).unwrap();
        assert_eq!(pipe.number_of_points(), 5);
        assert_eq!(pipe.delta_x(), 2_500.0);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = SimConfig::from_yaml_str("time: [1, 2").unwrap_err();
        assert!(matches!(err, SimError::Yaml(_)));
    }
}
