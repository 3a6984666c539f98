//! Error types for simulation runs.

use gp_components::ComponentError;
use gp_solver::SolverError;
use thiserror::Error;

/// Errors that abort a simulation run.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Invalid configuration: {what}")]
    Config { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    #[error(
        "Newton solver did not converge at t = {time}: residual {residual:e} after {iterations} iterations"
    )]
    NotConverged {
        time: f64,
        residual: f64,
        iterations: usize,
    },
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub(crate) fn config(what: impl Into<String>) -> Self {
        SimError::Config { what: what.into() }
    }
}
