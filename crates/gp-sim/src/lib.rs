//! Transient simulation of gas and power networks.
//!
//! Provides:
//! - [`Timedata`]: the equidistant time grid of a run
//! - [`TimeEvolver`]: one implicit Newton solve per time step
//! - [`SimConfig`]: YAML run configuration
//!
//! A run aborts on the first step that fails to converge.

pub mod config;
pub mod error;
pub mod evolver;
pub mod timedata;

// Re-exports for public API
pub use config::{SimConfig, SolverConfig, TimeConfig};
pub use error::{SimError, SimResult};
pub use evolver::{SimRecord, TimeEvolver, run_simulation};
pub use timedata::Timedata;
