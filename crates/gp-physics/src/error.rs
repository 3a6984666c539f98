//! Physics parameter errors.

use thiserror::Error;

/// Result type for physics construction.
pub type PhysicsResult<T> = Result<T, PhysicsError>;

/// Errors raised while configuring a balance law.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Non-physical parameter (negative diameter, roughness, ...).
    #[error("Non-physical value for {what}: {value}")]
    NonPhysical { what: &'static str, value: f64 },
}
