//! Error types for building and preparing networks.

use gp_core::ValueMapError;
use gp_graph::GraphError;
use gp_physics::PhysicsError;
use thiserror::Error;

/// Errors raised while a network problem is assembled or a time step is
/// prepared.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    /// The network cannot be simulated as described.
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    #[error("Value lookup failed: {0}")]
    ValueMap(#[from] ValueMapError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl ComponentError {
    pub(crate) fn configuration(what: impl Into<String>) -> Self {
        ComponentError::Configuration { what: what.into() }
    }
}
