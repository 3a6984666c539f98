//! Error types for solver operations.

use thiserror::Error;

/// Errors raised by assembly, factorization and the Newton iteration.
///
/// Running out of iterations is not an error; it is reported through
/// [`crate::NewtonOutcome::success`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Numerical problem: {what}")]
    NumericalProblem { what: String },

    #[error("Jacobian entry ({row}, {col}) is not part of the stored sparsity pattern")]
    PatternChanged { row: usize, col: usize },

    #[error("Dimension mismatch in {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
}

pub type SolverResult<T> = Result<T, SolverError>;
