//! Sparse Newton machinery for the time-step systems of gaspower.
//!
//! A time step asks for the root of `F(new_state) = 0`, where `F` is assembled
//! from every component of a network. This crate provides:
//! - [`Problem`]: what the solver needs from such a system
//! - [`MatrixHandler`] with the triplet and in-place assembly strategies
//! - [`SparseLu`]: pattern analysis once, numeric factorization per iteration
//! - [`NewtonSolver`]: the damped, affine-invariant Newton iteration
//! - finite difference helpers for derivative tests

pub mod error;
pub mod factorization;
pub mod jacobian;
pub mod matrix_handler;
pub mod newton;
pub mod problem;

pub use error::{SolverError, SolverResult};
pub use factorization::SparseLu;
pub use matrix_handler::{InPlaceHandler, MatrixHandler, Transposed, TripletHandler};
pub use newton::{NewtonConfig, NewtonOutcome, NewtonSolver, SolveOptions};
pub use problem::{Problem, Timestep};
