//! Damped, affine-invariant Newton solver.
//!
//! Follows the global Newton method of Deuflhard and Hohmann: a trial step
//! `x + lambda * dx` is accepted once the simplified Newton correction at the
//! trial point, computed with the same factorization, is small enough
//! relative to `dx`. Otherwise `lambda` is halved.

use nalgebra::DVector;
use nalgebra_sparse::CscMatrix;
use tracing::{debug, warn};

use crate::error::{SolverError, SolverResult};
use crate::factorization::SparseLu;
use crate::matrix_handler::{InPlaceHandler, MatrixHandler, TripletHandler};
use crate::problem::{Problem, Timestep};

/// Newton solver configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonConfig {
    /// Residual norm below which the state is accepted
    pub tolerance: f64,
    /// Maximum Newton iterations per solve
    pub maximal_iterations: usize,
    /// Smallest damping factor before the solve is abandoned
    pub minimal_stepsize: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            maximal_iterations: 50,
            minimal_stepsize: 1e-10,
        }
    }
}

/// Per-call knobs of [`NewtonSolver::solve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveOptions {
    /// Rebuild the Jacobian from triplets because its pattern may have changed.
    pub new_jacobian_structure: bool,
    /// Recompute and refactor the Jacobian at every iteration. Otherwise the
    /// first factorization is reused (simplified Newton).
    pub use_full_jacobian: bool,
}

/// What a solve achieved. Running out of iterations is reported here, not
/// raised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonOutcome {
    pub success: bool,
    pub residual: f64,
    pub used_iterations: usize,
}

/// Keeps the Jacobian and its factorization alive between solves so the
/// sparsity analysis is only redone when the pattern changes.
#[derive(Debug, Default)]
pub struct NewtonSolver {
    config: NewtonConfig,
    jacobian: Option<CscMatrix<f64>>,
    lu: SparseLu,
}

impl NewtonSolver {
    pub fn new(config: NewtonConfig) -> Self {
        Self {
            config,
            jacobian: None,
            lu: SparseLu::new(),
        }
    }

    pub fn config(&self) -> &NewtonConfig {
        &self.config
    }

    /// The last assembled Jacobian.
    pub fn jacobian(&self) -> Option<&CscMatrix<f64>> {
        self.jacobian.as_ref()
    }

    pub fn factorization(&self) -> &SparseLu {
        &self.lu
    }

    pub fn number_of_nonzeros(&self) -> usize {
        self.jacobian.as_ref().map_or(0, CscMatrix::nnz)
    }

    /// Assemble the Jacobian from scratch and analyze its pattern.
    pub fn evaluate_state_derivative_triplets<P: Problem + ?Sized>(
        &mut self,
        problem: &P,
        step: &Timestep<'_>,
        new_state: &DVector<f64>,
    ) -> SolverResult<()> {
        let n = new_state.len();
        let mut handler = TripletHandler::new(n, n);
        problem.d_evaluate_d_new_state(&mut handler, step, new_state);
        handler.finalize()?;
        let matrix = handler.into_matrix();
        self.lu.analyze_pattern(&matrix)?;
        self.jacobian = Some(matrix);
        Ok(())
    }

    /// Refresh the Jacobian values, keeping the stored pattern.
    ///
    /// Falls back to a triplet rebuild if there is no stored matrix of the
    /// right size or if a contribution lands outside the pattern.
    pub fn evaluate_state_derivative_in_place<P: Problem + ?Sized>(
        &mut self,
        problem: &P,
        step: &Timestep<'_>,
        new_state: &DVector<f64>,
    ) -> SolverResult<()> {
        let n = new_state.len();
        let result = match self.jacobian.as_mut() {
            Some(matrix) if matrix.nrows() == n => {
                let mut handler = InPlaceHandler::new(matrix);
                problem.d_evaluate_d_new_state(&mut handler, step, new_state);
                handler.finalize()
            }
            _ => return self.evaluate_state_derivative_triplets(problem, step, new_state),
        };
        match result {
            Err(SolverError::PatternChanged { row, col }) => {
                warn!(
                    "Jacobian entry ({row}, {col}) is outside the stored pattern at t = {}, rebuilding",
                    step.new_time
                );
                self.evaluate_state_derivative_triplets(problem, step, new_state)
            }
            other => other,
        }
    }

    /// Drive `new_state` towards `F(new_state) = 0`.
    ///
    /// Fails with [`SolverError::NumericalProblem`] if the Jacobian cannot be
    /// factored or the damping factor drops below the configured minimum.
    pub fn solve<P: Problem + ?Sized>(
        &mut self,
        new_state: &mut DVector<f64>,
        problem: &P,
        step: &Timestep<'_>,
        options: SolveOptions,
    ) -> SolverResult<NewtonOutcome> {
        let n = new_state.len();
        if step.last_state.len() != n {
            return Err(SolverError::DimensionMismatch {
                what: "last state",
                expected: n,
                got: step.last_state.len(),
            });
        }

        let mut rootvalues = DVector::zeros(n);
        problem.evaluate(&mut rootvalues, step, new_state);
        let mut outcome = NewtonOutcome {
            success: false,
            residual: rootvalues.norm(),
            used_iterations: 0,
        };
        if outcome.residual <= self.config.tolerance {
            outcome.success = true;
            return Ok(outcome);
        }
        if !outcome.residual.is_finite() {
            return Err(SolverError::NumericalProblem {
                what: format!("residual is not finite at t = {}", step.new_time),
            });
        }

        if options.new_jacobian_structure {
            self.evaluate_state_derivative_triplets(problem, step, new_state)?;
        } else {
            self.evaluate_state_derivative_in_place(problem, step, new_state)?;
        }
        self.factorize()?;

        let mut candidate_values = DVector::zeros(n);
        while outcome.residual > self.config.tolerance
            && outcome.used_iterations < self.config.maximal_iterations
        {
            if options.use_full_jacobian && outcome.used_iterations > 0 {
                self.evaluate_state_derivative_in_place(problem, step, new_state)?;
                self.factorize()?;
            }

            let newton_step = -self.lu.solve(&rootvalues)?;
            let step_norm = newton_step.norm();
            if !step_norm.is_finite() {
                return Err(SolverError::NumericalProblem {
                    what: format!("Newton step is not finite at t = {}", step.new_time),
                });
            }

            let mut lambda = 1.0;
            let candidate = loop {
                let candidate = &*new_state + lambda * &newton_step;
                problem.evaluate(&mut candidate_values, step, &candidate);
                let correction = self.lu.solve(&candidate_values)?.norm();
                if correction <= (1.0 - 0.5 * lambda) * step_norm {
                    break candidate;
                }
                lambda *= 0.5;
                if lambda < self.config.minimal_stepsize {
                    return Err(SolverError::NumericalProblem {
                        what: format!(
                            "Minimal stepsize reached at t = {} after {} iterations",
                            step.new_time, outcome.used_iterations
                        ),
                    });
                }
            };

            *new_state = candidate;
            std::mem::swap(&mut rootvalues, &mut candidate_values);
            outcome.used_iterations += 1;
            outcome.residual = rootvalues.norm();
            debug!(
                "newton iteration {}: residual = {:.3e}, lambda = {}",
                outcome.used_iterations, outcome.residual, lambda
            );
        }

        outcome.success = outcome.residual <= self.config.tolerance;
        Ok(outcome)
    }

    fn factorize(&mut self) -> SolverResult<()> {
        let matrix = self
            .jacobian
            .as_ref()
            .ok_or_else(|| SolverError::NumericalProblem {
                what: "no Jacobian has been assembled".to_string(),
            })?;
        self.lu.factorize(matrix)
    }
}
