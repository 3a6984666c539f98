//! Newton solver on small closed-form systems.

use gp_solver::jacobian::{assembled_jacobian, problem_difference_jacobian};
use gp_solver::{
    MatrixHandler, NewtonConfig, NewtonSolver, Problem, SolveOptions, SolverError, Timestep,
};
use nalgebra::{DMatrix, DVector, Matrix2, Vector2};

/// `F(x) = A x + b` with `A = [[2, 1], [0, 3]]`, `b = (1, 0)`. Root at `(-0.5, 0)`.
struct Linear;

impl Problem for Linear {
    fn evaluate(&self, rootvalues: &mut DVector<f64>, _: &Timestep<'_>, x: &DVector<f64>) {
        let a = Matrix2::new(2.0, 1.0, 0.0, 3.0);
        let y = a * Vector2::new(x[0], x[1]) + Vector2::new(1.0, 0.0);
        rootvalues.copy_from_slice(y.as_slice());
    }

    fn d_evaluate_d_new_state(
        &self,
        jacobian: &mut dyn MatrixHandler,
        _: &Timestep<'_>,
        _: &DVector<f64>,
    ) {
        jacobian.add_to_coefficient(0, 0, 2.0);
        jacobian.add_to_coefficient(0, 1, 1.0);
        jacobian.add_to_coefficient(1, 1, 3.0);
    }
}

/// `F(x) = A (x * x) + b` with `A = [[1, 1], [0, 1]]`, `b = (9, 0)`. No real root.
struct Squares;

impl Problem for Squares {
    fn evaluate(&self, rootvalues: &mut DVector<f64>, _: &Timestep<'_>, x: &DVector<f64>) {
        rootvalues[0] = x[0] * x[0] + x[1] * x[1] + 9.0;
        rootvalues[1] = x[1] * x[1];
    }

    fn d_evaluate_d_new_state(
        &self,
        jacobian: &mut dyn MatrixHandler,
        _: &Timestep<'_>,
        x: &DVector<f64>,
    ) {
        jacobian.add_to_coefficient(0, 0, 2.0 * x[0]);
        jacobian.add_to_coefficient(0, 1, 2.0 * x[1]);
        jacobian.add_to_coefficient(1, 1, 2.0 * x[1]);
    }
}

/// `x0 = 1` and `x1 = 2 + c x0^2`. The `(1, 0)` entry only exists while the
/// coupling `c` is on.
struct Coupled {
    coupling: Option<f64>,
}

impl Problem for Coupled {
    fn evaluate(&self, rootvalues: &mut DVector<f64>, _: &Timestep<'_>, x: &DVector<f64>) {
        let c = self.coupling.unwrap_or(0.0);
        rootvalues[0] = x[0] - 1.0;
        rootvalues[1] = x[1] - 2.0 - c * x[0] * x[0];
    }

    fn d_evaluate_d_new_state(
        &self,
        jacobian: &mut dyn MatrixHandler,
        _: &Timestep<'_>,
        x: &DVector<f64>,
    ) {
        jacobian.add_to_coefficient(0, 0, 1.0);
        jacobian.add_to_coefficient(1, 1, 1.0);
        if let Some(c) = self.coupling {
            jacobian.add_to_coefficient(1, 0, -2.0 * c * x[0]);
        }
    }
}

fn solver(tolerance: f64, maximal_iterations: usize) -> NewtonSolver {
    NewtonSolver::new(NewtonConfig {
        tolerance,
        maximal_iterations,
        ..NewtonConfig::default()
    })
}

fn vector(a: f64, b: f64) -> DVector<f64> {
    DVector::from_vec(vec![a, b])
}

const FRESH: SolveOptions = SolveOptions {
    new_jacobian_structure: true,
    use_full_jacobian: false,
};

#[test]
fn linear_system_converges_in_one_iteration() {
    let last = vector(0.0, 0.0);
    let step = Timestep {
        last_time: 0.0,
        new_time: 1.0,
        last_state: &last,
    };
    for start in [vector(5.0, 3.0), vector(100.0, -7.0)] {
        let mut solver = solver(1e-12, 10_000);
        let mut x = start.clone();
        let outcome = solver.solve(&mut x, &Linear, &step, FRESH).unwrap();
        assert!(outcome.success, "from {start}");
        assert_eq!(outcome.used_iterations, 1);
        assert!((x[0] + 0.5).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);
    }
}

#[test]
fn start_at_root_needs_no_iteration() {
    let last = vector(0.0, 0.0);
    let step = Timestep {
        last_time: 0.0,
        new_time: 1.0,
        last_state: &last,
    };
    let mut solver = solver(1e-12, 10);
    let mut x = vector(-0.5, 0.0);
    let outcome = solver.solve(&mut x, &Linear, &step, FRESH).unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.used_iterations, 0);
    assert_eq!(outcome.residual, 0.0);
    // Nothing was assembled.
    assert_eq!(solver.number_of_nonzeros(), 0);
}

#[test]
fn singular_jacobian_is_a_numerical_problem() {
    let last = vector(0.0, 0.0);
    let step = Timestep {
        last_time: 0.0,
        new_time: 1.0,
        last_state: &last,
    };
    let mut solver = solver(1e-12, 100);
    let mut x = last.clone();
    let err = solver.solve(&mut x, &Squares, &step, FRESH).unwrap_err();
    assert!(matches!(err, SolverError::NumericalProblem { .. }));
    assert!(err.to_string().contains("non-invertible"));
}

#[test]
fn iteration_budget_is_reported_not_raised() {
    let last = vector(0.0, 0.0);
    let step = Timestep {
        last_time: 0.0,
        new_time: 1.0,
        last_state: &last,
    };
    let options = SolveOptions {
        new_jacobian_structure: true,
        use_full_jacobian: true,
    };
    for budget in [3, 5] {
        let mut solver = solver(1e-12, budget);
        let mut x = vector(1.0, 1.0);
        let outcome = solver.solve(&mut x, &Squares, &step, options).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.used_iterations, budget);
        assert!(outcome.residual > 9.0);
    }
}

#[test]
fn simplified_newton_runs_into_minimal_stepsize() {
    // With the first Jacobian frozen the corrector test never passes.
    let last = vector(0.0, 0.0);
    let step = Timestep {
        last_time: 0.0,
        new_time: 1.0,
        last_state: &last,
    };
    let mut solver = solver(1e-12, 100);
    let mut x = vector(1.0, 1.0);
    let err = solver.solve(&mut x, &Squares, &step, FRESH).unwrap_err();
    assert!(err.to_string().contains("Minimal stepsize"));
}

#[test]
fn jacobian_is_reused_across_solves() {
    let last = vector(0.0, 0.0);
    let step = Timestep {
        last_time: 0.0,
        new_time: 1.0,
        last_state: &last,
    };
    let mut solver = solver(1e-12, 10);
    let mut x = vector(5.0, 3.0);
    solver.solve(&mut x, &Linear, &step, FRESH).unwrap();
    assert_eq!(solver.number_of_nonzeros(), 3);

    let mut x = vector(-4.0, 2.0);
    let outcome = solver
        .solve(&mut x, &Linear, &step, SolveOptions::default())
        .unwrap();
    assert!(outcome.success);
    assert_eq!(solver.number_of_nonzeros(), 3);

    // Rebuilding an unchanged pattern keeps the symbolic factorization.
    let mut x = vector(7.0, -1.0);
    assert!(solver.solve(&mut x, &Linear, &step, FRESH).unwrap().success);
    assert_eq!(solver.factorization().number_of_analyses(), 1);
}

#[test]
fn new_jacobian_entry_forces_a_rebuild() {
    let last = vector(0.0, 0.0);
    let step = Timestep {
        last_time: 0.0,
        new_time: 1.0,
        last_state: &last,
    };
    let mut solver = solver(1e-12, 20);
    let mut problem = Coupled { coupling: None };
    let mut x = vector(5.0, 5.0);
    assert!(solver.solve(&mut x, &problem, &step, FRESH).unwrap().success);
    assert_eq!(solver.number_of_nonzeros(), 2);
    assert_eq!(solver.factorization().number_of_analyses(), 1);

    problem.coupling = Some(3.0);
    let options = SolveOptions {
        new_jacobian_structure: false,
        use_full_jacobian: true,
    };
    let outcome = solver.solve(&mut x, &problem, &step, options).unwrap();
    assert!(outcome.success, "{outcome:?}");
    assert!((x[0] - 1.0).abs() < 1e-12);
    assert!((x[1] - 5.0).abs() < 1e-10);

    let jacobian = solver.jacobian().unwrap();
    assert_eq!(jacobian.nnz(), 3);
    assert!(jacobian.get_entry(1, 0).is_some_and(|e| e.into_value() == -6.0));
    assert_eq!(solver.factorization().number_of_analyses(), 2);
}

#[test]
fn mismatched_last_state_is_rejected() {
    let last = DVector::zeros(3);
    let step = Timestep {
        last_time: 0.0,
        new_time: 1.0,
        last_state: &last,
    };
    let mut solver = solver(1e-12, 10);
    let mut x = vector(1.0, 1.0);
    assert!(matches!(
        solver.solve(&mut x, &Linear, &step, FRESH),
        Err(SolverError::DimensionMismatch { .. })
    ));
}

#[test]
fn analytic_jacobian_matches_differences() {
    let last = vector(0.0, 0.0);
    let step = Timestep {
        last_time: 0.0,
        new_time: 1.0,
        last_state: &last,
    };
    let x = vector(1.5, -0.25);
    let exact = DMatrix::from(&assembled_jacobian(&Squares, &step, &x));
    let approx = problem_difference_jacobian(&Squares, &step, &x, 1e-6);
    assert!((exact - approx).abs().max() < 1e-8);
}
