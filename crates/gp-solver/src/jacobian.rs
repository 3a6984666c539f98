//! Finite difference Jacobians, used to check hand-written derivatives.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CscMatrix;

use crate::matrix_handler::TripletHandler;
use crate::problem::{Problem, Timestep};

/// Compute a Jacobian using central finite differences.
///
/// Column `j` is `(f(x + h e_j) - f(x - h e_j)) / 2h` with
/// `h = epsilon * max(|x_j|, 1)`.
pub fn central_difference_jacobian<F>(x: &DVector<f64>, f: F, epsilon: f64) -> DMatrix<f64>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let n = x.len();
    let m = f(x).len();
    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);

        let mut x_plus = x.clone();
        x_plus[j] += dx;
        let mut x_minus = x.clone();
        x_minus[j] -= dx;

        let df = (f(&x_plus) - f(&x_minus)) / (2.0 * dx);
        jac.set_column(j, &df);
    }

    jac
}

/// Central difference Jacobian of a [`Problem`] with respect to the new state.
pub fn problem_difference_jacobian<P: Problem + ?Sized>(
    problem: &P,
    step: &Timestep<'_>,
    new_state: &DVector<f64>,
    epsilon: f64,
) -> DMatrix<f64> {
    central_difference_jacobian(
        new_state,
        |x| {
            let mut rootvalues = DVector::zeros(x.len());
            problem.evaluate(&mut rootvalues, step, x);
            rootvalues
        },
        epsilon,
    )
}

/// The analytic Jacobian of a [`Problem`], assembled from triplets.
pub fn assembled_jacobian<P: Problem + ?Sized>(
    problem: &P,
    step: &Timestep<'_>,
    new_state: &DVector<f64>,
) -> CscMatrix<f64> {
    let n = new_state.len();
    let mut handler = TripletHandler::new(n, n);
    problem.d_evaluate_d_new_state(&mut handler, step, new_state);
    handler.into_matrix()
}
