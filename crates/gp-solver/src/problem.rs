//! The nonlinear system the Newton solver works on.

use nalgebra::DVector;

use crate::matrix_handler::MatrixHandler;

/// Everything about a time step that stays fixed while Newton iterates.
#[derive(Debug, Clone, Copy)]
pub struct Timestep<'a> {
    pub last_time: f64,
    pub new_time: f64,
    pub last_state: &'a DVector<f64>,
}

impl Timestep<'_> {
    pub fn delta_t(&self) -> f64 {
        self.new_time - self.last_time
    }
}

/// A root-finding problem `F(new_state) = 0` for one time step.
pub trait Problem {
    /// Write `F(new_state)` into `rootvalues`.
    fn evaluate(&self, rootvalues: &mut DVector<f64>, step: &Timestep<'_>, new_state: &DVector<f64>);

    /// Push `dF/d new_state` into `jacobian`.
    fn d_evaluate_d_new_state(
        &self,
        jacobian: &mut dyn MatrixHandler,
        step: &Timestep<'_>,
        new_state: &DVector<f64>,
    );
}
