//! Implicit box scheme.
//!
//! Discretizes a [`BalanceLaw`] on one interval `[x_left, x_right]` between two
//! time levels. The residual of a pipe with `N` points is the stack of the
//! `N - 1` interval residuals.

use nalgebra::{Matrix2, Vector2};

use crate::balance_law::BalanceLaw;

/// The four states a single interval residual reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStates {
    pub last_left: Vector2<f64>,
    pub last_right: Vector2<f64>,
    pub new_left: Vector2<f64>,
    pub new_right: Vector2<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImplicitBoxScheme {
    pub delta_t: f64,
    pub delta_x: f64,
}

impl ImplicitBoxScheme {
    pub fn new(delta_t: f64, delta_x: f64) -> Self {
        Self { delta_t, delta_x }
    }

    /// Residual of one interval.
    pub fn evaluate_point<L: BalanceLaw + ?Sized>(&self, law: &L, states: &BoxStates) -> Vector2<f64> {
        let ratio = self.delta_t / self.delta_x;
        0.5 * (states.new_left + states.new_right)
            - 0.5 * (states.last_left + states.last_right)
            - ratio * (law.flux(&states.new_left) - law.flux(&states.new_right))
            - 0.5 * self.delta_t * (law.source(&states.new_left) + law.source(&states.new_right))
    }

    pub fn devaluate_point_dnew_left<L: BalanceLaw + ?Sized>(
        &self,
        law: &L,
        new_left: &Vector2<f64>,
    ) -> Matrix2<f64> {
        let ratio = self.delta_t / self.delta_x;
        0.5 * Matrix2::identity()
            - ratio * law.dflux_dstate(new_left)
            - 0.5 * self.delta_t * law.dsource_dstate(new_left)
    }

    pub fn devaluate_point_dnew_right<L: BalanceLaw + ?Sized>(
        &self,
        law: &L,
        new_right: &Vector2<f64>,
    ) -> Matrix2<f64> {
        let ratio = self.delta_t / self.delta_x;
        0.5 * Matrix2::identity() + ratio * law.dflux_dstate(new_right)
            - 0.5 * self.delta_t * law.dsource_dstate(new_right)
    }

    /// Derivative with respect to either last state. The scheme is linear in them.
    pub fn devaluate_point_dlast(&self) -> Matrix2<f64> {
        -0.5 * Matrix2::identity()
    }
}
