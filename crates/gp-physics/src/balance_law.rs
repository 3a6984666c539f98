//! Balance law trait.

use nalgebra::{Matrix2, Vector2};

use crate::gas::BAR;

/// A one-dimensional balance law `d/dt u + d/dx f(u) = s(u)` over a
/// two-component state.
///
/// Besides flux and source, a balance law knows how to translate its state to
/// physical pressure and flow and back. The `_bar` variants express pressure
/// in bar, which is how boundary values and initial profiles are given.
pub trait BalanceLaw {
    fn flux(&self, state: &Vector2<f64>) -> Vector2<f64>;
    fn dflux_dstate(&self, state: &Vector2<f64>) -> Matrix2<f64>;

    fn source(&self, state: &Vector2<f64>) -> Vector2<f64>;
    fn dsource_dstate(&self, state: &Vector2<f64>) -> Matrix2<f64>;

    /// Pressure (Pa) and volumetric flow at `state`.
    fn p_qvol(&self, state: &Vector2<f64>) -> Vector2<f64>;
    fn dp_qvol_dstate(&self, state: &Vector2<f64>) -> Matrix2<f64>;

    /// Inverse of [`BalanceLaw::p_qvol`].
    fn state(&self, p_qvol: &Vector2<f64>) -> Vector2<f64>;
    fn dstate_dp_qvol(&self, p_qvol: &Vector2<f64>) -> Matrix2<f64>;

    fn p_qvol_bar(&self, state: &Vector2<f64>) -> Vector2<f64> {
        let mut out = self.p_qvol(state);
        out[0] /= BAR;
        out
    }

    fn dp_qvol_bar_dstate(&self, state: &Vector2<f64>) -> Matrix2<f64> {
        let mut jac = self.dp_qvol_dstate(state);
        jac[(0, 0)] /= BAR;
        jac[(0, 1)] /= BAR;
        jac
    }

    fn state_from_p_qvol_bar(&self, p_qvol_bar: &Vector2<f64>) -> Vector2<f64> {
        self.state(&Vector2::new(p_qvol_bar[0] * BAR, p_qvol_bar[1]))
    }
}
