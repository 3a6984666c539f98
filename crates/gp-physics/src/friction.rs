//! Darcy friction factor for pipe flow.
//!
//! Three regimes, chosen by Reynolds number:
//! - laminar (`Re < 2000`): `64 / Re`
//! - transitional (`2000 <= Re <= 4000`): a cubic spline that matches value and
//!   slope of both neighbouring regimes at the borders
//! - turbulent (`Re > 4000`): the explicit Swamee-Jain approximation
//!
//! The laminar branch is handled by the caller in closed form (it is linear in
//! the flow), so `lambda_non_laminar` only covers the two upper regimes.

use nalgebra::{Matrix4, Vector4};

/// Reynolds number below which flow is laminar.
pub const LAMINAR_BORDER: f64 = 2000.0;
/// Reynolds number above which flow is fully turbulent.
pub const TURBULENT_BORDER: f64 = 4000.0;

/// Friction model for one pipe geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Friction {
    diameter: f64,
    roughness: f64,
    /// Cubic coefficients `[a3, a2, a1, a0]` of the transitional spline.
    spline: [f64; 4],
}

impl Friction {
    pub fn new(diameter: f64, roughness: f64) -> Self {
        let spline = transition_coefficients(diameter, roughness);
        Self {
            diameter,
            roughness,
            spline,
        }
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    pub fn roughness(&self) -> f64 {
        self.roughness
    }

    /// Friction factor for `Re >= 2000`.
    pub fn lambda_non_laminar(&self, re: f64) -> f64 {
        debug_assert!(
            re >= LAMINAR_BORDER * (1.0 - 1e-12),
            "non-laminar friction queried at Re = {re}"
        );
        if re > TURBULENT_BORDER {
            swamee_jain(re, self.diameter, self.roughness)
        } else {
            let [a3, a2, a1, a0] = self.spline;
            ((a3 * re + a2) * re + a1) * re + a0
        }
    }

    pub fn dlambda_non_laminar_dre(&self, re: f64) -> f64 {
        debug_assert!(
            re >= LAMINAR_BORDER * (1.0 - 1e-12),
            "non-laminar friction queried at Re = {re}"
        );
        if re > TURBULENT_BORDER {
            dswamee_jain_dre(re, self.diameter, self.roughness)
        } else {
            let [a3, a2, a1, _] = self.spline;
            (3.0 * a3 * re + 2.0 * a2) * re + a1
        }
    }

    /// Friction factor over all regimes, laminar included.
    pub fn lambda(&self, re: f64) -> f64 {
        if re < LAMINAR_BORDER {
            64.0 / re
        } else {
            self.lambda_non_laminar(re)
        }
    }

    /// Implicit Colebrook-White friction factor for turbulent flow.
    pub fn colebrook(&self, re: f64) -> f64 {
        colebrook(re, self.diameter, self.roughness)
    }
}

/// Swamee-Jain approximation of the Colebrook equation.
pub fn swamee_jain(re: f64, diameter: f64, roughness: f64) -> f64 {
    let aux = (roughness / (3.7 * diameter) + 5.74 / re.powf(0.9)).log10();
    0.25 / (aux * aux)
}

pub fn dswamee_jain_dre(re: f64, diameter: f64, roughness: f64) -> f64 {
    let x = re.powf(0.9);
    let a = roughness / (3.7 * diameter) + 5.74 / x;
    let aux = a.log10();
    let daux_dre = 1.0 / std::f64::consts::LN_10 / a * (-5.74 / (x * x)) * 0.9 * x / re;
    -0.5 / (aux * aux * aux) * daux_dre
}

/// Colebrook-White, solved for `1/sqrt(lambda)` by Newton's method.
pub fn colebrook(re: f64, diameter: f64, roughness: f64) -> f64 {
    let mut mu = 1.0 / swamee_jain(re, diameter, roughness).sqrt();
    for _ in 0..10 {
        let inner = 2.51 / re * mu + roughness / (3.71 * diameter);
        let f = mu + 2.0 * inner.log10();
        if f.abs() < 1e-12 {
            break;
        }
        let df = 1.0 + 2.0 / std::f64::consts::LN_10 * (2.51 / re) / inner;
        mu -= f / df;
    }
    1.0 / (mu * mu)
}

/// Solve for the cubic that joins `64/Re` at the laminar border with
/// Swamee-Jain at the turbulent border, matching values and slopes.
fn transition_coefficients(diameter: f64, roughness: f64) -> [f64; 4] {
    let a = LAMINAR_BORDER;
    let b = TURBULENT_BORDER;
    #[rustfmt::skip]
    let system = Matrix4::new(
        a * a * a,       a * a,     a,   1.0,
        3.0 * a * a,     2.0 * a,   1.0, 0.0,
        b * b * b,       b * b,     b,   1.0,
        3.0 * b * b,     2.0 * b,   1.0, 0.0,
    );
    let constraints = Vector4::new(
        64.0 / a,
        -64.0 / (a * a),
        swamee_jain(b, diameter, roughness),
        dswamee_jain_dre(b, diameter, roughness),
    );
    // The system only depends on the two borders and is regular.
    match system.lu().solve(&constraints) {
        Some(c) => [c[0], c[1], c[2], c[3]],
        None => unreachable!("spline system at fixed borders is singular"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fd<F: Fn(f64) -> f64>(f: F, x: f64) -> f64 {
        let h = 1e-6 * x;
        (f(x + h) - f(x - h)) / (2.0 * h)
    }

    #[test]
    fn spline_meets_laminar_branch() {
        let friction = Friction::new(0.5, 1e-5);
        let a = LAMINAR_BORDER;
        let laminar = 64.0 / a;
        assert!((friction.lambda_non_laminar(a) - laminar).abs() < 1e-12);
        assert!((friction.dlambda_non_laminar_dre(a) + 64.0 / (a * a)).abs() < 1e-14);
    }

    #[test]
    fn spline_meets_turbulent_branch() {
        let friction = Friction::new(0.5, 1e-5);
        let b = TURBULENT_BORDER;
        let below = friction.lambda_non_laminar(b);
        let above = friction.lambda_non_laminar(b * (1.0 + 1e-12));
        assert!((below - above).abs() < 1e-10);
        let slope_below = friction.dlambda_non_laminar_dre(b);
        let slope_above = dswamee_jain_dre(b, 0.5, 1e-5);
        assert!((slope_below - slope_above).abs() < 1e-12);
    }

    #[test]
    fn swamee_jain_derivative_matches_differences() {
        for re in [4.5e3, 1e4, 1e5, 1e7] {
            let exact = dswamee_jain_dre(re, 1.0, 1e-5);
            let approx = fd(|r| swamee_jain(r, 1.0, 1e-5), re);
            assert!(
                (exact - approx).abs() < 1e-6 * exact.abs(),
                "Re = {re}: {exact} vs {approx}"
            );
        }
    }

    #[test]
    fn spline_derivative_matches_differences() {
        let friction = Friction::new(0.8, 2e-5);
        for re in [2500.0, 3000.0, 3900.0] {
            let exact = friction.dlambda_non_laminar_dre(re);
            let approx = fd(|r| friction.lambda_non_laminar(r), re);
            assert!((exact - approx).abs() < 1e-6 * exact.abs().max(1e-6));
        }
    }

    #[test]
    fn swamee_jain_tracks_colebrook() {
        for (d, k) in [(1.0, 1e-5), (0.5, 1e-4), (0.2, 5e-5)] {
            let friction = Friction::new(d, k);
            for re in [4e3, 1e4, 1e5, 1e6, 1e7] {
                let sj = swamee_jain(re, d, k);
                let cw = friction.colebrook(re);
                assert!((sj / cw - 1.0).abs() < 0.02, "d = {d}, Re = {re}");
            }
        }
    }

    #[test]
    fn lambda_is_continuous_across_regimes() {
        let friction = Friction::new(0.5, 1e-5);
        let eps = 1e-9;
        for border in [LAMINAR_BORDER, TURBULENT_BORDER] {
            let low = friction.lambda(border * (1.0 - eps));
            let high = friction.lambda(border * (1.0 + eps));
            assert!((low - high).abs() < 1e-8 * low);
        }
    }
}
