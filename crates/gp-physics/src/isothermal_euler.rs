//! Isothermal Euler equations for gas pipes.
//!
//! State is `(rho, q)`: density and volumetric flow at standard conditions.
//! Friction is linear in `q` below `Re = 2000` and quadratic above.

use gp_core::dabs_dx;
use nalgebra::{Matrix2, Vector2};

use crate::balance_law::BalanceLaw;
use crate::error::{PhysicsError, PhysicsResult};
use crate::friction::{Friction, LAMINAR_BORDER};
use crate::gas::{self, ETA, RHO_0};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsothermalEuler {
    diameter: f64,
    area: f64,
    /// `Re = coeff_re * |q|`.
    coeff_re: f64,
    friction: Friction,
}

impl IsothermalEuler {
    pub fn new(diameter: f64, roughness: f64) -> PhysicsResult<Self> {
        if !(diameter > 0.0 && diameter.is_finite()) {
            return Err(PhysicsError::NonPhysical {
                what: "pipe diameter",
                value: diameter,
            });
        }
        if !(roughness >= 0.0 && roughness.is_finite()) {
            return Err(PhysicsError::NonPhysical {
                what: "pipe roughness",
                value: roughness,
            });
        }
        let area = std::f64::consts::PI * (0.5 * diameter) * (0.5 * diameter);
        Ok(Self {
            diameter,
            area,
            coeff_re: diameter / ETA * RHO_0,
            friction: Friction::new(diameter, roughness),
        })
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn friction(&self) -> &Friction {
        &self.friction
    }

    /// Reynolds number for flow `q`.
    pub fn reynolds(&self, q: f64) -> f64 {
        self.coeff_re * q.abs()
    }

    fn friction_prefactor(&self) -> f64 {
        RHO_0 / (2.0 * self.area * self.diameter)
    }
}

impl BalanceLaw for IsothermalEuler {
    fn flux(&self, state: &Vector2<f64>) -> Vector2<f64> {
        let (rho, q) = (state[0], state[1]);
        Vector2::new(
            RHO_0 / self.area * q,
            self.area / RHO_0 * gas::p(rho) + RHO_0 / self.area * q * q / rho,
        )
    }

    fn dflux_dstate(&self, state: &Vector2<f64>) -> Matrix2<f64> {
        let (rho, q) = (state[0], state[1]);
        Matrix2::new(
            0.0,
            RHO_0 / self.area,
            self.area / RHO_0 * gas::dp_drho(rho) - RHO_0 / self.area * q * q / (rho * rho),
            2.0 * RHO_0 / self.area * q / rho,
        )
    }

    fn source(&self, state: &Vector2<f64>) -> Vector2<f64> {
        let (rho, q) = (state[0], state[1]);
        let re = self.reynolds(q);
        let pre = self.friction_prefactor();
        let momentum = if re < LAMINAR_BORDER {
            // lambda = 64 / Re cancels one power of |q|.
            -pre * 64.0 / self.coeff_re * q / rho
        } else {
            -pre * self.friction.lambda_non_laminar(re) * q.abs() * q / rho
        };
        Vector2::new(0.0, momentum)
    }

    fn dsource_dstate(&self, state: &Vector2<f64>) -> Matrix2<f64> {
        let (rho, q) = (state[0], state[1]);
        let re = self.reynolds(q);
        let pre = self.friction_prefactor();
        let (d_rho, d_q) = if re < LAMINAR_BORDER {
            let c = pre * 64.0 / self.coeff_re;
            (c * q / (rho * rho), -c / rho)
        } else {
            let lambda = self.friction.lambda_non_laminar(re);
            let dlambda_dre = self.friction.dlambda_non_laminar_dre(re);
            let sign = dabs_dx(q);
            let dre_dq = self.coeff_re * sign;
            let d_q = -pre / rho
                * (dlambda_dre * dre_dq * q.abs() * q + lambda * sign * q + lambda * q.abs());
            (pre * lambda * q.abs() * q / (rho * rho), d_q)
        };
        Matrix2::new(0.0, 0.0, d_rho, d_q)
    }

    fn p_qvol(&self, state: &Vector2<f64>) -> Vector2<f64> {
        Vector2::new(gas::p(state[0]), state[1])
    }

    fn dp_qvol_dstate(&self, state: &Vector2<f64>) -> Matrix2<f64> {
        Matrix2::new(gas::dp_drho(state[0]), 0.0, 0.0, 1.0)
    }

    fn state(&self, p_qvol: &Vector2<f64>) -> Vector2<f64> {
        Vector2::new(gas::rho(p_qvol[0]), p_qvol[1])
    }

    fn dstate_dp_qvol(&self, p_qvol: &Vector2<f64>) -> Matrix2<f64> {
        Matrix2::new(gas::drho_dp(p_qvol[0]), 0.0, 0.0, 1.0)
    }
}
