//! Natural gas constants and equation of state.
//!
//! The real-gas factor is linear in pressure, `z = 1 + alpha p`, which gives
//! closed forms for both `p(rho)` and `rho(p)`. Pressures are in pascal.

/// Pascal per bar.
pub const BAR: f64 = 1e5;
/// Density at standard conditions (kg/m^3).
pub const RHO_0: f64 = 0.785;
/// Standard temperature (K).
pub const T_0: f64 = 273.15;
/// Critical temperature (K).
pub const T_CRIT: f64 = 192.0;
/// Compressibility at standard conditions.
pub const Z_0: f64 = 1.005;
/// Standard pressure (Pa).
pub const P_0: f64 = 1.01325 * BAR;
/// Critical pressure (bar).
pub const P_CRIT_BAR: f64 = 46.4;
/// Gas temperature (K).
pub const T: f64 = 283.15;
/// Pressure coefficient of the real-gas factor (1/Pa).
pub const ALPHA: f64 = (0.257 / P_CRIT_BAR - 0.533 * T_CRIT / (P_CRIT_BAR * T)) / BAR;
/// Squared speed of sound of the ideal part (m^2/s^2).
pub const C_VAC_SQUARED: f64 = P_0 * T / (Z_0 * T_0 * RHO_0);
/// Dynamic viscosity (Pa s).
pub const ETA: f64 = 1e-5;

/// Pressure (Pa) at density `rho`.
pub fn p(rho: f64) -> f64 {
    C_VAC_SQUARED * rho / (1.0 - ALPHA * C_VAC_SQUARED * rho)
}

pub fn dp_drho(rho: f64) -> f64 {
    let d = 1.0 - ALPHA * C_VAC_SQUARED * rho;
    C_VAC_SQUARED / (d * d)
}

/// Density at pressure `p` (Pa). Inverse of [`p`].
pub fn rho(p: f64) -> f64 {
    p / (C_VAC_SQUARED * (1.0 + ALPHA * p))
}

pub fn drho_dp(p: f64) -> f64 {
    let d = 1.0 + ALPHA * p;
    1.0 / (C_VAC_SQUARED * d * d)
}
