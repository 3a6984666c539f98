//! Ornstein-Uhlenbeck processes for fluctuating loads.
//!
//! A load follows `dX = theta (mu - X) dt + mu sigma dW`. One outer time
//! step is covered by several Euler-Maruyama substeps.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{ComponentError, ComponentResult};

/// Relative band around the mean that a sampled value is clamped to.
pub const CLAMP_BAND: f64 = 0.43;

/// Number of Euler-Maruyama substeps on `delta_t` that keeps the
/// deterministic part stable.
///
/// With `h = delta_t / n`, explicit Euler on `x' = -theta x` needs
/// `|1 - theta h| <= 1`. If `n` substeps violate that, the count is raised to
/// `ceil(theta delta_t / a) + 1`, so that `theta h < a < 2`.
pub fn stable_number_of_oup_steps(
    stability_parameter: f64,
    theta: f64,
    delta_t: f64,
    number_of_stochastic_steps: usize,
) -> ComponentResult<usize> {
    if !(stability_parameter > 0.0 && stability_parameter < 2.0) {
        return Err(ComponentError::configuration(format!(
            "the stability parameter must satisfy 0 < a < 2, got {stability_parameter}"
        )));
    }
    if number_of_stochastic_steps == 0 {
        return Err(ComponentError::configuration(
            "at least one stochastic step per time step is required",
        ));
    }
    let stepsize = delta_t / number_of_stochastic_steps as f64;
    if 1.0 - theta * stepsize < -1.0 {
        return Ok((theta * delta_t / stability_parameter).ceil() as usize + 1);
    }
    Ok(number_of_stochastic_steps)
}

/// Advance a relative Ornstein-Uhlenbeck process by `delta_t`.
///
/// The noise scales with the mean `mu`. The result is clamped to
/// `(1 ± CLAMP_BAND) mu`.
pub fn euler_maruyama_oup_relative<R: Rng + ?Sized>(
    last_value: f64,
    theta: f64,
    mu: f64,
    delta_t: f64,
    sigma: f64,
    rng: &mut R,
    number_of_stochastic_steps: usize,
) -> f64 {
    let stepsize = delta_t / number_of_stochastic_steps as f64;
    let noise_scale = stepsize.sqrt();
    let mut value = last_value;
    for _ in 0..number_of_stochastic_steps {
        let z: f64 = rng.sample(StandardNormal);
        value += theta * (mu - value) * stepsize + mu * sigma * noise_scale * z;
    }

    let sign = if mu > 0.0 {
        1.0
    } else if mu < 0.0 {
        -1.0
    } else {
        0.0
    };
    if sign * value < (1.0 - CLAMP_BAND) * sign * mu {
        (1.0 - CLAMP_BAND) * mu
    } else if sign * value > (1.0 + CLAMP_BAND) * sign * mu {
        (1.0 + CLAMP_BAND) * mu
    } else {
        value
    }
}
