/// Floating point type used throughout the system.
pub type Real = f64;

/// Slack allowed when a time query lands just outside a sampled range.
pub const TIME_EPSILON: Real = 1e-10;

/// Derivative of `|x|`, taking 0 at the kink.
pub fn dabs_dx(x: Real) -> Real {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
