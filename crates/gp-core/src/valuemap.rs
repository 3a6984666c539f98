//! Time-indexed value providers.
//!
//! Boundary conditions, control schedules and initial profiles are all given
//! as sorted samples `(argument, values)`. Queries interpolate linearly
//! between neighbouring samples. Arguments outside the sampled range are an
//! error, except for a slack of [`TIME_EPSILON`] that absorbs rounding in
//! accumulated step times.

use thiserror::Error;

use crate::numeric::{Real, TIME_EPSILON};

pub type ValueMapResult<T> = Result<T, ValueMapError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueMapError {
    #[error("Value map has no samples")]
    Empty,

    #[error("Sample at {argument} has {got} values, expected {expected}")]
    WrongWidth {
        argument: Real,
        expected: usize,
        got: usize,
    },

    #[error("Two samples share the argument {argument}")]
    DuplicateArgument { argument: Real },

    #[error("Sample at {argument} is not finite")]
    NonFinite { argument: Real },

    #[error("Requested value {requested} is lower than the first valid value: {first}")]
    TooEarly { requested: Real, first: Real },

    #[error("Requested value {requested} is higher than the last valid value: {last}")]
    TooLate { requested: Real, last: Real },
}

/// One raw sample, as read from configuration data.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Sample {
    pub argument: Real,
    pub values: Vec<Real>,
}

/// Piecewise-linear map from a scalar argument (usually time) to `N` values.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMap<const N: usize> {
    arguments: Vec<Real>,
    values: Vec<[Real; N]>,
    /// A constant map answers every query.
    unbounded: bool,
}

/// Boundary values of a component, indexed by time.
pub type BoundaryValue<const N: usize> = ValueMap<N>;
/// Control schedule of a component, indexed by time.
pub type ControlValue<const N: usize> = ValueMap<N>;
/// Initial profile of a component, indexed by position (pipes) or a single point.
pub type InitialValue<const N: usize> = ValueMap<N>;

impl<const N: usize> ValueMap<N> {
    /// Build a map from samples in any order.
    pub fn new(samples: impl IntoIterator<Item = (Real, [Real; N])>) -> ValueMapResult<Self> {
        let mut samples: Vec<(Real, [Real; N])> = samples.into_iter().collect();
        if samples.is_empty() {
            return Err(ValueMapError::Empty);
        }
        for (argument, values) in &samples {
            if !argument.is_finite() || values.iter().any(|v| !v.is_finite()) {
                return Err(ValueMapError::NonFinite {
                    argument: *argument,
                });
            }
        }
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        for pair in samples.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(ValueMapError::DuplicateArgument {
                    argument: pair[0].0,
                });
            }
        }
        let (arguments, values) = samples.into_iter().unzip();
        Ok(Self {
            arguments,
            values,
            unbounded: false,
        })
    }

    /// A map returning `value` for every argument.
    pub fn constant(value: [Real; N]) -> Self {
        Self {
            arguments: vec![0.0],
            values: vec![value],
            unbounded: true,
        }
    }

    /// Build a map from raw samples, checking that each carries `N` values.
    pub fn from_samples(samples: &[Sample]) -> ValueMapResult<Self> {
        let mut typed = Vec::with_capacity(samples.len());
        for sample in samples {
            let values: [Real; N] =
                sample
                    .values
                    .as_slice()
                    .try_into()
                    .map_err(|_| ValueMapError::WrongWidth {
                        argument: sample.argument,
                        expected: N,
                        got: sample.values.len(),
                    })?;
            typed.push((sample.argument, values));
        }
        Self::new(typed)
    }

    pub fn first_argument(&self) -> Real {
        self.arguments[0]
    }

    pub fn last_argument(&self) -> Real {
        self.arguments[self.arguments.len() - 1]
    }

    /// Interpolated values at `t`.
    pub fn at(&self, t: Real) -> ValueMapResult<[Real; N]> {
        if self.unbounded {
            return Ok(self.values[0]);
        }
        let first = self.first_argument();
        let last = self.last_argument();
        if t >= last {
            if t > last + TIME_EPSILON {
                return Err(ValueMapError::TooLate { requested: t, last });
            }
            return Ok(self.values[self.values.len() - 1]);
        }
        if t <= first {
            if t < first - TIME_EPSILON {
                return Err(ValueMapError::TooEarly {
                    requested: t,
                    first,
                });
            }
            return Ok(self.values[0]);
        }

        // first < t < last, so there is a sample strictly above and one at or below.
        let next = self.arguments.partition_point(|&a| a < t);
        let previous = next - 1;
        let t_minus = self.arguments[previous];
        let t_plus = self.arguments[next];
        let weight = (t - t_minus) / (t_plus - t_minus);

        let mut out = [0.0; N];
        for (i, slot) in out.iter_mut().enumerate() {
            let low = self.values[previous][i];
            let high = self.values[next][i];
            *slot = low + weight * (high - low);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> ValueMap<2> {
        ValueMap::new([(10.0, [2.0, -1.0]), (0.0, [0.0, 1.0]), (20.0, [2.0, 0.0])]).unwrap()
    }

    #[test]
    fn interpolates_between_samples() {
        let map = ramp();
        assert_eq!(map.at(5.0).unwrap(), [1.0, 0.0]);
        assert_eq!(map.at(15.0).unwrap(), [2.0, -0.5]);
        assert_eq!(map.at(10.0).unwrap(), [2.0, -1.0]);
    }

    #[test]
    fn endpoints_are_inclusive_with_slack() {
        let map = ramp();
        assert_eq!(map.at(0.0).unwrap(), [0.0, 1.0]);
        assert_eq!(map.at(-1e-12).unwrap(), [0.0, 1.0]);
        assert_eq!(map.at(20.0 + 1e-12).unwrap(), [2.0, 0.0]);
    }

    #[test]
    fn out_of_range_distinguishes_direction() {
        let map = ramp();
        assert!(matches!(
            map.at(-1.0),
            Err(ValueMapError::TooEarly { first, .. }) if first == 0.0
        ));
        assert!(matches!(
            map.at(21.0),
            Err(ValueMapError::TooLate { last, .. }) if last == 20.0
        ));
    }

    #[test]
    fn rejects_bad_samples() {
        assert_eq!(
            ValueMap::<1>::new(std::iter::empty()).unwrap_err(),
            ValueMapError::Empty
        );
        assert!(matches!(
            ValueMap::new([(1.0, [0.0]), (1.0, [2.0])]),
            Err(ValueMapError::DuplicateArgument { .. })
        ));
        assert!(matches!(
            ValueMap::new([(0.0, [Real::NAN])]),
            Err(ValueMapError::NonFinite { .. })
        ));
    }

    #[test]
    fn raw_samples_are_width_checked() {
        let good = [
            Sample {
                argument: 0.0,
                values: vec![1.0],
            },
            Sample {
                argument: 1.0,
                values: vec![3.0],
            },
        ];
        let map = ValueMap::<1>::from_samples(&good).unwrap();
        assert_eq!(map.at(0.5).unwrap(), [2.0]);

        let bad = [Sample {
            argument: 0.0,
            values: vec![1.0, 2.0],
        }];
        assert_eq!(
            ValueMap::<1>::from_samples(&bad).unwrap_err(),
            ValueMapError::WrongWidth {
                argument: 0.0,
                expected: 1,
                got: 2
            }
        );
    }

    #[test]
    fn constant_answers_everywhere() {
        let map = ValueMap::constant([4.0]);
        assert_eq!(map.at(-1e9).unwrap(), [4.0]);
        assert_eq!(map.at(1e9).unwrap(), [4.0]);
    }

    proptest::proptest! {
        #[test]
        fn interpolation_stays_within_neighbours(t in 0.0_f64..20.0) {
            let map = ramp();
            let [a, b] = map.at(t).unwrap();
            proptest::prop_assert!((0.0..=2.0).contains(&a));
            proptest::prop_assert!((-1.0..=1.0).contains(&b));
        }
    }
}
