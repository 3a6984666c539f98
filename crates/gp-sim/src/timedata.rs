//! Time grid of a run.

use crate::config::TimeConfig;
use crate::error::{SimError, SimResult};

/// `number_of_steps` equal steps covering `[start, end]`.
///
/// The step count is `ceil((end - start) / desired_delta_t)`, so the actual
/// step never exceeds the desired one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timedata {
    start: f64,
    end: f64,
    number_of_steps: usize,
    delta_t: f64,
}

impl Timedata {
    pub fn new(start: f64, end: f64, desired_delta_t: f64) -> SimResult<Self> {
        if !(start.is_finite() && end.is_finite() && end > start) {
            return Err(SimError::InvalidArg {
                what: format!("time interval [{start}, {end}] is empty or not finite"),
            });
        }
        if !(desired_delta_t > 0.0 && desired_delta_t.is_finite()) {
            return Err(SimError::InvalidArg {
                what: format!("desired_delta_t must be positive, got {desired_delta_t}"),
            });
        }
        let number_of_steps = ((end - start) / desired_delta_t).ceil() as usize;
        Ok(Self {
            start,
            end,
            number_of_steps,
            delta_t: (end - start) / number_of_steps as f64,
        })
    }

    pub fn from_config(config: &TimeConfig) -> SimResult<Self> {
        Self::new(config.start, config.end, config.desired_delta_t)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn number_of_steps(&self) -> usize {
        self.number_of_steps
    }

    pub fn delta_t(&self) -> f64 {
        self.delta_t
    }

    /// Time after `k` steps. The last one is exactly `end`.
    pub fn time(&self, k: usize) -> f64 {
        if k >= self.number_of_steps {
            self.end
        } else {
            self.start + k as f64 * self.delta_t
        }
    }

    /// `(last_time, new_time)` of every step.
    pub fn steps(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        (1..=self.number_of_steps).map(|k| (self.time(k - 1), self.time(k)))
    }
}
