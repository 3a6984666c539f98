//! Transmission lines between buses.

use gp_core::InitialValue;
use nalgebra::DVector;

use crate::error::ComponentResult;
use crate::indices::IndexRange;
use crate::traits::Stateful;

/// A line with admittance `G + iB`. It has no states of its own; the buses
/// at both ends read its admittance when they compute their power.
#[derive(Debug, Clone)]
pub struct TransmissionLine {
    g: f64,
    b: f64,
    indices: IndexRange,
}

impl TransmissionLine {
    pub fn new(g: f64, b: f64) -> Self {
        Self {
            g,
            b,
            indices: IndexRange::new("state"),
        }
    }

    pub fn g(&self) -> f64 {
        self.g
    }

    pub fn b(&self) -> f64 {
        self.b
    }
}

impl Stateful for TransmissionLine {
    fn number_of_states(&self) -> usize {
        0
    }

    fn state_indices(&self) -> &IndexRange {
        &self.indices
    }

    fn state_indices_mut(&mut self) -> &mut IndexRange {
        &mut self.indices
    }

    fn set_initial_values(&self, _: &mut DVector<f64>, _: &InitialValue<2>) -> ComponentResult<()> {
        Ok(())
    }
}
