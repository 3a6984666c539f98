//! Compressor stations.
//!
//! A compressor is a short edge that raises the pressure by a controlled
//! boost `u` (bar):
//!
//! ```text
//! start + 1:  p0 - p1 + u
//! start + 2:  q0 - q1
//! ```

use gp_core::{ControlValue, InitialValue};
use gp_solver::MatrixHandler;
use nalgebra::{DVector, RowVector2, Vector2};

use crate::error::ComponentResult;
use crate::gas::edge::{Direction, GasEdge};
use crate::gas::short::ShortSegment;
use crate::indices::IndexRange;
use crate::traits::{Controllable, Equation, Stateful, Step};

#[derive(Debug, Clone)]
pub struct CompressorStation {
    segment: ShortSegment,
    schedule: ControlValue<1>,
    control_indices: IndexRange,
}

impl CompressorStation {
    /// `schedule` gives the pressure boost in bar over time.
    pub fn new(schedule: ControlValue<1>) -> Self {
        Self {
            segment: ShortSegment::new(),
            schedule,
            control_indices: IndexRange::new("control"),
        }
    }

    fn boost(&self, controls: &DVector<f64>) -> f64 {
        controls[self.control_indices.start()]
    }
}

impl Stateful for CompressorStation {
    fn number_of_states(&self) -> usize {
        4
    }

    fn state_indices(&self) -> &IndexRange {
        &self.segment.indices
    }

    fn state_indices_mut(&mut self) -> &mut IndexRange {
        &mut self.segment.indices
    }

    fn set_initial_values(
        &self,
        new_state: &mut DVector<f64>,
        initial: &InitialValue<2>,
    ) -> ComponentResult<()> {
        self.segment.set_initial_values(new_state, initial)
    }
}

impl GasEdge for CompressorStation {
    fn boundary_equation_index(&self, direction: Direction) -> usize {
        self.segment.boundary_equation_index(direction)
    }

    fn boundary_state_index(&self, direction: Direction) -> usize {
        self.segment.boundary_state_index(direction)
    }

    fn boundary_p_qvol_bar(&self, direction: Direction, state: &DVector<f64>) -> Vector2<f64> {
        self.segment.boundary_p_qvol_bar(direction, state)
    }

    fn dboundary_p_qvol_dstate(
        &self,
        direction: Direction,
        jacobian: &mut dyn MatrixHandler,
        function_derivative: RowVector2<f64>,
        row: usize,
        _state: &DVector<f64>,
    ) {
        self.segment.dboundary_p_qvol_dstate(direction, jacobian, function_derivative, row);
    }
}

impl Equation for CompressorStation {
    fn evaluate(&self, rootvalues: &mut DVector<f64>, step: &Step<'_>) {
        let boost = self.boost(step.controls);
        self.segment.evaluate(rootvalues, step.new_state, -boost);
    }

    fn d_evaluate_d_new_state(&self, jacobian: &mut dyn MatrixHandler, _step: &Step<'_>) {
        self.segment.d_evaluate_d_new_state(jacobian);
    }

    fn d_evaluate_d_last_state(&self, _jacobian: &mut dyn MatrixHandler, _step: &Step<'_>) {}
}

impl Controllable for CompressorStation {
    fn number_of_controls(&self) -> usize {
        1
    }

    fn control_indices(&self) -> &IndexRange {
        &self.control_indices
    }

    fn control_indices_mut(&mut self) -> &mut IndexRange {
        &mut self.control_indices
    }

    fn set_controls(&self, controls: &mut DVector<f64>, time: f64) -> ComponentResult<()> {
        let [boost] = self.schedule.at(time)?;
        controls[self.control_indices.start()] = boost;
        Ok(())
    }

    fn d_evaluate_d_control(&self, jacobian: &mut dyn MatrixHandler, _step: &Step<'_>) {
        jacobian.add_to_coefficient(self.segment.start() + 1, self.control_indices.start(), 1.0);
    }
}
