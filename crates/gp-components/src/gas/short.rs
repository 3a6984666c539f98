//! Gas edges without spatial extent: short pipes and control valves.
//! Compressor stations share the layout, see [`crate::gas::compressor`].
//!
//! All of them hold `(p0, q0, p1, q1)` with pressure in bar, and own the two rows
//! between the node rows at `start` and `start + 3`.

use gp_core::{ControlValue, InitialValue};
use gp_solver::MatrixHandler;
use nalgebra::{DVector, RowVector2, Vector2};

use crate::error::ComponentResult;
use crate::gas::edge::{Direction, GasEdge};
use crate::indices::IndexRange;
use crate::traits::{Controllable, Equation, Stateful, Step};

/// State layout shared by the short edges.
#[derive(Debug, Clone)]
pub(crate) struct ShortSegment {
    pub(crate) indices: IndexRange,
}

impl ShortSegment {
    pub(crate) fn new() -> Self {
        Self {
            indices: IndexRange::new("state"),
        }
    }

    pub(crate) fn start(&self) -> usize {
        self.indices.start()
    }

    /// Pressure drop and flow mismatch across the segment.
    pub(crate) fn evaluate(
        &self,
        rootvalues: &mut DVector<f64>,
        state: &DVector<f64>,
        pressure_drop: f64,
    ) {
        let start = self.start();
        rootvalues[start + 1] = state[start] - state[start + 2] - pressure_drop;
        rootvalues[start + 2] = state[start + 1] - state[start + 3];
    }

    pub(crate) fn d_evaluate_d_new_state(&self, jacobian: &mut dyn MatrixHandler) {
        let start = self.start();
        jacobian.add_to_coefficient(start + 1, start, 1.0);
        jacobian.add_to_coefficient(start + 1, start + 2, -1.0);
        jacobian.add_to_coefficient(start + 2, start + 1, 1.0);
        jacobian.add_to_coefficient(start + 2, start + 3, -1.0);
    }

    /// The start end takes the first sample, the end takes the last one.
    pub(crate) fn set_initial_values(
        &self,
        new_state: &mut DVector<f64>,
        initial: &InitialValue<2>,
    ) -> ComponentResult<()> {
        let start = self.start();
        let [p0, q0] = initial.at(initial.first_argument())?;
        let [p1, q1] = initial.at(initial.last_argument())?;
        new_state[start] = p0;
        new_state[start + 1] = q0;
        new_state[start + 2] = p1;
        new_state[start + 3] = q1;
        Ok(())
    }

    pub(crate) fn boundary_equation_index(&self, direction: Direction) -> usize {
        match direction {
            Direction::Start => self.start(),
            Direction::End => self.indices.after() - 1,
        }
    }

    pub(crate) fn boundary_state_index(&self, direction: Direction) -> usize {
        match direction {
            Direction::Start => self.start(),
            Direction::End => self.indices.after() - 2,
        }
    }

    pub(crate) fn boundary_p_qvol_bar(
        &self,
        direction: Direction,
        state: &DVector<f64>,
    ) -> Vector2<f64> {
        let index = self.boundary_state_index(direction);
        Vector2::new(state[index], state[index + 1])
    }

    pub(crate) fn dboundary_p_qvol_dstate(
        &self,
        direction: Direction,
        jacobian: &mut dyn MatrixHandler,
        function_derivative: RowVector2<f64>,
        row: usize,
    ) {
        let index = self.boundary_state_index(direction);
        jacobian.add_to_coefficient(row, index, function_derivative[0]);
        jacobian.add_to_coefficient(row, index + 1, function_derivative[1]);
    }
}

/// A lossless connection: equal pressure and flow at both ends.
#[derive(Debug, Clone)]
pub struct ShortPipe {
    segment: ShortSegment,
}

impl ShortPipe {
    pub fn new() -> Self {
        Self {
            segment: ShortSegment::new(),
        }
    }
}

impl Default for ShortPipe {
    fn default() -> Self {
        Self::new()
    }
}

impl Stateful for ShortPipe {
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

impl GasEdge for ShortPipe {
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

impl Equation for ShortPipe {
    fn evaluate(&self, rootvalues: &mut DVector<f64>, step: &Step<'_>) {
        self.segment.evaluate(rootvalues, step.new_state, 0.0);
    }

    fn d_evaluate_d_new_state(&self, jacobian: &mut dyn MatrixHandler, _step: &Step<'_>) {
        self.segment.d_evaluate_d_new_state(jacobian);
    }

    fn d_evaluate_d_last_state(&self, _jacobian: &mut dyn MatrixHandler, _step: &Step<'_>) {}
}

/// A valve that drops the pressure by a controlled amount (bar).
#[derive(Debug, Clone)]
pub struct ControlValve {
    segment: ShortSegment,
    schedule: ControlValue<1>,
    control_indices: IndexRange,
}

impl ControlValve {
    pub fn new(schedule: ControlValue<1>) -> Self {
        Self {
            segment: ShortSegment::new(),
            schedule,
            control_indices: IndexRange::new("control"),
        }
    }

    fn pressure_drop(&self, controls: &DVector<f64>) -> f64 {
        controls[self.control_indices.start()]
    }
}

impl Stateful for ControlValve {
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

impl GasEdge for ControlValve {
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

impl Equation for ControlValve {
    fn evaluate(&self, rootvalues: &mut DVector<f64>, step: &Step<'_>) {
        let drop = self.pressure_drop(step.controls);
        self.segment.evaluate(rootvalues, step.new_state, drop);
    }

    fn d_evaluate_d_new_state(&self, jacobian: &mut dyn MatrixHandler, _step: &Step<'_>) {
        self.segment.d_evaluate_d_new_state(jacobian);
    }

    fn d_evaluate_d_last_state(&self, _jacobian: &mut dyn MatrixHandler, _step: &Step<'_>) {}
}

impl Controllable for ControlValve {
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
        let [drop] = self.schedule.at(time)?;
        controls[self.control_indices.start()] = drop;
        Ok(())
    }

    fn d_evaluate_d_control(&self, jacobian: &mut dyn MatrixHandler, _step: &Step<'_>) {
        jacobian.add_to_coefficient(self.segment.start() + 1, self.control_indices.start(), -1.0);
    }
}
