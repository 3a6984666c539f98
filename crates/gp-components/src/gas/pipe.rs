//! Gas pipe discretized with the implicit box scheme.
//!
//! A pipe of length `L` gets `N = ceil(L / desired_delta_x) + 1` equidistant
//! points. Its states are the interleaved pairs `(rho_i, q_i)` for
//! `i = 0..N`, and its rows are laid out as
//!
//! ```text
//! start            boundary row of the start node
//! start + 1 + 2i   interval i, first component   (i = 0..N-1)
//! start + 2 + 2i   interval i, second component
//! after - 1        boundary row of the end node
//! ```

use gp_core::InitialValue;
use gp_physics::{BalanceLaw, BoxStates, ImplicitBoxScheme, IsothermalEuler};
use gp_solver::MatrixHandler;
use nalgebra::{DVector, Matrix2, RowVector2, Vector2};

use crate::error::{ComponentError, ComponentResult};
use crate::gas::edge::{Direction, GasEdge};
use crate::indices::IndexRange;
use crate::traits::{Equation, Stateful, Step};

#[derive(Debug, Clone)]
pub struct Pipe {
    length: f64,
    law: IsothermalEuler,
    number_of_points: usize,
    delta_x: f64,
    indices: IndexRange,
}

impl Pipe {
    /// Length, diameter and roughness in meters.
    pub fn new(
        length: f64,
        diameter: f64,
        roughness: f64,
        desired_delta_x: f64,
    ) -> ComponentResult<Self> {
        if !(length > 0.0 && length.is_finite()) {
            return Err(ComponentError::configuration(format!(
                "pipe length must be positive, got {length}"
            )));
        }
        if !(desired_delta_x > 0.0 && desired_delta_x.is_finite()) {
            return Err(ComponentError::configuration(format!(
                "desired_delta_x must be positive, got {desired_delta_x}"
            )));
        }
        let law = IsothermalEuler::new(diameter, roughness)?;
        let number_of_points = (length / desired_delta_x).ceil() as usize + 1;
        Ok(Self {
            length,
            law,
            number_of_points,
            delta_x: length / (number_of_points - 1) as f64,
            indices: IndexRange::new("state"),
        })
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn number_of_points(&self) -> usize {
        self.number_of_points
    }

    pub fn delta_x(&self) -> f64 {
        self.delta_x
    }

    pub fn law(&self) -> &IsothermalEuler {
        &self.law
    }

    fn point(&self, state: &DVector<f64>, index: usize) -> Vector2<f64> {
        Vector2::new(state[index], state[index + 1])
    }

    fn scheme(&self, step: &Step<'_>) -> ImplicitBoxScheme {
        ImplicitBoxScheme::new(step.delta_t(), self.delta_x)
    }
}

fn add_block(jacobian: &mut dyn MatrixHandler, row: usize, col: usize, block: &Matrix2<f64>) {
    for i in 0..2 {
        for j in 0..2 {
            jacobian.add_to_coefficient(row + i, col + j, block[(i, j)]);
        }
    }
}

impl Stateful for Pipe {
    fn number_of_states(&self) -> usize {
        2 * self.number_of_points
    }

    fn state_indices(&self) -> &IndexRange {
        &self.indices
    }

    fn state_indices_mut(&mut self) -> &mut IndexRange {
        &mut self.indices
    }

    /// `initial` maps the position along the pipe, `0..=length`, to `(p [bar], q)`.
    fn set_initial_values(
        &self,
        new_state: &mut DVector<f64>,
        initial: &InitialValue<2>,
    ) -> ComponentResult<()> {
        let start = self.start_state_index();
        for i in 0..self.number_of_points {
            // Pin the last point to the exact length.
            let x = if i + 1 == self.number_of_points {
                self.length
            } else {
                i as f64 * self.delta_x
            };
            let [p, q] = initial.at(x)?;
            let state = self.law.state_from_p_qvol_bar(&Vector2::new(p, q));
            new_state[start + 2 * i] = state[0];
            new_state[start + 2 * i + 1] = state[1];
        }
        Ok(())
    }
}

impl Equation for Pipe {
    fn evaluate(&self, rootvalues: &mut DVector<f64>, step: &Step<'_>) {
        let scheme = self.scheme(step);
        let start = self.start_state_index();
        for i in 0..self.number_of_points - 1 {
            let left = start + 2 * i;
            let states = BoxStates {
                last_left: self.point(step.last_state, left),
                last_right: self.point(step.last_state, left + 2),
                new_left: self.point(step.new_state, left),
                new_right: self.point(step.new_state, left + 2),
            };
            let residual = scheme.evaluate_point(&self.law, &states);
            rootvalues[left + 1] = residual[0];
            rootvalues[left + 2] = residual[1];
        }
    }

    fn d_evaluate_d_new_state(&self, jacobian: &mut dyn MatrixHandler, step: &Step<'_>) {
        let scheme = self.scheme(step);
        let start = self.start_state_index();
        for i in 0..self.number_of_points - 1 {
            let left = start + 2 * i;
            let right = left + 2;
            let d_left =
                scheme.devaluate_point_dnew_left(&self.law, &self.point(step.new_state, left));
            let d_right =
                scheme.devaluate_point_dnew_right(&self.law, &self.point(step.new_state, right));
            add_block(jacobian, left + 1, left, &d_left);
            add_block(jacobian, left + 1, right, &d_right);
        }
    }

    fn d_evaluate_d_last_state(&self, jacobian: &mut dyn MatrixHandler, step: &Step<'_>) {
        let d_last = self.scheme(step).devaluate_point_dlast();
        let start = self.start_state_index();
        for i in 0..self.number_of_points - 1 {
            let left = start + 2 * i;
            add_block(jacobian, left + 1, left, &d_last);
            add_block(jacobian, left + 1, left + 2, &d_last);
        }
    }
}

impl GasEdge for Pipe {
    fn boundary_equation_index(&self, direction: Direction) -> usize {
        match direction {
            Direction::Start => self.start_state_index(),
            Direction::End => self.after_state_index() - 1,
        }
    }

    fn boundary_state_index(&self, direction: Direction) -> usize {
        match direction {
            Direction::Start => self.start_state_index(),
            Direction::End => self.after_state_index() - 2,
        }
    }

    fn boundary_p_qvol_bar(&self, direction: Direction, state: &DVector<f64>) -> Vector2<f64> {
        let point = self.point(state, self.boundary_state_index(direction));
        self.law.p_qvol_bar(&point)
    }

    fn dboundary_p_qvol_dstate(
        &self,
        direction: Direction,
        jacobian: &mut dyn MatrixHandler,
        function_derivative: RowVector2<f64>,
        row: usize,
        state: &DVector<f64>,
    ) {
        let index = self.boundary_state_index(direction);
        let derivative = function_derivative * self.law.dp_qvol_bar_dstate(&self.point(state, index));
        jacobian.add_to_coefficient(row, index, derivative[0]);
        jacobian.add_to_coefficient(row, index + 1, derivative[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_count_rounds_up() {
        let pipe = Pipe::new(1000.0, 0.5, 1e-5, 300.0).unwrap();
        assert_eq!(pipe.number_of_points(), 5);
        assert_eq!(pipe.number_of_states(), 10);
        assert!((pipe.delta_x() - 250.0).abs() < 1e-12);
    }

    #[test]
    fn exact_spacing_adds_one_point() {
        let pipe = Pipe::new(1000.0, 0.5, 1e-5, 100.0).unwrap();
        assert_eq!(pipe.number_of_points(), 11);
        assert_eq!(pipe.number_of_states(), 22);
    }

    #[test]
    fn boundary_rows_bracket_interior_rows() {
        let mut pipe = Pipe::new(1000.0, 0.5, 1e-5, 500.0).unwrap();
        assert_eq!(pipe.set_indices(7), 13);
        assert_eq!(pipe.boundary_equation_index(Direction::Start), 7);
        assert_eq!(pipe.boundary_equation_index(Direction::End), 12);
        assert_eq!(pipe.boundary_state_index(Direction::End), 11);
    }

    #[test]
    fn rejects_bad_geometry() {
        assert!(matches!(
            Pipe::new(-1.0, 0.5, 1e-5, 100.0),
            Err(ComponentError::Configuration { .. })
        ));
        assert!(matches!(
            Pipe::new(100.0, 0.0, 1e-5, 10.0),
            Err(ComponentError::Physics(_))
        ));
        assert!(Pipe::new(100.0, 0.5, 1e-5, 0.0).is_err());
    }

    #[test]
    fn initial_profile_is_interpolated_along_the_pipe() {
        let mut pipe = Pipe::new(1000.0, 0.5, 1e-5, 500.0).unwrap();
        pipe.set_indices(0);
        let initial = InitialValue::new([(0.0, [60.0, 10.0]), (1000.0, [50.0, 10.0])]).unwrap();
        let mut state = DVector::zeros(6);
        pipe.set_initial_values(&mut state, &initial).unwrap();

        let middle = pipe.law().p_qvol_bar(&Vector2::new(state[2], state[3]));
        assert!((middle[0] - 55.0).abs() < 1e-9);
        assert!((middle[1] - 10.0).abs() < 1e-9);
    }
}
