//! What gas nodes need from the edges attached to them.

use gp_solver::MatrixHandler;
use nalgebra::{DVector, RowVector2, Vector2};

use crate::traits::Stateful;

/// Which end of an edge a node sits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Start,
    End,
}

impl Direction {
    /// `+1` at the start, `-1` at the end. Flow leaving a node through an
    /// edge starting there is positive.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Start => 1.0,
            Direction::End => -1.0,
        }
    }
}

/// A gas edge exposes pressure (bar) and flow at both ends.
///
/// Each end has one equation row that belongs to the node at that end.
/// The node writes its balance there, so every row of the global residual
/// has exactly one writer.
pub trait GasEdge: Stateful {
    fn boundary_equation_index(&self, direction: Direction) -> usize;

    /// First of the two state indices at the `direction` end.
    fn boundary_state_index(&self, direction: Direction) -> usize;

    /// `(p [bar], q)` at the `direction` end.
    fn boundary_p_qvol_bar(&self, direction: Direction, state: &DVector<f64>) -> Vector2<f64>;

    /// Add `function_derivative * d(p, q)/d(state)` to row `row`.
    fn dboundary_p_qvol_dstate(
        &self,
        direction: Direction,
        jacobian: &mut dyn MatrixHandler,
        function_derivative: RowVector2<f64>,
        row: usize,
        state: &DVector<f64>,
    );
}
