//! Gas nodes.
//!
//! A gas node owns no states. It writes its balance equations at the
//! boundary rows of the attached gas edges, one row per edge. The edges are
//! ordered with the ones starting at the node first.
//!
//! For a flow balance with edges `e_0..e_m` the rows are
//!
//! ```text
//! row(e_i)  p(e_{i+1}) - p(e_i)                 for i < m
//! row(e_m)  sum_i dir_i q(e_i) - prescribed
//! ```
//!
//! so pressures agree across the node and the net outflow matches the
//! prescribed flow. A pressure boundary writes `p(e_i) - prescribed` instead.

use gp_core::{BoundaryValue, EdgeId};
use gp_solver::MatrixHandler;
use nalgebra::{DVector, RowVector2, Vector2};

use crate::component::gas_edge;
use crate::error::ComponentResult;
use crate::gas::edge::{Direction, GasEdge};
use crate::indices::IndexRange;
use crate::traits::{Constrainable, Equation, Step};

/// An edge as seen from a node, with the end of the edge the node sits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachedEdge {
    pub edge: EdgeId,
    pub direction: Direction,
}

#[derive(Debug, Clone)]
pub enum GasNodeKind {
    /// No external flow.
    Inner,
    /// Injects the boundary flow.
    Source(BoundaryValue<1>),
    /// Withdraws the boundary flow.
    Sink(BoundaryValue<1>),
    /// Fixes the pressure (bar) at every attached edge.
    PressureBoundary(BoundaryValue<1>),
    /// A sink whose pressure is an inequality constraint.
    ConstraintSink(BoundaryValue<1>),
}

#[derive(Debug, Clone)]
pub struct GasNode {
    kind: GasNodeKind,
    attached: Vec<AttachedEdge>,
    prescribed: f64,
    constraint_indices: IndexRange,
}

impl GasNode {
    pub fn new(kind: GasNodeKind) -> Self {
        Self {
            kind,
            attached: Vec::new(),
            prescribed: 0.0,
            constraint_indices: IndexRange::new("constraint"),
        }
    }

    pub fn inner() -> Self {
        Self::new(GasNodeKind::Inner)
    }

    pub fn source(flow: BoundaryValue<1>) -> Self {
        Self::new(GasNodeKind::Source(flow))
    }

    pub fn sink(flow: BoundaryValue<1>) -> Self {
        Self::new(GasNodeKind::Sink(flow))
    }

    pub fn pressure_boundary(pressure: BoundaryValue<1>) -> Self {
        Self::new(GasNodeKind::PressureBoundary(pressure))
    }

    pub fn constraint_sink(flow: BoundaryValue<1>) -> Self {
        Self::new(GasNodeKind::ConstraintSink(flow))
    }

    pub fn kind(&self) -> &GasNodeKind {
        &self.kind
    }

    pub fn attached_edges(&self) -> &[AttachedEdge] {
        &self.attached
    }

    /// Wire the node to its gas edges, starting edges first.
    pub fn setup(&mut self, attached: Vec<AttachedEdge>) {
        self.attached = attached;
    }

    fn is_pressure_boundary(&self) -> bool {
        matches!(self.kind, GasNodeKind::PressureBoundary(_))
    }

    fn boundaries<'n>(&self, step: &Step<'n>) -> impl Iterator<Item = (&'n dyn GasEdge, Direction)> {
        let net = step.net;
        self.attached
            .iter()
            .map(move |a| (gas_edge(net, a.edge), a.direction))
    }

    fn evaluate_flow_balance(&self, rootvalues: &mut DVector<f64>, step: &Step<'_>) {
        let values: Vec<(usize, Vector2<f64>, f64)> = self
            .boundaries(step)
            .map(|(edge, direction)| {
                (
                    edge.boundary_equation_index(direction),
                    edge.boundary_p_qvol_bar(direction, step.new_state),
                    direction.sign(),
                )
            })
            .collect();
        let Some(&(last_row, _, _)) = values.last() else {
            return;
        };
        for pair in values.windows(2) {
            rootvalues[pair[0].0] = pair[1].1[0] - pair[0].1[0];
        }
        let outflow: f64 = values.iter().map(|(_, pq, sign)| sign * pq[1]).sum();
        rootvalues[last_row] = outflow - self.prescribed;
    }

    fn d_flow_balance(&self, jacobian: &mut dyn MatrixHandler, step: &Step<'_>) {
        let rows: Vec<usize> = self
            .boundaries(step)
            .map(|(edge, direction)| edge.boundary_equation_index(direction))
            .collect();
        let Some(&last_row) = rows.last() else {
            return;
        };
        let state = step.new_state;
        for (i, (edge, direction)) in self.boundaries(step).enumerate() {
            if i > 0 {
                edge.dboundary_p_qvol_dstate(
                    direction,
                    jacobian,
                    RowVector2::new(1.0, 0.0),
                    rows[i - 1],
                    state,
                );
            }
            if i + 1 < rows.len() {
                edge.dboundary_p_qvol_dstate(
                    direction,
                    jacobian,
                    RowVector2::new(-1.0, 0.0),
                    rows[i],
                    state,
                );
            }
            edge.dboundary_p_qvol_dstate(
                direction,
                jacobian,
                RowVector2::new(0.0, direction.sign()),
                last_row,
                state,
            );
        }
    }

    fn evaluate_pressure_balance(&self, rootvalues: &mut DVector<f64>, step: &Step<'_>) {
        for (edge, direction) in self.boundaries(step) {
            let p = edge.boundary_p_qvol_bar(direction, step.new_state)[0];
            rootvalues[edge.boundary_equation_index(direction)] = p - self.prescribed;
        }
    }

    fn d_pressure_balance(&self, jacobian: &mut dyn MatrixHandler, step: &Step<'_>) {
        for (edge, direction) in self.boundaries(step) {
            let row = edge.boundary_equation_index(direction);
            edge.dboundary_p_qvol_dstate(
                direction,
                jacobian,
                RowVector2::new(1.0, 0.0),
                row,
                step.new_state,
            );
        }
    }
}

impl Equation for GasNode {
    fn evaluate(&self, rootvalues: &mut DVector<f64>, step: &Step<'_>) {
        if self.is_pressure_boundary() {
            self.evaluate_pressure_balance(rootvalues, step);
        } else {
            self.evaluate_flow_balance(rootvalues, step);
        }
    }

    fn d_evaluate_d_new_state(&self, jacobian: &mut dyn MatrixHandler, step: &Step<'_>) {
        if self.is_pressure_boundary() {
            self.d_pressure_balance(jacobian, step);
        } else {
            self.d_flow_balance(jacobian, step);
        }
    }

    fn d_evaluate_d_last_state(&self, _jacobian: &mut dyn MatrixHandler, _step: &Step<'_>) {}

    fn prepare_timestep(&mut self, _last_time: f64, new_time: f64) -> ComponentResult<()> {
        self.prescribed = match &self.kind {
            GasNodeKind::Inner => 0.0,
            GasNodeKind::Source(flow) => flow.at(new_time)?[0],
            GasNodeKind::Sink(flow) | GasNodeKind::ConstraintSink(flow) => -flow.at(new_time)?[0],
            GasNodeKind::PressureBoundary(pressure) => pressure.at(new_time)?[0],
        };
        Ok(())
    }
}

impl Constrainable for GasNode {
    fn number_of_constraints(&self) -> usize {
        match self.kind {
            GasNodeKind::ConstraintSink(_) => 1,
            _ => 0,
        }
    }

    fn constraint_indices(&self) -> &IndexRange {
        &self.constraint_indices
    }

    fn constraint_indices_mut(&mut self) -> &mut IndexRange {
        &mut self.constraint_indices
    }

    /// Pressure (bar) at the first attached edge.
    fn evaluate_constraint(&self, constraints: &mut DVector<f64>, step: &Step<'_>) {
        if self.number_of_constraints() == 0 {
            return;
        }
        if let Some((edge, direction)) = self.boundaries(step).next() {
            constraints[self.constraint_indices.start()] =
                edge.boundary_p_qvol_bar(direction, step.new_state)[0];
        }
    }

    fn d_evaluate_constraint_d_state(&self, jacobian: &mut dyn MatrixHandler, step: &Step<'_>) {
        if self.number_of_constraints() == 0 {
            return;
        }
        if let Some((edge, direction)) = self.boundaries(step).next() {
            edge.dboundary_p_qvol_dstate(
                direction,
                jacobian,
                RowVector2::new(1.0, 0.0),
                self.constraint_indices.start(),
                step.new_state,
            );
        }
    }
}
