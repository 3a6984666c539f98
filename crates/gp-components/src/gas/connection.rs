//! Coupling between the gas network and the power grid.
//!
//! A gas-fired plant (or a power-to-gas unit) sits on an edge from a gas node
//! to an external powerplant bus, which holds `(V, phi)` and leaves its active
//! power free for this edge to pin down. Its states are `(p [bar], q)` at the gas side. The gas node
//! writes its balance at `start`; the connection itself requires the bus to
//! inject exactly the power generated from the gas flow:
//!
//! ```text
//! start + 1:  P(bus) - generated(q)
//! ```

use gp_core::{InitialValue, NodeId};
use gp_solver::MatrixHandler;
use nalgebra::{DVector, RowVector2, Vector2};

use crate::component::GasPowerNet;
use crate::error::ComponentResult;
use crate::gas::edge::{Direction, GasEdge};
use crate::indices::IndexRange;
use crate::power::PowerNode;
use crate::traits::{Equation, Stateful, Step};

/// Half width of the flow band in which the two efficiencies are blended.
pub const KAPPA: f64 = 60.0;

#[derive(Debug, Clone)]
pub struct GasPowerConnection {
    /// Power per unit of gas flow while burning gas.
    gas2power_q_coefficient: f64,
    /// Power per unit of gas flow while producing gas.
    power2gas_q_coefficient: f64,
    power_node: Option<NodeId>,
    indices: IndexRange,
}

impl GasPowerConnection {
    pub fn new(gas2power_q_coefficient: f64, power2gas_q_coefficient: f64) -> Self {
        Self {
            gas2power_q_coefficient,
            power2gas_q_coefficient,
            power_node: None,
            indices: IndexRange::new("state"),
        }
    }

    /// Wire the connection to the bus at its end.
    pub fn setup(&mut self, power_node: NodeId) {
        self.power_node = Some(power_node);
    }

    /// Power generated from gas flow `q`.
    ///
    /// Linear with slope `g` above `KAPPA`, slope `r` below `-KAPPA`, and a
    /// cubic blend in between that is continuously differentiable.
    pub fn generated_power(&self, q: f64) -> f64 {
        let (g, r) = (self.gas2power_q_coefficient, self.power2gas_q_coefficient);
        if q > KAPPA {
            g * q
        } else if q < -KAPPA {
            r * q
        } else {
            let rel = q / KAPPA;
            q * (0.5 * (g + r) - 0.75 * (r - g) * rel + 0.25 * (r - g) * rel.powi(3))
        }
    }

    pub fn dgenerated_power_dq(&self, q: f64) -> f64 {
        let (g, r) = (self.gas2power_q_coefficient, self.power2gas_q_coefficient);
        if q > KAPPA {
            g
        } else if q < -KAPPA {
            r
        } else {
            let rel = q / KAPPA;
            0.5 * (g + r) - 1.5 * (r - g) * rel + (r - g) * rel.powi(3)
        }
    }

    fn power_node<'n>(&self, net: &'n GasPowerNet) -> &'n PowerNode {
        let node = self
            .power_node
            .and_then(|id| net.get_node_by_id(id))
            .and_then(|node| node.payload.as_power_node());
        match node {
            Some(node) => node,
            None => panic!("gas-power connection evaluated before setup wired its power node"),
        }
    }

    fn gas_side_only(direction: Direction) {
        if direction == Direction::End {
            panic!("a gas-power connection has no gas boundary at its power end");
        }
    }
}

impl Stateful for GasPowerConnection {
    fn number_of_states(&self) -> usize {
        2
    }

    fn state_indices(&self) -> &IndexRange {
        &self.indices
    }

    fn state_indices_mut(&mut self) -> &mut IndexRange {
        &mut self.indices
    }

    /// `initial` holds `(p [bar], q)`; its first sample is used.
    fn set_initial_values(
        &self,
        new_state: &mut DVector<f64>,
        initial: &InitialValue<2>,
    ) -> ComponentResult<()> {
        let start = self.start_state_index();
        let [p, q] = initial.at(initial.first_argument())?;
        new_state[start] = p;
        new_state[start + 1] = q;
        Ok(())
    }
}

impl Equation for GasPowerConnection {
    fn evaluate(&self, rootvalues: &mut DVector<f64>, step: &Step<'_>) {
        let start = self.start_state_index();
        let q = step.new_state[start + 1];
        let bus = self.power_node(step.net);
        rootvalues[start + 1] = bus.p(step.new_state) - self.generated_power(q);
    }

    fn d_evaluate_d_new_state(&self, jacobian: &mut dyn MatrixHandler, step: &Step<'_>) {
        let start = self.start_state_index();
        let q = step.new_state[start + 1];
        jacobian.add_to_coefficient(start + 1, start + 1, -self.dgenerated_power_dq(q));
        self.power_node(step.net)
            .add_p_derivative(start + 1, jacobian, step.new_state);
    }

    fn d_evaluate_d_last_state(&self, _jacobian: &mut dyn MatrixHandler, _step: &Step<'_>) {}
}

impl GasEdge for GasPowerConnection {
    fn boundary_equation_index(&self, direction: Direction) -> usize {
        Self::gas_side_only(direction);
        self.start_state_index()
    }

    fn boundary_state_index(&self, direction: Direction) -> usize {
        Self::gas_side_only(direction);
        self.start_state_index()
    }

    fn boundary_p_qvol_bar(&self, direction: Direction, state: &DVector<f64>) -> Vector2<f64> {
        let index = self.boundary_state_index(direction);
        Vector2::new(state[index], state[index + 1])
    }

    fn dboundary_p_qvol_dstate(
        &self,
        direction: Direction,
        jacobian: &mut dyn MatrixHandler,
        function_derivative: RowVector2<f64>,
        row: usize,
        _state: &DVector<f64>,
    ) {
        let index = self.boundary_state_index(direction);
        jacobian.add_to_coefficient(row, index, function_derivative[0]);
        jacobian.add_to_coefficient(row, index + 1, function_derivative[1]);
    }
}
