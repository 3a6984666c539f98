//! The network problem: every component of a net, indexed and wired.
//!
//! Building a [`NetworkProblem`] runs in three passes:
//! 1. reserve state, control, constraint and switch indices, nodes first
//! 2. validate the topology and collect the wiring of each node
//! 3. hand the wiring to the components
//!
//! Afterwards the net is read-only apart from the per-step preparation.

use std::collections::HashMap;

use gp_core::{EdgeId, InitialValue, NodeId};
use gp_graph::GraphError;
use gp_solver::{MatrixHandler, Problem, Timestep};
use nalgebra::DVector;
use tracing::{debug, warn};

use crate::component::{EdgeComponent, GasPowerNet, NodeComponent};
use crate::error::{ComponentError, ComponentResult};
use crate::gas::{AttachedEdge, Direction, GasNodeKind};
use crate::power::{Coupling, PowerNodeKind};
use crate::traits::{Stateful, Step};

/// Initial values keyed by component name.
///
/// Pipes read `(p [bar], q)` over the position along the pipe, the other gas
/// edges read their two ends, and buses read `(V, phi)`.
pub type InitialConditions = HashMap<String, InitialValue<2>>;

#[derive(Debug, Default)]
struct Wiring {
    gas_nodes: Vec<(NodeId, Vec<AttachedEdge>)>,
    power_nodes: Vec<(NodeId, Vec<Coupling>)>,
    connections: Vec<(EdgeId, NodeId)>,
}

#[derive(Debug, Clone)]
pub struct NetworkProblem {
    net: GasPowerNet,
    number_of_states: usize,
    number_of_controls: usize,
    number_of_constraints: usize,
    number_of_switches: usize,
    controls: DVector<f64>,
    switches: DVector<f64>,
}

impl NetworkProblem {
    /// Index, validate and wire `net`.
    pub fn new(mut net: GasPowerNet) -> ComponentResult<Self> {
        let counts = reserve_indices(&mut net);
        let wiring = collect_wiring(&net)?;
        apply_wiring(&mut net, wiring);

        let (number_of_states, number_of_controls, number_of_constraints, number_of_switches) =
            counts;
        debug!(
            "network set up: {} nodes, {} edges, {} states, {} controls, {} constraints, {} switches",
            net.node_count(),
            net.edge_count(),
            number_of_states,
            number_of_controls,
            number_of_constraints,
            number_of_switches
        );

        Ok(Self {
            net,
            number_of_states,
            number_of_controls,
            number_of_constraints,
            number_of_switches,
            controls: DVector::zeros(number_of_controls),
            switches: DVector::zeros(number_of_switches),
        })
    }

    pub fn net(&self) -> &GasPowerNet {
        &self.net
    }

    pub fn number_of_states(&self) -> usize {
        self.number_of_states
    }

    pub fn number_of_controls(&self) -> usize {
        self.number_of_controls
    }

    pub fn number_of_constraints(&self) -> usize {
        self.number_of_constraints
    }

    pub fn number_of_switches(&self) -> usize {
        self.number_of_switches
    }

    /// Controls loaded by the last [`prepare_timestep`](Self::prepare_timestep).
    pub fn controls(&self) -> &DVector<f64> {
        &self.controls
    }

    pub fn switches(&self) -> &DVector<f64> {
        &self.switches
    }

    /// Load boundary values, advance stochastic loads and read the control
    /// and switch schedules at `new_time`.
    pub fn prepare_timestep(&mut self, last_time: f64, new_time: f64) -> ComponentResult<()> {
        for node in self.net.nodes_mut() {
            node.payload
                .as_equation_mut()
                .prepare_timestep(last_time, new_time)?;
        }
        for edge in self.net.edges_mut() {
            if let Some(equation) = edge.payload.as_equation_mut() {
                equation.prepare_timestep(last_time, new_time)?;
            }
        }

        for edge in self.net.edges() {
            if let Some(component) = edge.payload.as_controllable() {
                component.set_controls(&mut self.controls, new_time)?;
            }
        }
        for node in self.net.nodes() {
            if let Some(component) = node.payload.as_switchable() {
                component.set_switches(&mut self.switches, new_time)?;
            }
        }
        Ok(())
    }

    /// Write the initial state of every stateful component.
    pub fn set_initial_values(
        &self,
        new_state: &mut DVector<f64>,
        initial: &InitialConditions,
    ) -> ComponentResult<()> {
        if new_state.len() != self.number_of_states {
            return Err(ComponentError::configuration(format!(
                "the state vector has {} entries but the network has {} states",
                new_state.len(),
                self.number_of_states
            )));
        }
        let nodes = self
            .net
            .nodes()
            .filter_map(|node| Some((node.name(), node.payload.as_stateful()?)));
        let edges = self
            .net
            .edges()
            .map(|edge| (edge.name(), edge.payload.as_stateful()));
        for (name, component) in nodes.chain(edges) {
            if component.number_of_states() == 0 {
                continue;
            }
            let Some(values) = initial.get(name) else {
                return Err(ComponentError::configuration(format!(
                    "no initial value for component '{name}'"
                )));
            };
            component.set_initial_values(new_state, values)?;
        }
        Ok(())
    }

    /// Reseed every stochastic load; the `k`-th one gets `seed + k`.
    pub fn seed_stochastic(&mut self, seed: u64) {
        let loads = self.net.nodes_mut().filter_map(|node| match &mut node.payload {
            NodeComponent::Power(bus) => match bus.kind_mut() {
                PowerNodeKind::StochasticPq(load) => Some(load),
                _ => None,
            },
            NodeComponent::Gas(_) => None,
        });
        for (k, load) in loads.enumerate() {
            load.reseed(seed.wrapping_add(k as u64));
        }
    }

    fn step<'a>(&'a self, timestep: &Timestep<'a>, new_state: &'a DVector<f64>) -> Step<'a> {
        Step {
            net: &self.net,
            last_time: timestep.last_time,
            new_time: timestep.new_time,
            last_state: timestep.last_state,
            new_state,
            controls: &self.controls,
            switches: &self.switches,
        }
    }

    pub fn d_evaluate_d_last_state(
        &self,
        jacobian: &mut dyn MatrixHandler,
        timestep: &Timestep<'_>,
        new_state: &DVector<f64>,
    ) {
        let step = self.step(timestep, new_state);
        for node in self.net.nodes() {
            node.payload
                .as_equation()
                .d_evaluate_d_last_state(jacobian, &step);
        }
        for edge in self.net.edges() {
            if let Some(equation) = edge.payload.as_equation() {
                equation.d_evaluate_d_last_state(jacobian, &step);
            }
        }
    }

    /// Columns are control indices.
    pub fn d_evaluate_d_control(
        &self,
        jacobian: &mut dyn MatrixHandler,
        timestep: &Timestep<'_>,
        new_state: &DVector<f64>,
    ) {
        let step = self.step(timestep, new_state);
        for edge in self.net.edges() {
            if let Some(component) = edge.payload.as_controllable() {
                component.d_evaluate_d_control(jacobian, &step);
            }
        }
    }

    pub fn evaluate_constraints(
        &self,
        constraints: &mut DVector<f64>,
        timestep: &Timestep<'_>,
        new_state: &DVector<f64>,
    ) {
        let step = self.step(timestep, new_state);
        for node in self.net.nodes() {
            if let Some(component) = node.payload.as_constrainable() {
                component.evaluate_constraint(constraints, &step);
            }
        }
    }

    /// Rows are constraint indices.
    pub fn d_evaluate_constraints_d_state(
        &self,
        jacobian: &mut dyn MatrixHandler,
        timestep: &Timestep<'_>,
        new_state: &DVector<f64>,
    ) {
        let step = self.step(timestep, new_state);
        for node in self.net.nodes() {
            if let Some(component) = node.payload.as_constrainable() {
                component.d_evaluate_constraint_d_state(jacobian, &step);
            }
        }
    }
}

impl Problem for NetworkProblem {
    fn evaluate(
        &self,
        rootvalues: &mut DVector<f64>,
        timestep: &Timestep<'_>,
        new_state: &DVector<f64>,
    ) {
        let step = self.step(timestep, new_state);
        for node in self.net.nodes() {
            node.payload.as_equation().evaluate(rootvalues, &step);
        }
        for edge in self.net.edges() {
            if let Some(equation) = edge.payload.as_equation() {
                equation.evaluate(rootvalues, &step);
            }
        }
    }

    fn d_evaluate_d_new_state(
        &self,
        jacobian: &mut dyn MatrixHandler,
        timestep: &Timestep<'_>,
        new_state: &DVector<f64>,
    ) {
        let step = self.step(timestep, new_state);
        for node in self.net.nodes() {
            node.payload
                .as_equation()
                .d_evaluate_d_new_state(jacobian, &step);
        }
        for edge in self.net.edges() {
            if let Some(equation) = edge.payload.as_equation() {
                equation.d_evaluate_d_new_state(jacobian, &step);
            }
        }
    }
}

/// Reserve all index ranges and return the counts of states, controls,
/// constraints and switches.
fn reserve_indices(net: &mut GasPowerNet) -> (usize, usize, usize, usize) {
    let (mut states, mut controls, mut constraints, mut switches) = (0, 0, 0, 0);
    for node in net.nodes_mut() {
        let component = &mut node.payload;
        if let Some(stateful) = component.as_stateful_mut() {
            states = stateful.set_indices(states);
        }
        if let Some(constrainable) = component.as_constrainable_mut() {
            constraints = constrainable.set_constraint_indices(constraints);
        }
        if let Some(switchable) = component.as_switchable_mut() {
            switches = switchable.set_switch_indices(switches);
        }
    }
    for edge in net.edges_mut() {
        let component = &mut edge.payload;
        states = component.as_stateful_mut().set_indices(states);
        if let Some(controllable) = component.as_controllable_mut() {
            controls = controllable.set_control_indices(controls);
        }
    }
    (states, controls, constraints, switches)
}

fn node_payload(net: &GasPowerNet, id: NodeId) -> ComponentResult<&NodeComponent> {
    net.get_node_by_id(id)
        .map(|node| &node.payload)
        .ok_or_else(|| GraphError::UnknownNode { node: id }.into())
}

fn collect_wiring(net: &GasPowerNet) -> ComponentResult<Wiring> {
    let mut wiring = Wiring::default();

    for edge in net.edges() {
        let start = node_payload(net, edge.starting_node())?;
        let end = node_payload(net, edge.ending_node())?;
        let kind = edge.payload.kind_name();
        let is_gas = |node: &NodeComponent| node.as_gas_node().is_some();
        let is_power = |node: &NodeComponent| node.as_power_node().is_some();

        match &edge.payload {
            EdgeComponent::Pipe(_)
            | EdgeComponent::ShortPipe(_)
            | EdgeComponent::ControlValve(_)
            | EdgeComponent::CompressorStation(_) => {
                if !(is_gas(start) && is_gas(end)) {
                    return Err(ComponentError::configuration(format!(
                        "{kind} '{}' must connect two gas nodes",
                        edge.name()
                    )));
                }
            }
            EdgeComponent::GasPowerConnection(_) => {
                if !is_gas(start) {
                    return Err(ComponentError::configuration(format!(
                        "{kind} '{}' must start at a gas node, not a {}",
                        edge.name(),
                        start.kind_name()
                    )));
                }
                if !is_external_plant(end) {
                    return Err(ComponentError::configuration(format!(
                        "{kind} '{}' must end at an external powerplant",
                        edge.name()
                    )));
                }
                wiring.connections.push((edge.id(), edge.ending_node()));
            }
            EdgeComponent::TransmissionLine(_) => {
                if !(is_power(start) && is_power(end)) {
                    return Err(ComponentError::configuration(format!(
                        "{kind} '{}' must connect two power nodes",
                        edge.name()
                    )));
                }
            }
        }
    }

    for node in net.nodes() {
        match &node.payload {
            NodeComponent::Gas(gas) => {
                let attached = gas_attachments(net, node.starting_edges(), node.ending_edges());
                if attached.is_empty() {
                    if matches!(gas.kind(), GasNodeKind::ConstraintSink(_)) {
                        return Err(ComponentError::configuration(format!(
                            "constraint sink '{}' has no gas edge to constrain",
                            node.name()
                        )));
                    }
                    warn!("gas node '{}' has no attached gas edges", node.name());
                }
                wiring.gas_nodes.push((node.id(), attached));
            }
            NodeComponent::Power(_) => {
                let fed_by_gas = wiring.connections.iter().any(|&(_, end)| end == node.id());
                if is_external_plant(&node.payload) && !fed_by_gas {
                    return Err(ComponentError::configuration(format!(
                        "external powerplant '{}' is not fed by a gas-power connection",
                        node.name()
                    )));
                }
                let couplings =
                    power_couplings(net, node.id(), node.starting_edges(), node.ending_edges())?;
                wiring.power_nodes.push((node.id(), couplings));
            }
        }
    }
    Ok(wiring)
}

fn is_external_plant(node: &NodeComponent) -> bool {
    matches!(
        node.as_power_node().map(|bus| bus.kind()),
        Some(PowerNodeKind::ExternalPowerplant(_))
    )
}

/// Starting edges first, then ending edges. Edge validation has already
/// rejected non-gas edges at gas nodes.
fn gas_attachments(net: &GasPowerNet, starting: &[EdgeId], ending: &[EdgeId]) -> Vec<AttachedEdge> {
    let starting = starting.iter().map(|&edge| AttachedEdge {
        edge,
        direction: Direction::Start,
    });
    let ending = ending.iter().map(|&edge| AttachedEdge {
        edge,
        direction: Direction::End,
    });
    starting
        .chain(ending)
        .filter(|attached| {
            net.edge(attached.edge)
                .is_some_and(|edge| edge.payload.as_gas_edge().is_some())
        })
        .collect()
}

fn power_couplings(
    net: &GasPowerNet,
    id: NodeId,
    starting: &[EdgeId],
    ending: &[EdgeId],
) -> ComponentResult<Vec<Coupling>> {
    let mut couplings = Vec::new();
    for &edge_id in starting.iter().chain(ending) {
        let edge = net
            .edge(edge_id)
            .ok_or(GraphError::UnknownEdge { edge: edge_id })?;
        let Some(line) = edge.payload.as_transmission_line() else {
            continue;
        };
        let neighbor = if edge.starting_node() == id {
            edge.ending_node()
        } else {
            edge.starting_node()
        };
        let Some(bus) = node_payload(net, neighbor)?.as_power_node() else {
            return Err(ComponentError::configuration(format!(
                "transmission line '{}' must connect two power nodes",
                edge.name()
            )));
        };
        couplings.push(Coupling {
            neighbor_start: bus.start_state_index(),
            g: line.g(),
            b: line.b(),
        });
    }
    Ok(couplings)
}

fn apply_wiring(net: &mut GasPowerNet, wiring: Wiring) {
    for (id, attached) in wiring.gas_nodes {
        if let Some(NodeComponent::Gas(node)) = net.get_node_by_id_mut(id).map(|n| &mut n.payload) {
            node.setup(attached);
        }
    }
    for (id, couplings) in wiring.power_nodes {
        if let Some(NodeComponent::Power(node)) = net.get_node_by_id_mut(id).map(|n| &mut n.payload) {
            node.setup(couplings);
        }
    }
    for (id, power_node) in wiring.connections {
        if let Some(EdgeComponent::GasPowerConnection(connection)) =
            net.edge_mut(id).map(|e| &mut e.payload)
        {
            connection.setup(power_node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gas::{GasNode, ShortPipe};
    use crate::power::{PowerNode, TransmissionLine};
    use gp_core::BoundaryValue;

    fn two_gas_nodes() -> (GasPowerNet, NodeId, NodeId) {
        let mut net = GasPowerNet::new();
        let a = net
            .new_node("a", GasNode::source(BoundaryValue::constant([5.0])).into())
            .unwrap();
        let b = net
            .new_node("b", GasNode::pressure_boundary(BoundaryValue::constant([50.0])).into())
            .unwrap();
        (net, a, b)
    }

    #[test]
    fn indices_follow_arena_order() {
        let (mut net, a, b) = two_gas_nodes();
        let bus = net
            .new_node("bus", PowerNode::vphi(0.0, 0.0, BoundaryValue::constant([1.0, 0.0])).into())
            .unwrap();
        net.make_edge_between("ab", a, b, ShortPipe::new().into()).unwrap();
        let problem = NetworkProblem::new(net).unwrap();

        // The bus comes first among the stateful nodes, then the edge.
        assert_eq!(problem.number_of_states(), 6);
        let bus = problem.net().get_node_by_id(bus).unwrap();
        assert_eq!(bus.payload.as_stateful().unwrap().start_state_index(), 0);
        let edge = problem.net().edges().next().unwrap();
        assert_eq!(edge.payload.as_stateful().start_state_index(), 2);
    }

    #[test]
    fn gas_node_wiring_lists_starting_edges_first() {
        let (mut net, a, b) = two_gas_nodes();
        let c = net.new_node("c", GasNode::inner().into()).unwrap();
        let ca = net.make_edge_between("ca", c, a, ShortPipe::new().into()).unwrap();
        let ab = net.make_edge_between("ab", a, b, ShortPipe::new().into()).unwrap();
        let problem = NetworkProblem::new(net).unwrap();

        let node = problem.net().get_node_by_id(a).unwrap();
        let attached = node.payload.as_gas_node().unwrap().attached_edges();
        assert_eq!(
            attached,
            &[
                AttachedEdge {
                    edge: ab,
                    direction: Direction::Start
                },
                AttachedEdge {
                    edge: ca,
                    direction: Direction::End
                },
            ]
        );
    }

    #[test]
    fn line_at_gas_node_is_rejected() {
        let (mut net, a, _) = two_gas_nodes();
        let bus = net
            .new_node("bus", PowerNode::vphi(0.0, 0.0, BoundaryValue::constant([1.0, 0.0])).into())
            .unwrap();
        net.make_edge_between("line", a, bus, TransmissionLine::new(1.0, -10.0).into())
            .unwrap();
        let err = NetworkProblem::new(net).unwrap_err();
        assert!(matches!(err, ComponentError::Configuration { .. }));
        assert!(err.to_string().contains("line"));
    }

    #[test]
    fn isolated_constraint_sink_is_rejected() {
        let mut net = GasPowerNet::new();
        net.new_node("lonely", GasNode::constraint_sink(BoundaryValue::constant([1.0])).into())
            .unwrap();
        assert!(NetworkProblem::new(net).is_err());
    }

    #[test]
    fn missing_initial_value_is_reported() {
        let (mut net, a, b) = two_gas_nodes();
        net.make_edge_between("ab", a, b, ShortPipe::new().into()).unwrap();
        let problem = NetworkProblem::new(net).unwrap();
        let mut state = DVector::zeros(problem.number_of_states());
        let err = problem
            .set_initial_values(&mut state, &InitialConditions::new())
            .unwrap_err();
        assert!(err.to_string().contains("'ab'"));
    }
}
