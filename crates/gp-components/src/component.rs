//! The closed sets of node and edge components.
//!
//! The network is a `Net` whose payloads are [`NodeComponent`] and
//! [`EdgeComponent`]. Callers reach a component's facets through the `as_*`
//! accessors, which return `None` for facets the variant does not have.

use gp_core::EdgeId;
use gp_graph::Net;

use crate::gas::{
    CompressorStation, ControlValve, GasEdge, GasNode, GasPowerConnection, Pipe, ShortPipe,
};
use crate::power::{PowerNode, TransmissionLine};
use crate::traits::{Constrainable, Controllable, Equation, Stateful, Switchable};

pub type GasPowerNet = Net<NodeComponent, EdgeComponent>;

#[derive(Debug, Clone)]
pub enum NodeComponent {
    Gas(GasNode),
    Power(PowerNode),
}

#[derive(Debug, Clone)]
pub enum EdgeComponent {
    Pipe(Pipe),
    ShortPipe(ShortPipe),
    ControlValve(ControlValve),
    CompressorStation(CompressorStation),
    GasPowerConnection(GasPowerConnection),
    TransmissionLine(TransmissionLine),
}

impl NodeComponent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeComponent::Gas(_) => "gas node",
            NodeComponent::Power(_) => "power node",
        }
    }

    pub fn as_gas_node(&self) -> Option<&GasNode> {
        match self {
            NodeComponent::Gas(node) => Some(node),
            NodeComponent::Power(_) => None,
        }
    }

    pub fn as_power_node(&self) -> Option<&PowerNode> {
        match self {
            NodeComponent::Power(node) => Some(node),
            NodeComponent::Gas(_) => None,
        }
    }

    pub fn as_stateful(&self) -> Option<&dyn Stateful> {
        match self {
            NodeComponent::Power(node) => Some(node),
            NodeComponent::Gas(_) => None,
        }
    }

    pub fn as_stateful_mut(&mut self) -> Option<&mut dyn Stateful> {
        match self {
            NodeComponent::Power(node) => Some(node),
            NodeComponent::Gas(_) => None,
        }
    }

    pub fn as_equation(&self) -> &dyn Equation {
        match self {
            NodeComponent::Gas(node) => node,
            NodeComponent::Power(node) => node,
        }
    }

    pub fn as_equation_mut(&mut self) -> &mut dyn Equation {
        match self {
            NodeComponent::Gas(node) => node,
            NodeComponent::Power(node) => node,
        }
    }

    pub fn as_constrainable(&self) -> Option<&dyn Constrainable> {
        match self {
            NodeComponent::Gas(node) => Some(node),
            NodeComponent::Power(_) => None,
        }
    }

    pub fn as_constrainable_mut(&mut self) -> Option<&mut dyn Constrainable> {
        match self {
            NodeComponent::Gas(node) => Some(node),
            NodeComponent::Power(_) => None,
        }
    }

    pub fn as_switchable(&self) -> Option<&dyn Switchable> {
        match self {
            NodeComponent::Power(node) => Some(node),
            NodeComponent::Gas(_) => None,
        }
    }

    pub fn as_switchable_mut(&mut self) -> Option<&mut dyn Switchable> {
        match self {
            NodeComponent::Power(node) => Some(node),
            NodeComponent::Gas(_) => None,
        }
    }
}

impl EdgeComponent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            EdgeComponent::Pipe(_) => "pipe",
            EdgeComponent::ShortPipe(_) => "short pipe",
            EdgeComponent::ControlValve(_) => "control valve",
            EdgeComponent::CompressorStation(_) => "compressor station",
            EdgeComponent::GasPowerConnection(_) => "gas-power connection",
            EdgeComponent::TransmissionLine(_) => "transmission line",
        }
    }

    pub fn as_stateful(&self) -> &dyn Stateful {
        match self {
            EdgeComponent::Pipe(edge) => edge,
            EdgeComponent::ShortPipe(edge) => edge,
            EdgeComponent::ControlValve(edge) => edge,
            EdgeComponent::CompressorStation(edge) => edge,
            EdgeComponent::GasPowerConnection(edge) => edge,
            EdgeComponent::TransmissionLine(edge) => edge,
        }
    }

    pub fn as_stateful_mut(&mut self) -> &mut dyn Stateful {
        match self {
            EdgeComponent::Pipe(edge) => edge,
            EdgeComponent::ShortPipe(edge) => edge,
            EdgeComponent::ControlValve(edge) => edge,
            EdgeComponent::CompressorStation(edge) => edge,
            EdgeComponent::GasPowerConnection(edge) => edge,
            EdgeComponent::TransmissionLine(edge) => edge,
        }
    }

    pub fn as_equation(&self) -> Option<&dyn Equation> {
        match self {
            EdgeComponent::Pipe(edge) => Some(edge),
            EdgeComponent::ShortPipe(edge) => Some(edge),
            EdgeComponent::ControlValve(edge) => Some(edge),
            EdgeComponent::CompressorStation(edge) => Some(edge),
            EdgeComponent::GasPowerConnection(edge) => Some(edge),
            EdgeComponent::TransmissionLine(_) => None,
        }
    }

    pub fn as_equation_mut(&mut self) -> Option<&mut dyn Equation> {
        match self {
            EdgeComponent::Pipe(edge) => Some(edge),
            EdgeComponent::ShortPipe(edge) => Some(edge),
            EdgeComponent::ControlValve(edge) => Some(edge),
            EdgeComponent::CompressorStation(edge) => Some(edge),
            EdgeComponent::GasPowerConnection(edge) => Some(edge),
            EdgeComponent::TransmissionLine(_) => None,
        }
    }

    pub fn as_controllable(&self) -> Option<&dyn Controllable> {
        match self {
            EdgeComponent::ControlValve(edge) => Some(edge),
            EdgeComponent::CompressorStation(edge) => Some(edge),
            _ => None,
        }
    }

    pub fn as_controllable_mut(&mut self) -> Option<&mut dyn Controllable> {
        match self {
            EdgeComponent::ControlValve(edge) => Some(edge),
            EdgeComponent::CompressorStation(edge) => Some(edge),
            _ => None,
        }
    }

    /// Any edge with a gas end, including gas-power connections.
    pub fn as_gas_edge(&self) -> Option<&dyn GasEdge> {
        match self {
            EdgeComponent::Pipe(edge) => Some(edge),
            EdgeComponent::ShortPipe(edge) => Some(edge),
            EdgeComponent::ControlValve(edge) => Some(edge),
            EdgeComponent::CompressorStation(edge) => Some(edge),
            EdgeComponent::GasPowerConnection(edge) => Some(edge),
            EdgeComponent::TransmissionLine(_) => None,
        }
    }

    pub fn as_transmission_line(&self) -> Option<&TransmissionLine> {
        match self {
            EdgeComponent::TransmissionLine(line) => Some(line),
            _ => None,
        }
    }
}

impl From<GasNode> for NodeComponent {
    fn from(node: GasNode) -> Self {
        NodeComponent::Gas(node)
    }
}

impl From<PowerNode> for NodeComponent {
    fn from(node: PowerNode) -> Self {
        NodeComponent::Power(node)
    }
}

impl From<Pipe> for EdgeComponent {
    fn from(edge: Pipe) -> Self {
        EdgeComponent::Pipe(edge)
    }
}

impl From<ShortPipe> for EdgeComponent {
    fn from(edge: ShortPipe) -> Self {
        EdgeComponent::ShortPipe(edge)
    }
}

impl From<ControlValve> for EdgeComponent {
    fn from(edge: ControlValve) -> Self {
        EdgeComponent::ControlValve(edge)
    }
}

impl From<CompressorStation> for EdgeComponent {
    fn from(edge: CompressorStation) -> Self {
        EdgeComponent::CompressorStation(edge)
    }
}

impl From<GasPowerConnection> for EdgeComponent {
    fn from(edge: GasPowerConnection) -> Self {
        EdgeComponent::GasPowerConnection(edge)
    }
}

impl From<TransmissionLine> for EdgeComponent {
    fn from(edge: TransmissionLine) -> Self {
        EdgeComponent::TransmissionLine(edge)
    }
}

/// The gas view of an edge a gas node was wired to during setup.
pub(crate) fn gas_edge(net: &GasPowerNet, id: EdgeId) -> &dyn GasEdge {
    match net.edge(id).and_then(|edge| edge.payload.as_gas_edge()) {
        Some(edge) => edge,
        None => panic!("edge {id} is wired to a gas node but is not a gas edge"),
    }
}
