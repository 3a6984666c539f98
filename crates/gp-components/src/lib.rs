//! gp-components: the components of a coupled gas and power network.
//!
//! Provides:
//! - Gas pipes (box scheme over the isothermal Euler equations), short pipes,
//!   control valves and compressor stations
//! - Gas nodes: inner nodes, sources, sinks, pressure boundaries and
//!   constraint sinks
//! - Gas-to-power connections
//! - Power buses (PQ, PV, slack, stochastic PQ, switched plants, external
//!   gas-fired plants) and transmission lines
//! - [`NetworkProblem`], which indexes and wires a whole net and implements
//!   [`gp_solver::Problem`]
//!
//! Components split their capabilities into the facets of [`traits`].
//!
//! # Example
//!
//! ```
//! use gp_components::{GasNode, GasPowerNet, InitialConditions, NetworkProblem, ShortPipe};
//! use gp_core::{BoundaryValue, InitialValue};
//! use nalgebra::DVector;
//!
//! let mut net = GasPowerNet::new();
//! let source = net
//!     .new_node("source", GasNode::source(BoundaryValue::constant([10.0])).into())
//!     .unwrap();
//! let outlet = net
//!     .new_node("outlet", GasNode::pressure_boundary(BoundaryValue::constant([60.0])).into())
//!     .unwrap();
//! net.make_edge_between("link", source, outlet, ShortPipe::new().into())
//!     .unwrap();
//!
//! let problem = NetworkProblem::new(net).unwrap();
//! let mut initial = InitialConditions::new();
//! initial.insert("link".into(), InitialValue::constant([60.0, 10.0]));
//!
//! let mut state = DVector::zeros(problem.number_of_states());
//! problem.set_initial_values(&mut state, &initial).unwrap();
//! assert_eq!(state.as_slice(), &[60.0, 10.0, 60.0, 10.0]);
//! ```

pub mod component;
pub mod error;
pub mod gas;
pub mod indices;
pub mod network;
pub mod power;
pub mod stochastic;
pub mod traits;

// Re-exports
pub use component::{EdgeComponent, GasPowerNet, NodeComponent};
pub use error::{ComponentError, ComponentResult};
pub use gas::{
    AttachedEdge, CompressorStation, ControlValve, Direction, GasEdge, GasNode, GasNodeKind,
    GasPowerConnection, Pipe, ShortPipe,
};
pub use indices::IndexRange;
pub use network::{InitialConditions, NetworkProblem};
pub use power::{
    Coupling, OupParameters, PowerNode, PowerNodeKind, StochasticLoad, Targets, TransmissionLine,
};
pub use traits::{Constrainable, Controllable, Equation, Stateful, Step, Switchable};
