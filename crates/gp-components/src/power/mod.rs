//! Power grid components.

pub mod line;
pub mod node;

pub use line::TransmissionLine;
pub use node::{Coupling, OupParameters, PowerNode, PowerNodeKind, StochasticLoad, Targets};
