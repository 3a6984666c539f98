//! Gas network components.

pub mod compressor;
pub mod connection;
pub mod edge;
pub mod node;
pub mod pipe;
pub mod short;

pub use compressor::CompressorStation;
pub use connection::GasPowerConnection;
pub use edge::{Direction, GasEdge};
pub use node::{AttachedEdge, GasNode, GasNodeKind};
pub use pipe::Pipe;
pub use short::{ControlValve, ShortPipe};
