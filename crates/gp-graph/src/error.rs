//! Graph-specific error types.

use gp_core::{EdgeId, NodeId};

pub type GraphResult<T> = Result<T, GraphError>;

/// Graph construction and mutation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A node id does not name a live node.
    UnknownNode { node: NodeId },

    /// An edge id does not name a live edge.
    UnknownEdge { edge: EdgeId },

    /// An edge between the two nodes already exists (in either direction).
    EdgeExists { start: NodeId, end: NodeId },

    /// An edge would start and end at the same node.
    SelfLoop { node: NodeId },

    /// A node or edge name is already taken.
    DuplicateName { name: String },

    /// No edge runs from `start` to `end`.
    NoEdgeBetween { start: NodeId, end: NodeId },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::UnknownNode { node } => {
                write!(f, "Node {} does not exist", node)
            }
            GraphError::UnknownEdge { edge } => {
                write!(f, "Edge {} does not exist", edge)
            }
            GraphError::EdgeExists { start, end } => {
                write!(f, "There is already an edge between node {} and {}", start, end)
            }
            GraphError::SelfLoop { node } => {
                write!(f, "Edge would start and end at node {}", node)
            }
            GraphError::DuplicateName { name } => {
                write!(f, "The name {:?} is already in use", name)
            }
            GraphError::NoEdgeBetween { start, end } => {
                write!(f, "No edge runs from node {} to {}", start, end)
            }
        }
    }
}

impl std::error::Error for GraphError {}
