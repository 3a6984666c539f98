//! Graph entities.

use gp_core::{EdgeId, NodeId};

/// A node of the network.
///
/// Incident edges are kept in two lists: edges that start here and edges that
/// end here. Both lists hold ids into the owning `Net`, never references.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<N> {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) starting: Vec<EdgeId>,
    pub(crate) ending: Vec<EdgeId>,
    /// Component data attached to this node.
    pub payload: N,
}

impl<N> Node<N> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Edges whose start is this node, in insertion order.
    pub fn starting_edges(&self) -> &[EdgeId] {
        &self.starting
    }

    /// Edges whose end is this node, in insertion order.
    pub fn ending_edges(&self) -> &[EdgeId] {
        &self.ending
    }
}

/// A directed edge between two nodes of the same `Net`.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<E> {
    pub(crate) id: EdgeId,
    pub(crate) name: String,
    pub(crate) start: NodeId,
    pub(crate) end: NodeId,
    /// Component data attached to this edge.
    pub payload: E,
}

impl<E> Edge<E> {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn starting_node(&self) -> NodeId {
        self.start
    }

    pub fn ending_node(&self) -> NodeId {
        self.end
    }

    /// Whether the edge connects `a` and `b`, in either direction.
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.start == a && self.end == b) || (self.start == b && self.end == a)
    }
}
