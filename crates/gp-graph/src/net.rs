//! The network arena.

use std::collections::HashMap;

use gp_core::{EdgeId, NodeId};

use crate::error::{GraphError, GraphResult};
use crate::graph::{Edge, Node};

/// Owner of all nodes and edges of a network.
///
/// Nodes and edges live in slot vectors. Removing an entity empties its slot,
/// so ids handed out earlier never get reused for a different entity.
/// Mutation happens while the network is assembled; afterwards the net is
/// only read.
#[derive(Debug, Clone)]
pub struct Net<N, E> {
    nodes: Vec<Option<Node<N>>>,
    edges: Vec<Option<Edge<E>>>,
    node_names: HashMap<String, NodeId>,
    edge_names: HashMap<String, EdgeId>,
}

impl<N, E> Default for Net<N, E> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            node_names: HashMap::new(),
            edge_names: HashMap::new(),
        }
    }
}

impl<N, E> Net<N, E> {
    /// Create an empty net.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its id.
    pub fn new_node(&mut self, name: impl Into<String>, payload: N) -> GraphResult<NodeId> {
        let name = name.into();
        if self.node_names.contains_key(&name) {
            return Err(GraphError::DuplicateName { name });
        }
        let id = NodeId::from_index(self.nodes.len() as u32);
        self.node_names.insert(name.clone(), id);
        self.nodes.push(Some(Node {
            id,
            name,
            starting: Vec::new(),
            ending: Vec::new(),
            payload,
        }));
        Ok(id)
    }

    /// Add an edge from `start` to `end`.
    ///
    /// Fails if either node is unknown, if `start == end`, or if the two nodes
    /// are already connected in either direction.
    pub fn make_edge_between(
        &mut self,
        name: impl Into<String>,
        start: NodeId,
        end: NodeId,
        payload: E,
    ) -> GraphResult<EdgeId> {
        self.require_node(start)?;
        self.require_node(end)?;
        if start == end {
            return Err(GraphError::SelfLoop { node: start });
        }
        if self.exists_edge_between(start, end) {
            return Err(GraphError::EdgeExists { start, end });
        }
        let name = name.into();
        if self.edge_names.contains_key(&name) {
            return Err(GraphError::DuplicateName { name });
        }

        let id = EdgeId::from_index(self.edges.len() as u32);
        self.edge_names.insert(name.clone(), id);
        self.edges.push(Some(Edge {
            id,
            name,
            start,
            end,
            payload,
        }));
        self.node_slot_mut(start).starting.push(id);
        self.node_slot_mut(end).ending.push(id);
        Ok(id)
    }

    /// Remove the edge running from `start` to `end` and return it.
    pub fn remove_edge_between(&mut self, start: NodeId, end: NodeId) -> GraphResult<Edge<E>> {
        let id = self
            .get_edge_by_node_ids(start, end)
            .map(|edge| edge.id)
            .ok_or(GraphError::NoEdgeBetween { start, end })?;
        Ok(self.take_edge(id))
    }

    /// Remove a node together with every edge touching it.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<Node<N>> {
        let node = self.require_node(id)?;
        let incident: Vec<EdgeId> = node
            .starting
            .iter()
            .chain(node.ending.iter())
            .copied()
            .collect();
        for edge in incident {
            self.take_edge(edge);
        }
        let node = self.nodes[id.slot()]
            .take()
            .ok_or(GraphError::UnknownNode { node: id })?;
        self.node_names.remove(&node.name);
        Ok(node)
    }

    /// Whether an edge connects `a` and `b`, in either direction.
    pub fn exists_edge_between(&self, a: NodeId, b: NodeId) -> bool {
        let Some(node) = self.get_node_by_id(a) else {
            return false;
        };
        node.starting
            .iter()
            .chain(node.ending.iter())
            .filter_map(|&e| self.edge(e))
            .any(|edge| edge.connects(a, b))
    }

    pub fn get_node_by_id(&self, id: NodeId) -> Option<&Node<N>> {
        self.nodes.get(id.slot()).and_then(Option::as_ref)
    }

    pub fn get_node_by_id_mut(&mut self, id: NodeId) -> Option<&mut Node<N>> {
        self.nodes.get_mut(id.slot()).and_then(Option::as_mut)
    }

    /// Look a node up by its string identifier.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.node_names.get(name).copied()
    }

    /// Look an edge up by its string identifier.
    pub fn find_edge(&self, name: &str) -> Option<EdgeId> {
        self.edge_names.get(name).copied()
    }

    /// The edge running from `start` to `end`, if any. Direction matters.
    pub fn get_edge_by_node_ids(&self, start: NodeId, end: NodeId) -> Option<&Edge<E>> {
        self.get_node_by_id(start)?
            .starting
            .iter()
            .filter_map(|&e| self.edge(e))
            .find(|edge| edge.end == end)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge<E>> {
        self.edges.get(id.slot()).and_then(Option::as_ref)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge<E>> {
        self.edges.get_mut(id.slot()).and_then(Option::as_mut)
    }

    /// Live nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node<N>> {
        self.nodes.iter().flatten()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node<N>> {
        self.nodes.iter_mut().flatten()
    }

    /// Live edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge<E>> {
        self.edges.iter().flatten()
    }

    pub fn edges_mut(&mut self) -> impl Iterator<Item = &mut Edge<E>> {
        self.edges.iter_mut().flatten()
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    fn require_node(&self, id: NodeId) -> GraphResult<&Node<N>> {
        self.get_node_by_id(id)
            .ok_or(GraphError::UnknownNode { node: id })
    }

    // Only called with ids taken from live edges.
    fn node_slot_mut(&mut self, id: NodeId) -> &mut Node<N> {
        match self.get_node_by_id_mut(id) {
            Some(node) => node,
            None => panic!("edge endpoint {id} is not a live node"),
        }
    }

    fn take_edge(&mut self, id: EdgeId) -> Edge<E> {
        let edge = match self.edges[id.slot()].take() {
            Some(edge) => edge,
            None => panic!("edge {id} was removed twice"),
        };
        self.edge_names.remove(&edge.name);
        self.node_slot_mut(edge.start).starting.retain(|&e| e != id);
        self.node_slot_mut(edge.end).ending.retain(|&e| e != id);
        edge
    }
}
