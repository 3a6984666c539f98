//! gp-graph: network topology layer for gaspower.
//!
//! Provides:
//! - Node and Edge entities carrying a component payload
//! - `Net`, an arena that owns all nodes and edges and hands out compact ids
//! - Directed incidence lists ("starting" and "ending" edges per node)
//!
//! # Example
//!
//! ```
//! use gp_graph::Net;
//!
//! let mut net: Net<&str, f64> = Net::new();
//! let a = net.new_node("a", "source").unwrap();
//! let b = net.new_node("b", "sink").unwrap();
//! let e = net.make_edge_between("a-b", a, b, 1.5).unwrap();
//!
//! assert!(net.exists_edge_between(b, a));
//! assert_eq!(net.get_edge_by_node_ids(a, b).unwrap().id(), e);
//! assert_eq!(net.get_node_by_id(a).unwrap().starting_edges(), &[e]);
//! ```

pub mod error;
pub mod graph;
pub mod net;

// Re-exports for ergonomics
pub use error::{GraphError, GraphResult};
pub use graph::{Edge, Node};
pub use net::Net;
