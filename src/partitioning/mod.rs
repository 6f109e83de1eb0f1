//! Partitioning of document keys across cluster nodes.
//!
//! Keys are mapped to nodes with a consistent hash ring:
//! - each node places a weight-proportional number of points on the ring
//! - a key is owned by the first point at or after its hash, wrapping around
//! - adding or removing a node only moves the keys adjacent to its points
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Topology (rev 42)                          │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │                    HashRing                           │  │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐   │  │
//! │  │  │ P:A │→│ P:B │→│ P:C │→│ P:A │→│ P:B │→│ P:C │   │  │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘ └─────┘ └─────┘   │  │
//! │  │      160 ketama points per unit-weight node          │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! │                                                             │
//! │  Key "user:123" → md5 → next point → node C                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use cluster_router::partitioning::{RingHasher, Topology};
//! use cluster_router::Node;
//!
//! let nodes = vec![
//!     Node::new("10.0.0.1:11210".parse().unwrap()),
//!     Node::new("10.0.0.2:11210".parse().unwrap()),
//! ];
//! let topology = Topology::new(1, nodes, RingHasher::Ketama).unwrap();
//! let owner = topology.node_for_id(b"user:123").unwrap();
//! assert!(topology.contains(owner));
//! ```

mod hashring;
mod topology;

pub use hashring::{
    HashRing, RingHasher, DEFAULT_VNODES_PER_NODE, KETAMA_DIGESTS_PER_NODE,
    KETAMA_POINTS_PER_DIGEST,
};
pub use topology::{NodeEntry, NodePorts, Topology, TopologyDocument};
