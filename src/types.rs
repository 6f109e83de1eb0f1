//! Core types shared by the ring, the router and the refresh driver.

use std::fmt;
use std::net::SocketAddr;

/// Weight given to nodes that do not advertise one.
pub const DEFAULT_NODE_WEIGHT: u32 = 1;

/// A data node as seen by the routing layer.
///
/// The weight is a relative capacity: a node with weight 2 receives roughly
/// twice the ring points of a node with weight 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node {
    addr: SocketAddr,
    weight: u32,
}

impl Node {
    /// Create a node with the default weight.
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            weight: DEFAULT_NODE_WEIGHT,
        }
    }

    /// Create a node with an explicit weight. Zero is clamped to 1.
    pub fn with_weight(addr: SocketAddr, weight: u32) -> Self {
        Self {
            addr,
            weight: weight.max(1),
        }
    }

    /// Address used to reach the node.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Relative routing weight.
    pub fn weight(&self) -> u32 {
        self.weight
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_weight_is_clamped() {
        let node = Node::with_weight("10.0.0.1:11210".parse().unwrap(), 0);
        assert_eq!(node.weight(), 1);
    }

    #[test]
    fn test_display_is_address() {
        let node = Node::new("10.0.0.1:11210".parse().unwrap());
        assert_eq!(node.to_string(), "10.0.0.1:11210");
        assert_eq!(node.weight(), DEFAULT_NODE_WEIGHT);
    }
}
