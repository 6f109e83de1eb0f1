//! Immutable cluster topology snapshots.

use super::hashring::{HashRing, RingHasher};
use crate::error::{Error, Result};
use crate::types::{Node, DEFAULT_NODE_WEIGHT};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

/// Decoded form of a cluster configuration document.
///
/// ```json
/// {"rev": 42, "name": "default",
///  "nodes": [{"hostname": "10.0.0.1:8091", "ports": {"direct": 11210}}]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyDocument {
    /// Configuration revision.
    #[serde(default)]
    pub rev: u64,

    /// Bucket name, if the server sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Data nodes.
    pub nodes: Vec<NodeEntry>,
}

/// A node as described by a configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    /// `ip`, `ip:port` or `[ipv6]:port`. The port here is the management
    /// port and is only used when no data port is given.
    pub hostname: String,

    /// Service ports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<NodePorts>,

    /// Relative routing weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

/// Service ports of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePorts {
    /// Data (key/value) port.
    pub direct: u16,
}

impl TopologyDocument {
    /// Decode a document from JSON bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl NodeEntry {
    /// Resolve the data address of this node.
    pub fn to_node(&self) -> Result<Node> {
        let (ip, host_port) = split_hostname(&self.hostname)?;
        let port = match (&self.ports, host_port) {
            (Some(ports), _) => ports.direct,
            (None, Some(port)) => port,
            (None, None) => {
                return Err(Error::InvalidNode(format!(
                    "{}: no data port advertised",
                    self.hostname
                )))
            }
        };
        Ok(Node::with_weight(
            SocketAddr::new(ip, port),
            self.weight.unwrap_or(DEFAULT_NODE_WEIGHT),
        ))
    }
}

fn split_hostname(hostname: &str) -> Result<(IpAddr, Option<u16>)> {
    let invalid = || Error::InvalidNode(format!("{}: not an ip address", hostname));

    if let Ok(addr) = hostname.parse::<SocketAddr>() {
        return Ok((addr.ip(), Some(addr.port())));
    }
    let bare = hostname.trim_start_matches('[').trim_end_matches(']');
    bare.parse::<IpAddr>()
        .map(|ip| (ip, None))
        .map_err(|_| invalid())
}

/// A snapshot of the cluster as seen by the router.
///
/// Snapshots are never modified; a configuration change produces a new one.
#[derive(Debug, Clone)]
pub struct Topology {
    revision: u64,
    name: Option<String>,
    nodes: Vec<Node>,
    ring: HashRing,
}

impl Topology {
    /// Build a topology from a node list.
    pub fn new(revision: u64, nodes: Vec<Node>, hasher: RingHasher) -> Result<Self> {
        let ring = HashRing::build(&nodes, hasher)?;
        Ok(Self {
            revision,
            name: None,
            nodes,
            ring,
        })
    }

    /// Build a topology from a decoded configuration document.
    pub fn from_document(document: &TopologyDocument, hasher: RingHasher) -> Result<Self> {
        let nodes = document
            .nodes
            .iter()
            .map(NodeEntry::to_node)
            .collect::<Result<Vec<_>>>()?;

        let mut topology = Self::new(document.rev, nodes, hasher)?;
        topology.name = document.name.clone();
        Ok(topology)
    }

    /// Decode and build a topology from JSON bytes.
    pub fn parse(bytes: &[u8], hasher: RingHasher) -> Result<Self> {
        Self::from_document(&TopologyDocument::parse(bytes)?, hasher)
    }

    /// Configuration revision.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Bucket name, if known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Nodes in configuration order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The hash ring built from the nodes.
    pub fn ring(&self) -> &HashRing {
        &self.ring
    }

    /// Whether a node with this address is part of the topology.
    pub fn contains(&self, addr: SocketAddr) -> bool {
        self.nodes.iter().any(|n| n.addr() == addr)
    }

    /// Address of the node owning document `key`.
    pub fn node_for_id(&self, key: &[u8]) -> Result<SocketAddr> {
        self.ring.lookup(key).map(Node::addr)
    }

    /// Nodes of `previous` that are missing from this topology.
    pub fn removed_since(&self, previous: &Topology) -> Vec<Node> {
        previous
            .nodes
            .iter()
            .filter(|n| !self.contains(n.addr()))
            .copied()
            .collect()
    }
}
