//! Consistent hash ring mapping document keys to nodes.
//!
//! The default placement is the ketama algorithm used by memcached clients,
//! so every client of the same cluster agrees on key ownership. An xxHash64
//! placement with virtual nodes is available for deployments that do not need
//! to interoperate with other clients.

use crate::error::{Error, Result};
use crate::types::Node;
use md5::{Digest, Md5};
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;
use twox_hash::XxHash64;

/// MD5 digests generated per node at unit relative weight.
pub const KETAMA_DIGESTS_PER_NODE: u64 = 40;

/// Ring points extracted from a single MD5 digest.
pub const KETAMA_POINTS_PER_DIGEST: usize = 4;

/// Number of virtual nodes per unit of weight for the xxHash64 ring.
pub const DEFAULT_VNODES_PER_NODE: usize = 256;

/// Point placement and key hashing scheme of a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RingHasher {
    /// libketama placement: MD5 digests of `"{ip}:{port}-{i}"`, four
    /// little-endian 32-bit points per digest.
    #[default]
    Ketama,

    /// xxHash64 placement with `vnodes` points for a node of average
    /// weight.
    XxHash64 {
        /// Virtual nodes per node of average weight.
        vnodes: usize,
    },
}

impl RingHasher {
    /// xxHash64 placement with the default vnode count.
    pub fn xxhash() -> Self {
        RingHasher::XxHash64 {
            vnodes: DEFAULT_VNODES_PER_NODE,
        }
    }

    /// Hash a document key onto the ring.
    pub fn hash_key(&self, key: &[u8]) -> u64 {
        match self {
            RingHasher::Ketama => ketama_point(&Md5::digest(key), 0) as u64,
            RingHasher::XxHash64 { .. } => xxhash(key),
        }
    }

    fn place(&self, nodes: &[Node], points: &mut BTreeMap<u64, Node>) {
        let node_count = nodes.len() as u64;
        let total_weight: u64 = nodes.iter().map(|n| n.weight() as u64).sum();

        for node in nodes {
            match self {
                RingHasher::Ketama => {
                    // libketama: floor(weight / total * 40 * count), in integers
                    // so equal weights always give exactly 40 digests.
                    let digests = (node.weight() as u64 * KETAMA_DIGESTS_PER_NODE * node_count
                        / total_weight)
                        .max(1);
                    let addr = node.addr();
                    for i in 0..digests {
                        let ident = format!("{}:{}-{}", addr.ip(), addr.port(), i);
                        let digest = Md5::digest(ident.as_bytes());
                        for h in 0..KETAMA_POINTS_PER_DIGEST {
                            points.insert(ketama_point(&digest, h) as u64, *node);
                        }
                    }
                }
                RingHasher::XxHash64 { vnodes } => {
                    // Normalized like ketama: the ring holds about
                    // `vnodes * count` points whatever the raw weights are.
                    let count = ((*vnodes as u64)
                        .saturating_mul(node.weight() as u64)
                        .saturating_mul(node_count)
                        / total_weight)
                        .max(1);
                    for i in 0..count {
                        let vnode_key = format!("{}:{}", node.addr(), i);
                        points.insert(xxhash(vnode_key.as_bytes()), *node);
                    }
                }
            }
        }
    }
}

fn ketama_point(digest: &[u8], h: usize) -> u32 {
    let offset = h * 4;
    u32::from_le_bytes([
        digest[offset],
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ])
}

fn xxhash(key: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    key.hash(&mut hasher);
    hasher.finish()
}

/// An immutable consistent hash ring.
///
/// A ring is built once from a node list. Topology changes build a new ring
/// rather than mutating an existing one.
#[derive(Debug, Clone)]
pub struct HashRing {
    /// Ring points mapped to their owning node.
    points: BTreeMap<u64, Node>,

    /// Placement scheme the points were built with.
    hasher: RingHasher,

    /// Nodes in the order they were supplied.
    nodes: Vec<Node>,
}

impl HashRing {
    /// Build a ring from a node list.
    ///
    /// Fails with [`Error::EmptyTopology`] when `nodes` is empty.
    pub fn build(nodes: &[Node], hasher: RingHasher) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::EmptyTopology);
        }

        let mut points = BTreeMap::new();
        hasher.place(nodes, &mut points);

        Ok(Self {
            points,
            hasher,
            nodes: nodes.to_vec(),
        })
    }

    /// Placement scheme of this ring.
    pub fn hasher(&self) -> RingHasher {
        self.hasher
    }

    /// Nodes in the ring.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Total number of points on the ring.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Hash a key with this ring's hasher.
    pub fn hash_key(&self, key: &[u8]) -> u64 {
        self.hasher.hash_key(key)
    }

    /// Find the node owning `key`.
    pub fn lookup(&self, key: &[u8]) -> Result<&Node> {
        self.owner_at(self.hash_key(key))
    }

    /// Find the node owning a ring position: the first point at or after
    /// `hash`, wrapping to the lowest point.
    pub fn owner_at(&self, hash: u64) -> Result<&Node> {
        self.points
            .range(hash..)
            .next()
            .or_else(|| self.points.iter().next())
            .map(|(_, node)| node)
            .ok_or(Error::EmptyTopology)
    }

    /// Iterate over all ring points in ascending order.
    pub fn points(&self) -> impl Iterator<Item = (u64, &Node)> + '_ {
        self.points.iter().map(|(&point, node)| (point, node))
    }

    /// Ring points owned by the node at `addr`, ascending.
    pub fn points_for(&self, addr: SocketAddr) -> Vec<u64> {
        self.points
            .iter()
            .filter(|(_, node)| node.addr() == addr)
            .map(|(&point, _)| point)
            .collect()
    }

    /// Count how many of `sample_size` synthetic keys land on each node.
    pub fn distribution(&self, sample_size: usize) -> HashMap<SocketAddr, usize> {
        let mut distribution = HashMap::new();

        for i in 0..sample_size {
            let key = format!("sample_key_{}", i);
            if let Ok(owner) = self.lookup(key.as_bytes()) {
                *distribution.entry(owner.addr()).or_insert(0) += 1;
            }
        }

        distribution
    }
}
