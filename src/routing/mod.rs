//! Request routing over the installed topology.
//!
//! [`Router`] answers `node_for_id` from whichever [`Topology`] is installed at
//! call time and accepts new topologies through a revision-checked,
//! lock-free swap. Nodes that disappear between revisions are reported to a
//! [`TopologyEventListener`].
//!
//! [`Topology`]: crate::partitioning::Topology

pub mod events;
mod router;

pub use events::{LoggingEventListener, NoopEventListener, TopologyEvent, TopologyEventListener};
pub use router::{PublishOutcome, Router};
