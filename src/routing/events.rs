//! Topology change events.

use std::net::SocketAddr;

/// Events emitted by the router when a new topology is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyEvent {
    /// A node known to the previous topology is absent from the new one.
    NodeDisconnected {
        /// The node's data address.
        addr: SocketAddr,
        /// Revision of the topology that dropped it.
        revision: u64,
    },

    /// A new topology was installed.
    TopologyChanged {
        /// The new revision.
        revision: u64,
        /// Number of nodes in the new topology.
        node_count: usize,
    },
}

impl TopologyEvent {
    /// Revision of the topology that produced this event.
    pub fn revision(&self) -> u64 {
        match self {
            TopologyEvent::NodeDisconnected { revision, .. } => *revision,
            TopologyEvent::TopologyChanged { revision, .. } => *revision,
        }
    }

    /// Check if this is a node-removal event.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, TopologyEvent::NodeDisconnected { .. })
    }
}

/// Listener for topology events.
///
/// Called on the thread that published the topology, after the swap. Must
/// not block.
///
/// Every installed topology is reported exactly once, but installs racing
/// on different threads are not ordered: events of revision 3 may arrive
/// before those of revision 2. Order by [`TopologyEvent::revision`] when it
/// matters, or read [`Router::current`](crate::routing::Router::current).
pub trait TopologyEventListener: Send + Sync + 'static {
    /// Called when a topology event occurs.
    fn on_event(&self, event: TopologyEvent);
}

/// No-op event listener.
pub struct NoopEventListener;

impl TopologyEventListener for NoopEventListener {
    fn on_event(&self, _event: TopologyEvent) {}
}

/// Event listener that logs events.
pub struct LoggingEventListener;

impl TopologyEventListener for LoggingEventListener {
    fn on_event(&self, event: TopologyEvent) {
        match &event {
            TopologyEvent::NodeDisconnected { addr, revision } => {
                tracing::info!(%addr, revision, "Node disconnected");
            }
            TopologyEvent::TopologyChanged {
                revision,
                node_count,
            } => {
                tracing::debug!(revision, node_count, "Topology changed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_revision() {
        let event = TopologyEvent::NodeDisconnected {
            addr: "127.0.0.1:11210".parse().unwrap(),
            revision: 9,
        };
        assert_eq!(event.revision(), 9);
        assert!(event.is_disconnect());

        let changed = TopologyEvent::TopologyChanged {
            revision: 10,
            node_count: 2,
        };
        assert_eq!(changed.revision(), 10);
        assert!(!changed.is_disconnect());
    }
}
