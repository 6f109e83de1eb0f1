//! Key routing over the current topology.
//!
//! The router holds the installed [`Topology`] in a lock-free cell. Readers
//! load the snapshot without blocking and always see a complete topology.
//! Writers publish with a compare-and-swap loop that only installs strictly
//! newer revisions, so out-of-order configuration deliveries are discarded.

use super::events::{NoopEventListener, TopologyEvent, TopologyEventListener};
use crate::error::{Error, Result};
use crate::metrics::RoutingMetrics;
use crate::partitioning::Topology;
use arc_swap::ArcSwapOption;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of [`Router::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The topology was installed.
    Installed {
        /// Revision it replaced, if any.
        previous: Option<u64>,
    },

    /// The topology was not newer than the installed one and was dropped.
    Stale {
        /// Revision that stays installed.
        current: u64,
    },
}

impl PublishOutcome {
    /// Whether the topology was installed.
    pub fn is_installed(&self) -> bool {
        matches!(self, PublishOutcome::Installed { .. })
    }
}

/// Routes document keys to nodes using the installed topology.
pub struct Router {
    /// Installed topology. `None` until the first publish.
    current: ArcSwapOption<Topology>,

    /// Receiver of topology events.
    listener: RwLock<Arc<dyn TopologyEventListener>>,

    /// Routing metrics.
    metrics: RoutingMetrics,
}

impl Router {
    /// Create a router with no topology.
    pub fn new() -> Self {
        Self::with_listener(Arc::new(NoopEventListener))
    }

    /// Create a router that reports events to `listener`.
    pub fn with_listener(listener: Arc<dyn TopologyEventListener>) -> Self {
        Self {
            current: ArcSwapOption::empty(),
            listener: RwLock::new(listener),
            metrics: RoutingMetrics::new(),
        }
    }

    /// Replace the event listener.
    pub fn set_listener(&self, listener: Arc<dyn TopologyEventListener>) {
        *self.listener.write() = listener;
    }

    /// Routing metrics.
    pub fn metrics(&self) -> &RoutingMetrics {
        &self.metrics
    }

    /// The installed topology.
    pub fn current(&self) -> Option<Arc<Topology>> {
        self.current.load_full()
    }

    /// Revision of the installed topology.
    pub fn revision(&self) -> Option<u64> {
        self.current.load_full().map(|t| t.revision())
    }

    /// Install `topology` if its revision is newer than the installed one.
    ///
    /// Events are dispatched on the calling thread after the swap, without
    /// ordering against concurrent publishers.
    pub fn publish(&self, topology: Topology) -> PublishOutcome {
        let next = Arc::new(topology);

        loop {
            let current = self.current.load_full();

            if let Some(cur) = &current {
                if next.revision() <= cur.revision() {
                    self.metrics.publishes_stale.inc();
                    debug!(
                        revision = next.revision(),
                        current = cur.revision(),
                        "Discarding stale topology"
                    );
                    return PublishOutcome::Stale {
                        current: cur.revision(),
                    };
                }
            }

            let prev = self.current.compare_and_swap(&current, Some(next.clone()));
            let swapped = match (&*prev, &current) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            };

            if swapped {
                self.on_installed(current.as_deref(), &next);
                return PublishOutcome::Installed {
                    previous: current.map(|t| t.revision()),
                };
            }
            // Lost a race with another publisher; re-check against its revision.
        }
    }

    fn on_installed(&self, previous: Option<&Topology>, next: &Topology) {
        self.metrics.record_installed(next.revision(), next.nodes().len());
        info!(
            revision = next.revision(),
            nodes = next.nodes().len(),
            previous = previous.map(|t| t.revision()),
            "Installed new topology"
        );

        let listener = self.listener.read().clone();

        if let Some(previous) = previous {
            for node in next.removed_since(previous) {
                self.metrics.nodes_removed.inc();
                listener.on_event(TopologyEvent::NodeDisconnected {
                    addr: node.addr(),
                    revision: next.revision(),
                });
            }
        }

        listener.on_event(TopologyEvent::TopologyChanged {
            revision: next.revision(),
            node_count: next.nodes().len(),
        });
    }

    /// Address of the node owning document `key` in the installed topology.
    pub fn node_for_id(&self, key: &[u8]) -> Result<SocketAddr> {
        let guard = self.current.load();
        match &*guard {
            Some(topology) => {
                self.metrics.lookups.inc();
                topology.node_for_id(key)
            }
            None => {
                self.metrics.lookups_empty.inc();
                Err(Error::EmptyTopology)
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("revision", &self.revision())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partitioning::RingHasher;
    use crate::types::Node;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<TopologyEvent>>,
    }

    impl TopologyEventListener for Recorder {
        fn on_event(&self, event: TopologyEvent) {
            self.events.lock().push(event);
        }
    }

    fn topology(revision: u64, hosts: &[&str]) -> Topology {
        let nodes = hosts.iter().map(|h| Node::new(h.parse().unwrap())).collect();
        Topology::new(revision, nodes, RingHasher::Ketama).unwrap()
    }

    #[test]
    fn test_empty_router() {
        let router = Router::new();
        assert!(router.current().is_none());
        assert_eq!(router.revision(), None);
        assert!(matches!(router.node_for_id(b"key"), Err(Error::EmptyTopology)));
        assert_eq!(router.metrics().snapshot().lookups_empty, 1);
    }

    #[test]
    fn test_publish_and_route() {
        let router = Router::new();
        let outcome = router.publish(topology(1, &["10.0.0.1:11210", "10.0.0.2:11210"]));
        assert_eq!(outcome, PublishOutcome::Installed { previous: None });
        assert_eq!(router.revision(), Some(1));

        let owner = router.node_for_id(b"user:123").unwrap();
        assert_eq!(router.node_for_id(b"user:123").unwrap(), owner);
        assert!(router.current().unwrap().contains(owner));
    }

    #[test]
    fn test_stale_revisions_rejected() {
        let router = Router::new();
        router.publish(topology(5, &["10.0.0.1:11210"]));

        assert_eq!(
            router.publish(topology(5, &["10.0.0.2:11210"])),
            PublishOutcome::Stale { current: 5 }
        );
        assert_eq!(
            router.publish(topology(4, &["10.0.0.2:11210"])),
            PublishOutcome::Stale { current: 5 }
        );
        assert_eq!(router.node_for_id(b"k").unwrap(), "10.0.0.1:11210".parse().unwrap());

        assert_eq!(
            router.publish(topology(6, &["10.0.0.2:11210"])),
            PublishOutcome::Installed { previous: Some(5) }
        );
        assert_eq!(router.node_for_id(b"k").unwrap(), "10.0.0.2:11210".parse().unwrap());

        let snapshot = router.metrics().snapshot();
        assert_eq!(snapshot.publishes_installed, 2);
        assert_eq!(snapshot.publishes_stale, 2);
        assert_eq!(snapshot.revision, 6);
    }

    #[test]
    fn test_node_disconnected_events() {
        let recorder = Arc::new(Recorder::default());
        let router = Router::with_listener(recorder.clone());

        router.publish(topology(1, &["10.0.0.1:11210", "10.0.0.2:11210", "10.0.0.3:11210"]));
        router.publish(topology(2, &["10.0.0.1:11210", "10.0.0.3:11210", "10.0.0.4:11210"]));

        let events = recorder.events.lock().clone();
        assert_eq!(
            events,
            vec![
                TopologyEvent::TopologyChanged {
                    revision: 1,
                    node_count: 3
                },
                TopologyEvent::NodeDisconnected {
                    addr: "10.0.0.2:11210".parse().unwrap(),
                    revision: 2
                },
                TopologyEvent::TopologyChanged {
                    revision: 2,
                    node_count: 3
                },
            ]
        );
        assert_eq!(router.metrics().snapshot().nodes_removed, 1);
    }

    #[test]
    fn test_stale_publish_emits_nothing() {
        let recorder = Arc::new(Recorder::default());
        let router = Router::new();
        router.publish(topology(3, &["10.0.0.1:11210"]));
        router.set_listener(recorder.clone());

        router.publish(topology(2, &["10.0.0.2:11210"]));
        assert!(recorder.events.lock().is_empty());
    }

    #[test]
    fn test_concurrent_publishers_keep_highest_revision() {
        let router = Arc::new(Router::new());
        let threads: Vec<_> = (0..8u64)
            .map(|t| {
                let router = router.clone();
                std::thread::spawn(move || {
                    for rev in 0..50u64 {
                        let revision = rev * 8 + t + 1;
                        router.publish(topology(revision, &["10.0.0.1:11210"]));
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(router.revision(), Some(400));
        let snapshot = router.metrics().snapshot();
        assert_eq!(snapshot.publishes_installed + snapshot.publishes_stale, 400);
    }

    #[test]
    fn test_concurrent_installs_each_reported_once() {
        let recorder = Arc::new(Recorder::default());
        let router = Arc::new(Router::with_listener(recorder.clone()));
        let threads: Vec<_> = (0..4u64)
            .map(|t| {
                let router = router.clone();
                std::thread::spawn(move || {
                    let mut installed = Vec::new();
                    for rev in 0..100u64 {
                        let revision = rev * 4 + t + 1;
                        if router.publish(topology(revision, &["10.0.0.1:11210"])).is_installed() {
                            installed.push(revision);
                        }
                    }
                    installed
                })
            })
            .collect();

        let mut installed: Vec<u64> = threads
            .into_iter()
            .flat_map(|t| t.join().unwrap())
            .collect();
        installed.sort_unstable();

        let mut reported: Vec<u64> = recorder
            .events
            .lock()
            .iter()
            .map(TopologyEvent::revision)
            .collect();
        reported.sort_unstable();

        assert_eq!(reported, installed);
        assert_eq!(reported.last().copied(), router.revision());
        assert_eq!(router.revision(), Some(400));
    }
}
