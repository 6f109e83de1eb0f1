//! Topology refresh driver.
//!
//! Turns configuration bytes from the management connection into installed
//! topologies:
//!
//! ```text
//! bytes ─▶ DocumentStream ─▶ TopologyDocument ─▶ Topology ─▶ Router::publish
//! ```
//!
//! Every step runs on one scheduler lane, so chunks are processed in arrival
//! order and the caller's I/O thread only enqueues.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::partitioning::{RingHasher, Topology};
use crate::routing::{PublishOutcome, Router};
use crate::scanner::DocumentStream;
use crate::scheduler::{CoreScheduler, TaskHandle, Worker, WorkerHandle};
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Source of configuration bytes for polling refreshes.
pub type FetchFn = Box<dyn Fn() -> Option<Bytes> + Send + Sync + 'static>;

struct RefreshState {
    stream: Mutex<DocumentStream>,
    router: Arc<Router>,
    hasher: RingHasher,
}

impl RefreshState {
    fn process(&self, chunk: &[u8]) -> Vec<PublishOutcome> {
        let documents = {
            let mut stream = self.stream.lock();
            if let Err(e) = stream.push(chunk) {
                self.router.metrics().decode_failures.inc();
                warn!(error = %e, "Skipping oversized configuration");
            }
            stream.drain()
        };

        documents
            .iter()
            .filter_map(|document| match self.build(document) {
                Ok(topology) => Some(self.router.publish(topology)),
                Err(e) => {
                    self.router.metrics().decode_failures.inc();
                    warn!(error = %e, len = document.len(), "Ignoring invalid configuration");
                    None
                }
            })
            .collect()
    }

    fn build(&self, document: &[u8]) -> Result<Topology> {
        let topology = Topology::parse(document, self.hasher)?;
        debug!(
            revision = topology.revision(),
            nodes = topology.nodes().len(),
            "Decoded configuration"
        );
        Ok(topology)
    }
}

/// Feeds configuration streams into a [`Router`].
pub struct TopologyRefresher {
    state: Arc<RefreshState>,
    lane: Arc<WorkerHandle>,
    poll_interval: Duration,
}

impl TopologyRefresher {
    /// Create a refresher publishing into `router`, running on a lane of
    /// `scheduler`.
    pub fn new(router: Arc<Router>, scheduler: &CoreScheduler, config: &ClientConfig) -> Self {
        Self {
            state: Arc::new(RefreshState {
                stream: Mutex::new(DocumentStream::new(&config.stream)),
                router,
                hasher: config.ring.hasher,
            }),
            lane: Arc::new(scheduler.create_worker()),
            poll_interval: config.refresh.poll_interval,
        }
    }

    /// The router this refresher publishes into.
    pub fn router(&self) -> &Arc<Router> {
        &self.state.router
    }

    /// Queue a chunk read from the configuration stream.
    pub fn feed(&self, chunk: impl Into<Bytes>) -> TaskHandle {
        let chunk = chunk.into();
        let state = self.state.clone();
        self.lane.schedule(move || {
            state.process(&chunk);
        })
    }

    /// Process a chunk on the calling thread.
    ///
    /// For callers that already run on a scheduler worker. Do not mix with
    /// [`feed`](Self::feed) for the same stream unless ordering does not
    /// matter.
    pub fn process_now(&self, chunk: &[u8]) -> Vec<PublishOutcome> {
        self.state.process(chunk)
    }

    /// Configured interval for [`schedule_poll`](Self::schedule_poll).
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll `fetch` every `interval` and process what it returns.
    ///
    /// Polling stops when the returned handle is cancelled.
    pub fn schedule_poll<F>(&self, interval: Duration, fetch: F) -> TaskHandle
    where
        F: Fn() -> Option<Bytes> + Send + Sync + 'static,
    {
        let token = CancellationToken::new();
        let poll = Arc::new(Poll {
            state: self.state.clone(),
            lane: self.lane.clone(),
            fetch: Box::new(fetch),
            interval,
            token: token.clone(),
        });
        poll.arm();
        TaskHandle::new(token)
    }

    /// Stop processing: queued chunks and polls are cancelled.
    pub fn stop(&self) {
        self.lane.cancel();
    }
}

impl std::fmt::Debug for TopologyRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyRefresher")
            .field("router", &self.state.router)
            .field("worker", &self.lane.worker_index())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

struct Poll {
    state: Arc<RefreshState>,
    lane: Arc<WorkerHandle>,
    fetch: FetchFn,
    interval: Duration,
    token: CancellationToken,
}

impl Poll {
    fn arm(self: Arc<Self>) {
        if self.token.is_cancelled() {
            return;
        }
        let next = self.clone();
        self.lane.schedule_delayed(move || next.tick(), self.interval);
    }

    fn tick(self: Arc<Self>) {
        if self.token.is_cancelled() {
            return;
        }
        if let Some(bytes) = (self.fetch)() {
            self.state.process(&bytes);
        }
        self.arm();
    }
}
