//! Worker handles bound to a single pool worker.

use super::task::{Action, TaskHandle};
use super::worker::PoolWorker;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Scheduling capability of a worker lane.
///
/// Tasks scheduled through the same lane run one at a time, in submission
/// order for immediate tasks.
pub trait Worker {
    /// Run `action` as soon as the worker is free.
    fn schedule<F>(&self, action: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static;

    /// Run `action` after `delay`.
    fn schedule_delayed<F>(&self, action: F, delay: Duration) -> TaskHandle
    where
        F: FnOnce() + Send + 'static;

    /// Cancel every pending task of this lane and refuse new ones.
    fn cancel(&self);

    /// Whether [`cancel`](Self::cancel) was called.
    fn is_cancelled(&self) -> bool;
}

/// A lane bound to one pool worker, created by
/// [`CoreScheduler::create_worker`](super::CoreScheduler::create_worker).
///
/// Several handles may share a worker. Cancelling one handle cancels only the
/// tasks it scheduled.
#[derive(Debug)]
pub struct WorkerHandle {
    worker: Arc<PoolWorker>,
    token: CancellationToken,
}

impl WorkerHandle {
    pub(crate) fn new(worker: Arc<PoolWorker>) -> Self {
        Self {
            worker,
            token: CancellationToken::new(),
        }
    }

    /// Index of the bound worker in its pool.
    pub fn worker_index(&self) -> usize {
        self.worker.index()
    }

    /// Whether the bound worker is stopped (or is the inert worker).
    pub fn is_worker_terminated(&self) -> bool {
        self.worker.is_terminated()
    }

    fn submit(&self, action: Action, delay: Option<Duration>) -> TaskHandle {
        if self.token.is_cancelled() {
            return TaskHandle::rejected();
        }
        self.worker.submit(action, delay, self.token.child_token())
    }
}

impl Worker for WorkerHandle {
    fn schedule<F>(&self, action: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Box::new(action), None)
    }

    fn schedule_delayed<F>(&self, action: F, delay: Duration) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Box::new(action), Some(delay))
    }

    fn cancel(&self) {
        self.token.cancel();
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
