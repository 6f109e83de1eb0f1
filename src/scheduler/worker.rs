//! Single-threaded pool workers.
//!
//! Each worker owns one OS thread running a current-thread tokio runtime.
//! Immediate tasks arrive on an unbounded MPSC channel and run one at a time
//! in submission order. Delayed tasks become timers on the same runtime, so
//! they also run on the worker thread and never overlap another task.

use super::task::{Action, ScheduledTask, TaskHandle};
use crate::metrics::SchedulerMetrics;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Index reported by the inert worker.
pub(crate) const INERT_WORKER_INDEX: usize = usize::MAX;

/// A worker thread with a private task queue.
#[derive(Debug)]
pub(crate) struct PoolWorker {
    index: usize,
    /// `None` for the inert worker.
    tx: Option<mpsc::UnboundedSender<ScheduledTask>>,
    terminated: CancellationToken,
    metrics: Arc<SchedulerMetrics>,
}

impl PoolWorker {
    /// Start a worker thread named `name`.
    pub(crate) fn spawn(
        index: usize,
        name: String,
        metrics: Arc<SchedulerMetrics>,
    ) -> io::Result<Arc<Self>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let terminated = CancellationToken::new();

        let loop_terminated = terminated.clone();
        let loop_metrics = metrics.clone();
        std::thread::Builder::new().name(name.clone()).spawn(move || {
            runtime.block_on(run_loop(index, rx, loop_terminated, loop_metrics.clone()));
            // Dropping the runtime drops every delayed task still waiting.
            drop(runtime);
            loop_metrics.workers_terminated.inc();
            loop_metrics.live_workers.dec();
            debug!(worker = index, "Worker stopped");
        })?;

        metrics.live_workers.inc();
        debug!(worker = index, thread = %name, "Worker started");

        Ok(Arc::new(Self {
            index,
            tx: Some(tx),
            terminated,
            metrics,
        }))
    }

    /// A worker without a thread. Accepts every task and runs none of them.
    pub(crate) fn inert(metrics: Arc<SchedulerMetrics>) -> Self {
        let terminated = CancellationToken::new();
        terminated.cancel();
        Self {
            index: INERT_WORKER_INDEX,
            tx: None,
            terminated,
            metrics,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated.is_cancelled()
    }

    /// Enqueue `action`. Never fails: a stopped worker drops the task and
    /// returns an inactive handle.
    pub(crate) fn submit(
        &self,
        action: Action,
        delay: Option<Duration>,
        token: CancellationToken,
    ) -> TaskHandle {
        let Some(tx) = self.tx.as_ref().filter(|_| !self.is_terminated()) else {
            return self.drop_task();
        };

        let task = ScheduledTask::new(action, delay, token.clone());
        if tx.send(task).is_err() {
            return self.drop_task();
        }

        self.metrics.tasks_submitted.inc();
        TaskHandle::new(token)
    }

    fn drop_task(&self) -> TaskHandle {
        self.metrics.tasks_dropped.inc();
        trace!(worker = self.index, "Dropping task submitted to stopped worker");
        TaskHandle::rejected()
    }

    /// Stop the worker loop. Queued and delayed tasks are discarded; a task
    /// already running finishes.
    pub(crate) fn terminate(&self) {
        self.terminated.cancel();
    }
}

async fn run_loop(
    index: usize,
    mut rx: mpsc::UnboundedReceiver<ScheduledTask>,
    terminated: CancellationToken,
    metrics: Arc<SchedulerMetrics>,
) {
    loop {
        tokio::select! {
            biased;
            _ = terminated.cancelled() => break,
            task = rx.recv() => {
                let Some(task) = task else { break };
                match task.delay {
                    None => task.run(index, &metrics),
                    Some(delay) => {
                        tokio::spawn(run_delayed(index, task, delay, metrics.clone()));
                    }
                }
            }
        }
    }
}

async fn run_delayed(
    index: usize,
    task: ScheduledTask,
    delay: Duration,
    metrics: Arc<SchedulerMetrics>,
) {
    let token = task.token.clone();
    tokio::select! {
        _ = tokio::time::sleep(delay) => task.run(index, &metrics),
        _ = token.cancelled() => metrics.tasks_cancelled.inc(),
    }
}

impl Drop for PoolWorker {
    fn drop(&mut self) {
        self.terminated.cancel();
    }
}
