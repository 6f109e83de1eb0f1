//! Fixed-size pool of workers with round-robin selection.

use super::worker::PoolWorker;
use crate::config::SchedulerConfig;
use crate::metrics::SchedulerMetrics;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::error;

/// A fixed set of workers.
#[derive(Debug)]
pub(crate) struct FixedPool {
    workers: Vec<Arc<PoolWorker>>,
    next: AtomicUsize,
}

impl FixedPool {
    /// Start `config.pool_size` workers.
    ///
    /// A worker whose thread cannot be started is replaced by an inert one,
    /// so the pool always has the configured size.
    pub(crate) fn new(config: &SchedulerConfig, metrics: &Arc<SchedulerMetrics>) -> Self {
        let size = config.pool_size.max(1);
        let workers = (0..size)
            .map(|index| {
                let name = format!("{}{}", config.thread_name_prefix, index);
                PoolWorker::spawn(index, name, metrics.clone()).unwrap_or_else(|e| {
                    error!(worker = index, error = %e, "Failed to start worker thread");
                    Arc::new(PoolWorker::inert(metrics.clone()))
                })
            })
            .collect();

        Self {
            workers,
            next: AtomicUsize::new(0),
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.workers.len()
    }

    /// Pick the next worker in round-robin order.
    pub(crate) fn next_worker(&self) -> Arc<PoolWorker> {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        self.workers[n % self.workers.len()].clone()
    }

    /// Stop every worker.
    pub(crate) fn shutdown(&self) {
        for worker in &self.workers {
            worker.terminate();
        }
    }
}
