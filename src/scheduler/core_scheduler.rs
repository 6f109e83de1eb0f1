//! The worker pool scheduler.

use super::handle::WorkerHandle;
use super::pool::FixedPool;
use super::task::TaskHandle;
use super::worker::PoolWorker;
use crate::config::SchedulerConfig;
use crate::metrics::SchedulerMetrics;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Fixed pool of single-threaded workers with idempotent lifecycle control.
///
/// # Lifecycle
///
/// The pool cell is either active (`Some(pool)`) or stopped (`None`) and only
/// changes through atomic swaps:
///
/// ```text
///            start()                       shutdown()
///  Stopped ───────────▶ Active(pool) ───────────────▶ Stopped
///     ▲  lost race: new pool torn down          │ pool torn down once
///     └─────────────────────────────────────────┘
/// ```
///
/// Scheduling never fails. While stopped, work is bound to an inert worker
/// that accepts and drops it.
#[derive(Debug)]
pub struct CoreScheduler {
    config: SchedulerConfig,
    pool: ArcSwapOption<FixedPool>,
    inert: Arc<PoolWorker>,
    metrics: Arc<SchedulerMetrics>,
}

impl CoreScheduler {
    /// Create a scheduler and start its pool.
    pub fn new(config: SchedulerConfig) -> Self {
        let metrics = Arc::new(SchedulerMetrics::new());
        let scheduler = Self {
            inert: Arc::new(PoolWorker::inert(metrics.clone())),
            config,
            pool: ArcSwapOption::empty(),
            metrics,
        };
        scheduler.start();
        scheduler
    }

    /// Scheduler metrics.
    pub fn metrics(&self) -> &SchedulerMetrics {
        &self.metrics
    }

    /// Configured number of workers.
    pub fn pool_size(&self) -> usize {
        self.config.pool_size.max(1)
    }

    /// Start a new pool if none is active.
    ///
    /// The pool is built first and then installed with a compare-and-swap.
    /// If another pool is already active the new one is torn down, so at most
    /// one pool is ever live.
    pub fn start(&self) {
        let fresh = Arc::new(FixedPool::new(&self.config, &self.metrics));
        let prev = self
            .pool
            .compare_and_swap(&None::<Arc<FixedPool>>, Some(fresh.clone()));

        if prev.is_some() {
            fresh.shutdown();
            self.metrics.pools_stopped.inc();
            debug!("Scheduler already active, discarded new pool");
        } else {
            self.metrics.pools_started.inc();
            info!(
                workers = fresh.size(),
                prefix = %self.config.thread_name_prefix,
                "Scheduler started"
            );
        }
    }

    /// Stop the active pool.
    ///
    /// Always succeeds and is idempotent: concurrent callers race on a single
    /// atomic swap and only the winner tears the pool down.
    pub fn shutdown(&self) -> bool {
        if let Some(pool) = self.pool.swap(None) {
            pool.shutdown();
            self.metrics.pools_stopped.inc();
            info!(workers = pool.size(), "Scheduler shut down");
        }
        true
    }

    /// Whether no pool is active.
    pub fn is_shutdown(&self) -> bool {
        self.pool.load().is_none()
    }

    /// Wait until every worker thread of this scheduler has exited.
    ///
    /// Returns `false` if threads are still running after `timeout`.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.metrics.live_workers.get() > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        true
    }

    fn select_worker(&self) -> Arc<PoolWorker> {
        match &*self.pool.load() {
            Some(pool) => pool.next_worker(),
            None => self.inert.clone(),
        }
    }

    /// Create a lane bound to the next worker in round-robin order.
    ///
    /// While stopped, the lane is bound to the inert worker.
    pub fn create_worker(&self) -> WorkerHandle {
        WorkerHandle::new(self.select_worker())
    }

    /// Run `action` on the next worker without creating a lane.
    pub fn schedule_direct<F>(&self, action: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.select_worker()
            .submit(Box::new(action), None, CancellationToken::new())
    }
}

impl Default for CoreScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl Drop for CoreScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
