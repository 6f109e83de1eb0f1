//! Scheduled tasks and their cancellation handles.

use crate::metrics::SchedulerMetrics;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::warn;

/// A unit of work submitted to a worker.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a single scheduled task.
///
/// Cancelling prevents the task from running if it has not started yet. It
/// has no effect on a task that is already running.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    token: CancellationToken,
}

impl TaskHandle {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// A handle for a task that was never accepted.
    pub(crate) fn rejected() -> Self {
        let token = CancellationToken::new();
        token.cancel();
        Self { token }
    }

    /// Cancel the task.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the task is still pending or running.
    ///
    /// Returns `false` once the task has finished, was cancelled, or was
    /// dropped by a stopped worker.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

/// A task owned by exactly one worker.
///
/// Dropping a task, run or not, cancels its token, so handles of tasks
/// discarded by a stopping worker turn inactive.
pub(crate) struct ScheduledTask {
    pub(crate) action: Action,
    pub(crate) delay: Option<Duration>,
    pub(crate) token: CancellationToken,
    _done: DropGuard,
}

impl ScheduledTask {
    pub(crate) fn new(action: Action, delay: Option<Duration>, token: CancellationToken) -> Self {
        Self {
            action,
            delay,
            _done: token.clone().drop_guard(),
            token,
        }
    }

    /// Run the action unless it was cancelled. A panicking action is caught
    /// so the worker survives it.
    pub(crate) fn run(self, worker: usize, metrics: &SchedulerMetrics) {
        if self.token.is_cancelled() {
            metrics.tasks_cancelled.inc();
            return;
        }

        let outcome = catch_unwind(AssertUnwindSafe(self.action));
        metrics.tasks_executed.inc();
        if outcome.is_err() {
            metrics.tasks_panicked.inc();
            warn!(worker, "Scheduled action panicked");
        }
    }
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("delay", &self.delay)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_run_marks_handle_inactive() {
        let metrics = SchedulerMetrics::new();
        let token = CancellationToken::new();
        let handle = TaskHandle::new(token.clone());
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();

        assert!(handle.is_active());
        ScheduledTask::new(Box::new(move || { h.fetch_add(1, Ordering::SeqCst); }), None, token)
            .run(0, &metrics);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!handle.is_active());
        assert_eq!(metrics.tasks_executed.get(), 1);
    }

    #[test]
    fn test_cancelled_task_is_skipped() {
        let metrics = SchedulerMetrics::new();
        let token = CancellationToken::new();
        let handle = TaskHandle::new(token.clone());
        handle.cancel();

        ScheduledTask::new(Box::new(|| panic!("must not run")), None, token).run(0, &metrics);
        assert_eq!(metrics.tasks_cancelled.get(), 1);
        assert_eq!(metrics.tasks_executed.get(), 0);
    }

    #[test]
    fn test_panic_is_contained() {
        let metrics = SchedulerMetrics::new();
        ScheduledTask::new(Box::new(|| panic!("boom")), None, CancellationToken::new())
            .run(3, &metrics);
        assert_eq!(metrics.tasks_panicked.get(), 1);
        assert_eq!(metrics.tasks_executed.get(), 1);
    }

    #[test]
    fn test_dropped_task_turns_handle_inactive() {
        let token = CancellationToken::new();
        let handle = TaskHandle::new(token.clone());
        let task = ScheduledTask::new(Box::new(|| panic!("must not run")), None, token);

        assert!(handle.is_active());
        drop(task);
        assert!(!handle.is_active());
    }

    #[test]
    fn test_rejected_handle() {
        assert!(!TaskHandle::rejected().is_active());
    }
}
