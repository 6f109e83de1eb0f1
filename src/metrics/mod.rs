//! Metrics for the scheduler and the router.
//!
//! Prometheus-style counters and gauges backed by atomics:
//! - scheduler task flow and pool lifecycle
//! - topology publishes, lookups and decode failures
//!
//! # Example
//!
//! ```rust
//! use cluster_router::metrics::RoutingMetrics;
//!
//! let metrics = RoutingMetrics::new();
//! metrics.record_installed(7, 3);
//! assert_eq!(metrics.snapshot().revision, 7);
//! ```

mod counters;
mod gauges;

pub use counters::Counter;
pub use gauges::Gauge;

fn push_counter(output: &mut String, counter: &Counter) {
    output.push_str(&format!(
        "# HELP {} {}\n# TYPE {} counter\n{} {}\n",
        counter.name(),
        counter.help(),
        counter.name(),
        counter.name(),
        counter.get()
    ));
}

fn push_gauge(output: &mut String, gauge: &Gauge) {
    output.push_str(&format!(
        "# HELP {} {}\n# TYPE {} gauge\n{} {}\n",
        gauge.name(),
        gauge.help(),
        gauge.name(),
        gauge.name(),
        gauge.get()
    ));
}

/// Metrics for the worker pool scheduler.
#[derive(Debug)]
pub struct SchedulerMetrics {
    /// Tasks accepted by a live worker.
    pub tasks_submitted: Counter,
    /// Tasks that ran to completion or panicked.
    pub tasks_executed: Counter,
    /// Tasks skipped because they were cancelled before running.
    pub tasks_cancelled: Counter,
    /// Tasks dropped because no live worker accepted them.
    pub tasks_dropped: Counter,
    /// Tasks whose action panicked.
    pub tasks_panicked: Counter,
    /// Pools installed by `start`.
    pub pools_started: Counter,
    /// Pools torn down by `shutdown` or a lost `start` race.
    pub pools_stopped: Counter,
    /// Worker threads that exited their loop.
    pub workers_terminated: Counter,
    /// Worker threads currently running.
    pub live_workers: Gauge,
}

impl SchedulerMetrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self {
            tasks_submitted: Counter::new("scheduler_tasks_submitted", "Tasks accepted by a worker"),
            tasks_executed: Counter::new("scheduler_tasks_executed", "Tasks executed"),
            tasks_cancelled: Counter::new("scheduler_tasks_cancelled", "Tasks cancelled before running"),
            tasks_dropped: Counter::new("scheduler_tasks_dropped", "Tasks dropped by stopped workers"),
            tasks_panicked: Counter::new("scheduler_tasks_panicked", "Tasks whose action panicked"),
            pools_started: Counter::new("scheduler_pools_started", "Worker pools started"),
            pools_stopped: Counter::new("scheduler_pools_stopped", "Worker pools torn down"),
            workers_terminated: Counter::new("scheduler_workers_terminated", "Worker threads exited"),
            live_workers: Gauge::new("scheduler_live_workers", "Worker threads running"),
        }
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> SchedulerMetricsSnapshot {
        SchedulerMetricsSnapshot {
            tasks_submitted: self.tasks_submitted.get(),
            tasks_executed: self.tasks_executed.get(),
            tasks_cancelled: self.tasks_cancelled.get(),
            tasks_dropped: self.tasks_dropped.get(),
            tasks_panicked: self.tasks_panicked.get(),
            pools_started: self.pools_started.get(),
            pools_stopped: self.pools_stopped.get(),
            workers_terminated: self.workers_terminated.get(),
            live_workers: self.live_workers.get(),
        }
    }

    /// Format metrics in Prometheus exposition format.
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();
        for counter in [
            &self.tasks_submitted,
            &self.tasks_executed,
            &self.tasks_cancelled,
            &self.tasks_dropped,
            &self.tasks_panicked,
            &self.pools_started,
            &self.pools_stopped,
            &self.workers_terminated,
        ] {
            push_counter(&mut output, counter);
        }
        push_gauge(&mut output, &self.live_workers);
        output
    }
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`SchedulerMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerMetricsSnapshot {
    pub tasks_submitted: u64,
    pub tasks_executed: u64,
    pub tasks_cancelled: u64,
    pub tasks_dropped: u64,
    pub tasks_panicked: u64,
    pub pools_started: u64,
    pub pools_stopped: u64,
    pub workers_terminated: u64,
    pub live_workers: i64,
}

/// Metrics for topology publication and routing.
#[derive(Debug)]
pub struct RoutingMetrics {
    /// Topologies installed.
    pub publishes_installed: Counter,
    /// Topologies discarded as stale.
    pub publishes_stale: Counter,
    /// Key lookups served.
    pub lookups: Counter,
    /// Lookups attempted with no topology.
    pub lookups_empty: Counter,
    /// Configuration documents that failed to decode or build.
    pub decode_failures: Counter,
    /// Nodes that disappeared from a published topology.
    pub nodes_removed: Counter,
    /// Revision of the installed topology.
    pub revision: Gauge,
    /// Node count of the installed topology.
    pub node_count: Gauge,
}

impl RoutingMetrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self {
            publishes_installed: Counter::new("topology_publishes_installed", "Topologies installed"),
            publishes_stale: Counter::new("topology_publishes_stale", "Stale topologies discarded"),
            lookups: Counter::new("routing_lookups", "Key lookups served"),
            lookups_empty: Counter::new("routing_lookups_empty", "Lookups without topology"),
            decode_failures: Counter::new("topology_decode_failures", "Undecodable configuration documents"),
            nodes_removed: Counter::new("topology_nodes_removed", "Nodes removed from the topology"),
            revision: Gauge::new("topology_revision", "Installed topology revision"),
            node_count: Gauge::new("topology_node_count", "Installed topology node count"),
        }
    }

    /// Record an installed topology.
    pub fn record_installed(&self, revision: u64, node_count: usize) {
        self.publishes_installed.inc();
        self.revision.set(revision as i64);
        self.node_count.set(node_count as i64);
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> RoutingMetricsSnapshot {
        RoutingMetricsSnapshot {
            publishes_installed: self.publishes_installed.get(),
            publishes_stale: self.publishes_stale.get(),
            lookups: self.lookups.get(),
            lookups_empty: self.lookups_empty.get(),
            decode_failures: self.decode_failures.get(),
            nodes_removed: self.nodes_removed.get(),
            revision: self.revision.get(),
            node_count: self.node_count.get(),
        }
    }

    /// Format metrics in Prometheus exposition format.
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();
        for counter in [
            &self.publishes_installed,
            &self.publishes_stale,
            &self.lookups,
            &self.lookups_empty,
            &self.decode_failures,
            &self.nodes_removed,
        ] {
            push_counter(&mut output, counter);
        }
        push_gauge(&mut output, &self.revision);
        push_gauge(&mut output, &self.node_count);
        output
    }
}

impl Default for RoutingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`RoutingMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingMetricsSnapshot {
    pub publishes_installed: u64,
    pub publishes_stale: u64,
    pub lookups: u64,
    pub lookups_empty: u64,
    pub decode_failures: u64,
    pub nodes_removed: u64,
    pub revision: i64,
    pub node_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_prometheus_output() {
        let metrics = RoutingMetrics::new();
        metrics.record_installed(12, 3);
        metrics.lookups.inc_by(5);

        let output = metrics.to_prometheus();

        assert!(output.contains("# HELP routing_lookups Key lookups served\n"));
        assert!(output.contains("# TYPE routing_lookups counter\nrouting_lookups 5\n"));
        assert!(output.contains("# TYPE topology_revision gauge\ntopology_revision 12\n"));
        assert!(output.contains("topology_node_count 3\n"));
    }

    #[test]
    fn test_scheduler_prometheus_output() {
        let metrics = SchedulerMetrics::new();
        metrics.tasks_dropped.inc();
        metrics.live_workers.set(4);

        let output = metrics.to_prometheus();

        assert!(output.contains("scheduler_tasks_dropped 1\n"));
        assert!(output.contains("# TYPE scheduler_live_workers gauge\nscheduler_live_workers 4\n"));
        assert_eq!(output.matches("# TYPE").count(), 9);
    }
}
