//! Configuration types for the routing core.

use crate::error::{Error, Result};
use crate::partitioning::RingHasher;
use std::time::Duration;

/// Default thread name prefix for scheduler workers.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "cr-computations-";

/// Main configuration bundling every component.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Worker pool configuration.
    pub scheduler: SchedulerConfig,

    /// Hash ring configuration.
    pub ring: RingConfig,

    /// Configuration stream framing.
    pub stream: StreamConfig,

    /// Topology refresh configuration.
    pub refresh: RefreshConfig,
}

impl ClientConfig {
    /// Create a configuration with defaults for every component.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set scheduler configuration.
    pub fn with_scheduler_config(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Set ring configuration.
    pub fn with_ring_config(mut self, ring: RingConfig) -> Self {
        self.ring = ring;
        self
    }

    /// Set stream configuration.
    pub fn with_stream_config(mut self, stream: StreamConfig) -> Self {
        self.stream = stream;
        self
    }

    /// Set refresh configuration.
    pub fn with_refresh_config(mut self, refresh: RefreshConfig) -> Self {
        self.refresh = refresh;
        self
    }

    /// Check every component for values that cannot work.
    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate()?;
        self.ring.validate()?;
        self.stream.validate()?;
        self.refresh.validate()
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Number of worker threads.
    pub pool_size: usize,

    /// Worker threads are named `{prefix}{index}`.
    pub thread_name_prefix: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            pool_size: cpus.max(1),
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration with a fixed pool size.
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            ..Default::default()
        }
    }

    /// Set the worker thread name prefix.
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(Error::Config("scheduler pool_size must be at least 1".into()));
        }
        Ok(())
    }
}

/// Hash ring configuration.
#[derive(Debug, Clone, Default)]
pub struct RingConfig {
    /// Point placement and key hashing scheme.
    pub hasher: RingHasher,
}

impl RingConfig {
    /// Set the ring hasher.
    pub fn with_hasher(mut self, hasher: RingHasher) -> Self {
        self.hasher = hasher;
        self
    }

    fn validate(&self) -> Result<()> {
        if let RingHasher::XxHash64 { vnodes: 0 } = self.hasher {
            return Err(Error::Config("xxhash ring needs at least one vnode per node".into()));
        }
        Ok(())
    }
}

/// Configuration stream framing.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Upper bound on buffered bytes for a single document.
    pub max_document_size: usize,

    /// Initial buffer capacity.
    pub initial_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_document_size: 4 * 1024 * 1024, // 4MB
            initial_capacity: 8 * 1024,
        }
    }
}

impl StreamConfig {
    /// Set the maximum document size.
    pub fn with_max_document_size(mut self, size: usize) -> Self {
        self.max_document_size = size;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_document_size == 0 {
            return Err(Error::Config("max_document_size must be positive".into()));
        }
        Ok(())
    }
}

/// Topology refresh configuration.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Interval between polling refreshes.
    pub poll_interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2500),
        }
    }
}

impl RefreshConfig {
    /// Set the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::Config("poll_interval must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::new();
        assert!(config.validate().is_ok());
        assert!(config.scheduler.pool_size >= 1);
        assert_eq!(config.scheduler.thread_name_prefix, DEFAULT_THREAD_NAME_PREFIX);
        assert_eq!(config.ring.hasher, RingHasher::Ketama);
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let config = ClientConfig::new().with_scheduler_config(SchedulerConfig::new(0));
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_vnodes_rejected() {
        let config = ClientConfig::new()
            .with_ring_config(RingConfig::default().with_hasher(RingHasher::XxHash64 { vnodes: 0 }));
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::new()
            .with_scheduler_config(SchedulerConfig::new(3).with_thread_name_prefix("io-"))
            .with_stream_config(StreamConfig::default().with_max_document_size(1024))
            .with_refresh_config(RefreshConfig::default().with_poll_interval(Duration::from_secs(1)));

        assert_eq!(config.scheduler.pool_size, 3);
        assert_eq!(config.scheduler.thread_name_prefix, "io-");
        assert_eq!(config.stream.max_document_size, 1024);
        assert_eq!(config.refresh.poll_interval, Duration::from_secs(1));
    }
}
