//! Client-side cluster topology routing core.
//!
//! This crate provides the pieces a database client needs to route document
//! operations to the right cluster node:
//! - **Boundary scanner** to split a streamed configuration into JSON documents
//! - **Consistent hash ring** (ketama or xxHash64 vnodes) mapping keys to nodes
//! - **Router** holding the current topology behind a lock-free swap
//! - **Core scheduler** running internal work on a fixed pool of worker threads
//!
//! # Example
//!
//! ```rust
//! use cluster_router::{ClientConfig, CoreScheduler, Router, TopologyRefresher};
//! use std::sync::Arc;
//!
//! let config = ClientConfig::new();
//! let router = Arc::new(Router::new());
//! let scheduler = CoreScheduler::new(config.scheduler.clone());
//! let refresher = TopologyRefresher::new(router.clone(), &scheduler, &config);
//!
//! let document = br#"{"rev":1,"nodes":[{"hostname":"10.0.0.1","ports":{"direct":11210}}]}"#;
//! refresher.process_now(document);
//!
//! let owner = router.node_for_id(b"user:123").unwrap();
//! assert_eq!(owner, "10.0.0.1:11210".parse::<std::net::SocketAddr>().unwrap());
//!
//! scheduler.shutdown();
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │        management connection (bytes)        │
//! └─────────────────────────────────────────────┘
//!                     │ feed(chunk)
//!                     ▼
//! ┌─────────────────────────────────────────────┐
//! │   TopologyRefresher (one scheduler lane)    │
//! │  DocumentStream ─▶ Topology::parse          │
//! └─────────────────────────────────────────────┘
//!                     │ publish(topology)
//!                     ▼
//! ┌─────────────────────────────────────────────┐
//! │   Router  (ArcSwapOption<Topology>)         │
//! │  • node_for_id(key) -> SocketAddr           │
//! │  • TopologyEvent -> listener                │
//! └─────────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────────┐
//! │   HashRing  (BTreeMap<u64, Node>)           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Consistency Model
//!
//! - **Lookups** never block and always see one complete topology.
//! - **Publishes** only install strictly newer revisions.
//! - **Refreshes** run serially, in arrival order.

pub mod config;
pub mod error;
pub mod metrics;
pub mod partitioning;
pub mod refresh;
pub mod routing;
pub mod scanner;
pub mod scheduler;
#[cfg(test)]
mod testing;
pub mod types;

// Re-export main types for convenience
pub use config::{ClientConfig, RefreshConfig, RingConfig, SchedulerConfig, StreamConfig};
pub use error::{Error, Result};
pub use types::Node;

// Re-export partitioning types
pub use partitioning::{HashRing, RingHasher, Topology, TopologyDocument};

// Re-export routing types
pub use routing::{PublishOutcome, Router, TopologyEvent, TopologyEventListener};

// Re-export scheduler types
pub use scheduler::{CoreScheduler, TaskHandle, Worker, WorkerHandle};

// Re-export scanner types
pub use scanner::{BoundaryScanner, DocumentStream, ScanState};

// Re-export metrics types
pub use metrics::{Counter, Gauge, RoutingMetrics, SchedulerMetrics};

pub use refresh::TopologyRefresher;
