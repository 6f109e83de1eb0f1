//! Worker pool scheduler for internal, non-blocking dispatch.
//!
//! Topology refreshes and other internal work run here so the calling thread
//! never blocks.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                      CoreScheduler                        │
//! │   pool: ArcSwapOption<FixedPool>        inert worker      │
//! │  ┌─────────────────────────────────────────────────────┐  │
//! │  │ FixedPool   next: AtomicUsize (round robin)         │  │
//! │  │  ┌──────────┐  ┌──────────┐  ┌──────────┐           │  │
//! │  │  │ worker 0 │  │ worker 1 │  │ worker 2 │  ...      │  │
//! │  │  │ mpsc  ⏱  │  │ mpsc  ⏱  │  │ mpsc  ⏱  │           │  │
//! │  │  └──────────┘  └──────────┘  └──────────┘           │  │
//! │  └─────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//!        ▲ create_worker() → WorkerHandle (lane on one worker)
//!        ▲ schedule_direct(action)
//! ```
//!
//! # Example
//!
//! ```rust
//! use cluster_router::scheduler::{CoreScheduler, Worker};
//! use cluster_router::SchedulerConfig;
//! use std::sync::mpsc;
//!
//! let scheduler = CoreScheduler::new(SchedulerConfig::new(2));
//! let lane = scheduler.create_worker();
//! let (tx, rx) = mpsc::channel();
//! lane.schedule(move || tx.send(42).unwrap());
//! assert_eq!(rx.recv().unwrap(), 42);
//!
//! assert!(scheduler.shutdown());
//! assert!(scheduler.shutdown());
//! ```

mod core_scheduler;
mod handle;
mod pool;
mod task;
mod worker;

pub use core_scheduler::CoreScheduler;
pub use handle::{Worker, WorkerHandle};
pub use task::{Action, TaskHandle};
