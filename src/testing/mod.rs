//! End-to-end tests for the routing core.
//!
//! These wire the real scheduler, refresher and router together and drive
//! them with configuration streams split the way a socket would split them.
//!
//! ```text
//! ┌──────────────┐  chunks  ┌───────────────────┐ publish ┌────────┐
//! │ ConfigStream │ ───────▶ │ TopologyRefresher │ ──────▶ │ Router │
//! └──────────────┘          └───────────────────┘         └────────┘
//!                                                              │
//!                                                  EventRecorder ◀┘
//! ```

mod utils;
