//! Cycle-accurate valid/ready pipeline model.
//!
//! This crate models synchronous hardware pipelines as software, with the following:
//! 1. **Framework:** Handshake links, combinational stages, pipeline controllers,
//!    composition with `connect()`, and validated pipeline graphs.
//! 2. **Multiplexing:** Priority fan-in, mux-ID routed fan-out, and reservation stations.
//! 3. **FP adder:** An IEEE-754 binary16/32/64 adder built from stages on controllers,
//!    as a pipeline and as a state machine.
//! 4. **Simulation:** Configuration, a tick-by-tick driver, and statistics collection.

/// Common types (bit helpers, errors).
pub mod common;
/// Simulator configuration (defaults, controller kinds, hierarchical config structures).
pub mod config;
/// Pipeline framework and the units built on it.
pub mod core;
/// Tick-by-tick simulation driver.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// FP adder realisations.
pub use crate::core::units::fpu::{FpAddFsm, FpAddMuxInOut, FpAddPipe};
/// Simulation driver; construct with `Simulator::new`.
pub use crate::sim::Simulator;
/// Statistics of a simulator run.
pub use crate::stats::PipeStats;
