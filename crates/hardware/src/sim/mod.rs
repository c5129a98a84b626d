//! Simulation driver.
//!
//! Feeds operand streams into the FP-add reservation stations and collects results and
//! statistics.

/// Tick-by-tick driver for the FP-add unit.
pub mod simulator;

pub use simulator::Simulator;
