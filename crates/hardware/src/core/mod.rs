//! Pipeline framework and the units built on it.
//!
//! This module contains the valid/ready pipeline framework (handshake signals, stages,
//! controllers, composition and multiplexing) and the functional units assembled from
//! it.

/// Handshake framework: stages, controllers, composition and muxing.
pub mod pipeline;

/// Functional units (FP adder).
pub mod units;
