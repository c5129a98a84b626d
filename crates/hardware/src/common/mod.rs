//! Common utilities and types used throughout the pipeline model.
//!
//! This module provides building blocks shared by every layer. It includes:
//! 1. **Bit Helpers:** Masks, leading-zero counts, and the sticky-merging right shifter.
//! 2. **Error Handling:** Errors raised while assembling and while driving pipelines.

/// Bit-vector helpers for modelled hardware signals.
pub mod bits;

/// Build and simulation error types.
pub mod error;

pub use bits::{mask, num_bits};
pub use error::{BuildError, SimError};
