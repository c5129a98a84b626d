//! IEEE-754 floating-point adder.
//!
//! The adder is written once as a sequence of combinational stages and realised three
//! ways:
//! 1. **FpAddPipe:** The stages grouped into three chains, each wrapped in a pipeline
//!    controller chosen by configuration.
//! 2. **FpAddFsm:** A single-issue state machine stepping one state per tick, with
//!    bit-serial alignment and normalisation.
//! 3. **FpAddMuxInOut:** Reservation stations feeding several lanes into one `FpAddPipe`.
//!
//! Results are correctly rounded (nearest, ties to even) for binary16, binary32 and
//! binary64. Every operand pair produces a result; invalid operations yield the
//! default NaN.

/// Mantissa addition and carry fix-up.
pub mod add;

/// Exponent alignment, single-shot and bit-serial.
pub mod align;

/// Records passed between stages.
pub mod data;

/// Binary interchange format parameters.
pub mod format;

/// State-machine realisation.
pub mod fsm;

/// Reservation stations around the pipelined adder.
pub mod mux;

/// Post-add normalisation.
pub mod normalise;

/// Decoded numbers and rounding bits.
pub mod num;

/// Result packing.
pub mod pack;

/// Pipelined realisation.
pub mod pipeline;

/// Rounding and corrections.
pub mod round;

/// Special cases and denormalisation.
pub mod specialcases;

pub use data::{FpAddInput, FpContext, FpPackData};
pub use format::FpFormat;
pub use fsm::{FpAddFsm, FsmState};
pub use mux::{FpAddMuxInOut, fpadd_mux_in_out};
pub use num::{FpNum, Overflow};
pub use pipeline::FpAddPipe;
