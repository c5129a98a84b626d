//! Valid/ready pipeline composition framework.
//!
//! This module contains the building blocks for cycle-accurate pipelines.
//! It includes the following components:
//! 1. **Records:** Payload shapes and the traits every payload implements.
//! 2. **Signals:** The `PrevControl`/`NextControl` halves of a handshake link.
//! 3. **Traits:** The `Stage`, `Clocked` and `Pipe` interfaces.
//! 4. **Stages:** Reusable stages and combinational stage chains.
//! 5. **Controllers:** Handshake disciplines that wrap a stage with registers.
//! 6. **Connect:** Straight-line composition of pipes.
//! 7. **Builder:** Validated graphs with fan-in, fan-out and feedback.
//! 8. **Multipipe:** Priority fan-in, mux-ID fan-out and reservation stations.

/// Graph builder with combinational-loop detection.
pub mod builder;

/// Pipeline controllers (unbuffered, FIFO-backed, handshake, cancellable).
pub mod controllers;

/// Straight-line composition of pipes.
pub mod connect;

/// Multi-lane fan-in and fan-out.
pub mod multipipe;

/// Payload shapes, records and mux IDs.
pub mod record;

/// Handshake link signals and per-tick records.
pub mod signals;

/// Stage implementations and stage chains.
pub mod stage;

/// Traits for stages and clocked components.
pub mod traits;

pub use builder::{Link, Node, NodeId, PipeNode, PipelineBuilder, PipelineGraph};
pub use connect::{Connected, PipeChain};
pub use record::{Field, MuxId, Record, Shape};
pub use signals::{NextControl, PrevControl, TickInputs, TickOutputs};
pub use stage::{FnStage, PassThroughStage, StageChain, StageList};
pub use traits::{Clocked, CombPaths, Pipe, Stage};
