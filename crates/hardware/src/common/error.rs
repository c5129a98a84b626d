//! Error definitions.
//!
//! This module defines the errors raised while a pipeline is being assembled or driven.
//! It provides:
//! 1. **Wiring Errors:** Empty chains, shape mismatches, and port misuse.
//! 2. **Graph Errors:** Combinational loops and cycles without a designated feedback link.
//! 3. **Parameter Errors:** Unsupported widths, zero depths, and lane count mismatches.
//! 4. **Simulation Errors:** A run that did not drain within its cycle budget.
//!
//! Protocol violations at run time (writing a full queue, routing to a missing lane) are
//! caller logic errors and panic instead of returning one of these.

use thiserror::Error;

/// Error raised while building a stage chain, a controller, or a pipeline graph.
///
/// Every variant describes a malformed wiring diagram or parameter set. None of them
/// can occur once a pipeline has been built; from then on the model is a total function
/// of its registers and inputs.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A stage chain was requested with no stages.
    #[error("a stage chain needs at least one stage")]
    EmptyChain,

    /// `connect()` was called with no pipelines.
    #[error("connect() needs at least one pipeline")]
    EmptyConnect,

    /// The output shape of one stage cannot be assigned to the input of the next.
    #[error("output shape `{from}` is not assignable to input shape `{to}`")]
    ShapeMismatch {
        /// Name of the producing shape.
        from: String,
        /// Name of the consuming shape.
        to: String,
    },

    /// A multiplexer or arbiter was given a different number of lanes than it was built for.
    #[error("expected {expected} lanes, found {found}")]
    LaneCountMismatch {
        /// Lane count the component was configured with.
        expected: usize,
        /// Lane count actually supplied.
        found: usize,
    },

    /// More lanes were requested than the mux ID field can name.
    #[error("{lanes} lanes requested, at most {max} supported")]
    TooManyLanes {
        /// Lane count requested.
        lanes: usize,
        /// Largest supported lane count.
        max: usize,
    },

    /// A multiplexer or arbiter was requested with zero lanes.
    #[error("at least one lane is required")]
    NoLanes,

    /// Per-lane masks do not fit the 64-bit mask bus.
    #[error("{lanes} lanes of {width}-bit masks exceed 64 bits")]
    MaskTooWide {
        /// Number of lanes.
        lanes: usize,
        /// Mask width per lane.
        width: u32,
    },

    /// A queue was requested with depth zero.
    #[error("queue depth must be at least 1")]
    ZeroDepth,

    /// The IEEE-754 width is not one of 16, 32 or 64.
    #[error("unsupported IEEE-754 width {0} (expected 16, 32 or 64)")]
    UnsupportedWidth(u32),

    /// A link refers to a port index the node does not have.
    #[error("node `{node}` has no {direction} port {index}")]
    PortOutOfRange {
        /// Name of the node.
        node: String,
        /// `"input"` or `"output"`.
        direction: &'static str,
        /// Offending port index.
        index: usize,
    },

    /// Two links drive, or are driven by, the same port.
    #[error("{direction} port {index} of node `{node}` is linked more than once")]
    PortAlreadyLinked {
        /// Name of the node.
        node: String,
        /// `"input"` or `"output"`.
        direction: &'static str,
        /// Offending port index.
        index: usize,
    },

    /// Non-feedback links form a cycle.
    #[error("cycle through {0:?} is not closed by a designated feedback link")]
    UndeclaredCycle(Vec<String>),

    /// A cycle exists in which every node passes signals through combinationally.
    #[error("combinational loop through {0:?}")]
    CombinationalLoop(Vec<String>),

    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Error raised while driving a built pipeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    /// `run_until_idle` hit its cycle budget with work still queued or in flight.
    #[error("not idle after {max_cycles} cycles ({outstanding} operations outstanding)")]
    CycleBudget {
        /// The budget that was exhausted.
        max_cycles: u64,
        /// Operations still queued or in flight.
        outstanding: u64,
    },
}
