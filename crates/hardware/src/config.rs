//! Configuration system for the pipeline simulator.
//!
//! This module defines the configuration structures used to parameterize a run. It
//! provides:
//! 1. **Defaults:** Baseline FP width, lane count, queue geometry and cycle limit.
//! 2. **Structures:** Hierarchical config for the FP unit, queues and the simulation loop.
//! 3. **Enums:** The handshake discipline wrapped around each pipeline stage.
//!
//! Configuration is supplied as JSON, or use `Config::default()`.

use serde::Deserialize;
use tracing::debug;

use crate::common::BuildError;
use crate::core::units::fpu::FpContext;

/// Default configuration constants for the simulator.
mod defaults {
    /// IEEE-754 operand width in bits.
    pub const FP_WIDTH: u32 = 32;

    /// Reservation-station lanes in front of the shared adder.
    pub const NUM_ROWS: usize = 4;

    /// Queue depth for FIFO-backed controllers.
    ///
    /// Two slots let the upstream stage run one tick past a stall.
    pub const QUEUE_DEPTH: usize = 2;

    /// Cycle budget for `run_until_idle`.
    pub const MAX_CYCLES: u64 = 10_000;
}

/// Handshake discipline wrapped around each stage of the FP adder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ControllerKind {
    /// One input register per stage; the stage runs on the registered operands.
    #[default]
    Unbuffered,
    /// Combinational stage whose refused output waits in a one-entry buffer.
    #[serde(alias = "UnbufferedPipeline2")]
    Unbuffered2,
    /// Registered output with `ready_o` passed straight through from downstream.
    #[serde(alias = "SimpleHandshake")]
    Simple,
    /// Registered output that refills in the same tick it drains.
    #[serde(alias = "PassThroughHandshake")]
    PassThrough,
    /// Depth-1 registered queue with full throughput.
    #[serde(alias = "RegisterPipeline")]
    Register,
    /// Depth-2 first-word-fall-through queue.
    #[serde(alias = "BufferedHandshake")]
    Buffered,
    /// Queue built from the `queue` section of the configuration.
    Fifo,
    /// One-slot register whose contents can be cancelled per lane.
    MaskCancellable,
}

impl ControllerKind {
    /// Whether in-flight work carries per-lane cancellation masks.
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::MaskCancellable)
    }

    /// Ticks an item spends in one wrapped stage when nothing downstream stalls.
    ///
    /// Fall-through queues and the output-buffered unbuffered controller hand an arriving
    /// item straight on while they are empty.
    pub const fn stage_latency(self, queue: &QueueConfig) -> u32 {
        match self {
            Self::Buffered | Self::Unbuffered2 => 0,
            Self::Fifo if queue.fwft => 0,
            _ => 1,
        }
    }
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use pipesim_core::config::{Config, ControllerKind};
///
/// let config = Config::default();
/// assert_eq!(config.fpu.width, 32);
/// assert_eq!(config.fpu.controller, ControllerKind::Unbuffered);
///
/// let json = r#"{
///     "fpu": { "width": 64, "controller": "Buffered", "num_rows": 2 },
///     "queue": { "depth": 4, "fwft": false, "pipe": true },
///     "sim": { "max_cycles": 500, "trace": true }
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.fpu.width, 64);
/// assert_eq!(config.queue.depth, 4);
/// assert!(config.sim.trace);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// FP adder configuration
    #[serde(default)]
    pub fpu: FpuConfig,
    /// Queue geometry for FIFO-backed controllers
    #[serde(default)]
    pub queue: QueueConfig,
    /// Simulation loop settings
    #[serde(default)]
    pub sim: SimConfig,
}

impl Config {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// [`BuildError::Config`] for malformed JSON, otherwise whatever
    /// [`validate`](Self::validate) reports.
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Checks parameters that deserialize fine but cannot be built.
    ///
    /// # Errors
    ///
    /// - [`BuildError::UnsupportedWidth`] unless the width is 16, 32 or 64.
    /// - [`BuildError::NoLanes`] for zero reservation stations.
    /// - [`BuildError::TooManyLanes`] for more stations than [`FpContext::MAX_LANES`].
    /// - [`BuildError::ZeroDepth`] for a zero-depth queue.
    pub const fn validate(&self) -> Result<(), BuildError> {
        if !matches!(self.fpu.width, 16 | 32 | 64) {
            return Err(BuildError::UnsupportedWidth(self.fpu.width));
        }
        if self.fpu.num_rows == 0 {
            return Err(BuildError::NoLanes);
        }
        if self.fpu.num_rows > FpContext::MAX_LANES {
            return Err(BuildError::TooManyLanes {
                lanes: self.fpu.num_rows,
                max: FpContext::MAX_LANES,
            });
        }
        if self.queue.depth == 0 {
            return Err(BuildError::ZeroDepth);
        }
        Ok(())
    }
}

/// FP adder configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FpuConfig {
    /// Operand width in bits (16, 32 or 64)
    #[serde(default = "FpuConfig::default_width")]
    pub width: u32,
    /// Handshake discipline around each stage
    #[serde(default)]
    pub controller: ControllerKind,
    /// Number of reservation-station lanes
    #[serde(default = "FpuConfig::default_num_rows")]
    pub num_rows: usize,
}

impl FpuConfig {
    /// Returns the default operand width.
    fn default_width() -> u32 {
        defaults::FP_WIDTH
    }

    /// Returns the default lane count.
    fn default_num_rows() -> usize {
        defaults::NUM_ROWS
    }
}

impl Default for FpuConfig {
    fn default() -> Self {
        Self {
            width: defaults::FP_WIDTH,
            controller: ControllerKind::default(),
            num_rows: defaults::NUM_ROWS,
        }
    }
}

/// Queue geometry for FIFO-backed controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct QueueConfig {
    /// Number of slots
    #[serde(default = "QueueConfig::default_depth")]
    pub depth: usize,
    /// First-word-fall-through: an empty queue passes input straight to its output
    #[serde(default = "QueueConfig::default_fwft")]
    pub fwft: bool,
    /// A full queue accepts when its head leaves in the same tick
    #[serde(default)]
    pub pipe: bool,
}

impl QueueConfig {
    /// Returns the default queue depth.
    fn default_depth() -> usize {
        defaults::QUEUE_DEPTH
    }

    /// Fall-through is on unless asked otherwise.
    fn default_fwft() -> bool {
        true
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            depth: defaults::QUEUE_DEPTH,
            fwft: true,
            pipe: false,
        }
    }
}

/// Simulation loop settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    /// Upper bound on cycles for a single `run_until_idle`
    #[serde(default = "SimConfig::default_max_cycles")]
    pub max_cycles: u64,
    /// Log every completed result at debug level
    #[serde(default)]
    pub trace: bool,
}

impl SimConfig {
    /// Returns the default cycle budget.
    fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_cycles: defaults::MAX_CYCLES,
            trace: false,
        }
    }
}
