//! The pipelined FP adder.
//!
//! Nine stages grouped into three controller-wrapped chains:
//! 1. **Special cases:** `specialcases` then `denorm`.
//! 2. **Add:** `align`, `add0`, `add1`.
//! 3. **Normalise and pack:** `normalise`, `round`, `corrections`, `pack`.
//!
//! The controller around each chain is picked at run time, so the same datapath runs
//! as a register pipeline, a buffered pipeline or a cancellable one.

use std::fmt;

use tracing::debug;

use super::add::{FpAdd0, FpAdd1};
use super::align::FpAlign;
use super::data::{FpAddInput, FpPackData, FpPostCalcData, FpScData};
use super::format::FpFormat;
use super::normalise::FpNormalise;
use super::pack::FpPack;
use super::round::{FpCorrections, FpRound};
use super::specialcases::{FpDenorm, FpSpecialCases};
use crate::common::BuildError;
use crate::config::{ControllerKind, QueueConfig};
use crate::core::pipeline::connect::Connected;
use crate::core::pipeline::controllers::{self, DynController};
use crate::core::pipeline::record::Shape;
use crate::core::pipeline::signals::{NextControl, PrevControl};
use crate::core::pipeline::traits::{Clocked, CombPaths, Pipe};
use crate::{connect, stage_chain};

/// Number of controller-wrapped chains in the adder.
pub const FPADD_STAGES: u32 = 3;

type Inner = Connected<
    Connected<DynController<FpAddInput, FpScData>, DynController<FpScData, FpPostCalcData>>,
    DynController<FpPostCalcData, FpPackData>,
>;

/// FP adder built from three controller-wrapped stage chains.
pub struct FpAddPipe {
    fmt: FpFormat,
    kind: ControllerKind,
    latency: u32,
    inner: Inner,
}

impl FpAddPipe {
    /// Builds the adder for `fmt` with every chain wrapped in a `kind` controller.
    ///
    /// # Errors
    ///
    /// [`BuildError::ZeroDepth`] for a zero-depth FIFO; shape errors cannot occur for the
    /// fixed stage order but are still propagated.
    pub fn new(fmt: FpFormat, kind: ControllerKind, queue: &QueueConfig) -> Result<Self, BuildError> {
        let sc = stage_chain![FpSpecialCases::new(fmt), FpDenorm::new(fmt)]?;
        let add = stage_chain![FpAlign::new(fmt), FpAdd0::new(fmt), FpAdd1::new(fmt)]?;
        let norm = stage_chain![
            FpNormalise::new(fmt),
            FpRound::new(fmt),
            FpCorrections::new(fmt),
            FpPack::new(fmt),
        ]?;
        let inner = connect![
            controllers::wrap(kind, sc, queue)?,
            controllers::wrap(kind, add, queue)?,
            controllers::wrap(kind, norm, queue)?,
        ]?;
        let latency = FPADD_STAGES * kind.stage_latency(queue);
        debug!(width = fmt.width(), ?kind, latency, "fpadd pipeline built");
        Ok(Self {
            fmt,
            kind,
            latency,
            inner,
        })
    }

    /// Operand format.
    pub const fn format(&self) -> FpFormat {
        self.fmt
    }

    /// Controller discipline around each chain.
    pub const fn kind(&self) -> ControllerKind {
        self.kind
    }

    /// Ticks from an accepted input to its result appearing on `valid_o`, unstalled.
    pub const fn latency(&self) -> u32 {
        self.latency
    }
}

impl fmt::Debug for FpAddPipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FpAddPipe")
            .field("fmt", &self.fmt)
            .field("kind", &self.kind)
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

impl Clocked for FpAddPipe {
    fn settle_forward(&mut self) {
        self.inner.settle_forward();
    }

    fn settle_backward(&mut self) {
        self.inner.settle_backward();
    }

    fn clock(&mut self) {
        self.inner.clock();
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn comb_paths(&self) -> CombPaths {
        self.inner.comb_paths()
    }
}

impl Pipe for FpAddPipe {
    type Input = FpAddInput;
    type Output = FpPackData;

    fn p(&self) -> &PrevControl<FpAddInput> {
        self.inner.p()
    }

    fn p_mut(&mut self) -> &mut PrevControl<FpAddInput> {
        self.inner.p_mut()
    }

    fn n(&self) -> &NextControl<FpPackData> {
        self.inner.n()
    }

    fn n_mut(&mut self) -> &mut NextControl<FpPackData> {
        self.inner.n_mut()
    }

    fn ispec(&self) -> Shape {
        self.inner.ispec()
    }

    fn ospec(&self) -> Shape {
        self.inner.ospec()
    }
}
