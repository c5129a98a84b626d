//! The state-machine FP adder.
//!
//! Handles one operation at a time and advances one state per clock edge. Alignment
//! and normalisation move a single bit per edge, so the number of ticks an operation
//! takes depends on its operands. From the outside it behaves like any controller:
//! `ready_o` is high only while waiting for operands, `valid_o` only while presenting a
//! result.

use std::mem;

use tracing::trace;

use super::add::{FpAdd0, FpAdd1};
use super::align::FpAlign;
use super::data::{
    FpAddInput, FpAddStage0Data, FpNorm1Data, FpPackData, FpPostCalcData, FpRoundData, FpScData,
};
use super::format::FpFormat;
use super::normalise::FpNormalise;
use super::pack::FpPack;
use super::round::{FpCorrections, FpRound};
use super::specialcases::{FpDenorm, FpSpecialCases};
use crate::core::pipeline::record::Shape;
use crate::core::pipeline::signals::{NextControl, PrevControl};
use crate::core::pipeline::traits::{Clocked, CombPaths, Pipe, Stage};

/// Adder state, holding the operation in its current form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FsmState {
    /// Waiting for operands.
    #[default]
    GetOps,
    /// Operands latched, not yet decoded.
    SpecialCases(FpAddInput),
    /// Decoded, implicit ones not yet applied.
    Denorm(FpScData),
    /// Shifting the smaller operand one bit per tick.
    Align(FpScData),
    /// Aligned, ready to add.
    Add0(FpScData),
    /// Total computed, carry not yet handled.
    Add1(FpAddStage0Data),
    /// Shifting the result one bit per tick.
    Normalise(FpPostCalcData),
    /// Normalised, rounding decided.
    Round(FpNorm1Data),
    /// Rounded.
    Corrections(FpRoundData),
    /// Ready to encode.
    Pack(FpRoundData),
    /// Presenting the result until it is taken.
    PutZ(FpPackData),
}

impl FsmState {
    /// Short state name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GetOps => "get_ops",
            Self::SpecialCases(_) => "special_cases",
            Self::Denorm(_) => "denormalise",
            Self::Align(_) => "align",
            Self::Add0(_) => "add_0",
            Self::Add1(_) => "add_1",
            Self::Normalise(_) => "normalise_1",
            Self::Round(_) => "round",
            Self::Corrections(_) => "corrections",
            Self::Pack(_) => "pack",
            Self::PutZ(_) => "put_z",
        }
    }
}

/// One-operation-at-a-time FP adder.
#[derive(Debug)]
pub struct FpAddFsm {
    fmt: FpFormat,
    state: FsmState,
    p: PrevControl<FpAddInput>,
    n: NextControl<FpPackData>,
    specialcases: FpSpecialCases,
    denorm: FpDenorm,
    align: FpAlign,
    add0: FpAdd0,
    add1: FpAdd1,
    normalise: FpNormalise,
    round: FpRound,
    corrections: FpCorrections,
    pack: FpPack,
}

impl FpAddFsm {
    /// Creates an idle adder for `fmt`.
    pub fn new(fmt: FpFormat) -> Self {
        Self {
            fmt,
            state: FsmState::GetOps,
            p: PrevControl::new(),
            n: NextControl::default(),
            specialcases: FpSpecialCases::new(fmt),
            denorm: FpDenorm::new(fmt),
            align: FpAlign::new(fmt),
            add0: FpAdd0::new(fmt),
            add1: FpAdd1::new(fmt),
            normalise: FpNormalise::new(fmt),
            round: FpRound::new(fmt),
            corrections: FpCorrections::new(fmt),
            pack: FpPack::new(fmt),
        }
    }

    /// Operand format.
    pub const fn format(&self) -> FpFormat {
        self.fmt
    }

    /// Current state.
    pub const fn state(&self) -> &FsmState {
        &self.state
    }

    /// Whether the adder is waiting for operands.
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, FsmState::GetOps)
    }

    fn next_state(&self, state: FsmState) -> FsmState {
        match state {
            FsmState::GetOps => {
                if self.p.trigger() {
                    FsmState::SpecialCases(self.p.data_i.clone())
                } else {
                    FsmState::GetOps
                }
            }
            FsmState::SpecialCases(ops) => {
                let sc = self.specialcases.process(&ops);
                if sc.out_do_z {
                    FsmState::PutZ(FpPackData {
                        z: sc.oz,
                        ctx: sc.ctx,
                    })
                } else {
                    FsmState::Denorm(sc)
                }
            }
            FsmState::Denorm(sc) => FsmState::Align(self.denorm.process(&sc)),
            FsmState::Align(sc) => match self.align.step(&sc) {
                Some(next) => FsmState::Align(next),
                None => FsmState::Add0(sc),
            },
            FsmState::Add0(sc) => FsmState::Add1(self.add0.process(&sc)),
            FsmState::Add1(sum) => FsmState::Normalise(self.add1.process(&sum)),
            FsmState::Normalise(post) => match self.normalise.step(&post) {
                Some(next) => FsmState::Normalise(next),
                None => FsmState::Round(self.normalise.finish(&post)),
            },
            FsmState::Round(norm) => FsmState::Corrections(self.round.process(&norm)),
            FsmState::Corrections(r) => FsmState::Pack(self.corrections.process(&r)),
            FsmState::Pack(r) => FsmState::PutZ(self.pack.process(&r)),
            FsmState::PutZ(z) => {
                if self.n.ready_i {
                    FsmState::GetOps
                } else {
                    FsmState::PutZ(z)
                }
            }
        }
    }
}

impl Clocked for FpAddFsm {
    fn settle_forward(&mut self) {
        match &self.state {
            FsmState::PutZ(z) => {
                self.n.valid_o = true;
                self.n.data_o.clone_from(z);
            }
            _ => self.n.valid_o = false,
        }
    }

    fn settle_backward(&mut self) {
        self.p.ready_o = self.is_idle();
    }

    fn clock(&mut self) {
        let state = mem::take(&mut self.state);
        let from = state.name();
        self.state = self.next_state(state);
        if from != self.state.name() {
            trace!(from, to = self.state.name(), "fpadd fsm");
        }
    }

    fn reset(&mut self) {
        self.state = FsmState::GetOps;
        self.n.valid_o = false;
        self.n.data_o = FpPackData::default();
    }

    fn comb_paths(&self) -> CombPaths {
        CombPaths::REGISTERED
    }
}

impl Pipe for FpAddFsm {
    type Input = FpAddInput;
    type Output = FpPackData;

    fn p(&self) -> &PrevControl<FpAddInput> {
        &self.p
    }

    fn p_mut(&mut self) -> &mut PrevControl<FpAddInput> {
        &mut self.p
    }

    fn n(&self) -> &NextControl<FpPackData> {
        &self.n
    }

    fn n_mut(&mut self) -> &mut NextControl<FpPackData> {
        &mut self.n
    }

    fn ispec(&self) -> Shape {
        FpAddInput::shape(&self.fmt)
    }

    fn ospec(&self) -> Shape {
        FpPackData::shape(&self.fmt)
    }
}
