//! Records passed between the stages of the FP adder.
//!
//! One record type per stage boundary. Each carries an [`FpContext`] holding the mux ID,
//! copied unchanged from input to output, plus the bypass result `oz` and the
//! `out_do_z` flag set by special-case detection so later stages can skip their work.

use super::format::FpFormat;
use super::num::{FpNum, Overflow};
use crate::common::num_bits;
use crate::core::pipeline::record::{Field, MuxId, Shape};

/// Per-operation context travelling alongside the numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FpContext {
    /// Lane the operation entered on.
    pub muxid: usize,
}

impl FpContext {
    /// Most lanes a mux ID can name.
    pub const MAX_LANES: usize = 256;

    /// Declared width of the mux ID field.
    pub const WIDTH: u32 = num_bits(Self::MAX_LANES);
}

macro_rules! impl_muxid {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl MuxId for $ty {
                fn muxid(&self) -> usize {
                    self.ctx.muxid
                }

                fn set_muxid(&mut self, id: usize) {
                    self.ctx.muxid = id;
                }
            }
        )+
    };
}

impl_muxid!(
    FpAddInput,
    FpScData,
    FpAddStage0Data,
    FpPostCalcData,
    FpNorm1Data,
    FpRoundData,
    FpPackData,
);

fn operand_fields(fmt: &FpFormat) -> [Field; 3] {
    [
        Field::new("s", 1),
        Field::new("e", fmt.internal_e_width()),
        Field::new("m", fmt.operand_m_width()),
    ]
}

fn result_fields(fmt: &FpFormat) -> [Field; 3] {
    [
        Field::new("s", 1),
        Field::new("e", fmt.internal_e_width()),
        Field::new("m", fmt.result_m_width()),
    ]
}

fn bypass_fields(fmt: &FpFormat) -> [Field; 3] {
    [
        Field::new("oz", fmt.width()),
        Field::new("out_do_z", 1),
        Field::new("muxid", FpContext::WIDTH),
    ]
}

/// Two operand encodings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FpAddInput {
    /// First operand.
    pub a: u64,
    /// Second operand.
    pub b: u64,
    /// Operation context.
    pub ctx: FpContext,
}

impl FpAddInput {
    /// Creates an input with mux ID 0.
    pub const fn new(a: u64, b: u64) -> Self {
        Self {
            a,
            b,
            ctx: FpContext { muxid: 0 },
        }
    }

    /// Declared shape for `fmt`.
    pub fn shape(fmt: &FpFormat) -> Shape {
        Shape::new(
            "fpadd_input",
            [
                Field::new("a", fmt.width()),
                Field::new("b", fmt.width()),
                Field::new("muxid", FpContext::WIDTH),
            ],
        )
    }
}

/// Decoded operands after special-case detection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FpScData {
    /// First operand, operand form.
    pub a: FpNum,
    /// Second operand, operand form.
    pub b: FpNum,
    /// Bypass result.
    pub oz: u64,
    /// `oz` is the final answer.
    pub out_do_z: bool,
    /// Operation context.
    pub ctx: FpContext,
}

impl FpScData {
    /// Declared shape for `fmt`.
    pub fn shape(fmt: &FpFormat) -> Shape {
        Shape::new(
            "fpsc_data",
            operand_fields(fmt)
                .into_iter()
                .chain(operand_fields(fmt))
                .chain(bypass_fields(fmt)),
        )
    }
}

/// Raw sum or difference of the aligned mantissas.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FpAddStage0Data {
    /// Sign and exponent of the result; mantissa unused.
    pub z: FpNum,
    /// Mantissa total, one bit wider than an operand mantissa.
    pub tot: u64,
    /// Bypass result.
    pub oz: u64,
    /// `oz` is the final answer.
    pub out_do_z: bool,
    /// Operation context.
    pub ctx: FpContext,
}

impl FpAddStage0Data {
    /// Declared shape for `fmt`.
    pub fn shape(fmt: &FpFormat) -> Shape {
        Shape::new(
            "fpadd_stage0",
            result_fields(fmt)
                .into_iter()
                .chain([Field::new("tot", fmt.operand_m_width() + 1)])
                .chain(bypass_fields(fmt)),
        )
    }
}

/// Result mantissa with its rounding bits, before normalisation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FpPostCalcData {
    /// Result in result form.
    pub z: FpNum,
    /// Rounding bits.
    pub of: Overflow,
    /// Bypass result.
    pub oz: u64,
    /// `oz` is the final answer.
    pub out_do_z: bool,
    /// Operation context.
    pub ctx: FpContext,
}

impl FpPostCalcData {
    /// Declared shape for `fmt`.
    pub fn shape(fmt: &FpFormat) -> Shape {
        Shape::new(
            "fp_postcalc",
            result_fields(fmt)
                .into_iter()
                .chain([
                    Field::new("guard", 1),
                    Field::new("round_bit", 1),
                    Field::new("sticky", 1),
                    Field::new("m0", 1),
                ])
                .chain(bypass_fields(fmt)),
        )
    }
}

/// Normalised result and the rounding decision.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FpNorm1Data {
    /// Result in result form.
    pub z: FpNum,
    /// Round up.
    pub roundz: bool,
    /// Bypass result.
    pub oz: u64,
    /// `oz` is the final answer.
    pub out_do_z: bool,
    /// Operation context.
    pub ctx: FpContext,
}

impl FpNorm1Data {
    /// Declared shape for `fmt`.
    pub fn shape(fmt: &FpFormat) -> Shape {
        Shape::new(
            "fp_norm1",
            result_fields(fmt)
                .into_iter()
                .chain([Field::new("roundz", 1)])
                .chain(bypass_fields(fmt)),
        )
    }
}

/// Rounded result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FpRoundData {
    /// Result in result form.
    pub z: FpNum,
    /// Bypass result.
    pub oz: u64,
    /// `oz` is the final answer.
    pub out_do_z: bool,
    /// Operation context.
    pub ctx: FpContext,
}

impl FpRoundData {
    /// Declared shape for `fmt`.
    pub fn shape(fmt: &FpFormat) -> Shape {
        Shape::new(
            "fp_round",
            result_fields(fmt).into_iter().chain(bypass_fields(fmt)),
        )
    }
}

/// Packed result encoding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FpPackData {
    /// Result encoding.
    pub z: u64,
    /// Operation context.
    pub ctx: FpContext,
}

impl FpPackData {
    /// Declared shape for `fmt`.
    pub fn shape(fmt: &FpFormat) -> Shape {
        Shape::new(
            "fp_pack",
            [
                Field::new("z", fmt.width()),
                Field::new("muxid", FpContext::WIDTH),
            ],
        )
    }
}
