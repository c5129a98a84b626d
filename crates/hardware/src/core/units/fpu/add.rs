//! Mantissa addition and carry fix-up.

use super::data::{FpAddStage0Data, FpPostCalcData, FpScData};
use super::format::FpFormat;
use super::num::{FpNum, Overflow};
use crate::common::bits::{bit, mask};
use crate::core::pipeline::record::Shape;
use crate::core::pipeline::traits::Stage;

/// Adds or subtracts the aligned mantissas.
///
/// Like signs add. Unlike signs subtract the smaller mantissa from the larger and take the
/// larger one's sign. The total is one bit wider than an operand mantissa to hold the
/// carry.
#[derive(Clone, Copy, Debug)]
pub struct FpAdd0 {
    fmt: FpFormat,
}

impl FpAdd0 {
    /// Creates the stage for `fmt`.
    pub const fn new(fmt: FpFormat) -> Self {
        Self { fmt }
    }
}

impl Stage for FpAdd0 {
    type Input = FpScData;
    type Output = FpAddStage0Data;

    fn ispec(&self) -> Shape {
        FpScData::shape(&self.fmt)
    }

    fn ospec(&self) -> Shape {
        FpAddStage0Data::shape(&self.fmt)
    }

    fn process(&self, input: &FpScData) -> FpAddStage0Data {
        let mut out = FpAddStage0Data {
            oz: input.oz,
            out_do_z: input.out_do_z,
            ctx: input.ctx,
            ..FpAddStage0Data::default()
        };
        if input.out_do_z {
            return out;
        }
        let (a, b) = (&input.a, &input.b);
        let (s, tot) = if a.s == b.s {
            (a.s, a.m + b.m)
        } else if a.m >= b.m {
            (a.s, a.m - b.m)
        } else {
            (b.s, b.m - a.m)
        };
        out.z = FpNum::new(s, a.e, 0);
        out.tot = tot & mask(self.fmt.operand_m_width() + 1);
        out
    }
}

/// Splits the total into a result mantissa and its rounding bits.
///
/// When the carry bit is set the total is taken one position higher, the exponent goes up
/// by one and the two lowest bits fold into sticky.
#[derive(Clone, Copy, Debug)]
pub struct FpAdd1 {
    fmt: FpFormat,
}

impl FpAdd1 {
    /// Creates the stage for `fmt`.
    pub const fn new(fmt: FpFormat) -> Self {
        Self { fmt }
    }
}

impl Stage for FpAdd1 {
    type Input = FpAddStage0Data;
    type Output = FpPostCalcData;

    fn ispec(&self) -> Shape {
        FpAddStage0Data::shape(&self.fmt)
    }

    fn ospec(&self) -> Shape {
        FpPostCalcData::shape(&self.fmt)
    }

    fn process(&self, input: &FpAddStage0Data) -> FpPostCalcData {
        let mut out = FpPostCalcData {
            z: input.z,
            oz: input.oz,
            out_do_z: input.out_do_z,
            ctx: input.ctx,
            ..FpPostCalcData::default()
        };
        if input.out_do_z {
            return out;
        }
        let tot = input.tot;
        let m_mask = mask(self.fmt.result_m_width());
        if bit(tot, self.fmt.operand_m_width()) {
            out.z.m = (tot >> 4) & m_mask;
            out.z.e += 1;
            out.of = Overflow {
                m0: bit(tot, 4),
                guard: bit(tot, 3),
                round_bit: bit(tot, 2),
                sticky: bit(tot, 1) | bit(tot, 0),
            };
        } else {
            out.z.m = (tot >> 3) & m_mask;
            out.of = Overflow {
                m0: bit(tot, 3),
                guard: bit(tot, 2),
                round_bit: bit(tot, 1),
                sticky: bit(tot, 0),
            };
        }
        out
    }
}
