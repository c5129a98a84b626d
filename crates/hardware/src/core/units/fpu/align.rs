//! Exponent alignment.
//!
//! The operand with the smaller exponent has its mantissa shifted right until both
//! exponents match, with every bit that falls off merged into the sticky position.
//! [`FpAlign::process`] does the whole shift in one go; [`FpAlign::step`] moves one bit
//! per call and is what the state-machine adder clocks.

use super::data::FpScData;
use super::format::FpFormat;
use super::num::FpNum;
use crate::common::bits::shift_right_merge;
use crate::core::pipeline::record::Shape;
use crate::core::pipeline::traits::Stage;

/// Brings both operands to the larger of their exponents.
#[derive(Clone, Copy, Debug)]
pub struct FpAlign {
    fmt: FpFormat,
}

impl FpAlign {
    /// Creates the stage for `fmt`.
    pub const fn new(fmt: FpFormat) -> Self {
        Self { fmt }
    }

    fn shift_to(&self, n: FpNum, e: i32) -> FpNum {
        let diff = (e - n.e) as u32;
        FpNum {
            e,
            m: shift_right_merge(n.m, diff, self.fmt.operand_m_width()),
            ..n
        }
    }

    /// Shifts the smaller operand down by one bit.
    ///
    /// Returns `None` once the exponents already match (or the operation is bypassed).
    pub fn step(&self, input: &FpScData) -> Option<FpScData> {
        if input.out_do_z || input.a.e == input.b.e {
            return None;
        }
        let mut out = input.clone();
        if out.a.e < out.b.e {
            out.a = out.a.shift_down(&self.fmt);
        } else {
            out.b = out.b.shift_down(&self.fmt);
        }
        Some(out)
    }
}

impl Stage for FpAlign {
    type Input = FpScData;
    type Output = FpScData;

    fn ispec(&self) -> Shape {
        FpScData::shape(&self.fmt)
    }

    fn ospec(&self) -> Shape {
        FpScData::shape(&self.fmt)
    }

    fn process(&self, input: &FpScData) -> FpScData {
        if input.out_do_z {
            return input.clone();
        }
        let (a, b) = (input.a, input.b);
        let (a, b) = if a.e > b.e {
            (a, self.shift_to(b, a.e))
        } else if b.e > a.e {
            (self.shift_to(a, b.e), b)
        } else {
            (a, b)
        };
        FpScData {
            a,
            b,
            ..input.clone()
        }
    }
}
