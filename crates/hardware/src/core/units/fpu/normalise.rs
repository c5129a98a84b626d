//! Post-add normalisation.
//!
//! A result whose leading bit is clear is shifted up while the exponent stays above
//! `N126`; a result whose exponent has dropped below `N126` is shifted down to it, with
//! the bits that fall off merged into sticky. [`FpNormalise::process`] does either in a
//! single shift; [`FpNormalise::step`] moves one bit per call.

use super::data::{FpNorm1Data, FpPostCalcData};
use super::format::FpFormat;
use super::num::Overflow;
use crate::common::bits::{bit, leading_zeros, mask, shift_right_merge};
use crate::core::pipeline::record::Shape;
use crate::core::pipeline::traits::Stage;

/// Normalises the result mantissa and decides whether to round up.
#[derive(Clone, Copy, Debug)]
pub struct FpNormalise {
    fmt: FpFormat,
}

impl FpNormalise {
    /// Creates the stage for `fmt`.
    pub const fn new(fmt: FpFormat) -> Self {
        Self { fmt }
    }

    fn decrease(&self, d: &FpPostCalcData) -> bool {
        d.z.m_msbzero(&self.fmt) && d.z.e > self.fmt.n126()
    }

    fn increase(&self, d: &FpPostCalcData) -> bool {
        d.z.e < self.fmt.n126()
    }

    /// Mantissa with guard, round and sticky appended below it.
    fn extended(d: &FpPostCalcData) -> u64 {
        (d.z.m << 3)
            | (d.of.guard as u64) << 2
            | (d.of.round_bit as u64) << 1
            | d.of.sticky as u64
    }

    /// Applies one bit of normalisation.
    ///
    /// Returns `None` once no further shift is needed (or the operation is bypassed).
    pub fn step(&self, input: &FpPostCalcData) -> Option<FpPostCalcData> {
        if input.out_do_z {
            return None;
        }
        let (z, of) = (input.z, input.of);
        let m_mask = mask(self.fmt.result_m_width());
        let mut out = input.clone();
        if self.decrease(input) {
            out.z.e = z.e - 1;
            out.z.m = ((z.m << 1) | of.guard as u64) & m_mask;
            out.of = Overflow {
                guard: of.round_bit,
                round_bit: false,
                sticky: of.sticky,
                m0: of.guard,
            };
        } else if self.increase(input) {
            out.z.e = z.e + 1;
            out.z.m = z.m >> 1;
            out.of = Overflow {
                guard: bit(z.m, 0),
                round_bit: of.guard,
                sticky: of.sticky | of.round_bit,
                m0: bit(z.m, 1),
            };
        } else {
            return None;
        }
        Some(out)
    }

    /// Converts a normalised result into the round stage's input.
    pub fn finish(&self, input: &FpPostCalcData) -> FpNorm1Data {
        FpNorm1Data {
            z: input.z,
            roundz: input.of.roundz(),
            oz: input.oz,
            out_do_z: input.out_do_z,
            ctx: input.ctx,
        }
    }
}

impl Stage for FpNormalise {
    type Input = FpPostCalcData;
    type Output = FpNorm1Data;

    fn ispec(&self) -> Shape {
        FpPostCalcData::shape(&self.fmt)
    }

    fn ospec(&self) -> Shape {
        FpNorm1Data::shape(&self.fmt)
    }

    fn process(&self, input: &FpPostCalcData) -> FpNorm1Data {
        if input.out_do_z {
            return self.finish(input);
        }
        let fmt = &self.fmt;
        let width = fmt.operand_m_width();
        let temp_m = Self::extended(input);
        let mut out = input.clone();

        if self.decrease(input) {
            let limit = (input.z.e - fmt.n126()) as u32;
            let clz = leading_zeros(temp_m, width).min(limit);
            let shifted = (temp_m << clz) & mask(width);
            out.z.e = input.z.e - clz as i32;
            out.z.m = shifted >> 3;
            out.of.m0 = bit(shifted, 3);
            out.of.guard = bit(shifted, 2);
            out.of.round_bit = bit(shifted, 1);
        } else if self.increase(input) {
            let diff = (fmt.n126() - input.z.e) as u32;
            let shifted = shift_right_merge(temp_m, diff, width + 1);
            out.z.e = fmt.n126();
            out.z.m = shifted >> 3;
            out.of = Overflow {
                m0: bit(shifted, 3),
                guard: bit(shifted, 2),
                round_bit: bit(shifted, 1),
                sticky: bit(shifted, 0),
            };
        }
        self.finish(&out)
    }
}
