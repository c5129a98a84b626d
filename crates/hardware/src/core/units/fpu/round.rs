//! Rounding and the subnormal exponent fix-up.

use super::data::{FpNorm1Data, FpRoundData};
use super::format::FpFormat;
use crate::common::bits::mask;
use crate::core::pipeline::record::Shape;
use crate::core::pipeline::traits::Stage;

/// Round to nearest, ties to even.
///
/// A mantissa of all ones rounds up to zero with the exponent incremented.
#[derive(Clone, Copy, Debug)]
pub struct FpRound {
    fmt: FpFormat,
}

impl FpRound {
    /// Creates the stage for `fmt`.
    pub const fn new(fmt: FpFormat) -> Self {
        Self { fmt }
    }
}

impl Stage for FpRound {
    type Input = FpNorm1Data;
    type Output = FpRoundData;

    fn ispec(&self) -> Shape {
        FpNorm1Data::shape(&self.fmt)
    }

    fn ospec(&self) -> Shape {
        FpRoundData::shape(&self.fmt)
    }

    fn process(&self, input: &FpNorm1Data) -> FpRoundData {
        let mut z = input.z;
        if !input.out_do_z && input.roundz {
            let m_mask = mask(self.fmt.result_m_width());
            if z.m == m_mask {
                z.e += 1;
            }
            z.m = (z.m + 1) & m_mask;
        }
        FpRoundData {
            z,
            oz: input.oz,
            out_do_z: input.out_do_z,
            ctx: input.ctx,
        }
    }
}

/// Moves a result that stayed subnormal back to the `N127` exponent it packs with.
#[derive(Clone, Copy, Debug)]
pub struct FpCorrections {
    fmt: FpFormat,
}

impl FpCorrections {
    /// Creates the stage for `fmt`.
    pub const fn new(fmt: FpFormat) -> Self {
        Self { fmt }
    }
}

impl Stage for FpCorrections {
    type Input = FpRoundData;
    type Output = FpRoundData;

    fn ispec(&self) -> Shape {
        FpRoundData::shape(&self.fmt)
    }

    fn ospec(&self) -> Shape {
        FpRoundData::shape(&self.fmt)
    }

    fn process(&self, input: &FpRoundData) -> FpRoundData {
        let mut out = input.clone();
        if !input.out_do_z && input.z.is_denormalised(&self.fmt) {
            out.z.e = self.fmt.n127();
        }
        out
    }
}
