//! Result packing.

use super::data::{FpPackData, FpRoundData};
use super::format::FpFormat;
use crate::core::pipeline::record::Shape;
use crate::core::pipeline::traits::Stage;

/// Encodes the rounded result, or forwards the bypass result.
///
/// Exponents past `P127` pack as an infinity of the result's sign.
#[derive(Clone, Copy, Debug)]
pub struct FpPack {
    fmt: FpFormat,
}

impl FpPack {
    /// Creates the stage for `fmt`.
    pub const fn new(fmt: FpFormat) -> Self {
        Self { fmt }
    }
}

impl Stage for FpPack {
    type Input = FpRoundData;
    type Output = FpPackData;

    fn ispec(&self) -> Shape {
        FpRoundData::shape(&self.fmt)
    }

    fn ospec(&self) -> Shape {
        FpPackData::shape(&self.fmt)
    }

    fn process(&self, input: &FpRoundData) -> FpPackData {
        let f = &self.fmt;
        let z = &input.z;
        let packed = if input.out_do_z {
            input.oz
        } else if z.is_overflowed(f) {
            f.inf(z.s)
        } else {
            f.create(z.s, z.e, z.m)
        };
        FpPackData {
            z: packed,
            ctx: input.ctx,
        }
    }
}
