//! Special-case detection and denormalisation.
//!
//! NaNs, infinities, zeros and exact cancellation are resolved up front and the answer is
//! parked in `oz` with `out_do_z` set; every later stage leaves such operations alone.

use super::data::{FpAddInput, FpScData};
use super::format::FpFormat;
use super::num::FpNum;
use crate::core::pipeline::record::Shape;
use crate::core::pipeline::traits::Stage;

/// Decodes both operands and resolves the operations whose result needs no arithmetic.
#[derive(Clone, Copy, Debug)]
pub struct FpSpecialCases {
    fmt: FpFormat,
}

impl FpSpecialCases {
    /// Creates the stage for `fmt`.
    pub const fn new(fmt: FpFormat) -> Self {
        Self { fmt }
    }

    /// Returns the bypass result, or `None` when the sum must be computed.
    fn bypass(&self, a: &FpNum, b: &FpNum) -> Option<u64> {
        let f = &self.fmt;
        let field = |n: &FpNum| n.m >> 3;
        let s_nomatch = a.s != b.s;

        if a.is_nan(f) || b.is_nan(f) {
            Some(f.default_nan())
        } else if a.is_inf(f) {
            Some(if b.exp_128(f) && s_nomatch {
                f.default_nan()
            } else {
                f.inf(a.s)
            })
        } else if b.is_inf(f) {
            Some(f.inf(b.s))
        } else if a.is_zero(f) && b.is_zero(f) {
            Some(f.create(a.s && b.s, b.e, field(b)))
        } else if a.is_zero(f) {
            Some(f.create(b.s, b.e, field(b)))
        } else if b.is_zero(f) {
            Some(f.create(a.s, a.e, field(a)))
        } else if s_nomatch && a.e == b.e && a.m == b.m {
            Some(f.zero(false))
        } else {
            None
        }
    }
}

impl Stage for FpSpecialCases {
    type Input = FpAddInput;
    type Output = FpScData;

    fn ispec(&self) -> Shape {
        FpAddInput::shape(&self.fmt)
    }

    fn ospec(&self) -> Shape {
        FpScData::shape(&self.fmt)
    }

    fn process(&self, input: &FpAddInput) -> FpScData {
        let a = FpNum::decode(&self.fmt, input.a);
        let b = FpNum::decode(&self.fmt, input.b);
        let bypass = self.bypass(&a, &b);
        FpScData {
            a,
            b,
            oz: bypass.unwrap_or(0),
            out_do_z: bypass.is_some(),
            ctx: input.ctx,
        }
    }
}

/// Gives normal operands their implicit one; holds subnormals at `N126`.
#[derive(Clone, Copy, Debug)]
pub struct FpDenorm {
    fmt: FpFormat,
}

impl FpDenorm {
    /// Creates the stage for `fmt`.
    pub const fn new(fmt: FpFormat) -> Self {
        Self { fmt }
    }

    fn denormalise(&self, n: FpNum) -> FpNum {
        if n.exp_n127(&self.fmt) {
            FpNum { e: self.fmt.n126(), ..n }
        } else {
            FpNum {
                m: n.m | 1 << (self.fmt.m_width() + 3),
                ..n
            }
        }
    }
}

impl Stage for FpDenorm {
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
        FpScData {
            a: self.denormalise(input.a),
            b: self.denormalise(input.b),
            ..input.clone()
        }
    }
}
