//! Decoded floating-point numbers.
//!
//! An [`FpNum`] is a sign, a widened signed exponent and a mantissa held as an integer.
//! Operands carry three extra low bits (guard, round, sticky) below the stored field
//! and the implicit one above it; results carry the implicit one and the field only.

use super::format::FpFormat;
use crate::common::bits::{bit, shift_right_merge};

/// Sign, unbiased exponent and mantissa.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FpNum {
    /// Sign bit.
    pub s: bool,
    /// Unbiased exponent.
    pub e: i32,
    /// Mantissa, including whatever extra bits the context uses.
    pub m: u64,
}

impl FpNum {
    /// Creates a number from its parts.
    pub const fn new(s: bool, e: i32, m: u64) -> Self {
        Self { s, e, m }
    }

    /// Decodes an encoding into operand form (field shifted up by three).
    pub const fn decode(fmt: &FpFormat, v: u64) -> Self {
        Self {
            s: fmt.get_sign(v),
            e: fmt.get_exponent(v),
            m: fmt.get_mantissa(v) << 3,
        }
    }

    /// Exponent is `P128`.
    pub const fn exp_128(&self, fmt: &FpFormat) -> bool {
        self.e == fmt.p128()
    }

    /// Exponent is `N127`.
    pub const fn exp_n127(&self, fmt: &FpFormat) -> bool {
        self.e == fmt.n127()
    }

    /// Bit `rmw` of the mantissa is clear.
    pub const fn m_msbzero(&self, fmt: &FpFormat) -> bool {
        !bit(self.m, fmt.m_width())
    }

    /// NaN: maximum exponent, nonzero mantissa.
    pub const fn is_nan(&self, fmt: &FpFormat) -> bool {
        self.exp_128(fmt) && self.m != 0
    }

    /// Infinity: maximum exponent, zero mantissa.
    pub const fn is_inf(&self, fmt: &FpFormat) -> bool {
        self.exp_128(fmt) && self.m == 0
    }

    /// Zero: minimum exponent, zero mantissa.
    pub const fn is_zero(&self, fmt: &FpFormat) -> bool {
        self.exp_n127(fmt) && self.m == 0
    }

    /// Exponent too large to pack as a finite value.
    pub const fn is_overflowed(&self, fmt: &FpFormat) -> bool {
        self.e > fmt.p127()
    }

    /// Held at `N126` without a leading one.
    pub const fn is_denormalised(&self, fmt: &FpFormat) -> bool {
        self.e == fmt.n126() && self.m_msbzero(fmt)
    }

    /// One step of alignment: halve the mantissa, merging the lost bit into sticky.
    pub const fn shift_down(self, fmt: &FpFormat) -> Self {
        Self {
            s: self.s,
            e: self.e + 1,
            m: shift_right_merge(self.m, 1, fmt.operand_m_width()),
        }
    }
}

/// Bits below the result mantissa that decide rounding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Overflow {
    /// First bit below the mantissa.
    pub guard: bool,
    /// Second bit below the mantissa.
    pub round_bit: bool,
    /// OR of every bit further down.
    pub sticky: bool,
    /// Least significant mantissa bit.
    pub m0: bool,
}

impl Overflow {
    /// Round-to-nearest-even increment decision.
    pub const fn roundz(&self) -> bool {
        self.guard && (self.round_bit || self.sticky || self.m0)
    }
}
