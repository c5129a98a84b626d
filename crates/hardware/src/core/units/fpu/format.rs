//! IEEE-754 binary format descriptors.
//!
//! [`FpFormat`] answers two kinds of question. The bit-pattern helpers (`get_*`, `is_*`)
//! classify raw encodings the way software sees them. The internal constants (`p128`,
//! `n126`, ...) describe the widened representation the adder works in: a signed
//! exponent with two extra bits of range and a mantissa with an explicit leading one.

use crate::common::{BuildError, mask};

/// A standard IEEE-754 binary interchange format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FpFormat {
    width: u32,
    e_width: u32,
    m_width: u32,
}

impl Default for FpFormat {
    fn default() -> Self {
        Self::BINARY32
    }
}

impl FpFormat {
    /// binary16: 5-bit exponent, 10-bit mantissa.
    pub const BINARY16: Self = Self {
        width: 16,
        e_width: 5,
        m_width: 10,
    };
    /// binary32: 8-bit exponent, 23-bit mantissa.
    pub const BINARY32: Self = Self {
        width: 32,
        e_width: 8,
        m_width: 23,
    };
    /// binary64: 11-bit exponent, 52-bit mantissa.
    pub const BINARY64: Self = Self {
        width: 64,
        e_width: 11,
        m_width: 52,
    };

    /// Looks up the standard format of the given total width.
    ///
    /// # Errors
    ///
    /// [`BuildError::UnsupportedWidth`] unless `width` is 16, 32 or 64.
    pub fn standard(width: u32) -> Result<Self, BuildError> {
        match width {
            16 => Ok(Self::BINARY16),
            32 => Ok(Self::BINARY32),
            64 => Ok(Self::BINARY64),
            other => Err(BuildError::UnsupportedWidth(other)),
        }
    }

    /// Total width in bits.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Width of the exponent field.
    pub const fn e_width(&self) -> u32 {
        self.e_width
    }

    /// Width of the stored mantissa field (`rmw`).
    pub const fn m_width(&self) -> u32 {
        self.m_width
    }

    /// Mask covering the mantissa field.
    pub const fn mantissa_mask(&self) -> u64 {
        mask(self.m_width)
    }

    /// Exponent field value reserved for infinities and NaNs.
    pub const fn exponent_inf_nan(&self) -> u64 {
        mask(self.e_width)
    }

    /// Exponent bias (also the largest unbiased normal exponent).
    pub const fn exponent_bias(&self) -> i32 {
        (1 << (self.e_width - 1)) - 1
    }

    /// Unbiased exponent of infinities and NaNs.
    pub const fn e_max(&self) -> i32 {
        self.exponent_inf_nan() as i32 - self.exponent_bias()
    }

    /// Unbiased exponent of zeros and subnormals.
    pub const fn e_sub(&self) -> i32 {
        -self.exponent_bias()
    }

    /// Sign bit of `x`.
    pub const fn get_sign(&self, x: u64) -> bool {
        (x >> (self.e_width + self.m_width)) & 1 == 1
    }

    /// Raw (biased) exponent field of `x`.
    pub const fn get_exponent_field(&self, x: u64) -> u64 {
        (x >> self.m_width) & self.exponent_inf_nan()
    }

    /// Unbiased exponent of `x`.
    pub const fn get_exponent(&self, x: u64) -> i32 {
        self.get_exponent_field(x) as i32 - self.exponent_bias()
    }

    /// Mantissa field of `x`.
    pub const fn get_mantissa(&self, x: u64) -> u64 {
        x & self.mantissa_mask()
    }

    /// `x` is a zero of either sign.
    pub const fn is_zero(&self, x: u64) -> bool {
        self.get_exponent(x) == self.e_sub() && self.get_mantissa(x) == 0
    }

    /// `x` is subnormal.
    pub const fn is_subnormal(&self, x: u64) -> bool {
        self.get_exponent(x) == self.e_sub() && self.get_mantissa(x) != 0
    }

    /// `x` is an infinity of either sign.
    pub const fn is_inf(&self, x: u64) -> bool {
        self.get_exponent(x) == self.e_max() && self.get_mantissa(x) == 0
    }

    /// `x` is a NaN, quiet or signalling.
    pub const fn is_nan(&self, x: u64) -> bool {
        self.get_exponent(x) == self.e_max() && self.get_mantissa(x) != 0
    }

    /// `x` is a quiet NaN.
    pub const fn is_quiet_nan(&self, x: u64) -> bool {
        self.is_nan(x) && self.get_mantissa(x) >> (self.m_width - 1) == 1
    }

    /// `x` is a signalling NaN.
    pub const fn is_nan_signaling(&self, x: u64) -> bool {
        self.is_nan(x) && self.get_mantissa(x) >> (self.m_width - 1) == 0
    }

    /// `x` is neither infinite nor NaN.
    pub const fn is_finite(&self, x: u64) -> bool {
        self.get_exponent(x) != self.e_max()
    }

    /// Width of the widened signed exponent the adder works with.
    pub const fn internal_e_width(&self) -> u32 {
        self.e_width + 2
    }

    /// Width of an operand mantissa: implicit one, field, then guard, round and sticky.
    pub const fn operand_m_width(&self) -> u32 {
        self.m_width + 4
    }

    /// Width of a result mantissa: implicit one and field.
    pub const fn result_m_width(&self) -> u32 {
        self.m_width + 1
    }

    /// `P128`: internal exponent of infinities and NaNs.
    pub const fn p128(&self) -> i32 {
        self.e_max()
    }

    /// `P127`: the bias, and the largest exponent that still packs as a finite value.
    pub const fn p127(&self) -> i32 {
        self.e_max() - 1
    }

    /// `N127`: internal exponent of zeros and subnormals as decoded.
    pub const fn n127(&self) -> i32 {
        -(self.e_max() - 1)
    }

    /// `N126`: smallest normal exponent, where subnormals are held while computing.
    pub const fn n126(&self) -> i32 {
        -(self.e_max() - 2)
    }

    /// Packs sign, unbiased exponent and mantissa field into an encoding.
    ///
    /// The exponent is biased and truncated to the field; mantissa bits above the field
    /// are dropped.
    pub const fn create(&self, s: bool, e: i32, m: u64) -> u64 {
        let e_field = (e + self.p127()) as u64 & self.exponent_inf_nan();
        ((s as u64) << (self.width - 1)) | (e_field << self.m_width) | (m & self.mantissa_mask())
    }

    /// The quiet NaN with only the top mantissa bit set.
    pub const fn nan(&self, s: bool) -> u64 {
        self.create(s, self.p128(), 1 << (self.m_width - 1))
    }

    /// An infinity.
    pub const fn inf(&self, s: bool) -> u64 {
        self.create(s, self.p128(), 0)
    }

    /// A zero.
    pub const fn zero(&self, s: bool) -> u64 {
        self.create(s, self.n127(), 0)
    }

    /// The NaN every invalid operation produces.
    pub const fn default_nan(&self) -> u64 {
        self.nan(true)
    }
}
