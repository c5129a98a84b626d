//! Bit-vector helpers shared by the handshake layer and the FP datapath.
//!
//! Hardware signals are modelled as `u64` words with an explicit width. These helpers
//! mirror the few wide-signal primitives the datapath needs: masks, single-bit reads,
//! a leading-zero counter, and a right shifter that folds lost bits into a sticky bit.

/// Returns a word with the low `width` bits set.
#[inline]
pub const fn mask(width: u32) -> u64 {
    if width >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Reads bit `index` of `value`.
#[inline]
pub const fn bit(value: u64, index: u32) -> bool {
    index < u64::BITS && (value >> index) & 1 == 1
}

/// Counts leading zeros of `value` viewed as a `width`-bit signal.
///
/// A zero value yields `width`.
#[inline]
pub const fn leading_zeros(value: u64, width: u32) -> u32 {
    let v = value & mask(width);
    v.leading_zeros() - (u64::BITS - width)
}

/// Shifts `value` right by `amount`, merging every bit that falls off into bit 0.
///
/// Bit 0 of the input is treated as an existing sticky bit and is kept in the merge.
/// The shift amount saturates at `width - 1`, at which point every bit above the sticky
/// position has been folded in.
///
/// # Examples
///
/// ```
/// use pipesim_core::common::bits::shift_right_merge;
///
/// // 0b1011_0 >> 2: bits "10" drop into sticky, which becomes 1.
/// assert_eq!(shift_right_merge(0b10110, 2, 5), 0b00101);
/// ```
pub const fn shift_right_merge(value: u64, amount: u32, width: u32) -> u64 {
    let amount = if amount > width - 1 { width - 1 } else { amount };
    let upper = (value >> 1) & mask(width - 1);
    let shifted = upper >> amount;
    let lost = upper & mask(amount);
    let sticky = lost != 0 || value & 1 == 1;
    ((shifted << 1) | sticky as u64) & mask(width)
}

/// Number of bits needed to encode an index into `count` lanes (at least one).
#[inline]
pub const fn num_bits(count: usize) -> u32 {
    if count <= 2 {
        1
    } else {
        usize::BITS - (count - 1).leading_zeros()
    }
}
