//! # **Word Trait** - *Storage-Word Abstraction for Packed Bits*
//!
//! Bits are packed into unsigned storage words. The word width is a
//! compile-time choice: wider words amortise head/body/tail bookkeeping in
//! the bulk kernels, narrower words give finer allocation granularity.
//! `u64` is the default throughout the crate.

use std::fmt::Debug;
use std::ops::{BitAndAssign, BitOrAssign, BitXorAssign};

use num_traits::PrimInt;

/// Unsigned integer unit in which bits are packed.
///
/// Bit `i` of a logical range lives in word `i / BITS` at shift
/// `i % BITS`, LSB-first. All bulk operations in
/// [`element_wise`](crate::kernels::element_wise) agree on this mapping.
pub trait Word:
    PrimInt + BitAndAssign + BitOrAssign + BitXorAssign + Debug + Send + Sync + 'static
{
    /// Number of bits in one storage word.
    const BITS: usize;
}

impl Word for u8 {
    const BITS: usize = 8;
}

impl Word for u16 {
    const BITS: usize = 16;
}

impl Word for u32 {
    const BITS: usize = 32;
}

impl Word for u64 {
    const BITS: usize = 64;
}

/// Number of storage words required to hold `bits` logical bits.
#[inline(always)]
pub fn words_for<W: Word>(bits: usize) -> usize {
    (bits + W::BITS - 1) / W::BITS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_for() {
        assert_eq!(words_for::<u64>(0), 0);
        assert_eq!(words_for::<u64>(1), 1);
        assert_eq!(words_for::<u64>(64), 1);
        assert_eq!(words_for::<u64>(65), 2);
        assert_eq!(words_for::<u8>(9), 2);
        assert_eq!(words_for::<u16>(16), 1);
        assert_eq!(words_for::<u32>(96), 3);
    }
}
