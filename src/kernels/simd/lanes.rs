//! # **SIMD Lane Operations** - *Per-Type Lane Primitives for the Backends*
//!
//! The named abstract operations every backend is written against:
//! broadcast a scalar to lanes, load a chunk, compare lane-wise, widen to
//! the accumulator type, do lane arithmetic, and materialise a comparison
//! as a packed integer mask (lane `i` to bit `i`). Implemented once per
//! element type; the backends differ only in chunking and in how the lane
//! masks reach the output bytes.

use std::simd::prelude::*;

use crate::enums::operators::{ArithOp, CompareOp};
use crate::traits::column::ColumnValue;

/// Lane-level operations of one element type at a fixed lane count `N`.
pub trait SimdColumn<const N: usize>: ColumnValue
where
{
    /// Broadcast a scalar to every lane.
    fn splat(value: Self) -> Simd<Self, N>;

    /// Load exactly `N` elements.
    fn load(src: &[Self]) -> Simd<Self, N>;

    /// Load fewer than `N` elements, zero-filling the rest.
    fn load_padded(src: &[Self]) -> Simd<Self, N>;

    /// Lane-wise comparison materialised as an `N`-bit mask.
    fn compare(op: CompareOp, a: Simd<Self, N>, b: Simd<Self, N>) -> u64;

    /// Widen every lane into the accumulator type.
    fn widen_lanes(v: Simd<Self, N>) -> Simd<Self::Acc, N>;

    /// Broadcast an accumulator scalar to every lane.
    fn acc_splat(value: Self::Acc) -> Simd<Self::Acc, N>;

    /// Lane arithmetic in the accumulator domain. Only called for
    /// operations this element family advertises via
    /// [`ColumnValue::arith_supported`].
    fn acc_arith(
        op: ArithOp,
        a: Simd<Self::Acc, N>,
        r: Simd<Self::Acc, N>,
    ) -> Simd<Self::Acc, N>;

    /// Lane-wise accumulator comparison materialised as an `N`-bit mask.
    fn acc_compare(op: CompareOp, a: Simd<Self::Acc, N>, b: Simd<Self::Acc, N>) -> u64;
}

macro_rules! compare_to_bitmask {
    ($op:expr, $a:expr, $b:expr) => {
        match $op {
            CompareOp::Eq => $a.simd_eq($b).to_bitmask(),
            CompareOp::Ne => $a.simd_ne($b).to_bitmask(),
            CompareOp::Lt => $a.simd_lt($b).to_bitmask(),
            CompareOp::Le => $a.simd_le($b).to_bitmask(),
            CompareOp::Gt => $a.simd_gt($b).to_bitmask(),
            CompareOp::Ge => $a.simd_ge($b).to_bitmask(),
        }
    };
}

macro_rules! load_padded_impl {
    ($t:ty, $src:expr) => {{
        let mut lanes = [<$t>::default(); N];
        lanes[..$src.len()].copy_from_slice($src);
        Simd::from_array(lanes)
    }};
}

macro_rules! int_simd_column {
    ($($t:ty),*) => {
        $(
            impl<const N: usize> SimdColumn<N> for $t
            where
            {
                #[inline(always)]
                fn splat(value: Self) -> Simd<Self, N> {
                    Simd::splat(value)
                }

                #[inline(always)]
                fn load(src: &[Self]) -> Simd<Self, N> {
                    Simd::from_slice(src)
                }

                #[inline(always)]
                fn load_padded(src: &[Self]) -> Simd<Self, N> {
                    load_padded_impl!($t, src)
                }

                #[inline(always)]
                fn compare(op: CompareOp, a: Simd<Self, N>, b: Simd<Self, N>) -> u64 {
                    compare_to_bitmask!(op, a, b)
                }

                #[inline(always)]
                fn widen_lanes(v: Simd<Self, N>) -> Simd<i64, N> {
                    v.cast::<i64>()
                }

                #[inline(always)]
                fn acc_splat(value: i64) -> Simd<i64, N> {
                    Simd::splat(value)
                }

                #[inline(always)]
                fn acc_arith(op: ArithOp, a: Simd<i64, N>, r: Simd<i64, N>) -> Simd<i64, N> {
                    match op {
                        ArithOp::Add => a + r,
                        ArithOp::Sub => a - r,
                        ArithOp::Mul => a * r,
                        // declined at entry for integer lanes
                        ArithOp::Div | ArithOp::Mod => unreachable!(),
                    }
                }

                #[inline(always)]
                fn acc_compare(op: CompareOp, a: Simd<i64, N>, b: Simd<i64, N>) -> u64 {
                    compare_to_bitmask!(op, a, b)
                }
            }
        )*
    };
}

macro_rules! float_simd_column {
    ($($t:ty),*) => {
        $(
            impl<const N: usize> SimdColumn<N> for $t
            where
            {
                #[inline(always)]
                fn splat(value: Self) -> Simd<Self, N> {
                    Simd::splat(value)
                }

                #[inline(always)]
                fn load(src: &[Self]) -> Simd<Self, N> {
                    Simd::from_slice(src)
                }

                #[inline(always)]
                fn load_padded(src: &[Self]) -> Simd<Self, N> {
                    load_padded_impl!($t, src)
                }

                #[inline(always)]
                fn compare(op: CompareOp, a: Simd<Self, N>, b: Simd<Self, N>) -> u64 {
                    compare_to_bitmask!(op, a, b)
                }

                #[inline(always)]
                fn widen_lanes(v: Simd<Self, N>) -> Simd<Self, N> {
                    v
                }

                #[inline(always)]
                fn acc_splat(value: Self) -> Simd<Self, N> {
                    Simd::splat(value)
                }

                #[inline(always)]
                fn acc_arith(op: ArithOp, a: Simd<Self, N>, r: Simd<Self, N>) -> Simd<Self, N> {
                    match op {
                        ArithOp::Add => a + r,
                        ArithOp::Sub => a - r,
                        ArithOp::Mul => a * r,
                        // Div is rewritten into a multiply before the lane
                        // loop; Mod declines at entry
                        ArithOp::Div | ArithOp::Mod => unreachable!(),
                    }
                }

                #[inline(always)]
                fn acc_compare(op: CompareOp, a: Simd<Self, N>, b: Simd<Self, N>) -> u64 {
                    compare_to_bitmask!(op, a, b)
                }
            }
        )*
    };
}

int_simd_column!(i8, i16, i32, i64);
float_simd_column!(f32, f64);

/// Copy the low `nbytes` of a lane mask into the output stream.
#[inline(always)]
pub(crate) fn write_mask_bytes(out: &mut [u8], byte_pos: usize, mask: u64, nbytes: usize) {
    out[byte_pos..byte_pos + nbytes].copy_from_slice(&mask.to_le_bytes()[..nbytes]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_bitmask_order() {
        let a: Simd<i32, 8> = Simd::from_array([0, 1, 2, 3, 4, 5, 6, 7]);
        let b = Simd::splat(3);
        // lane i maps to bit i
        assert_eq!(<i32 as SimdColumn<8>>::compare(CompareOp::Lt, a, b), 0b0000_0111);
        assert_eq!(<i32 as SimdColumn<8>>::compare(CompareOp::Eq, a, b), 0b0000_1000);
        assert_eq!(<i32 as SimdColumn<8>>::compare(CompareOp::Ge, a, b), 0b1111_1000);
    }

    #[test]
    fn test_load_padded() {
        let src = [7i16, 8, 9];
        let v = <i16 as SimdColumn<8>>::load_padded(&src);
        assert_eq!(v.to_array(), [7, 8, 9, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_widen_and_arith() {
        let v: Simd<i8, 4> = Simd::from_array([100, -100, 27, 0]);
        let wide = <i8 as SimdColumn<4>>::widen_lanes(v);
        let r = <i8 as SimdColumn<4>>::acc_splat(100);
        let sum = <i8 as SimdColumn<4>>::acc_arith(ArithOp::Add, wide, r);
        assert_eq!(sum.to_array(), [200, 0, 127, 100]);
    }

    #[test]
    fn test_write_mask_bytes() {
        let mut out = [0xFFu8; 6];
        write_mask_bytes(&mut out, 1, 0xAABBCCDD, 4);
        assert_eq!(out, [0xFF, 0xDD, 0xCC, 0xBB, 0xAA, 0xFF]);
    }
}
