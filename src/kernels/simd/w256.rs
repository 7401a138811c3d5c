//! # **Packed 256-Bit Backend** - *Lane-Packed Predicate Kernels (AVX2 Class)*
//!
//! Processes elements in 32-byte vector chunks and materialises each
//! comparison as a packed integer mask. Chunks narrower than a byte of
//! output (the 64-bit element types, four lanes per vector) run two
//! vectors per output byte, concatenating the two 4-bit masks. Trailing
//! elements, always a whole number of output bytes, run through 8-lane
//! vectors.
//!
//! Entry points are `unsafe fn` gated on the `avx2` target feature; the
//! dispatcher only binds them after probing the CPU.

use crate::enums::operators::{ArithOp, CompareOp, RangeKind};
use crate::traits::column::ColumnValue;


use super::lanes::{SimdColumn, write_mask_bytes};

/// Stream packed lane masks into the output bytes.
///
/// `mask_full` yields the mask of one full vector starting at an element
/// index; `mask_tail` yields an 8-lane mask. When `FULL < 8`, several
/// vectors accumulate into one output byte.
#[inline(always)]
fn pack_mask_stream<const FULL: usize>(
    out: &mut [u8],
    n: usize,
    mut mask_full: impl FnMut(usize) -> u64,
    mut mask_tail: impl FnMut(usize) -> u64,
) {
    debug_assert_eq!(n % 8, 0);
    let (vectors, bytes) = if FULL >= 8 { (1, FULL / 8) } else { (8 / FULL, 1) };
    let block = vectors * FULL;
    let full_n = (n / block) * block;
    let mut i = 0;
    while i < full_n {
        let mut m = 0u64;
        for j in 0..vectors {
            m |= mask_full(i + j * FULL) << (j * FULL);
        }
        write_mask_bytes(out, i / 8, m, bytes);
        i += block;
    }
    while i < n {
        write_mask_bytes(out, i / 8, mask_tail(i), 1);
        i += 8;
    }
}

#[inline(always)]
fn compare_val_body<T, const FULL: usize>(out: &mut [u8], src: &[T], op: CompareOp, value: T)
where
    T: SimdColumn<FULL> + SimdColumn<8>,
{
    let target_full = <T as SimdColumn<FULL>>::splat(value);
    let target_8 = <T as SimdColumn<8>>::splat(value);
    pack_mask_stream::<FULL>(
        out,
        src.len(),
        |i| {
            let v = <T as SimdColumn<FULL>>::load(&src[i..i + FULL]);
            <T as SimdColumn<FULL>>::compare(op, v, target_full)
        },
        |i| {
            let v = <T as SimdColumn<8>>::load(&src[i..i + 8]);
            <T as SimdColumn<8>>::compare(op, v, target_8)
        },
    );
}

#[inline(always)]
fn compare_column_body<T, const FULL: usize>(
    out: &mut [u8],
    left: &[T],
    right: &[T],
    op: CompareOp,
) where
    T: SimdColumn<FULL> + SimdColumn<8>,
{
    debug_assert_eq!(left.len(), right.len());
    pack_mask_stream::<FULL>(
        out,
        left.len(),
        |i| {
            let l = <T as SimdColumn<FULL>>::load(&left[i..i + FULL]);
            let r = <T as SimdColumn<FULL>>::load(&right[i..i + FULL]);
            <T as SimdColumn<FULL>>::compare(op, l, r)
        },
        |i| {
            let l = <T as SimdColumn<8>>::load(&left[i..i + 8]);
            let r = <T as SimdColumn<8>>::load(&right[i..i + 8]);
            <T as SimdColumn<8>>::compare(op, l, r)
        },
    );
}

#[inline(always)]
fn within_range_val_body<T, const FULL: usize>(
    out: &mut [u8],
    src: &[T],
    lower: T,
    upper: T,
    kind: RangeKind,
) where
    T: SimdColumn<FULL> + SimdColumn<8>,
{
    let lo_full = <T as SimdColumn<FULL>>::splat(lower);
    let hi_full = <T as SimdColumn<FULL>>::splat(upper);
    let lo_8 = <T as SimdColumn<8>>::splat(lower);
    let hi_8 = <T as SimdColumn<8>>::splat(upper);
    pack_mask_stream::<FULL>(
        out,
        src.len(),
        |i| {
            let v = <T as SimdColumn<FULL>>::load(&src[i..i + FULL]);
            <T as SimdColumn<FULL>>::compare(kind.lower(), lo_full, v)
                & <T as SimdColumn<FULL>>::compare(kind.upper(), v, hi_full)
        },
        |i| {
            let v = <T as SimdColumn<8>>::load(&src[i..i + 8]);
            <T as SimdColumn<8>>::compare(kind.lower(), lo_8, v)
                & <T as SimdColumn<8>>::compare(kind.upper(), v, hi_8)
        },
    );
}

#[inline(always)]
fn within_range_column_body<T, const FULL: usize>(
    out: &mut [u8],
    lower: &[T],
    upper: &[T],
    src: &[T],
    kind: RangeKind,
) where
    T: SimdColumn<FULL> + SimdColumn<8>,
{
    debug_assert_eq!(lower.len(), src.len());
    debug_assert_eq!(upper.len(), src.len());
    pack_mask_stream::<FULL>(
        out,
        src.len(),
        |i| {
            let lo = <T as SimdColumn<FULL>>::load(&lower[i..i + FULL]);
            let hi = <T as SimdColumn<FULL>>::load(&upper[i..i + FULL]);
            let v = <T as SimdColumn<FULL>>::load(&src[i..i + FULL]);
            <T as SimdColumn<FULL>>::compare(kind.lower(), lo, v)
                & <T as SimdColumn<FULL>>::compare(kind.upper(), v, hi)
        },
        |i| {
            let lo = <T as SimdColumn<8>>::load(&lower[i..i + 8]);
            let hi = <T as SimdColumn<8>>::load(&upper[i..i + 8]);
            let v = <T as SimdColumn<8>>::load(&src[i..i + 8]);
            <T as SimdColumn<8>>::compare(kind.lower(), lo, v)
                & <T as SimdColumn<8>>::compare(kind.upper(), v, hi)
        },
    );
}

#[inline(always)]
fn arith_compare_body<T, const FULL: usize>(
    out: &mut [u8],
    src: &[T],
    rhs: T::Acc,
    value: T::Acc,
    aop: ArithOp,
    cmp: CompareOp,
) -> bool
where
    T: SimdColumn<FULL> + SimdColumn<8>,
{
    if !T::arith_supported(aop) {
        return false;
    }
    debug_assert!(matches!(cmp, CompareOp::Eq | CompareOp::Ne));

    if T::IS_FLOAT && aop == ArithOp::Div {
        // x / rhs cmp value, evaluated as x cmp rhs * value
        let target = rhs * value;
        let t_full = <T as SimdColumn<FULL>>::acc_splat(target);
        let t_8 = <T as SimdColumn<8>>::acc_splat(target);
        pack_mask_stream::<FULL>(
            out,
            src.len(),
            |i| {
                let v = <T as SimdColumn<FULL>>::load(&src[i..i + FULL]);
                <T as SimdColumn<FULL>>::acc_compare(
                    cmp,
                    <T as SimdColumn<FULL>>::widen_lanes(v),
                    t_full,
                )
            },
            |i| {
                let v = <T as SimdColumn<8>>::load(&src[i..i + 8]);
                <T as SimdColumn<8>>::acc_compare(cmp, <T as SimdColumn<8>>::widen_lanes(v), t_8)
            },
        );
        return true;
    }

    let r_full = <T as SimdColumn<FULL>>::acc_splat(rhs);
    let v_full = <T as SimdColumn<FULL>>::acc_splat(value);
    let r_8 = <T as SimdColumn<8>>::acc_splat(rhs);
    let v_8 = <T as SimdColumn<8>>::acc_splat(value);
    pack_mask_stream::<FULL>(
        out,
        src.len(),
        |i| {
            let v = <T as SimdColumn<FULL>>::load(&src[i..i + FULL]);
            let acc = <T as SimdColumn<FULL>>::acc_arith(
                aop,
                <T as SimdColumn<FULL>>::widen_lanes(v),
                r_full,
            );
            <T as SimdColumn<FULL>>::acc_compare(cmp, acc, v_full)
        },
        |i| {
            let v = <T as SimdColumn<8>>::load(&src[i..i + 8]);
            let acc =
                <T as SimdColumn<8>>::acc_arith(aop, <T as SimdColumn<8>>::widen_lanes(v), r_8);
            <T as SimdColumn<8>>::acc_compare(cmp, acc, v_8)
        },
    );
    true
}

macro_rules! w256_backend {
    ($t:ty, $full:expr, $cv:ident, $cc:ident, $rv:ident, $rc:ident, $ac:ident) => {
        /// # Safety
        /// Requires `avx2` on the running CPU.
        #[target_feature(enable = "avx2")]
        pub unsafe fn $cv(out: &mut [u8], src: &[$t], op: CompareOp, value: $t) -> bool {
            compare_val_body::<$t, $full>(out, src, op, value);
            true
        }

        /// # Safety
        /// Requires `avx2` on the running CPU.
        #[target_feature(enable = "avx2")]
        pub unsafe fn $cc(out: &mut [u8], left: &[$t], right: &[$t], op: CompareOp) -> bool {
            compare_column_body::<$t, $full>(out, left, right, op);
            true
        }

        /// # Safety
        /// Requires `avx2` on the running CPU.
        #[target_feature(enable = "avx2")]
        pub unsafe fn $rv(
            out: &mut [u8],
            src: &[$t],
            lower: $t,
            upper: $t,
            kind: RangeKind,
        ) -> bool {
            within_range_val_body::<$t, $full>(out, src, lower, upper, kind);
            true
        }

        /// # Safety
        /// Requires `avx2` on the running CPU.
        #[target_feature(enable = "avx2")]
        pub unsafe fn $rc(
            out: &mut [u8],
            lower: &[$t],
            upper: &[$t],
            src: &[$t],
            kind: RangeKind,
        ) -> bool {
            within_range_column_body::<$t, $full>(out, lower, upper, src, kind);
            true
        }

        /// # Safety
        /// Requires `avx2` on the running CPU.
        #[target_feature(enable = "avx2")]
        pub unsafe fn $ac(
            out: &mut [u8],
            src: &[$t],
            rhs: <$t as ColumnValue>::Acc,
            value: <$t as ColumnValue>::Acc,
            aop: ArithOp,
            cmp: CompareOp,
        ) -> bool {
            arith_compare_body::<$t, $full>(out, src, rhs, value, aop, cmp)
        }
    };
}

w256_backend!(
    i8,
    32,
    compare_val_i8,
    compare_column_i8,
    within_range_val_i8,
    within_range_column_i8,
    arith_compare_i8
);
w256_backend!(
    i16,
    16,
    compare_val_i16,
    compare_column_i16,
    within_range_val_i16,
    within_range_column_i16,
    arith_compare_i16
);
w256_backend!(
    i32,
    8,
    compare_val_i32,
    compare_column_i32,
    within_range_val_i32,
    within_range_column_i32,
    arith_compare_i32
);
w256_backend!(
    i64,
    4,
    compare_val_i64,
    compare_column_i64,
    within_range_val_i64,
    within_range_column_i64,
    arith_compare_i64
);
w256_backend!(
    f32,
    8,
    compare_val_f32,
    compare_column_f32,
    within_range_val_f32,
    within_range_column_f32,
    arith_compare_f32
);
w256_backend!(
    f64,
    4,
    compare_val_f64,
    compare_column_f64,
    within_range_val_f64,
    within_range_column_f64,
    arith_compare_f64
);
