//! # **Vectorized Policy** - *Head/Body/Tail Split Over the SIMD Backends*
//!
//! Wraps the scalar kernels and one SIMD backend. A predicate over
//! `(start, n)` splits at word boundaries: the head and tail always run
//! scalar (sub-byte masking is not worth vector lanes), while the
//! word-aligned body is reinterpreted as bytes and offered to the backend.
//! A declined body falls back to the scalar kernel over the same range.
//!
//! The body's bit count is a whole number of words, so this is the single
//! place the backends' `n % 8 == 0` precondition is established.

use crate::enums::operators::{ArithOp, CompareOp, RangeKind};
use crate::kernels::dispatch::DispatchColumn;
use crate::kernels::scalar;
use crate::kernels::simd::scalable;
use crate::traits::word::Word;

/// One SIMD backend as seen by the policy layer.
///
/// Every entry point returns `true` when it wrote the full result and
/// `false` when it declined; a declined call must not touch `out`. The
/// default methods decline everything, which is the reference vectorizer.
pub trait Vectorizer {
    fn compare_val<T: DispatchColumn>(
        out: &mut [u8],
        src: &[T],
        op: CompareOp,
        value: T,
    ) -> bool {
        let _ = (out, src, op, value);
        false
    }

    fn compare_column<T: DispatchColumn>(
        out: &mut [u8],
        left: &[T],
        right: &[T],
        op: CompareOp,
    ) -> bool {
        let _ = (out, left, right, op);
        false
    }

    fn within_range_val<T: DispatchColumn>(
        out: &mut [u8],
        src: &[T],
        lower: T,
        upper: T,
        kind: RangeKind,
    ) -> bool {
        let _ = (out, src, lower, upper, kind);
        false
    }

    fn within_range_column<T: DispatchColumn>(
        out: &mut [u8],
        lower: &[T],
        upper: &[T],
        src: &[T],
        kind: RangeKind,
    ) -> bool {
        let _ = (out, lower, upper, src, kind);
        false
    }

    fn arith_compare<T: DispatchColumn>(
        out: &mut [u8],
        src: &[T],
        rhs: T::Acc,
        value: T::Acc,
        aop: ArithOp,
        cmp: CompareOp,
    ) -> bool {
        let _ = (out, src, rhs, value, aop, cmp);
        false
    }
}

/// Declines every call, forcing the scalar path throughout.
pub struct RefVectorizer;

impl Vectorizer for RefVectorizer {}

/// Indirects through the process-wide dispatch table.
pub struct DynamicVectorizer;

impl Vectorizer for DynamicVectorizer {
    #[inline(always)]
    fn compare_val<T: DispatchColumn>(out: &mut [u8], src: &[T], op: CompareOp, value: T) -> bool {
        // SAFETY: the slot was bound against the backend chosen by the CPU
        // probe, so its target features are present on this machine.
        unsafe { (T::kernel_slots().compare_val)(out, src, op, value) }
    }

    #[inline(always)]
    fn compare_column<T: DispatchColumn>(
        out: &mut [u8],
        left: &[T],
        right: &[T],
        op: CompareOp,
    ) -> bool {
        // SAFETY: as above
        unsafe { (T::kernel_slots().compare_column)(out, left, right, op) }
    }

    #[inline(always)]
    fn within_range_val<T: DispatchColumn>(
        out: &mut [u8],
        src: &[T],
        lower: T,
        upper: T,
        kind: RangeKind,
    ) -> bool {
        // SAFETY: as above
        unsafe { (T::kernel_slots().within_range_val)(out, src, lower, upper, kind) }
    }

    #[inline(always)]
    fn within_range_column<T: DispatchColumn>(
        out: &mut [u8],
        lower: &[T],
        upper: &[T],
        src: &[T],
        kind: RangeKind,
    ) -> bool {
        // SAFETY: as above
        unsafe { (T::kernel_slots().within_range_column)(out, lower, upper, src, kind) }
    }

    #[inline(always)]
    fn arith_compare<T: DispatchColumn>(
        out: &mut [u8],
        src: &[T],
        rhs: T::Acc,
        value: T::Acc,
        aop: ArithOp,
        cmp: CompareOp,
    ) -> bool {
        // SAFETY: as above
        unsafe { (T::kernel_slots().arith_compare)(out, src, rhs, value, aop, cmp) }
    }
}

/// Compile-time pick of the scalable backend at its 8-lane
/// instantiation. Portable to every target, independent of the probe.
pub struct ScalableVectorizer;

impl Vectorizer for ScalableVectorizer {
    #[inline(always)]
    fn compare_val<T: DispatchColumn>(out: &mut [u8], src: &[T], op: CompareOp, value: T) -> bool {
        scalable::compare_val::<T, 8>(out, src, op, value)
    }

    #[inline(always)]
    fn compare_column<T: DispatchColumn>(
        out: &mut [u8],
        left: &[T],
        right: &[T],
        op: CompareOp,
    ) -> bool {
        scalable::compare_column::<T, 8>(out, left, right, op)
    }

    #[inline(always)]
    fn within_range_val<T: DispatchColumn>(
        out: &mut [u8],
        src: &[T],
        lower: T,
        upper: T,
        kind: RangeKind,
    ) -> bool {
        scalable::within_range_val::<T, 8>(out, src, lower, upper, kind)
    }

    #[inline(always)]
    fn within_range_column<T: DispatchColumn>(
        out: &mut [u8],
        lower: &[T],
        upper: &[T],
        src: &[T],
        kind: RangeKind,
    ) -> bool {
        scalable::within_range_column::<T, 8>(out, lower, upper, src, kind)
    }

    #[inline(always)]
    fn arith_compare<T: DispatchColumn>(
        out: &mut [u8],
        src: &[T],
        rhs: T::Acc,
        value: T::Acc,
        aop: ArithOp,
        cmp: CompareOp,
    ) -> bool {
        scalable::arith_compare::<T, 8>(out, src, rhs, value, aop, cmp)
    }
}

/// Split of a bit range at word boundaries.
struct Split {
    /// First body word.
    first: usize,
    /// One past the last body word.
    last: usize,
    /// Elements before the first word boundary.
    head: usize,
    /// Elements after the last word boundary.
    tail: usize,
}

#[inline(always)]
fn split<W: Word>(start: usize, size: usize) -> Option<Split> {
    let mut first = start / W::BITS;
    let last = (start + size) / W::BITS;
    let start_shift = start % W::BITS;
    let end_shift = (start + size) % W::BITS;

    if first == last {
        // whole range inside one word
        return None;
    }

    let mut head = 0;
    if start_shift != 0 {
        head = W::BITS - start_shift;
        first += 1;
    }
    Some(Split {
        first,
        last,
        head,
        tail: end_shift,
    })
}

/// View the body words as the byte stream the backends write into.
#[inline(always)]
fn body_bytes<W: Word>(data: &mut [W], first: usize, last: usize) -> &mut [u8] {
    let body = &mut data[first..last];
    // SAFETY: a word slice is always valid as its own bytes; the borrow
    // ends before any scalar fallback re-borrows `data`.
    unsafe {
        core::slice::from_raw_parts_mut(
            body.as_mut_ptr().cast::<u8>(),
            body.len() * core::mem::size_of::<W>(),
        )
    }
}

/// Bit `start + i` of `data` = `op(src[i], value)`.
pub fn compare_val<W: Word, V: Vectorizer, T: DispatchColumn>(
    data: &mut [W],
    start: usize,
    src: &[T],
    op: CompareOp,
    value: T,
) {
    let size = src.len();
    if size == 0 {
        return;
    }
    let Some(s) = split::<W>(start, size) else {
        scalar::compare_val(data, start, src, op, value);
        return;
    };

    if s.head != 0 {
        scalar::compare_val(data, start, &src[..s.head], op, value);
    }

    let body_bits = (s.last - s.first) * W::BITS;
    if body_bits != 0 {
        let body = &src[s.head..s.head + body_bits];
        if !V::compare_val(body_bytes::<W>(data, s.first, s.last), body, op, value) {
            scalar::compare_val(data, s.first * W::BITS, body, op, value);
        }
    }

    if s.tail != 0 {
        scalar::compare_val(
            data,
            s.last * W::BITS,
            &src[s.head + body_bits..],
            op,
            value,
        );
    }
}

/// Bit `start + i` of `data` = `op(left[i], right[i])`.
pub fn compare_column<W: Word, V: Vectorizer, T: DispatchColumn>(
    data: &mut [W],
    start: usize,
    left: &[T],
    right: &[T],
    op: CompareOp,
) {
    debug_assert_eq!(left.len(), right.len());
    let size = left.len();
    if size == 0 {
        return;
    }
    let Some(s) = split::<W>(start, size) else {
        scalar::compare_column(data, start, left, right, op);
        return;
    };

    if s.head != 0 {
        scalar::compare_column(data, start, &left[..s.head], &right[..s.head], op);
    }

    let body_bits = (s.last - s.first) * W::BITS;
    if body_bits != 0 {
        let l = &left[s.head..s.head + body_bits];
        let r = &right[s.head..s.head + body_bits];
        if !V::compare_column(body_bytes::<W>(data, s.first, s.last), l, r, op) {
            scalar::compare_column(data, s.first * W::BITS, l, r, op);
        }
    }

    if s.tail != 0 {
        scalar::compare_column(
            data,
            s.last * W::BITS,
            &left[s.head + body_bits..],
            &right[s.head + body_bits..],
            op,
        );
    }
}

/// Bit `start + i` of `data` = `src[i]` within the bounds under `kind`.
pub fn within_range_val<W: Word, V: Vectorizer, T: DispatchColumn>(
    data: &mut [W],
    start: usize,
    lower: T,
    upper: T,
    src: &[T],
    kind: RangeKind,
) {
    let size = src.len();
    if size == 0 {
        return;
    }
    let Some(s) = split::<W>(start, size) else {
        scalar::within_range_val(data, start, lower, upper, src, kind);
        return;
    };

    if s.head != 0 {
        scalar::within_range_val(data, start, lower, upper, &src[..s.head], kind);
    }

    let body_bits = (s.last - s.first) * W::BITS;
    if body_bits != 0 {
        let body = &src[s.head..s.head + body_bits];
        if !V::within_range_val(body_bytes::<W>(data, s.first, s.last), body, lower, upper, kind)
        {
            scalar::within_range_val(data, s.first * W::BITS, lower, upper, body, kind);
        }
    }

    if s.tail != 0 {
        scalar::within_range_val(
            data,
            s.last * W::BITS,
            lower,
            upper,
            &src[s.head + body_bits..],
            kind,
        );
    }
}

/// Column-bound variant of [`within_range_val`].
pub fn within_range_column<W: Word, V: Vectorizer, T: DispatchColumn>(
    data: &mut [W],
    start: usize,
    lower: &[T],
    upper: &[T],
    src: &[T],
    kind: RangeKind,
) {
    debug_assert_eq!(lower.len(), src.len());
    debug_assert_eq!(upper.len(), src.len());
    let size = src.len();
    if size == 0 {
        return;
    }
    let Some(s) = split::<W>(start, size) else {
        scalar::within_range_column(data, start, lower, upper, src, kind);
        return;
    };

    if s.head != 0 {
        scalar::within_range_column(
            data,
            start,
            &lower[..s.head],
            &upper[..s.head],
            &src[..s.head],
            kind,
        );
    }

    let body_bits = (s.last - s.first) * W::BITS;
    if body_bits != 0 {
        let lo = &lower[s.head..s.head + body_bits];
        let hi = &upper[s.head..s.head + body_bits];
        let v = &src[s.head..s.head + body_bits];
        if !V::within_range_column(body_bytes::<W>(data, s.first, s.last), lo, hi, v, kind) {
            scalar::within_range_column(data, s.first * W::BITS, lo, hi, v, kind);
        }
    }

    if s.tail != 0 {
        scalar::within_range_column(
            data,
            s.last * W::BITS,
            &lower[s.head + body_bits..],
            &upper[s.head + body_bits..],
            &src[s.head + body_bits..],
            kind,
        );
    }
}

/// Bit `start + i` of `data` = `cmp(aop(widen(src[i]), rhs), value)`.
pub fn arith_compare<W: Word, V: Vectorizer, T: DispatchColumn>(
    data: &mut [W],
    start: usize,
    src: &[T],
    rhs: T::Acc,
    value: T::Acc,
    aop: ArithOp,
    cmp: CompareOp,
) {
    let size = src.len();
    if size == 0 {
        return;
    }
    let Some(s) = split::<W>(start, size) else {
        scalar::arith_compare(data, start, src, rhs, value, aop, cmp);
        return;
    };

    if s.head != 0 {
        scalar::arith_compare(data, start, &src[..s.head], rhs, value, aop, cmp);
    }

    let body_bits = (s.last - s.first) * W::BITS;
    if body_bits != 0 {
        let body = &src[s.head..s.head + body_bits];
        if !V::arith_compare(body_bytes::<W>(data, s.first, s.last), body, rhs, value, aop, cmp)
        {
            scalar::arith_compare(data, s.first * W::BITS, body, rhs, value, aop, cmp);
        }
    }

    if s.tail != 0 {
        scalar::arith_compare(
            data,
            s.last * W::BITS,
            &src[s.head + body_bits..],
            rhs,
            value,
            aop,
            cmp,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::element_wise::op_count;
    use crate::structs::proxy::bit_at;

    fn check_against_scalar<V: Vectorizer>(start: usize, n: usize) {
        let src: Vec<i32> = (0..n as i32).map(|i| i % 7).collect();
        let words = start / 64 + n / 64 + 2;

        let mut expect = vec![0u64; words];
        scalar::compare_val(&mut expect, start, &src, CompareOp::Le, 3);

        let mut got = vec![0u64; words];
        compare_val::<u64, V, i32>(&mut got, start, &src, CompareOp::Le, 3);

        for i in 0..start + n {
            assert_eq!(
                bit_at(&got, i).get(),
                bit_at(&expect, i).get(),
                "start={start} n={n} bit={i}"
            );
        }
    }

    #[test]
    fn test_matches_scalar_across_offsets() {
        for start in [0usize, 1, 7, 8, 63, 64, 65] {
            for n in [0usize, 1, 8, 63, 64, 100, 256] {
                check_against_scalar::<ScalableVectorizer>(start, n);
                check_against_scalar::<DynamicVectorizer>(start, n);
                check_against_scalar::<RefVectorizer>(start, n);
            }
        }
    }

    #[test]
    fn test_preserves_neighbouring_bits() {
        let src: Vec<i64> = (0..100).collect();
        let mut data = vec![u64::MAX; 4];
        compare_val::<u64, ScalableVectorizer, i64>(&mut data, 30, &src, CompareOp::Lt, 0);
        // predicate is everywhere-false over [30, 130)
        assert_eq!(op_count(&data, 30, 100), 0);
        assert_eq!(op_count(&data, 0, 30), 30);
        assert_eq!(op_count(&data, 130, 126), 126);
    }

    #[test]
    fn test_arith_fallback_matches_scalar() {
        // integer Div declines on every backend, exercising the fallback
        let src: Vec<i32> = (1..129).collect();
        let mut expect = vec![0u64; 3];
        scalar::arith_compare(&mut expect, 5, &src, 4, 8, ArithOp::Div, CompareOp::Eq);
        let mut got = vec![0u64; 3];
        arith_compare::<u64, DynamicVectorizer, i32>(
            &mut got,
            5,
            &src,
            4,
            8,
            ArithOp::Div,
            CompareOp::Eq,
        );
        for i in 0..133 {
            assert_eq!(bit_at(&got, i).get(), bit_at(&expect, i).get(), "bit {i}");
        }
    }
}
