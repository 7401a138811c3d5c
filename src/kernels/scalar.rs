//! # **Scalar Predicate Kernels** - *Reference Implementations*
//!
//! Plain per-element loops writing through bit proxies, so they accept any
//! start-bit offset. These are the oracle the SIMD backends are tested
//! against and the fallback whenever a backend declines a call.

use crate::enums::operators::{ArithOp, CompareOp, RangeKind};
use crate::structs::proxy::bit_at_mut;
use crate::traits::column::ColumnValue;
use crate::traits::word::Word;

/// Bit `start + i` = `op(src[i], value)`.
pub fn compare_val<W: Word, T: ColumnValue>(
    data: &mut [W],
    start: usize,
    src: &[T],
    op: CompareOp,
    value: T,
) {
    for (i, &x) in src.iter().enumerate() {
        bit_at_mut(data, start + i).assign(op.apply(x, value));
    }
}

/// Bit `start + i` = `op(left[i], right[i])`.
pub fn compare_column<W: Word, T: ColumnValue>(
    data: &mut [W],
    start: usize,
    left: &[T],
    right: &[T],
    op: CompareOp,
) {
    debug_assert_eq!(left.len(), right.len());
    for (i, (&l, &r)) in left.iter().zip(right.iter()).enumerate() {
        bit_at_mut(data, start + i).assign(op.apply(l, r));
    }
}

/// Bit `start + i` = `lower cmp src[i] AND src[i] cmp upper` with the
/// comparisons selected by `kind`.
pub fn within_range_val<W: Word, T: ColumnValue>(
    data: &mut [W],
    start: usize,
    lower: T,
    upper: T,
    src: &[T],
    kind: RangeKind,
) {
    for (i, &x) in src.iter().enumerate() {
        let mut bit = bit_at_mut(data, start + i);
        bit.assign(kind.lower().apply(lower, x));
        bit.and_assign(kind.upper().apply(x, upper));
    }
}

/// Column-bound variant of [`within_range_val`].
pub fn within_range_column<W: Word, T: ColumnValue>(
    data: &mut [W],
    start: usize,
    lower: &[T],
    upper: &[T],
    src: &[T],
    kind: RangeKind,
) {
    debug_assert_eq!(lower.len(), src.len());
    debug_assert_eq!(upper.len(), src.len());
    for (i, &x) in src.iter().enumerate() {
        bit_at_mut(data, start + i).assign(kind.contains(lower[i], x, upper[i]));
    }
}

/// Bit `start + i` = `cmp(aop(widen(src[i]), rhs), value)`.
///
/// `cmp` must be `Eq` or `Ne`. Float `Div` is evaluated as
/// `cmp(x, rhs * value)`, trading a division per element for one multiply
/// up front; results can differ from true division at rounding boundaries,
/// identically across every backend.
pub fn arith_compare<W: Word, T: ColumnValue>(
    data: &mut [W],
    start: usize,
    src: &[T],
    rhs: T::Acc,
    value: T::Acc,
    aop: ArithOp,
    cmp: CompareOp,
) {
    debug_assert!(matches!(cmp, CompareOp::Eq | CompareOp::Ne));
    if T::IS_FLOAT && aop == ArithOp::Div {
        let target = rhs * value;
        for (i, &x) in src.iter().enumerate() {
            bit_at_mut(data, start + i).assign(cmp.apply(x.widen(), target));
        }
        return;
    }
    for (i, &x) in src.iter().enumerate() {
        bit_at_mut(data, start + i).assign(cmp.apply(aop.apply(x.widen(), rhs), value));
    }
}
