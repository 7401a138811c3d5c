//! # **Column Trait** - *Scalar Element Types for Predicate Kernels*
//!
//! Typed columns fed to the predicate kernels carry one of six element
//! types: `i8`, `i16`, `i32`, `i64`, `f32`, `f64`. Arithmetic predicates
//! widen integers to an `i64` accumulator before computing, so narrow
//! columns do not overflow mid-expression; floats accumulate in their own
//! width.

use std::simd::SimdElement;

use num_traits::Num;

use crate::enums::operators::ArithOp;

/// Element type of a scalar column consumed by the predicate kernels.
pub trait ColumnValue:
    Copy + Default + PartialOrd + SimdElement + Send + Sync + 'static
{
    /// Accumulator type for arithmetic predicates: `i64` for the integer
    /// widths, `Self` for floats.
    type Acc: Copy + Default + PartialOrd + Num + SimdElement + Send + Sync + 'static;

    /// True for `f32`/`f64`. Float division predicates are rewritten into
    /// a multiply against the compare target, keeping scalar and SIMD
    /// outputs bit-identical.
    const IS_FLOAT: bool;

    /// Widen an element into the accumulator type.
    fn widen(self) -> Self::Acc;

    /// Whether the SIMD backends implement `op` for this element family.
    /// Unsupported combinations decline and run on the scalar path.
    fn arith_supported(op: ArithOp) -> bool;
}

macro_rules! int_column_value {
    ($($t:ty),*) => {
        $(
            impl ColumnValue for $t {
                type Acc = i64;
                const IS_FLOAT: bool = false;

                #[inline(always)]
                fn widen(self) -> i64 {
                    self as i64
                }

                #[inline(always)]
                fn arith_supported(op: ArithOp) -> bool {
                    // no lane-wise integer division on any backend
                    matches!(op, ArithOp::Add | ArithOp::Sub | ArithOp::Mul)
                }
            }
        )*
    };
}

macro_rules! float_column_value {
    ($($t:ty),*) => {
        $(
            impl ColumnValue for $t {
                type Acc = $t;
                const IS_FLOAT: bool = true;

                #[inline(always)]
                fn widen(self) -> $t {
                    self
                }

                #[inline(always)]
                fn arith_supported(op: ArithOp) -> bool {
                    !matches!(op, ArithOp::Mod)
                }
            }
        )*
    };
}

int_column_value!(i8, i16, i32, i64);
float_column_value!(f32, f64);
