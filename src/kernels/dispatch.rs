//! # **Dispatch Module** - *Runtime CPU Probe and Kernel Binding*
//!
//! Probes the hardware once and binds a table of per-operator,
//! per-element-type function pointers to the best available backend.
//! Every slot starts at the declining reference implementation and is
//! upgraded in order of preference, widest first. Binding is one-shot;
//! after initialisation the table is immutable and read lock-free from
//! any thread.

use std::sync::OnceLock;

use crate::enums::operators::{ArithOp, CompareOp, RangeKind};
use crate::kernels::simd::scalable;
#[cfg(target_arch = "x86_64")]
use crate::kernels::simd::{w256, w512};
use crate::traits::column::ColumnValue;

/// Backend families a dispatch slot can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Decline everything; all predicate work runs scalar.
    Reference,
    /// 256-bit lane-packed kernels (AVX2 class).
    Packed256,
    /// 512-bit hardware-mask kernels (AVX-512 class).
    Masked512,
    /// Scalable kernels instantiated at 16-byte vectors.
    Scalable128,
    /// Scalable kernels instantiated at 32-byte vectors.
    Scalable256,
}

/// The backend selected for this process.
pub fn active_backend() -> BackendKind {
    static BACKEND: OnceLock<BackendKind> = OnceLock::new();
    *BACKEND.get_or_init(probe)
}

fn probe() -> BackendKind {
    // the byte-reinterpreting body path is little-endian only; the word
    // path the scalar kernels use is endian-neutral
    if cfg!(target_endian = "big") {
        return BackendKind::Reference;
    }

    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("avx512f")
            && std::arch::is_x86_feature_detected!("avx512bw")
        {
            return BackendKind::Masked512;
        }
        if std::arch::is_x86_feature_detected!("avx2") {
            return BackendKind::Packed256;
        }
    }

    #[cfg(all(target_arch = "aarch64", target_os = "linux"))]
    {
        // SVE presence comes from the auxiliary capability word
        let hwcap = unsafe { libc::getauxval(libc::AT_HWCAP) };
        if hwcap & libc::HWCAP_SVE != 0 {
            return BackendKind::Scalable256;
        }
    }

    BackendKind::Scalable128
}

/// Function-pointer table for one element type: one slot per operator
/// family. A slot returns `true` when it wrote the full result and
/// `false` when it declined without touching the output.
///
/// Slots are `unsafe fn` because the bound kernels may carry target
/// features; the probe guarantees they are present before binding.
pub struct KernelSlots<T: ColumnValue> {
    pub compare_val: unsafe fn(&mut [u8], &[T], CompareOp, T) -> bool,
    pub compare_column: unsafe fn(&mut [u8], &[T], &[T], CompareOp) -> bool,
    pub within_range_val: unsafe fn(&mut [u8], &[T], T, T, RangeKind) -> bool,
    pub within_range_column: unsafe fn(&mut [u8], &[T], &[T], &[T], RangeKind) -> bool,
    pub arith_compare: unsafe fn(&mut [u8], &[T], T::Acc, T::Acc, ArithOp, CompareOp) -> bool,
}

// Decline-everything defaults, the reference backend.

fn decline_compare_val<T: ColumnValue>(_: &mut [u8], _: &[T], _: CompareOp, _: T) -> bool {
    false
}

fn decline_compare_column<T: ColumnValue>(_: &mut [u8], _: &[T], _: &[T], _: CompareOp) -> bool {
    false
}

fn decline_within_range_val<T: ColumnValue>(
    _: &mut [u8],
    _: &[T],
    _: T,
    _: T,
    _: RangeKind,
) -> bool {
    false
}

fn decline_within_range_column<T: ColumnValue>(
    _: &mut [u8],
    _: &[T],
    _: &[T],
    _: &[T],
    _: RangeKind,
) -> bool {
    false
}

fn decline_arith_compare<T: ColumnValue>(
    _: &mut [u8],
    _: &[T],
    _: T::Acc,
    _: T::Acc,
    _: ArithOp,
    _: CompareOp,
) -> bool {
    false
}

fn reference_slots<T: ColumnValue>() -> KernelSlots<T> {
    KernelSlots {
        compare_val: decline_compare_val::<T>,
        compare_column: decline_compare_column::<T>,
        within_range_val: decline_within_range_val::<T>,
        within_range_column: decline_within_range_column::<T>,
        arith_compare: decline_arith_compare::<T>,
    }
}

/// Element types with a bound dispatch table.
pub trait DispatchColumn: crate::kernels::simd::lanes::SimdColumn<8> {
    /// The process-wide slots for this element type, bound on first use.
    fn kernel_slots() -> &'static KernelSlots<Self>;
}

macro_rules! bind_dispatch {
    ($t:ty, $slots:ident, $n128:expr, $n256:expr,
     $cv:ident, $cc:ident, $rv:ident, $rc:ident, $ac:ident) => {
        static $slots: OnceLock<KernelSlots<$t>> = OnceLock::new();

        impl DispatchColumn for $t {
            fn kernel_slots() -> &'static KernelSlots<$t> {
                $slots.get_or_init(|| match active_backend() {
                    #[cfg(target_arch = "x86_64")]
                    BackendKind::Masked512 => KernelSlots {
                        compare_val: w512::$cv,
                        compare_column: w512::$cc,
                        within_range_val: w512::$rv,
                        within_range_column: w512::$rc,
                        arith_compare: w512::$ac,
                    },
                    #[cfg(target_arch = "x86_64")]
                    BackendKind::Packed256 => KernelSlots {
                        compare_val: w256::$cv,
                        compare_column: w256::$cc,
                        within_range_val: w256::$rv,
                        within_range_column: w256::$rc,
                        arith_compare: w256::$ac,
                    },
                    BackendKind::Scalable128 => KernelSlots {
                        compare_val: scalable::compare_val::<$t, $n128>,
                        compare_column: scalable::compare_column::<$t, $n128>,
                        within_range_val: scalable::within_range_val::<$t, $n128>,
                        within_range_column: scalable::within_range_column::<$t, $n128>,
                        arith_compare: scalable::arith_compare::<$t, $n128>,
                    },
                    BackendKind::Scalable256 => KernelSlots {
                        compare_val: scalable::compare_val::<$t, $n256>,
                        compare_column: scalable::compare_column::<$t, $n256>,
                        within_range_val: scalable::within_range_val::<$t, $n256>,
                        within_range_column: scalable::within_range_column::<$t, $n256>,
                        arith_compare: scalable::arith_compare::<$t, $n256>,
                    },
                    _ => reference_slots::<$t>(),
                })
            }
        }
    };
}

bind_dispatch!(
    i8,
    SLOTS_I8,
    16,
    32,
    compare_val_i8,
    compare_column_i8,
    within_range_val_i8,
    within_range_column_i8,
    arith_compare_i8
);
bind_dispatch!(
    i16,
    SLOTS_I16,
    8,
    16,
    compare_val_i16,
    compare_column_i16,
    within_range_val_i16,
    within_range_column_i16,
    arith_compare_i16
);
bind_dispatch!(
    i32,
    SLOTS_I32,
    4,
    8,
    compare_val_i32,
    compare_column_i32,
    within_range_val_i32,
    within_range_column_i32,
    arith_compare_i32
);
bind_dispatch!(
    i64,
    SLOTS_I64,
    2,
    4,
    compare_val_i64,
    compare_column_i64,
    within_range_val_i64,
    within_range_column_i64,
    arith_compare_i64
);
bind_dispatch!(
    f32,
    SLOTS_F32,
    4,
    8,
    compare_val_f32,
    compare_column_f32,
    within_range_val_f32,
    within_range_column_f32,
    arith_compare_f32
);
bind_dispatch!(
    f64,
    SLOTS_F64,
    2,
    4,
    compare_val_f64,
    compare_column_f64,
    within_range_val_f64,
    within_range_column_f64,
    arith_compare_f64
);
