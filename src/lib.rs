//! # **Bitsieve** – Packed Bitsets with Vectorized Predicate Kernels
//!
//! Rust-first building block for vectorized execution pipelines: a packed
//! bitset with arbitrary bit offsets, plus a family of multi-backend
//! predicate kernels that evaluate comparison, range and fused
//! arithmetic-compare tests over typed scalar columns straight into packed
//! bitmasks.
//!
//! ## Key Features
//! - **Bit-packed data model** with sub-word offsets: every operation
//!   addresses `(words, start_bit, n_bits)`, so sub-range views are
//!   first-class observers *and* mutators.
//! - **Full set-algebra surface** – AND, OR, XOR, SUB, flip, copy, fill,
//!   popcount, all/any/none, equality, find-next-set.
//! - **Three SIMD backends** – 256-bit lane-packed, 512-bit hardware-mask
//!   and a vector-length-parametric scalable backend – all producing
//!   bit-identical results to the scalar reference.
//! - **Runtime CPU dispatch** – one probe at first use binds per-operator,
//!   per-type kernel slots; unsupported combinations silently fall back to
//!   the scalar path.
//! - **64-byte aligned storage** via `Vec64` for predictable SIMD loads.
//!
//! ## Example
//! ```rust
//! use bitsieve::{Bitset, CompareOp};
//!
//! let col: Vec<i32> = (0..100).collect();
//! let hits = Bitset::<u64>::from_compare_val(&col, CompareOp::Lt, 10);
//! assert_eq!(hits.count_ones(), 10);
//! assert_eq!(hits.find_first(), Some(0));
//!
//! let mut mask = Bitset::<u64>::with_len(100, false);
//! mask.set(2, true);
//! mask.set(50, true);
//! let both = &hits & &mask;
//! assert_eq!(both.count_ones(), 1);
//! ```
//!
//! ## Requirements
//! Requires Rust nightly for `portable_simd`.

#![feature(portable_simd)]

/// **CompareOp**, **RangeKind**, **ArithOp**, **KernelError** - *Operator tags and errors.*
pub mod enums {
    pub mod error;
    pub mod operators;
}

/// **Bitset**, **BitsetV**, **BitRef** - *Containers, views and bit handles.*
pub mod structs {
    pub mod views {
        pub mod bitset_view;
    }
    pub mod bitset;
    pub mod proxy;
}

/// **Element-wise**, **scalar**, **SIMD** and **dispatch** kernel layers.
pub mod kernels {
    pub mod simd {
        pub mod lanes;
        pub mod scalable;
        #[cfg(target_arch = "x86_64")]
        pub mod w256;
        #[cfg(target_arch = "x86_64")]
        pub mod w512;
    }
    pub mod dispatch;
    pub mod element_wise;
    pub mod scalar;
    pub mod vectorized;
}

/// **Word**, **ColumnValue** - *Storage and element type unions.*
pub mod traits {
    pub mod column;
    pub mod word;
}

pub use enums::error::KernelError;
pub use enums::operators::{ArithOp, CompareOp, RangeKind};
pub use kernels::dispatch::{BackendKind, DispatchColumn, KernelSlots, active_backend};
pub use kernels::simd::lanes::SimdColumn;
pub use kernels::vectorized::{DynamicVectorizer, RefVectorizer, ScalableVectorizer, Vectorizer};
pub use structs::bitset::Bitset;
pub use structs::proxy::{BitRef, BitRefConst};
pub use structs::views::bitset_view::{BitsetV, BitsetVMut};
pub use traits::column::ColumnValue;
pub use traits::word::Word;
