//! # **Bitset Module** - *Owning Packed Bitset*
//!
//! 64-byte-aligned packed bitset over a chosen storage-word width.
//!
//! ## Purpose
//! - Result carrier for the predicate kernels (one bit per column row).
//! - General set-algebra workhorse: AND, OR, XOR, SUB, flip, fill,
//!   popcount, find, append, resize.
//!
//! ## Behaviour
//! - LSB of word 0 is logical bit 0.
//! - Zero-copy windowing via [`BitsetV`] / [`BitsetVMut`] (`view`,
//!   `view_mut`); views observe and mutate the same storage.
//! - Bits past `len` in the last word are unobservable and may hold
//!   arbitrary values; every operation masks them.
//! - Resizing or reallocating invalidates outstanding views, which the
//!   borrow checker enforces.

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::ops::{BitAnd, BitOr, BitXor, Not, Sub};

use vec64::Vec64;

use crate::enums::error::KernelError;
use crate::enums::operators::{ArithOp, CompareOp, RangeKind};
use crate::kernels::dispatch::DispatchColumn;
use crate::kernels::element_wise;
use crate::kernels::vectorized::{self, DynamicVectorizer};
use crate::structs::proxy::bit_at_mut;
use crate::structs::views::bitset_view::{BitsetV, BitsetVMut};
use crate::traits::word::{Word, words_for};

/// # Bitset
///
/// Owning packed bitset parameterised over the storage word `W`.
///
/// The word width is an encapsulated choice: any `W` yields the same
/// observable bits, wider words just amortise the per-range bookkeeping.
/// `u64` is the default.
///
/// # Example
/// ```rust
/// use bitsieve::Bitset;
///
/// let mut b = Bitset::<u64>::with_len(10, false);
/// b.set(3, true);
/// b.set(7, true);
/// assert_eq!(b.count_ones(), 2);
///
/// let v = b.view(2, 6);
/// assert!(v.get(1)); // original bit 3
/// ```
#[derive(Clone)]
pub struct Bitset<W: Word = u64> {
    words: Vec64<W>,
    len: usize,
}

impl<W: Word> Default for Bitset<W> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Word> Bitset<W> {
    /// Constructs a new, empty bitset.
    #[inline]
    pub fn new() -> Self {
        Self {
            words: Vec64::new(),
            len: 0,
        }
    }

    /// Create with `len` bits, all set or all cleared.
    #[inline]
    pub fn with_len(len: usize, set: bool) -> Self {
        let fill = if set { !W::zero() } else { W::zero() };
        let n_words = words_for::<W>(len);
        let mut words = Vec64::with_capacity(n_words);
        words.resize(n_words, fill);
        Self { words, len }
    }

    /// Create empty with room reserved for `bits` bits.
    #[inline]
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: Vec64::with_capacity(words_for::<W>(bits)),
            len: 0,
        }
    }

    /// Construct from a slice of bools (true = set).
    pub fn from_bools(bits: &[bool]) -> Self {
        let mut out = Self::with_len(bits.len(), false);
        for (i, &b) in bits.iter().enumerate() {
            bit_at_mut(out.words.as_mut_slice(), i).or_assign(b);
        }
        out
    }

    /// Construct from existing storage words. `len` must fit.
    pub fn from_words(words: impl Into<Vec64<W>>, len: usize) -> Self {
        let words: Vec64<W> = words.into();
        assert!(
            len <= words.len() * W::BITS,
            "Bitset::from_words: len {} exceeds storage of {} bits",
            len,
            words.len() * W::BITS
        );
        Self { words, len }
    }

    /// Logical number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bits the current storage can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.words.len() * W::BITS
    }

    /// Underlying storage words.
    #[inline]
    pub fn as_words(&self) -> &[W] {
        self.words.as_slice()
    }

    /// Mutable storage words.
    #[inline]
    pub fn as_words_mut(&mut self) -> &mut [W] {
        self.words.as_mut_slice()
    }

    /// Returns bit `idx`.
    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        #[cfg(feature = "range_checks")]
        assert!(
            idx < self.len,
            "Bitset::get out of bounds (idx={idx}, len={})",
            self.len
        );
        // SAFETY: idx is in range (asserted above when checks are on,
        // caller contract otherwise)
        unsafe { self.get_unchecked(idx) }
    }

    /// Set or clear bit `idx`.
    #[inline]
    pub fn set(&mut self, idx: usize, value: bool) {
        #[cfg(feature = "range_checks")]
        assert!(
            idx < self.len,
            "Bitset::set out of bounds (idx={idx}, len={})",
            self.len
        );
        bit_at_mut(self.words.as_mut_slice(), idx).assign(value);
    }

    /// Bit read with no bounds checking.
    ///
    /// # Safety
    /// `idx` must be below `len`.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, idx: usize) -> bool {
        let w = unsafe { *self.words.as_slice().get_unchecked(idx / W::BITS) };
        (w >> (idx % W::BITS)) & W::one() != W::zero()
    }

    /// Bit write with no bounds checking.
    ///
    /// # Safety
    /// `idx` must be below `len`.
    #[inline(always)]
    pub unsafe fn set_unchecked(&mut self, idx: usize, value: bool) {
        let w = unsafe { self.words.as_mut_slice().get_unchecked_mut(idx / W::BITS) };
        let mask = W::one() << (idx % W::BITS);
        if value {
            *w |= mask;
        } else {
            *w &= !mask;
        }
    }

    /// Append one bit.
    #[inline]
    pub fn push(&mut self, value: bool) {
        let needed = words_for::<W>(self.len + 1);
        if self.words.len() < needed {
            self.words.resize(needed, W::zero());
        }
        self.len += 1;
        bit_at_mut(self.words.as_mut_slice(), self.len - 1).assign(value);
    }

    /// Set every bit to `value`.
    #[inline]
    pub fn fill(&mut self, value: bool) {
        element_wise::fill(self.words.as_mut_slice(), 0, self.len, value);
    }

    /// Set every bit.
    #[inline]
    pub fn set_all(&mut self) {
        element_wise::set_range(self.words.as_mut_slice(), 0, self.len);
    }

    /// Clear every bit.
    #[inline]
    pub fn reset_all(&mut self) {
        element_wise::reset_range(self.words.as_mut_slice(), 0, self.len);
    }

    /// Fill the window `[offset, offset + len)`.
    #[inline]
    pub fn fill_range(&mut self, offset: usize, len: usize, value: bool) {
        assert!(
            offset + len <= self.len,
            "Bitset::fill_range out of bounds (offset={offset}, len={len}, size={})",
            self.len
        );
        element_wise::fill(self.words.as_mut_slice(), offset, len, value);
    }

    /// Complement bit `idx`.
    #[inline]
    pub fn flip_bit(&mut self, idx: usize) {
        #[cfg(feature = "range_checks")]
        assert!(
            idx < self.len,
            "Bitset::flip_bit out of bounds (idx={idx}, len={})",
            self.len
        );
        bit_at_mut(self.words.as_mut_slice(), idx).flip();
    }

    /// Complement every bit.
    #[inline]
    pub fn flip_all(&mut self) {
        element_wise::flip_range(self.words.as_mut_slice(), 0, self.len);
    }

    /// Complement the window `[offset, offset + len)`.
    #[inline]
    pub fn flip_range(&mut self, offset: usize, len: usize) {
        assert!(
            offset + len <= self.len,
            "Bitset::flip_range out of bounds (offset={offset}, len={len}, size={})",
            self.len
        );
        element_wise::flip_range(self.words.as_mut_slice(), offset, len);
    }

    /// True iff every bit is set. Vacuously true when empty.
    #[inline]
    pub fn all_set(&self) -> bool {
        element_wise::all(self.words.as_slice(), 0, self.len)
    }

    /// True iff every bit is clear. Vacuously true when empty.
    #[inline]
    pub fn all_unset(&self) -> bool {
        element_wise::none(self.words.as_slice(), 0, self.len)
    }

    /// True iff at least one bit is set.
    #[inline]
    pub fn any_set(&self) -> bool {
        !self.all_unset()
    }

    /// Count of set bits.
    #[inline]
    pub fn count_ones(&self) -> usize {
        element_wise::op_count(self.words.as_slice(), 0, self.len)
    }

    /// Count of clear bits.
    #[inline]
    pub fn count_zeros(&self) -> usize {
        self.len - self.count_ones()
    }

    /// Index of the first set bit.
    #[inline]
    pub fn find_first(&self) -> Option<usize> {
        element_wise::find(self.words.as_slice(), 0, self.len, 0)
    }

    /// Index of the first set bit after `prev`.
    #[inline]
    pub fn find_next(&self, prev: usize) -> Option<usize> {
        element_wise::find(self.words.as_slice(), 0, self.len, prev + 1)
    }

    /// Iterator over the indices of set bits, ascending.
    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        let mut next = self.find_first();
        std::iter::from_fn(move || {
            let cur = next?;
            next = self.find_next(cur);
            Some(cur)
        })
    }

    /// Iterator over the indices of clear bits, ascending.
    pub fn iter_cleared(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| unsafe { !self.get_unchecked(i) })
    }

    /// `self &= other`, element-wise.
    #[inline]
    pub fn intersect_with(&mut self, other: &Self) {
        assert_eq!(self.len, other.len, "Bitset::intersect_with length mismatch");
        element_wise::op_and(
            self.words.as_mut_slice(),
            other.words.as_slice(),
            0,
            0,
            self.len,
        );
    }

    /// `self |= other`, element-wise.
    #[inline]
    pub fn union_with(&mut self, other: &Self) {
        assert_eq!(self.len, other.len, "Bitset::union_with length mismatch");
        element_wise::op_or(
            self.words.as_mut_slice(),
            other.words.as_slice(),
            0,
            0,
            self.len,
        );
    }

    /// `self ^= other`, element-wise.
    #[inline]
    pub fn xor_with(&mut self, other: &Self) {
        assert_eq!(self.len, other.len, "Bitset::xor_with length mismatch");
        element_wise::op_xor(
            self.words.as_mut_slice(),
            other.words.as_slice(),
            0,
            0,
            self.len,
        );
    }

    /// `self &= !other`, element-wise.
    #[inline]
    pub fn subtract(&mut self, other: &Self) {
        assert_eq!(self.len, other.len, "Bitset::subtract length mismatch");
        element_wise::op_sub(
            self.words.as_mut_slice(),
            other.words.as_slice(),
            0,
            0,
            self.len,
        );
    }

    /// Intersect with every bitset in `others`.
    pub fn intersect_many(&mut self, others: &[&Self]) {
        for other in others {
            self.intersect_with(other);
        }
    }

    /// Union with every bitset in `others`.
    pub fn union_many(&mut self, others: &[&Self]) {
        for other in others {
            self.union_with(other);
        }
    }

    /// Resize to `new_len` bits; new bits are set or cleared per `set`.
    pub fn resize(&mut self, new_len: usize, set: bool) {
        let n_words = words_for::<W>(new_len);
        self.words.resize(n_words, W::zero());
        if new_len > self.len {
            // stale bits may remain in the old last word
            element_wise::fill(self.words.as_mut_slice(), self.len, new_len - self.len, set);
        }
        self.len = new_len;
    }

    /// Reserve storage for at least `additional` more bits.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        let needed = words_for::<W>(self.len + additional);
        let current = self.words.len();
        if needed > current {
            self.words.reserve(needed - current);
        }
    }

    /// Drop all bits and storage length.
    #[inline]
    pub fn clear(&mut self) {
        self.words.clear();
        self.len = 0;
    }

    /// Append every bit of `other`.
    pub fn append(&mut self, other: &Self) {
        self.append_range(other, 0, other.len);
    }

    /// Append `count` bits of `other` starting at `start`.
    pub fn append_range(&mut self, other: &Self, start: usize, count: usize) {
        assert!(
            start + count <= other.len,
            "Bitset::append_range out of bounds (start={start}, count={count}, len={})",
            other.len
        );
        let old = self.len;
        self.resize(old + count, false);
        element_wise::copy_bits(
            other.words.as_slice(),
            start,
            self.words.as_mut_slice(),
            old,
            count,
        );
    }

    /// Append every bit of a view.
    pub fn append_view(&mut self, view: &BitsetV<'_, W>) {
        let (words, offset, count) = view.as_parts();
        let old = self.len;
        self.resize(old + count, false);
        element_wise::copy_bits(words, offset, self.words.as_mut_slice(), old, count);
    }

    /// Read-only window over `[offset, offset + len)`.
    #[inline]
    pub fn view(&self, offset: usize, len: usize) -> BitsetV<'_, W> {
        assert!(
            offset + len <= self.len,
            "Bitset::view out of bounds (offset={offset}, len={len}, size={})",
            self.len
        );
        BitsetV::new(self.words.as_slice(), offset, len)
    }

    /// Read-only window from `offset` to the end.
    #[inline]
    pub fn view_from(&self, offset: usize) -> BitsetV<'_, W> {
        self.view(offset, self.len - offset)
    }

    /// Read-only window over the whole bitset.
    #[inline]
    pub fn as_view(&self) -> BitsetV<'_, W> {
        BitsetV::new(self.words.as_slice(), 0, self.len)
    }

    /// Mutable window over `[offset, offset + len)`.
    #[inline]
    pub fn view_mut(&mut self, offset: usize, len: usize) -> BitsetVMut<'_, W> {
        assert!(
            offset + len <= self.len,
            "Bitset::view_mut out of bounds (offset={offset}, len={len}, size={})",
            self.len
        );
        BitsetVMut::new(self.words.as_mut_slice(), offset, len)
    }

    // Predicate surface. Each call fills bit i with the predicate over
    // row i of the column(s), routed through the dynamic dispatcher.

    /// Bit `i` = `op(src[i], value)`.
    pub fn compare_val<T: DispatchColumn>(
        &mut self,
        src: &[T],
        op: CompareOp,
        value: T,
    ) -> Result<(), KernelError> {
        if self.len != src.len() {
            return Err(KernelError::rows_mismatch(
                "Bitset::compare_val",
                self.len,
                src.len(),
            ));
        }
        vectorized::compare_val::<W, DynamicVectorizer, T>(
            self.words.as_mut_slice(),
            0,
            src,
            op,
            value,
        );
        Ok(())
    }

    /// Bit `i` = `op(left[i], right[i])`.
    pub fn compare_column<T: DispatchColumn>(
        &mut self,
        left: &[T],
        right: &[T],
        op: CompareOp,
    ) -> Result<(), KernelError> {
        if self.len != left.len() {
            return Err(KernelError::rows_mismatch(
                "Bitset::compare_column",
                self.len,
                left.len(),
            ));
        }
        if left.len() != right.len() {
            return Err(KernelError::columns_mismatch(
                "Bitset::compare_column",
                left.len(),
                right.len(),
            ));
        }
        vectorized::compare_column::<W, DynamicVectorizer, T>(
            self.words.as_mut_slice(),
            0,
            left,
            right,
            op,
        );
        Ok(())
    }

    /// Bit `i` = `src[i]` within `[lower, upper]` under `kind`.
    pub fn within_range_val<T: DispatchColumn>(
        &mut self,
        lower: T,
        upper: T,
        src: &[T],
        kind: RangeKind,
    ) -> Result<(), KernelError> {
        if self.len != src.len() {
            return Err(KernelError::rows_mismatch(
                "Bitset::within_range_val",
                self.len,
                src.len(),
            ));
        }
        vectorized::within_range_val::<W, DynamicVectorizer, T>(
            self.words.as_mut_slice(),
            0,
            lower,
            upper,
            src,
            kind,
        );
        Ok(())
    }

    /// Bit `i` = `src[i]` within `[lower[i], upper[i]]` under `kind`.
    pub fn within_range_column<T: DispatchColumn>(
        &mut self,
        lower: &[T],
        upper: &[T],
        src: &[T],
        kind: RangeKind,
    ) -> Result<(), KernelError> {
        if self.len != src.len() {
            return Err(KernelError::rows_mismatch(
                "Bitset::within_range_column",
                self.len,
                src.len(),
            ));
        }
        if lower.len() != src.len() {
            return Err(KernelError::columns_mismatch(
                "Bitset::within_range_column",
                lower.len(),
                src.len(),
            ));
        }
        if upper.len() != src.len() {
            return Err(KernelError::columns_mismatch(
                "Bitset::within_range_column",
                upper.len(),
                src.len(),
            ));
        }
        vectorized::within_range_column::<W, DynamicVectorizer, T>(
            self.words.as_mut_slice(),
            0,
            lower,
            upper,
            src,
            kind,
        );
        Ok(())
    }

    /// Bit `i` = `cmp(aop(widen(src[i]), rhs), value)`; `cmp` is `Eq` or
    /// `Ne`.
    pub fn arith_compare<T: DispatchColumn>(
        &mut self,
        src: &[T],
        rhs: T::Acc,
        value: T::Acc,
        aop: ArithOp,
        cmp: CompareOp,
    ) -> Result<(), KernelError> {
        if self.len != src.len() {
            return Err(KernelError::rows_mismatch(
                "Bitset::arith_compare",
                self.len,
                src.len(),
            ));
        }
        if !matches!(cmp, CompareOp::Eq | CompareOp::Ne) {
            return Err(KernelError::InvalidArguments(format!(
                "Bitset::arith_compare: comparison must be Eq or Ne, got {:?}",
                cmp
            )));
        }
        vectorized::arith_compare::<W, DynamicVectorizer, T>(
            self.words.as_mut_slice(),
            0,
            src,
            rhs,
            value,
            aop,
            cmp,
        );
        Ok(())
    }

    /// Allocating form of [`compare_val`](Self::compare_val).
    pub fn from_compare_val<T: DispatchColumn>(src: &[T], op: CompareOp, value: T) -> Self {
        let mut out = Self::with_len(src.len(), false);
        vectorized::compare_val::<W, DynamicVectorizer, T>(
            out.words.as_mut_slice(),
            0,
            src,
            op,
            value,
        );
        out
    }

    /// Allocating form of [`compare_column`](Self::compare_column).
    pub fn from_compare_column<T: DispatchColumn>(left: &[T], right: &[T], op: CompareOp) -> Self {
        assert_eq!(
            left.len(),
            right.len(),
            "Bitset::from_compare_column length mismatch"
        );
        let mut out = Self::with_len(left.len(), false);
        vectorized::compare_column::<W, DynamicVectorizer, T>(
            out.words.as_mut_slice(),
            0,
            left,
            right,
            op,
        );
        out
    }

    /// Allocating form of [`within_range_val`](Self::within_range_val).
    pub fn from_within_range_val<T: DispatchColumn>(
        lower: T,
        upper: T,
        src: &[T],
        kind: RangeKind,
    ) -> Self {
        let mut out = Self::with_len(src.len(), false);
        vectorized::within_range_val::<W, DynamicVectorizer, T>(
            out.words.as_mut_slice(),
            0,
            lower,
            upper,
            src,
            kind,
        );
        out
    }

    /// Allocating form of [`within_range_column`](Self::within_range_column).
    pub fn from_within_range_column<T: DispatchColumn>(
        lower: &[T],
        upper: &[T],
        src: &[T],
        kind: RangeKind,
    ) -> Self {
        assert_eq!(
            lower.len(),
            src.len(),
            "Bitset::from_within_range_column length mismatch"
        );
        assert_eq!(
            upper.len(),
            src.len(),
            "Bitset::from_within_range_column length mismatch"
        );
        let mut out = Self::with_len(src.len(), false);
        vectorized::within_range_column::<W, DynamicVectorizer, T>(
            out.words.as_mut_slice(),
            0,
            lower,
            upper,
            src,
            kind,
        );
        out
    }

    /// Allocating form of [`arith_compare`](Self::arith_compare).
    pub fn from_arith_compare<T: DispatchColumn>(
        src: &[T],
        rhs: T::Acc,
        value: T::Acc,
        aop: ArithOp,
        cmp: CompareOp,
    ) -> Self {
        assert!(
            matches!(cmp, CompareOp::Eq | CompareOp::Ne),
            "Bitset::from_arith_compare: comparison must be Eq or Ne"
        );
        let mut out = Self::with_len(src.len(), false);
        vectorized::arith_compare::<W, DynamicVectorizer, T>(
            out.words.as_mut_slice(),
            0,
            src,
            rhs,
            value,
            aop,
            cmp,
        );
        out
    }
}

#[cfg(feature = "parallel_proc")]
mod parallel {
    use rayon::prelude::*;

    use super::Bitset;
    use crate::traits::word::Word;

    impl<W: Word> Bitset<W> {
        /// Parallel iterator over every bit in `[0, len)`.
        #[inline]
        pub fn par_iter(&self) -> impl ParallelIterator<Item = bool> + '_ {
            (0..self.len())
                .into_par_iter()
                .map(move |i| unsafe { self.get_unchecked(i) })
        }

        /// Parallel iterator over the half-open window `[start, end)`.
        #[inline]
        pub fn par_iter_range(
            &self,
            start: usize,
            end: usize,
        ) -> impl ParallelIterator<Item = bool> + '_ {
            debug_assert!(start <= end && end <= self.len());
            (start..end)
                .into_par_iter()
                .map(move |i| unsafe { self.get_unchecked(i) })
        }
    }
}

impl<W: Word> PartialEq for Bitset<W> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && element_wise::op_eq(
                self.words.as_slice(),
                other.words.as_slice(),
                0,
                0,
                self.len,
            )
    }
}

impl<W: Word> Eq for Bitset<W> {}

impl<W: Word> BitAnd for &Bitset<W> {
    type Output = Bitset<W>;

    #[inline]
    fn bitand(self, rhs: Self) -> Bitset<W> {
        let mut out = self.clone();
        out.intersect_with(rhs);
        out
    }
}

impl<W: Word> BitOr for &Bitset<W> {
    type Output = Bitset<W>;

    #[inline]
    fn bitor(self, rhs: Self) -> Bitset<W> {
        let mut out = self.clone();
        out.union_with(rhs);
        out
    }
}

impl<W: Word> BitXor for &Bitset<W> {
    type Output = Bitset<W>;

    #[inline]
    fn bitxor(self, rhs: Self) -> Bitset<W> {
        let mut out = self.clone();
        out.xor_with(rhs);
        out
    }
}

impl<W: Word> Sub for &Bitset<W> {
    type Output = Bitset<W>;

    #[inline]
    fn sub(self, rhs: Self) -> Bitset<W> {
        let mut out = self.clone();
        out.subtract(rhs);
        out
    }
}

impl<W: Word> Not for &Bitset<W> {
    type Output = Bitset<W>;

    #[inline]
    fn not(self) -> Bitset<W> {
        let mut out = self.clone();
        out.flip_all();
        out
    }
}

impl<W: Word> FromIterator<bool> for Bitset<W> {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut out = Bitset::new();
        for bit in iter {
            out.push(bit);
        }
        out
    }
}

impl<W: Word> Debug for Bitset<W> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Bitset")
            .field("len", &self.len)
            .field("ones", &self.count_ones())
            .field("zeros", &self.count_zeros())
            .finish()
    }
}

impl<W: Word> Display for Bitset<W> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        const MAX_PREVIEW: usize = 64;
        writeln!(
            f,
            "Bitset [{} bits] (ones: {}, zeros: {})",
            self.len,
            self.count_ones(),
            self.count_zeros()
        )?;
        write!(f, "[")?;
        for i in 0..usize::min(self.len, MAX_PREVIEW) {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", if unsafe { self.get_unchecked(i) } { '1' } else { '0' })?;
        }
        if self.len > MAX_PREVIEW {
            write!(f, " … ({} total)", self.len)?;
        }
        write!(f, "]")
    }
}
