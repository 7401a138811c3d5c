//! # **BitsetV / BitsetVMut Module** - *Zero-Copy Windows Over a Bitset*
//!
//! Logical windows into a contiguous region of packed bits.
//!
//! ## Purpose
//! - Indexable, bounds-checked access to a sub-range of a bitset.
//! - All logical indices are relative to the window.
//! - [`BitsetV`] observes; [`BitsetVMut`] also mutates the underlying
//!   storage in place, including through the predicate kernels.
//!
//! ## Behaviour
//! - Operations remap indices to the absolute positions in the parent
//!   storage; bits outside the window are never touched.
//! - Window slicing is O(1), pointer and metadata updates only.
//! - Views borrow the owner, so the borrow checker rules out mutation
//!   races and use-after-resize.

use std::fmt::{self, Debug, Display, Formatter};

use crate::enums::error::KernelError;
use crate::enums::operators::{ArithOp, CompareOp, RangeKind};
use crate::kernels::dispatch::DispatchColumn;
use crate::kernels::element_wise;
use crate::kernels::vectorized::{self, DynamicVectorizer};
use crate::structs::bitset::Bitset;
use crate::structs::proxy::bit_at_mut;
use crate::traits::word::Word;

/// Read-only window over `[offset, offset + len)` of a word slice.
#[derive(Clone, Copy)]
pub struct BitsetV<'a, W: Word = u64> {
    words: &'a [W],
    offset: usize,
    len: usize,
}

impl<'a, W: Word> BitsetV<'a, W> {
    /// Construct a view; the window must fit inside the storage.
    #[inline]
    pub fn new(words: &'a [W], offset: usize, len: usize) -> Self {
        assert!(
            offset + len <= words.len() * W::BITS,
            "BitsetV: out of bounds (offset + len = {}, storage bits = {})",
            offset + len,
            words.len() * W::BITS
        );
        Self { words, offset, len }
    }

    /// Number of bits in the window.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute bit offset of the window start.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The window as `(words, absolute_offset, len)`.
    #[inline]
    pub fn as_parts(&self) -> (&'a [W], usize, usize) {
        (self.words, self.offset, self.len)
    }

    /// Bit `i` of the window.
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        #[cfg(feature = "range_checks")]
        assert!(
            i < self.len,
            "BitsetV: index {i} out of bounds for window len {}",
            self.len
        );
        // SAFETY: in range per the assertion / caller contract
        unsafe { self.get_unchecked(i) }
    }

    /// Unchecked bit read.
    ///
    /// # Safety
    /// `i` must be below the window length.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, i: usize) -> bool {
        let idx = self.offset + i;
        let w = unsafe { *self.words.get_unchecked(idx / W::BITS) };
        (w >> (idx % W::BITS)) & W::one() != W::zero()
    }

    /// Count of set bits in the window.
    #[inline]
    pub fn count_ones(&self) -> usize {
        element_wise::op_count(self.words, self.offset, self.len)
    }

    /// Count of clear bits in the window.
    #[inline]
    pub fn count_zeros(&self) -> usize {
        self.len - self.count_ones()
    }

    /// True iff every bit in the window is set.
    #[inline]
    pub fn all_set(&self) -> bool {
        element_wise::all(self.words, self.offset, self.len)
    }

    /// True iff every bit in the window is clear.
    #[inline]
    pub fn all_unset(&self) -> bool {
        element_wise::none(self.words, self.offset, self.len)
    }

    /// True iff at least one bit in the window is set.
    #[inline]
    pub fn any_set(&self) -> bool {
        !self.all_unset()
    }

    /// Index of the first set bit in the window.
    #[inline]
    pub fn find_first(&self) -> Option<usize> {
        element_wise::find(self.words, self.offset, self.len, 0)
    }

    /// Index of the first set bit after `prev`, relative to the window.
    #[inline]
    pub fn find_next(&self, prev: usize) -> Option<usize> {
        element_wise::find(self.words, self.offset, self.len, prev + 1)
    }

    /// Iterator over window-relative indices of set bits.
    pub fn iter_set(&self) -> impl Iterator<Item = usize> + 'a {
        let this = *self;
        let mut next = this.find_first();
        std::iter::from_fn(move || {
            let cur = next?;
            next = this.find_next(cur);
            Some(cur)
        })
    }

    /// Iterator over window-relative indices of clear bits.
    pub fn iter_cleared(&self) -> impl Iterator<Item = usize> + 'a {
        let this = *self;
        (0..this.len).filter(move |&i| unsafe { !this.get_unchecked(i) })
    }

    /// Window into this window: shifts the offset by another `offset`.
    #[inline]
    pub fn view(&self, offset: usize, len: usize) -> BitsetV<'a, W> {
        assert!(
            offset + len <= self.len,
            "BitsetV::view out of bounds (offset={offset}, len={len}, window={})",
            self.len
        );
        BitsetV {
            words: self.words,
            offset: self.offset + offset,
            len,
        }
    }

    /// Window from `offset` to the end of this window.
    #[inline]
    pub fn view_from(&self, offset: usize) -> BitsetV<'a, W> {
        self.view(offset, self.len - offset)
    }

    /// Materialise the window into an owning bitset.
    pub fn to_bitset(&self) -> Bitset<W> {
        let mut out = Bitset::with_len(self.len, false);
        element_wise::copy_bits(self.words, self.offset, out.as_words_mut(), 0, self.len);
        out
    }
}

impl<W: Word> PartialEq for BitsetV<'_, W> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && element_wise::op_eq(self.words, other.words, self.offset, other.offset, self.len)
    }
}

impl<W: Word> PartialEq<Bitset<W>> for BitsetV<'_, W> {
    #[inline]
    fn eq(&self, other: &Bitset<W>) -> bool {
        self.len == other.len()
            && element_wise::op_eq(self.words, other.as_words(), self.offset, 0, self.len)
    }
}

impl<W: Word> PartialEq<BitsetV<'_, W>> for Bitset<W> {
    #[inline]
    fn eq(&self, other: &BitsetV<'_, W>) -> bool {
        other == self
    }
}

impl<W: Word> Debug for BitsetV<'_, W> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitsetV")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .field("ones", &self.count_ones())
            .finish()
    }
}

impl<W: Word> Display for BitsetV<'_, W> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        const MAX_PREVIEW: usize = 64;
        writeln!(
            f,
            "BitsetV [{} bits] (offset: {}, ones: {})",
            self.len,
            self.offset,
            self.count_ones()
        )?;
        let limit = self.len.min(MAX_PREVIEW);
        write!(f, "  ")?;
        for i in 0..limit {
            write!(f, "{}", if self.get(i) { '1' } else { '.' })?;
        }
        if self.len > MAX_PREVIEW {
            write!(f, "... ({} more bits)", self.len - MAX_PREVIEW)?;
        }
        writeln!(f)
    }
}

/// Mutable window over `[offset, offset + len)` of a word slice.
///
/// Carries the same read surface as [`BitsetV`] plus in-place mutation,
/// set algebra against other windows, and the predicate kernels at the
/// window's bit offset.
pub struct BitsetVMut<'a, W: Word = u64> {
    words: &'a mut [W],
    offset: usize,
    len: usize,
}

impl<'a, W: Word> BitsetVMut<'a, W> {
    /// Construct a mutable view; the window must fit inside the storage.
    #[inline]
    pub fn new(words: &'a mut [W], offset: usize, len: usize) -> Self {
        assert!(
            offset + len <= words.len() * W::BITS,
            "BitsetVMut: out of bounds (offset + len = {}, storage bits = {})",
            offset + len,
            words.len() * W::BITS
        );
        Self { words, offset, len }
    }

    /// Number of bits in the window.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute bit offset of the window start.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Read-only alias of this window.
    #[inline]
    pub fn as_view(&self) -> BitsetV<'_, W> {
        BitsetV::new(self.words, self.offset, self.len)
    }

    /// Bit `i` of the window.
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        self.as_view().get(i)
    }

    /// Set or clear bit `i` of the window.
    #[inline]
    pub fn set(&mut self, i: usize, value: bool) {
        #[cfg(feature = "range_checks")]
        assert!(
            i < self.len,
            "BitsetVMut: index {i} out of bounds for window len {}",
            self.len
        );
        bit_at_mut(self.words, self.offset + i).assign(value);
    }

    /// Set every bit in the window to `value`.
    #[inline]
    pub fn fill(&mut self, value: bool) {
        element_wise::fill(self.words, self.offset, self.len, value);
    }

    /// Complement bit `i` of the window.
    #[inline]
    pub fn flip_bit(&mut self, i: usize) {
        #[cfg(feature = "range_checks")]
        assert!(
            i < self.len,
            "BitsetVMut: index {i} out of bounds for window len {}",
            self.len
        );
        bit_at_mut(self.words, self.offset + i).flip();
    }

    /// Complement every bit in the window.
    #[inline]
    pub fn flip_all(&mut self) {
        element_wise::flip_range(self.words, self.offset, self.len);
    }

    /// Complement `[offset, offset + len)` of the window.
    #[inline]
    pub fn flip_range(&mut self, offset: usize, len: usize) {
        assert!(
            offset + len <= self.len,
            "BitsetVMut::flip_range out of bounds (offset={offset}, len={len}, window={})",
            self.len
        );
        element_wise::flip_range(self.words, self.offset + offset, len);
    }

    /// Count of set bits in the window.
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.as_view().count_ones()
    }

    /// True iff every bit in the window is set.
    #[inline]
    pub fn all_set(&self) -> bool {
        self.as_view().all_set()
    }

    /// True iff every bit in the window is clear.
    #[inline]
    pub fn all_unset(&self) -> bool {
        self.as_view().all_unset()
    }

    /// Index of the first set bit in the window.
    #[inline]
    pub fn find_first(&self) -> Option<usize> {
        self.as_view().find_first()
    }

    /// Index of the first set bit after `prev`, relative to the window.
    #[inline]
    pub fn find_next(&self, prev: usize) -> Option<usize> {
        self.as_view().find_next(prev)
    }

    /// Mutable window into this window.
    #[inline]
    pub fn view_mut(&mut self, offset: usize, len: usize) -> BitsetVMut<'_, W> {
        assert!(
            offset + len <= self.len,
            "BitsetVMut::view_mut out of bounds (offset={offset}, len={len}, window={})",
            self.len
        );
        BitsetVMut {
            words: &mut *self.words,
            offset: self.offset + offset,
            len,
        }
    }

    /// Materialise the window into an owning bitset.
    #[inline]
    pub fn to_bitset(&self) -> Bitset<W> {
        self.as_view().to_bitset()
    }

    /// `self &= other`, element-wise over the two windows.
    #[inline]
    pub fn intersect_with(&mut self, other: &BitsetV<'_, W>) {
        assert_eq!(self.len, other.len(), "BitsetVMut::intersect_with length mismatch");
        let (words, offset, _) = other.as_parts();
        element_wise::op_and(self.words, words, self.offset, offset, self.len);
    }

    /// `self |= other`, element-wise over the two windows.
    #[inline]
    pub fn union_with(&mut self, other: &BitsetV<'_, W>) {
        assert_eq!(self.len, other.len(), "BitsetVMut::union_with length mismatch");
        let (words, offset, _) = other.as_parts();
        element_wise::op_or(self.words, words, self.offset, offset, self.len);
    }

    /// `self ^= other`, element-wise over the two windows.
    #[inline]
    pub fn xor_with(&mut self, other: &BitsetV<'_, W>) {
        assert_eq!(self.len, other.len(), "BitsetVMut::xor_with length mismatch");
        let (words, offset, _) = other.as_parts();
        element_wise::op_xor(self.words, words, self.offset, offset, self.len);
    }

    /// `self &= !other`, element-wise over the two windows.
    #[inline]
    pub fn subtract(&mut self, other: &BitsetV<'_, W>) {
        assert_eq!(self.len, other.len(), "BitsetVMut::subtract length mismatch");
        let (words, offset, _) = other.as_parts();
        element_wise::op_sub(self.words, words, self.offset, offset, self.len);
    }

    /// Copy every bit of `other` into this window.
    #[inline]
    pub fn copy_from(&mut self, other: &BitsetV<'_, W>) {
        assert_eq!(self.len, other.len(), "BitsetVMut::copy_from length mismatch");
        let (words, offset, _) = other.as_parts();
        element_wise::copy_bits(words, offset, self.words, self.offset, self.len);
    }

    /// Bit `i` of the window = `op(src[i], value)`.
    pub fn compare_val<T: DispatchColumn>(
        &mut self,
        src: &[T],
        op: CompareOp,
        value: T,
    ) -> Result<(), KernelError> {
        if self.len != src.len() {
            return Err(KernelError::rows_mismatch(
                "BitsetVMut::compare_val",
                self.len,
                src.len(),
            ));
        }
        vectorized::compare_val::<W, DynamicVectorizer, T>(self.words, self.offset, src, op, value);
        Ok(())
    }

    /// Bit `i` of the window = `op(left[i], right[i])`.
    pub fn compare_column<T: DispatchColumn>(
        &mut self,
        left: &[T],
        right: &[T],
        op: CompareOp,
    ) -> Result<(), KernelError> {
        if self.len != left.len() {
            return Err(KernelError::rows_mismatch(
                "BitsetVMut::compare_column",
                self.len,
                left.len(),
            ));
        }
        if left.len() != right.len() {
            return Err(KernelError::columns_mismatch(
                "BitsetVMut::compare_column",
                left.len(),
                right.len(),
            ));
        }
        vectorized::compare_column::<W, DynamicVectorizer, T>(
            self.words,
            self.offset,
            left,
            right,
            op,
        );
        Ok(())
    }

    /// Bit `i` of the window = `src[i]` within the bounds under `kind`.
    pub fn within_range_val<T: DispatchColumn>(
        &mut self,
        lower: T,
        upper: T,
        src: &[T],
        kind: RangeKind,
    ) -> Result<(), KernelError> {
        if self.len != src.len() {
            return Err(KernelError::rows_mismatch(
                "BitsetVMut::within_range_val",
                self.len,
                src.len(),
            ));
        }
        vectorized::within_range_val::<W, DynamicVectorizer, T>(
            self.words,
            self.offset,
            lower,
            upper,
            src,
            kind,
        );
        Ok(())
    }

    /// Bit `i` of the window = `src[i]` within `[lower[i], upper[i]]`.
    pub fn within_range_column<T: DispatchColumn>(
        &mut self,
        lower: &[T],
        upper: &[T],
        src: &[T],
        kind: RangeKind,
    ) -> Result<(), KernelError> {
        if self.len != src.len() {
            return Err(KernelError::rows_mismatch(
                "BitsetVMut::within_range_column",
                self.len,
                src.len(),
            ));
        }
        if lower.len() != src.len() {
            return Err(KernelError::columns_mismatch(
                "BitsetVMut::within_range_column",
                lower.len(),
                src.len(),
            ));
        }
        if upper.len() != src.len() {
            return Err(KernelError::columns_mismatch(
                "BitsetVMut::within_range_column",
                upper.len(),
                src.len(),
            ));
        }
        vectorized::within_range_column::<W, DynamicVectorizer, T>(
            self.words,
            self.offset,
            lower,
            upper,
            src,
            kind,
        );
        Ok(())
    }

    /// Bit `i` of the window = `cmp(aop(widen(src[i]), rhs), value)`.
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
                "BitsetVMut::arith_compare",
                self.len,
                src.len(),
            ));
        }
        if !matches!(cmp, CompareOp::Eq | CompareOp::Ne) {
            return Err(KernelError::InvalidArguments(format!(
                "BitsetVMut::arith_compare: comparison must be Eq or Ne, got {:?}",
                cmp
            )));
        }
        vectorized::arith_compare::<W, DynamicVectorizer, T>(
            self.words,
            self.offset,
            src,
            rhs,
            value,
            aop,
            cmp,
        );
        Ok(())
    }
}

impl<W: Word> Debug for BitsetVMut<'_, W> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitsetVMut")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .field("ones", &self.count_ones())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_basic_access() {
        let bits = [true, false, true, false, true, false, true, false];
        let b = Bitset::<u64>::from_bools(&bits);
        let v = b.as_view();
        assert_eq!(v.len(), 8);
        for (i, &bit) in bits.iter().enumerate() {
            assert_eq!(v.get(i), bit);
        }
        assert_eq!(v.count_ones(), 4);
        assert_eq!(v.iter_set().collect::<Vec<_>>(), vec![0, 2, 4, 6]);
        assert_eq!(v.iter_cleared().collect::<Vec<_>>(), vec![1, 3, 5, 7]);
    }

    #[test]
    fn test_view_offset_window() {
        let bits = [true, true, false, false, true, true, false, false];
        let b = Bitset::<u64>::from_bools(&bits);
        let v = b.view(2, 4);
        assert_eq!(v.len(), 4);
        assert_eq!(
            (0..4).map(|i| v.get(i)).collect::<Vec<_>>(),
            vec![false, false, true, true]
        );
        assert_eq!(v.count_ones(), 2);
        assert_eq!(v.find_first(), Some(2));
        assert_eq!(v.find_next(2), Some(3));
        assert_eq!(v.find_next(3), None);
    }

    #[test]
    fn test_view_compose_and_materialise() {
        let bits = [
            true, true, true, false, false, false, true, false, true, true,
        ];
        let b = Bitset::<u64>::from_bools(&bits);
        let v = b.view(2, 6); // 1 0 0 0 1 0
        let sub = v.view(2, 3); // 0 0 1
        assert_eq!(sub.offset(), 4);
        assert_eq!(sub.len(), 3);
        assert!(!sub.get(0) && !sub.get(1) && sub.get(2));

        let owned = sub.to_bitset();
        assert_eq!(owned, Bitset::<u64>::from_bools(&[false, false, true]));
    }

    #[test]
    fn test_view_eq_across_offsets() {
        let mut a = Bitset::<u64>::with_len(130, false);
        a.set(0, true);
        a.set(64, true);
        a.set(65, true);
        // bits 0..2 and 64..66 are both "1 1" shifted differently? no:
        // bit 1 is clear, so compare 64..66 against 64..66 of a clone
        let b = a.clone();
        assert_eq!(a.view(64, 2), b.view(64, 2));
        assert_ne!(a.view(0, 2), b.view(64, 2));
    }

    #[test]
    fn test_view_mut_isolated_windows() {
        let mut b = Bitset::<u64>::with_len(128, false);
        {
            let mut v = b.view_mut(0, 40);
            v.fill(true);
        }
        {
            let mut v = b.view_mut(40, 88);
            v.flip_all();
            v.set(1, false);
            v.flip_bit(0);
        }
        assert_eq!(b.view(0, 40).count_ones(), 40);
        assert_eq!(b.view(40, 88).count_ones(), 86);
        assert!(!b.get(40));
        assert!(!b.get(41));
    }

    #[test]
    fn test_view_mut_set_algebra() {
        let mut storage = Bitset::<u64>::with_len(64, false);
        for i in 0..32 {
            storage.set(i, i % 2 == 0);
        }
        let other = Bitset::<u64>::from_bools(&[true; 32]);
        {
            let mut v = storage.view_mut(32, 32);
            v.union_with(&other.as_view());
        }
        assert_eq!(storage.view(32, 32).count_ones(), 32);
        {
            let mut v = storage.view_mut(32, 32);
            v.fill(false);
        }
        assert_eq!(storage.count_ones(), 16);
    }

    #[test]
    fn test_view_mut_algebra_across_bitsets() {
        let mut a = Bitset::<u64>::with_len(100, true);
        let mut mask = Bitset::<u64>::with_len(40, false);
        for i in 0..40 {
            mask.set(i, i < 20);
        }
        {
            let mut v = a.view_mut(30, 40);
            v.intersect_with(&mask.as_view());
        }
        assert_eq!(a.count_ones(), 30 + 20 + 30);
        assert!(a.get(49));
        assert!(!a.get(50));
    }

    #[test]
    fn test_view_mut_predicate_offset() {
        let col: Vec<i32> = (0..50).collect();
        let mut b = Bitset::<u64>::with_len(120, false);
        {
            let mut v = b.view_mut(33, 50);
            v.compare_val(&col, CompareOp::Lt, 10).unwrap();
        }
        assert_eq!(b.count_ones(), 10);
        assert_eq!(b.find_first(), Some(33));
        assert_eq!(b.view(33, 50).find_first(), Some(0));
    }

    #[test]
    fn test_copy_from() {
        let src = Bitset::<u64>::from_bools(&[true, false, true, true, false]);
        let mut dst = Bitset::<u64>::with_len(70, false);
        {
            let mut v = dst.view_mut(63, 5);
            v.copy_from(&src.as_view());
        }
        assert_eq!(dst.iter_set().collect::<Vec<_>>(), vec![63, 65, 66]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_view_out_of_bounds() {
        let b = Bitset::<u64>::with_len(8, false);
        let _ = b.view(4, 8);
    }
}
