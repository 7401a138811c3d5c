//! Integration tests for the bitset container: set algebra laws, views,
//! resizing and the boundary matrix, across every storage-word width.

use bitsieve::{Bitset, Word};

fn every_nth<W: Word>(len: usize, n: usize) -> Bitset<W> {
    let mut b = Bitset::<W>::with_len(len, false);
    for i in (0..len).step_by(n) {
        b.set(i, true);
    }
    b
}

#[test]
fn test_build_set_find_chain() {
    let mut b = Bitset::<u64>::with_len(64, false);
    b.set(0, true);
    b.set(3, true);
    b.set(63, true);
    assert_eq!(b.count_ones(), 3);
    assert_eq!(b.find_first(), Some(0));
    assert_eq!(b.find_next(0), Some(3));
    assert_eq!(b.find_next(3), Some(63));
    assert_eq!(b.find_next(63), None);
}

#[test]
fn test_set_algebra_128() {
    let mut a = Bitset::<u64>::with_len(128, false);
    let mut b = Bitset::<u64>::with_len(128, false);
    for i in [1usize, 2, 64, 100] {
        a.set(i, true);
    }
    for i in [2usize, 3, 100, 127] {
        b.set(i, true);
    }

    assert_eq!((&a & &b).iter_set().collect::<Vec<_>>(), vec![2, 100]);
    assert_eq!(
        (&a | &b).iter_set().collect::<Vec<_>>(),
        vec![1, 2, 3, 64, 100, 127]
    );
    assert_eq!(
        (&a ^ &b).iter_set().collect::<Vec<_>>(),
        vec![1, 3, 64, 127]
    );
    assert_eq!((&a - &b).iter_set().collect::<Vec<_>>(), vec![1, 64]);
}

#[test]
fn test_count_inclusion_exclusion() {
    let a = every_nth::<u64>(1000, 3);
    let b = every_nth::<u64>(1000, 7);
    let union = &a | &b;
    let inter = &a & &b;
    let sym = &a ^ &b;
    assert_eq!(
        union.count_ones() + inter.count_ones(),
        a.count_ones() + b.count_ones()
    );
    assert_eq!(sym.count_ones(), union.count_ones() - inter.count_ones());
}

#[test]
fn test_view_count_additivity() {
    let b = every_nth::<u64>(517, 5);
    for o in [0usize, 1, 7, 8, 63, 64, 128, 516, 517] {
        assert_eq!(
            b.view_from(o).count_ones(),
            b.count_ones() - b.view(0, o).count_ones(),
            "offset {o}"
        );
    }
}

#[test]
fn test_clone_independence() {
    let b = every_nth::<u64>(200, 4);
    let mut c = b.clone();
    assert_eq!(c, b);
    c.set(1, true);
    assert_ne!(c, b);
    assert!(!b.get(1));
}

#[test]
fn test_find_enumerates_exactly() {
    let b = every_nth::<u64>(300, 11);
    let expect: Vec<usize> = (0..300).step_by(11).collect();
    let mut seen = Vec::new();
    let mut cursor = b.find_first();
    while let Some(i) = cursor {
        seen.push(i);
        cursor = b.find_next(i);
    }
    assert_eq!(seen, expect);
    // the sentinel appears exactly once at the end
    assert_eq!(b.find_next(*seen.last().unwrap()), None);
}

#[test]
fn test_sub_then_or_equals_or() {
    let a = every_nth::<u64>(640, 3);
    let b = every_nth::<u64>(640, 4);

    let mut left = a.clone();
    left.subtract(&b);
    left.union_with(&b);

    let mut right = a.clone();
    right.union_with(&b);

    assert_eq!(left, right);
}

#[test]
fn test_double_flip_identity() {
    let b = every_nth::<u64>(1337, 7);
    for (offset, len) in [(0usize, 1337usize), (1, 1000), (63, 128), (64, 64), (100, 0)] {
        let mut c = b.clone();
        c.flip_range(offset, len);
        c.flip_range(offset, len);
        assert_eq!(c, b, "offset {offset} len {len}");
    }
}

#[test]
fn test_append_roundtrip() {
    let mut base = every_nth::<u64>(77, 2);
    let other = every_nth::<u64>(133, 3);
    let size_before = base.len();
    base.append(&other);
    assert_eq!(base.len(), size_before + other.len());
    assert_eq!(base.view_from(size_before), other);
}

#[test]
fn test_resize_scenario() {
    let mut b = every_nth::<u64>(1000, 3);
    assert_eq!(b.count_ones(), 334);
    b.resize(2000, true);
    assert_eq!(b.count_ones(), 334 + 1000);
    assert_eq!(b.find_first(), Some(0));
}

#[test]
fn test_word_width_equivalence() {
    fn script<W: Word>() -> Vec<bool> {
        let mut b = Bitset::<W>::with_len(150, false);
        for i in (0..150).step_by(3) {
            b.set(i, true);
        }
        b.flip_range(7, 100);
        let other = every_nth::<W>(150, 5);
        b.xor_with(&other);
        b.resize(170, true);
        b.fill_range(160, 5, false);
        (0..b.len()).map(|i| b.get(i)).collect()
    }

    let reference = script::<u64>();
    assert_eq!(script::<u8>(), reference);
    assert_eq!(script::<u16>(), reference);
    assert_eq!(script::<u32>(), reference);
}

#[test]
fn test_disjoint_views_stay_isolated() {
    let mut b = Bitset::<u64>::with_len(256, false);
    {
        let mut v = b.view_mut(0, 100);
        v.fill(true);
    }
    {
        let mut v = b.view_mut(100, 156);
        v.flip_all();
        v.flip_all();
    }
    // the second window's churn left the first untouched
    assert_eq!(b.view(0, 100).count_ones(), 100);
    assert_eq!(b.view(100, 156).count_ones(), 0);

    {
        let mut v = b.view_mut(100, 28);
        v.fill(true);
    }
    assert_eq!(b.view(0, 100).count_ones(), 100);
    assert_eq!(b.view(128, 128).count_ones(), 0);
    assert_eq!(b.count_ones(), 128);
}

#[test]
fn test_boundary_matrix() {
    for &size in &[0x08usize, 0x40, 0x1000, 0x1040] {
        for &offset in &[0usize, 1, 7, 8, 63, 64] {
            let mut b = Bitset::<u64>::with_len(offset + size + 5, false);
            b.fill_range(offset, size, true);
            assert_eq!(b.count_ones(), size, "offset {offset} size {size}");
            assert!(b.view(offset, size).all_set());
            if offset > 0 {
                assert!(b.view(0, offset).all_unset());
            }
            assert!(b.view_from(offset + size).all_unset());

            b.flip_range(offset, size);
            assert!(b.all_unset());
        }
    }
}

#[test]
fn test_empty_ranges_are_noops() {
    let mut b = Bitset::<u64>::new();
    assert!(b.is_empty());
    assert!(b.all_set());
    assert!(b.all_unset());
    assert_eq!(b.count_ones(), 0);
    assert_eq!(b.find_first(), None);
    b.fill(true);
    b.flip_all();
    assert_eq!(b.len(), 0);

    let mut c = Bitset::<u64>::with_len(64, true);
    let empty = Bitset::<u64>::new();
    let _ = &empty | &empty;
    c.fill_range(30, 0, false);
    assert_eq!(c.count_ones(), 64);
    assert!(c.view(30, 0).all_unset());
}

#[test]
fn test_single_word_mid_word_ranges() {
    // both ends strictly inside one storage word
    let mut b = Bitset::<u64>::with_len(64, false);
    b.fill_range(17, 23, true);
    assert_eq!(b.count_ones(), 23);
    assert_eq!(b.find_first(), Some(17));
    assert_eq!(b.view(17, 23).count_ones(), 23);
    b.flip_range(20, 10);
    assert_eq!(b.count_ones(), 13);

    // exactly two words
    let mut two = Bitset::<u64>::with_len(128, false);
    two.fill_range(0, 128, true);
    assert!(two.all_set());
}

#[test]
fn test_views_of_shared_storage_compose() {
    let mut b = Bitset::<u64>::with_len(200, false);
    for i in (0..200).step_by(2) {
        b.set(i, true);
    }
    let v = b.view(10, 100);
    let sub = v.view_from(40);
    assert_eq!(sub.offset(), 50);
    assert_eq!(sub.len(), 60);
    assert_eq!(sub.count_ones(), 30);
    assert_eq!(v.view(0, 40).count_ones() + sub.count_ones(), v.count_ones());
}

#[test]
fn test_iterators_match_bits() {
    let b = every_nth::<u64>(97, 9);
    let set: Vec<usize> = b.iter_set().collect();
    let cleared: Vec<usize> = b.iter_cleared().collect();
    assert_eq!(set.len() + cleared.len(), 97);
    for &i in &set {
        assert!(b.get(i));
    }
    for &i in &cleared {
        assert!(!b.get(i));
    }
}
