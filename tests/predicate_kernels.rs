//! Integration tests for the predicate kernels: scalar/SIMD bit-for-bit
//! equivalence on every compiled backend, decline semantics, and the
//! end-to-end filter scenarios.

use bitsieve::kernels::{scalar, vectorized};
use bitsieve::{
    ArithOp, Bitset, CompareOp, DynamicVectorizer, RangeKind, RefVectorizer, ScalableVectorizer,
    Vectorizer, active_backend,
};

/// Deterministic pseudo-random stream, good enough to fill columns.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

fn int_column<T: TryFrom<i64>>(n: usize, seed: u64, modulus: i64) -> Vec<T>
where
    <T as TryFrom<i64>>::Error: std::fmt::Debug,
{
    let mut rng = Lcg(seed);
    (0..n)
        .map(|_| T::try_from(rng.next() as i64 % modulus - modulus / 2).unwrap())
        .collect()
}

fn float_column(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = Lcg(seed);
    (0..n).map(|_| (rng.next() % 1000) as f64 / 8.0 - 60.0).collect()
}

fn bits(words: &[u64], start: usize, n: usize) -> Vec<bool> {
    (0..n)
        .map(|i| {
            let idx = start + i;
            (words[idx / 64] >> (idx % 64)) & 1 != 0
        })
        .collect()
}

macro_rules! assert_matches_scalar {
    ($scalar_call:expr, $vec_call:expr, $words:expr, $start:expr, $n:expr, $ctx:expr) => {{
        let mut expect = vec![0u64; $words];
        let mut got = vec![0u64; $words];
        let scalar_call = $scalar_call;
        let vec_call = $vec_call;
        scalar_call(&mut expect[..]);
        vec_call(&mut got[..]);
        assert_eq!(
            bits(&got, 0, $start + $n + 1),
            bits(&expect, 0, $start + $n + 1),
            "{}",
            $ctx
        );
    }};
}

fn check_compare_val<V: Vectorizer>(start: usize, n: usize, backend: &str) {
    let src = int_column::<i32>(n, 42, 50);
    for op in CompareOp::ALL {
        let words = (start + n) / 64 + 2;
        assert_matches_scalar!(
            |d| scalar::compare_val::<u64, i32>(d, start, &src, op, 3),
            |d| vectorized::compare_val::<u64, V, i32>(d, start, &src, op, 3),
            words,
            start,
            n,
            format!("{backend} compare_val {op:?} start={start} n={n}")
        );
    }
}

#[test]
fn test_compare_val_matches_scalar_all_backends() {
    for start in [0usize, 1, 7, 8, 63, 64] {
        for n in [0usize, 8, 64, 100, 333, 0x1040] {
            check_compare_val::<RefVectorizer>(start, n, "ref");
            check_compare_val::<ScalableVectorizer>(start, n, "scalable8");
            check_compare_val::<DynamicVectorizer>(start, n, "dynamic");
        }
    }
}

macro_rules! per_type_equivalence {
    ($t:ty, $col:expr, $value:expr) => {{
        let src: Vec<$t> = $col;
        let n = src.len();
        for op in CompareOp::ALL {
            let mut expect = vec![0u64; n / 64 + 2];
            scalar::compare_val::<u64, $t>(&mut expect, 0, &src, op, $value);
            let mut got = vec![0u64; n / 64 + 2];
            vectorized::compare_val::<u64, DynamicVectorizer, $t>(&mut got, 0, &src, op, $value);
            assert_eq!(
                bits(&got, 0, n),
                bits(&expect, 0, n),
                "{} {:?}",
                stringify!($t),
                op
            );
        }
    }};
}

#[test]
fn test_every_element_type_matches_scalar() {
    per_type_equivalence!(i8, int_column::<i8>(520, 7, 100), 3i8);
    per_type_equivalence!(i16, int_column::<i16>(520, 8, 1000), -40i16);
    per_type_equivalence!(i32, int_column::<i32>(520, 9, 100000), 17i32);
    per_type_equivalence!(i64, int_column::<i64>(520, 10, 1 << 40), 0i64);
    per_type_equivalence!(
        f32,
        float_column(520, 11).into_iter().map(|x| x as f32).collect(),
        1.5f32
    );
    per_type_equivalence!(f64, float_column(520, 12), -2.25f64);
}

#[test]
fn test_compare_column_matches_scalar() {
    let left = int_column::<i16>(300, 21, 60);
    let right = int_column::<i16>(300, 22, 60);
    for op in CompareOp::ALL {
        for start in [0usize, 5, 64] {
            let words = 8;
            let mut expect = vec![0u64; words];
            scalar::compare_column::<u64, i16>(&mut expect, start, &left, &right, op);
            let mut got = vec![0u64; words];
            vectorized::compare_column::<u64, DynamicVectorizer, i16>(
                &mut got, start, &left, &right, op,
            );
            assert_eq!(bits(&got, 0, start + 300), bits(&expect, 0, start + 300));
        }
    }
}

#[test]
fn test_within_range_matches_scalar() {
    let src = float_column(280, 31);
    let lower = float_column(280, 32);
    let upper: Vec<f64> = lower.iter().map(|x| x + 20.0).collect();
    for kind in RangeKind::ALL {
        let mut expect = vec![0u64; 6];
        scalar::within_range_val::<u64, f64>(&mut expect, 3, -10.0, 30.0, &src, kind);
        let mut got = vec![0u64; 6];
        vectorized::within_range_val::<u64, DynamicVectorizer, f64>(
            &mut got, 3, -10.0, 30.0, &src, kind,
        );
        assert_eq!(bits(&got, 0, 283), bits(&expect, 0, 283), "{kind:?}");

        let mut expect = vec![0u64; 6];
        scalar::within_range_column::<u64, f64>(&mut expect, 3, &lower, &upper, &src, kind);
        let mut got = vec![0u64; 6];
        vectorized::within_range_column::<u64, DynamicVectorizer, f64>(
            &mut got, 3, &lower, &upper, &src, kind,
        );
        assert_eq!(bits(&got, 0, 283), bits(&expect, 0, 283), "column {kind:?}");
    }
}

#[test]
fn test_arith_compare_matches_scalar() {
    let src = int_column::<i32>(272, 41, 1000);
    for aop in [ArithOp::Add, ArithOp::Sub, ArithOp::Mul, ArithOp::Div, ArithOp::Mod] {
        for cmp in [CompareOp::Eq, CompareOp::Ne] {
            let mut expect = vec![0u64; 6];
            scalar::arith_compare::<u64, i32>(&mut expect, 9, &src, 7, 21, aop, cmp);
            let mut got = vec![0u64; 6];
            vectorized::arith_compare::<u64, DynamicVectorizer, i32>(
                &mut got, 9, &src, 7, 21, aop, cmp,
            );
            assert_eq!(bits(&got, 0, 281), bits(&expect, 0, 281), "{aop:?} {cmp:?}");
        }
    }
}

#[test]
fn test_float_div_reformulation_is_consistent() {
    let src: Vec<f64> = vec![6.0, 3.0, 12.0, 1.5, 0.0, -6.0, 6.000001, 2.0];
    let mut expect = vec![0u64; 1];
    scalar::arith_compare::<u64, f64>(&mut expect, 0, &src, 2.0, 3.0, ArithOp::Div, CompareOp::Eq);
    let mut got = vec![0u64; 1];
    vectorized::arith_compare::<u64, DynamicVectorizer, f64>(
        &mut got,
        0,
        &src,
        2.0,
        3.0,
        ArithOp::Div,
        CompareOp::Eq,
    );
    assert_eq!(bits(&got, 0, 8), bits(&expect, 0, 8));
    // both paths compare against 2.0 * 3.0
    assert!(bits(&got, 0, 8)[0]);
    assert!(!bits(&got, 0, 8)[1]);
}

#[test]
fn test_decline_leaves_output_untouched() {
    // integer Mod declines on every SIMD backend
    let src = int_column::<i64>(128, 51, 100);
    let mut out = vec![0xA5u8; 16];
    let before = out.clone();
    let handled = ScalableVectorizer::arith_compare::<i64>(
        &mut out,
        &src,
        3,
        1,
        ArithOp::Mod,
        CompareOp::Eq,
    );
    assert!(!handled);
    assert_eq!(out, before);

    let mut out = vec![0x5Au8; 16];
    let before = out.clone();
    let handled = DynamicVectorizer::arith_compare::<i64>(
        &mut out,
        &src,
        3,
        1,
        ArithOp::Mod,
        CompareOp::Eq,
    );
    assert!(!handled);
    assert_eq!(out, before);

    // the reference vectorizer declines everything, writing nothing
    let mut out = vec![0xEEu8; 16];
    let before = out.clone();
    assert!(!RefVectorizer::compare_val::<i64>(&mut out, &src, CompareOp::Eq, 0));
    assert_eq!(out, before);
}

#[test]
fn test_scenario_compare_val_i8() {
    let src: Vec<i8> = (0..72).map(|i| (i % 5) as i8).collect();
    let hits = Bitset::<u64>::from_compare_val(&src, CompareOp::Eq, 1);
    let expect: Vec<usize> = (0..15).map(|k| 1 + 5 * k).collect();
    assert_eq!(hits.iter_set().collect::<Vec<_>>(), expect);
}

#[test]
fn test_scenario_within_range_f32() {
    let src: Vec<f32> = vec![0.5, 1.0, 1.5, 2.999, 3.0, 3.5, 1.0, 2.0];
    let hits = Bitset::<u64>::from_within_range_val(1.0, 3.0, &src, RangeKind::IncExc);
    let expect: Vec<bool> = src.iter().map(|&x| 1.0 <= x && x < 3.0).collect();
    let got: Vec<bool> = (0..8).map(|i| hits.get(i)).collect();
    assert_eq!(got, expect);
    assert_eq!(hits.iter_set().collect::<Vec<_>>(), vec![1, 2, 3, 6, 7]);
}

#[test]
fn test_scenario_arith_add() {
    // [5, 6, 4, 5, 0] padded to 8 elements with zeros
    let src: Vec<i32> = vec![5, 6, 4, 5, 0, 0, 0, 0];
    let hits = Bitset::<u64>::from_arith_compare(&src, 10, 15, ArithOp::Add, CompareOp::Eq);
    assert_eq!(hits.iter_set().collect::<Vec<_>>(), vec![0, 3]);
}

#[test]
fn test_view_predicates_hit_every_split() {
    // offsets walk the head/body/tail combinations through a view
    let src = int_column::<i32>(200, 61, 40);
    for offset in [0usize, 1, 7, 8, 63, 64] {
        let mut expect_words = vec![0u64; 6];
        scalar::compare_val::<u64, i32>(&mut expect_words, offset, &src, CompareOp::Gt, 0);

        let mut b = Bitset::<u64>::with_len(offset + 200 + 10, false);
        b.view_mut(offset, 200)
            .compare_val(&src, CompareOp::Gt, 0)
            .unwrap();

        assert_eq!(
            bits(b.as_words(), offset, 200),
            bits(&expect_words, offset, 200),
            "offset {offset}"
        );
        if offset > 0 {
            assert!(b.view(0, offset).all_unset());
        }
        assert!(b.view_from(offset + 200).all_unset());
    }
}

#[test]
fn test_nan_semantics_match_scalar() {
    let src: Vec<f32> = vec![1.0, f32::NAN, 2.0, f32::NAN, 0.0, -1.0, 5.0, f32::NAN];
    for op in CompareOp::ALL {
        let mut expect = vec![0u64; 1];
        scalar::compare_val::<u64, f32>(&mut expect, 0, &src, op, 2.0);
        let mut got = vec![0u64; 1];
        vectorized::compare_val::<u64, DynamicVectorizer, f32>(&mut got, 0, &src, op, 2.0);
        assert_eq!(bits(&got, 0, 8), bits(&expect, 0, 8), "{op:?}");
    }
}

#[test]
fn test_backend_probe_reports_something() {
    // whatever the host supports, the probe must be stable and the
    // dynamic path must produce scalar-identical results (covered above)
    let k = active_backend();
    assert_eq!(k, active_backend());
}
