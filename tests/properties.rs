// Property tests for merge invariants:
// 1. Associativity: grouping of pairwise merges does not matter
// 2. Commutativity: the order of two observations does not matter
// 3. Identity: merging a copy doubles counts and keeps markers
// 4. Line class counts always add up to the total

use proptest::collection::vec;
use proptest::prelude::*;

use covset::diagnostics::NullDiagnostics;
use covset::model::{CoverageStats, FileCoverage, HitCount, LineRecord};

fn arb_hits() -> impl Strategy<Value = HitCount> {
    prop_oneof![
        (0..1_000u64).prop_map(HitCount::Count),
        Just(HitCount::NotExecuted),
        Just(HitCount::NonFeasible),
        Just(HitCount::NonCode),
    ]
}

fn arb_line() -> impl Strategy<Value = LineRecord> {
    (arb_hits(), 0..20u32).prop_map(|(hits, complexity)| {
        LineRecord::new(0, "x", hits).with_complexity(complexity)
    })
}

fn arb_file(len: usize) -> impl Strategy<Value = FileCoverage> {
    vec(arb_line(), len).prop_map(|lines| FileCoverage::from_records("p.c", lines))
}

// Three files of the same length.
fn arb_triple() -> impl Strategy<Value = (FileCoverage, FileCoverage, FileCoverage)> {
    (1..40usize).prop_flat_map(|n| (arb_file(n), arb_file(n), arb_file(n)))
}

fn merged(mut a: FileCoverage, b: FileCoverage) -> FileCoverage {
    a.merge(b, &NullDiagnostics).unwrap();
    a
}

fn snapshot(file: &FileCoverage) -> (Vec<(HitCount, u32)>, CoverageStats) {
    let lines = file
        .lines()
        .iter()
        .map(|l| (l.hits(), l.complexity()))
        .collect();
    (lines, file.stats())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn merge_is_associative((a, b, c) in arb_triple()) {
        let left = merged(merged(a.clone(), b.clone()), c.clone());
        let right = merged(a, merged(b, c));
        prop_assert_eq!(snapshot(&left), snapshot(&right));
    }

    #[test]
    fn merge_is_commutative((a, b, _c) in arb_triple()) {
        let ab = merged(a.clone(), b.clone());
        let ba = merged(b, a);
        prop_assert_eq!(snapshot(&ab), snapshot(&ba));
    }

    #[test]
    fn merge_with_copy_doubles_counts((a, _b, _c) in arb_triple()) {
        let doubled = merged(a.clone(), a.clone());
        for (before, after) in a.lines().iter().zip(doubled.lines()) {
            match before.hits() {
                HitCount::Count(n) => prop_assert_eq!(after.hits(), HitCount::Count(n * 2)),
                marker => prop_assert_eq!(after.hits(), marker),
            }
        }
        prop_assert_eq!(a.stats().code_lines, doubled.stats().code_lines);
    }

    #[test]
    fn line_classes_sum_to_total((a, b, _c) in arb_triple()) {
        for file in [a.clone(), merged(a, b)] {
            let stats = file.stats();
            prop_assert_eq!(
                stats.code_lines + stats.non_feasible_lines + stats.non_code_lines,
                stats.total_lines
            );
            prop_assert!(stats.hit_code_lines <= stats.code_lines);
            prop_assert!((0.0..=100.0).contains(&stats.coverage_percent()));
        }
    }

    #[test]
    fn mismatched_lengths_never_merge(n in 1..30usize, extra in 1..5usize) {
        let lines = |len: usize| (0..len).map(|_| LineRecord::new(0, "x", HitCount::Count(1)));
        let mut a = FileCoverage::from_records("p.c", lines(n));
        let b = FileCoverage::from_records("p.c", lines(n + extra));
        let before = snapshot(&a);

        prop_assert!(a.merge(b, &NullDiagnostics).is_err());
        prop_assert_eq!(snapshot(&a), before);
    }

    #[test]
    fn parser_never_panics(input in vec(any::<u8>(), 0..512)) {
        let _ = covset::parsers::gcov::parse("fuzz.gcov", &input, &NullDiagnostics);
    }
}
