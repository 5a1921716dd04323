//! Streaming aggregation: partial accumulators built on disjoint row sets
//! must merge to exactly the single-pass result, for any partitioning.

use tablecalc::Val;

use super::support::Compiled;

/// Fold `rows` through one pass, and through every split point with a
/// merge, asserting all results agree.
fn assert_merge_invariant(compiled: &Compiled, rows: &[Val]) -> Val {
    let name = "merge invariant";
    let single_pass = compiled.run_rows(rows);

    for split in 0..=rows.len() {
        let mut gen_a = compiled.function.create_generator();
        let mut gen_b = compiled.function.create_generator();
        let mut a = compiled.state.create_stored_values();
        let mut b = compiled.state.create_stored_values();
        for row in &rows[..split] {
            gen_a.set(std::slice::from_ref(row), &mut a);
        }
        for row in &rows[split..] {
            gen_b.set(std::slice::from_ref(row), &mut b);
        }
        gen_a.merge(&mut a, &b);
        let merged = gen_a.eval(&a, None);

        match (&single_pass, &merged) {
            (Val::Double(x), Val::Double(y)) => assert!(
                (x - y).abs() < 1e-9,
                "{} split {}: {} != {}",
                name,
                split,
                x,
                y
            ),
            (expected, actual) => assert_eq!(
                expected, actual,
                "{} split {} diverged from single pass",
                name, split
            ),
        }
    }
    single_pass
}

fn doubles(values: &[f64]) -> Vec<Val> {
    values.iter().map(|v| Val::Double(*v)).collect()
}

#[test]
fn test_sum_merge_equals_single_pass_for_any_partitioning() {
    let sum = Compiled::with_field("sum", vec![]);
    let out = assert_merge_invariant(&sum, &doubles(&[1.0, 2.0, 3.0, 4.0, 5.0]));
    assert_eq!(out, Val::Double(15.0));
}

#[test]
fn test_min_max_merge() {
    let rows = doubles(&[600.0, 470.0, 170.0, 430.0, 300.0]);
    let min = Compiled::with_field("min", vec![]);
    let max = Compiled::with_field("max", vec![]);
    assert_eq!(assert_merge_invariant(&min, &rows), Val::Double(170.0));
    assert_eq!(assert_merge_invariant(&max, &rows), Val::Double(600.0));
}

#[test]
fn test_average_merge() {
    let average = Compiled::with_field("average", vec![]);
    let out = assert_merge_invariant(&average, &doubles(&[1.0, 2.0, 6.0]));
    assert_eq!(out, Val::Double(3.0));
}

#[test]
fn test_variance_and_stdev_merge() {
    let rows = doubles(&[600.0, 470.0, 170.0, 430.0, 300.0]);
    let variance = assert_merge_invariant(&Compiled::with_field("variance", vec![]), &rows);
    let Val::Double(variance) = variance else {
        panic!("expected a double, got {:?}", variance);
    };
    assert!((variance - 21704.0).abs() < 1e-6);

    let st_dev = assert_merge_invariant(&Compiled::with_field("stDev", vec![]), &rows);
    let Val::Double(st_dev) = st_dev else {
        panic!("expected a double, got {:?}", st_dev);
    };
    assert!((st_dev - 147.32277).abs() < 1e-4);
}

#[test]
fn test_count_merge() {
    let count = Compiled::with_values("count", vec![]);
    let out = assert_merge_invariant(&count, &doubles(&[122.0, 133.0, 11.0, 122.0]));
    assert_eq!(out, Val::Long(4));
}

#[test]
fn test_count_unique_merge_dedupes_across_partitions() {
    let rows = doubles(&[122.0, 133.0, 11.0, 122.0]);
    let out = assert_merge_invariant(&Compiled::with_field("countUnique", vec![]), &rows);
    assert_eq!(out, Val::Integer(3));
}

#[test]
fn test_joining_merge_keeps_target_then_source_order() {
    let compiled = Compiled::with_field("joining", vec![Val::string(",")]);
    let mut gen_a = compiled.function.create_generator();
    let mut gen_b = compiled.function.create_generator();
    let mut a = compiled.state.create_stored_values();
    let mut b = compiled.state.create_stored_values();
    gen_a.set(&[Val::string("one")], &mut a);
    gen_b.set(&[Val::string("two")], &mut b);
    gen_b.set(&[Val::string("three")], &mut b);
    gen_a.merge(&mut a, &b);
    assert_eq!(gen_a.eval(&a, None), Val::string("one,two,three"));
}

#[test]
fn test_joining_without_delimiter() {
    let compiled = Compiled::with_field("joining", vec![]);
    assert_eq!(
        compiled.run_rows(&[Val::string("one"), Val::string("two"), Val::string("three")]),
        Val::string("onetwothree")
    );
}

#[test]
fn test_sum_skips_nulls_and_keeps_errors() {
    let compiled = Compiled::with_field("sum", vec![]);
    assert_eq!(
        compiled.run_rows(&[Val::Double(1.0), Val::Null, Val::Double(2.0)]),
        Val::Double(3.0)
    );
    let out = compiled.run_rows(&[Val::Double(1.0), Val::err("bad"), Val::Double(2.0)]);
    assert_eq!(out, Val::err("bad"));
}

#[test]
fn test_empty_group_aggregates() {
    assert_eq!(Compiled::with_field("sum", vec![]).run_rows(&[]), Val::Null);
    assert_eq!(
        Compiled::with_values("count", vec![]).run_rows(&[]),
        Val::Long(0)
    );
    assert_eq!(
        Compiled::with_field("average", vec![]).run_rows(&[]),
        Val::Null
    );
    assert_eq!(
        Compiled::with_field("countUnique", vec![]).run_rows(&[]),
        Val::Integer(0)
    );
}

#[test]
fn test_count_keeps_counting_after_eval() {
    let compiled = Compiled::with_values("count", vec![]);
    let mut generator = compiled.function.create_generator();
    let mut storage = compiled.state.create_stored_values();
    generator.set(&[Val::Double(122.0)], &mut storage);
    generator.set(&[Val::Double(133.0)], &mut storage);
    assert_eq!(generator.eval(&storage, None), Val::Long(2));
    generator.set(&[Val::Double(11.0)], &mut storage);
    generator.set(&[Val::Double(122.0)], &mut storage);
    assert_eq!(generator.eval(&storage, None), Val::Long(4));
}
