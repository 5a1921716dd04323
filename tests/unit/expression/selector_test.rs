//! Selector functions over grouped child data, the planner-facing
//! capability flags, and the ungrouped fallback behaviour.

use tablecalc::{ChildData, GroupRows, LazyChildData, Val};

use super::support::{child_data, Compiled};

fn integers(n: i32) -> Vec<Val> {
    (1..=n).map(Val::Integer).collect()
}

/// Evaluate a compiled selector against a group of single-column member
/// rows, with the current row carrying 300.
fn eval_with_group(compiled: &Compiled, members: Vec<Val>) -> Val {
    let mut generator = compiled.function.create_generator();
    let mut storage = compiled.state.create_stored_values();
    generator.set(&[Val::Integer(300)], &mut storage);
    let supplier = LazyChildData::new(move || Some(child_data(compiled, &members)));
    generator.eval(&storage, Some(&supplier))
}

#[test]
fn test_first_and_last() {
    let first = Compiled::with_field("first", vec![]);
    assert_eq!(eval_with_group(&first, integers(10)), Val::Integer(1));

    let last = Compiled::with_field("last", vec![]);
    assert_eq!(eval_with_group(&last, integers(10)), Val::Integer(10));
}

#[test]
fn test_nth_is_zero_based() {
    let nth = Compiled::with_field("nth", vec![Val::Double(6.0)]);
    assert_eq!(eval_with_group(&nth, integers(10)), Val::Integer(7));
}

#[test]
fn test_top_and_bottom_join_members() {
    let top = Compiled::with_field("top", vec![Val::string(","), Val::Double(3.0)]);
    assert_eq!(eval_with_group(&top, integers(10)), Val::string("1,2,3"));
    // A group smaller than the limit joins what there is
    assert_eq!(eval_with_group(&top, integers(2)), Val::string("1,2"));

    let bottom = Compiled::with_field("bottom", vec![Val::string(","), Val::Double(3.0)]);
    assert_eq!(eval_with_group(&bottom, integers(10)), Val::string("8,9,10"));
    assert_eq!(eval_with_group(&bottom, integers(2)), Val::string("1,2"));
}

#[test]
fn test_any_reports_no_child_data_requirement() {
    let any = Compiled::with_field("any", vec![]);
    let first = Compiled::with_field("first", vec![]);

    assert!(!any.function.requires_child_data());
    assert!(first.function.requires_child_data());

    // Both are aggregate operators as far as the planner is concerned
    assert!(any.function.has_aggregate());
    assert!(first.function.has_aggregate());
}

#[test]
fn test_all_selectors_are_aggregates_needing_child_data_except_any() {
    for (name, extra, requires) in [
        ("any", vec![], false),
        ("first", vec![], true),
        ("last", vec![], true),
        ("nth", vec![Val::Double(0.0)], true),
        ("top", vec![Val::string(","), Val::Double(3.0)], true),
        ("bottom", vec![Val::string(","), Val::Double(3.0)], true),
    ] {
        let compiled = Compiled::with_field(name, extra);
        assert!(compiled.function.has_aggregate(), "{} aggregate flag", name);
        assert_eq!(
            compiled.function.requires_child_data(),
            requires,
            "{} child data flag",
            name
        );
    }
}

#[test]
fn test_ungrouped_context_falls_back_to_current_row() {
    for (name, extra) in [
        ("any", vec![]),
        ("first", vec![]),
        ("last", vec![]),
        ("nth", vec![Val::Double(7.0)]),
        ("top", vec![Val::string(","), Val::Double(3.0)]),
        ("bottom", vec![Val::string(","), Val::Double(3.0)]),
    ] {
        let compiled = Compiled::with_field(name, extra);
        let mut generator = compiled.function.create_generator();
        let mut storage = compiled.state.create_stored_values();
        generator.set(&[Val::Integer(300)], &mut storage);
        assert_eq!(
            generator.eval(&storage, None),
            Val::Integer(300),
            "{} without child data",
            name
        );
    }
}

#[test]
fn test_empty_group_falls_back_instead_of_failing() {
    for (name, extra) in [
        ("first", vec![]),
        ("last", vec![]),
        ("nth", vec![Val::Double(0.0)]),
    ] {
        let compiled = Compiled::with_field(name, extra);
        let mut generator = compiled.function.create_generator();
        let mut storage = compiled.state.create_stored_values();
        generator.set(&[Val::Integer(42)], &mut storage);
        let supplier =
            LazyChildData::new(|| Some(Box::new(GroupRows::default()) as Box<dyn ChildData>));
        assert_eq!(
            generator.eval(&storage, Some(&supplier)),
            Val::Integer(42),
            "{} on empty group",
            name
        );
    }
}

#[test]
fn test_selected_member_value_is_returned_even_if_null() {
    // first picks the first member in group order and evaluates it, Null
    // included
    let first = Compiled::with_field("first", vec![]);
    let members = vec![Val::Null, Val::Integer(2), Val::Integer(3)];
    assert_eq!(eval_with_group(&first, members), Val::Null);
}

#[test]
fn test_count_groups_reads_membership() {
    let compiled = Compiled::with_values("countGroups", vec![]);
    let mut generator = compiled.function.create_generator();
    let mut storage = compiled.state.create_stored_values();
    generator.set(&[Val::Double(122.0)], &mut storage);
    generator.set(&[Val::Double(133.0)], &mut storage);

    let supplier = LazyChildData::new(|| {
        Some(Box::new(GroupRows::new(vec![
            tablecalc::StoredValues::with_size(0),
            tablecalc::StoredValues::with_size(0),
        ])) as Box<dyn ChildData>)
    });
    assert_eq!(generator.eval(&storage, Some(&supplier)), Val::Long(2));

    // Outside a grouped context there is no membership to count
    assert_eq!(generator.eval(&storage, None), Val::Null);
}

#[test]
fn test_selector_merge_forwards_to_child() {
    // After merging two partitions, the fallback value is the first
    // partition's captured row, a deterministic tie-break
    let first = Compiled::with_field("first", vec![]);
    let mut gen_a = first.function.create_generator();
    let mut gen_b = first.function.create_generator();
    let mut a = first.state.create_stored_values();
    let mut b = first.state.create_stored_values();
    gen_a.set(&[Val::Integer(1)], &mut a);
    gen_b.set(&[Val::Integer(2)], &mut b);
    gen_a.merge(&mut a, &b);
    assert_eq!(gen_a.eval(&a, None), Val::Integer(1));
}
