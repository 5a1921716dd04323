//! End-to-end evaluation through the function factory: nested trees,
//! operator chains, error propagation and the constant fast path.

use std::sync::Arc;

use tablecalc::{
    bind_expression, create_function, ExpressionContext, FieldIndex, Function, Param, ParamBinder,
    StateIndex, Token, TokenKind, Val,
};

use super::support::Compiled;

fn ctx() -> ExpressionContext {
    ExpressionContext::with_reference_time(0)
}

#[test]
fn test_operator_chain_4_4_2_2() {
    // 4+4/2+2 under BODMAS binds as add(4, divide(4, 2), 2)
    let mut state = StateIndex::new();
    let divide = create_function(
        &ctx(),
        "divide",
        vec![Param::Value(Val::Double(4.0)), Param::Value(Val::Double(2.0))],
        &mut state,
    )
    .unwrap();
    let add = create_function(
        &ctx(),
        "add",
        vec![
            Param::Value(Val::Double(4.0)),
            Param::Function(divide),
            Param::Value(Val::Double(2.0)),
        ],
        &mut state,
    )
    .unwrap();
    let storage = state.create_stored_values();
    assert_eq!(add.create_generator().eval(&storage, None), Val::Double(8.0));
}

#[test]
fn test_bracketed_chain_via_nesting() {
    // (4+4)/(2+2) binds as divide(add(4,4), add(2,2))
    let mut state = StateIndex::new();
    let top = create_function(
        &ctx(),
        "add",
        vec![Param::Value(Val::Double(4.0)), Param::Value(Val::Double(4.0))],
        &mut state,
    )
    .unwrap();
    let bottom = create_function(
        &ctx(),
        "add",
        vec![Param::Value(Val::Double(2.0)), Param::Value(Val::Double(2.0))],
        &mut state,
    )
    .unwrap();
    let divide = create_function(
        &ctx(),
        "divide",
        vec![Param::Function(top), Param::Function(bottom)],
        &mut state,
    )
    .unwrap();
    let storage = state.create_stored_values();
    assert_eq!(
        divide.create_generator().eval(&storage, None),
        Val::Double(2.0)
    );
}

#[test]
fn test_modulo_chain() {
    let compiled = Compiled::with_values(
        "modulo",
        vec![Val::Double(8.0), Val::Double(3.0)],
    );
    assert_eq!(compiled.run(), Val::Double(2.0));
}

#[test]
fn test_concat_through_factory() {
    let compiled = Compiled::with_values(
        "concat",
        vec![Val::string("a"), Val::string("b"), Val::string("c")],
    );
    assert_eq!(compiled.run(), Val::string("abc"));
}

#[test]
fn test_concat_returns_error_unchanged() {
    let compiled =
        Compiled::with_values("concat", vec![Val::string("a"), Val::err("bad cell")]);
    assert_eq!(compiled.run(), Val::err("bad cell"));
}

#[test]
fn test_error_short_circuits_nested_trees() {
    // upperCase(concat('x', err())) carries the inner error out untouched
    let mut state = StateIndex::new();
    let err = create_function(&ctx(), "err", vec![], &mut state).unwrap();
    let concat = create_function(
        &ctx(),
        "concat",
        vec![Param::Value(Val::string("x")), Param::Function(err)],
        &mut state,
    )
    .unwrap();
    let upper = create_function(&ctx(), "upperCase", vec![Param::Function(concat)], &mut state)
        .unwrap();
    let storage = state.create_stored_values();
    assert!(upper.create_generator().eval(&storage, None).is_err());
}

#[test]
fn test_division_by_zero_never_raises() {
    let compiled =
        Compiled::with_values("divide", vec![Val::Double(8.0), Val::Double(0.0)]);
    let out = compiled.run();
    assert!(out.is_err(), "expected an error value, got {:?}", out);
}

#[test]
fn test_if_with_field_condition() {
    let compiled = Compiled::with_field("toBoolean", vec![]);
    assert_eq!(compiled.run_rows(&[Val::string("true")]), Val::Boolean(true));

    // if(match(${val1}, 'foo'), 'this', 'that')
    let mut state = StateIndex::new();
    let mut fields = FieldIndex::new();
    let binder = ParamBinder::new();
    let field = binder
        .bind(&mut fields, &mut state, &Token::new(TokenKind::Field, "val1", 0))
        .unwrap();
    let matcher = create_function(
        &ctx(),
        "match",
        vec![field, Param::Value(Val::string("foo"))],
        &mut state,
    )
    .unwrap();
    let branch = create_function(
        &ctx(),
        "if",
        vec![
            Param::Function(matcher),
            Param::Value(Val::string("this")),
            Param::Value(Val::string("that")),
        ],
        &mut state,
    )
    .unwrap();

    let mut generator = branch.create_generator();
    let mut storage = state.create_stored_values();
    generator.set(&[Val::string("foo")], &mut storage);
    assert_eq!(generator.eval(&storage, None), Val::string("this"));

    let mut generator = branch.create_generator();
    let mut storage = state.create_stored_values();
    generator.set(&[Val::string("bar")], &mut storage);
    assert_eq!(generator.eval(&storage, None), Val::string("that"));
}

#[test]
fn test_eval_is_idempotent_for_unchanged_storage() {
    let compiled = Compiled::with_field("sum", vec![]);
    let mut generator = compiled.function.create_generator();
    let mut storage = compiled.state.create_stored_values();
    generator.set(&[Val::Double(2.0)], &mut storage);
    generator.set(&[Val::Double(3.0)], &mut storage);
    let first = generator.eval(&storage, None);
    let second = generator.eval(&storage, None);
    assert_eq!(first, second);
    assert_eq!(first, Val::Double(5.0));
}

#[test]
fn test_static_value_fast_path() {
    // A literal expression folds without generator machinery
    let expression = bind_expression(vec![Param::Value(Val::string("hello"))]).unwrap();
    assert_eq!(expression.static_value(), Some(&Val::string("hello")));
    assert!(!expression.has_aggregate());
    assert!(!expression.requires_child_data());

    // A function tree over literals is not statically known
    let mut state = StateIndex::new();
    let concat = create_function(
        &ctx(),
        "concat",
        vec![Param::Value(Val::string("a")), Param::Value(Val::string("b"))],
        &mut state,
    )
    .unwrap();
    let expression = bind_expression(vec![Param::Function(concat)]).unwrap();
    assert_eq!(expression.static_value(), None);
}

#[test]
fn test_aggregate_flag_propagates_to_root() {
    let mut state = StateIndex::new();
    let mut fields = FieldIndex::new();
    let binder = ParamBinder::new();
    let field = binder
        .bind(&mut fields, &mut state, &Token::new(TokenKind::Field, "val1", 0))
        .unwrap();
    let count = create_function(&ctx(), "count", vec![], &mut state).unwrap();
    // floor(${val1} + count()) contains an aggregate two levels down
    let add = create_function(
        &ctx(),
        "add",
        vec![field, Param::Function(count)],
        &mut state,
    )
    .unwrap();
    let floor = create_function(&ctx(), "floor", vec![Param::Function(add)], &mut state).unwrap();

    assert!(floor.has_aggregate());
    assert!(!floor.requires_child_data());

    // And it evaluates: rows 1.34, 1.8655 -> floor(1.8655 + 2) == 3
    let mut generator = floor.create_generator();
    let mut storage = state.create_stored_values();
    generator.set(&[Val::Double(1.34)], &mut storage);
    generator.set(&[Val::Double(1.8655)], &mut storage);
    assert_eq!(generator.eval(&storage, None), Val::Double(3.0));
}

#[test]
fn test_function_tree_is_shareable_across_generators() {
    let compiled = Compiled::with_field("sum", vec![]);
    let function: Arc<dyn Function> = Arc::clone(&compiled.function);

    // Two independent generator trees over the same function tree
    let mut gen_a = function.create_generator();
    let mut gen_b = function.create_generator();
    let mut a = compiled.state.create_stored_values();
    let mut b = compiled.state.create_stored_values();
    gen_a.set(&[Val::Double(1.0)], &mut a);
    gen_b.set(&[Val::Double(10.0)], &mut b);
    assert_eq!(gen_a.eval(&a, None), Val::Double(1.0));
    assert_eq!(gen_b.eval(&b, None), Val::Double(10.0));
}
