//! Parameter binding: token resolution, field position stability, named
//! parameter substitution and the two error channels.

use std::collections::HashMap;

use tablecalc::{
    bind_expression, create_function, ExprError, ExpressionContext, FieldIndex, Param,
    ParamBinder, StateIndex, Token, TokenKind, Val,
};

fn ctx() -> ExpressionContext {
    ExpressionContext::with_reference_time(0)
}

#[test]
fn test_field_token_reused_binds_same_position() {
    let binder = ParamBinder::new();
    let mut fields = FieldIndex::new();
    let mut state = StateIndex::new();

    binder
        .bind(&mut fields, &mut state, &Token::new(TokenKind::Field, "val1", 0))
        .unwrap();
    binder
        .bind(&mut fields, &mut state, &Token::new(TokenKind::Field, "val1", 20))
        .unwrap();
    binder
        .bind(&mut fields, &mut state, &Token::new(TokenKind::Field, "val2", 40))
        .unwrap();

    assert_eq!(fields.len(), 2);
    assert_eq!(fields.get("val1"), Some(0));
    assert_eq!(fields.get("val2"), Some(1));
}

#[test]
fn test_literal_tokens() {
    let binder = ParamBinder::new();
    let mut fields = FieldIndex::new();
    let mut state = StateIndex::new();

    let cases = [
        (TokenKind::String, "hello", Val::string("hello")),
        (TokenKind::Number, "50", Val::Double(50.0)),
        (
            TokenKind::DateLiteral,
            "2014-02-22T12:12:12.888Z",
            Val::Date(1393071132888),
        ),
        (TokenKind::DurationLiteral, "1h", Val::Duration(3_600_000)),
        (TokenKind::DurationLiteral, "PT5M", Val::Duration(300_000)),
    ];
    for (kind, text, expected) in cases {
        let param = binder
            .bind(&mut fields, &mut state, &Token::new(kind, text, 0))
            .unwrap();
        assert_eq!(param.static_value(), Some(&expected), "token '{}'", text);
    }
    // No literal claimed a field position
    assert!(fields.is_empty());
}

#[test]
fn test_named_parameter_substitution() {
    let mut named = HashMap::new();
    named.insert("currentUser".to_string(), Val::string("jbloggs"));
    let binder = ParamBinder::with_named(named);
    let mut fields = FieldIndex::new();
    let mut state = StateIndex::new();

    let substituted = binder
        .bind(
            &mut fields,
            &mut state,
            &Token::new(TokenKind::Field, "currentUser", 0),
        )
        .unwrap();
    assert_eq!(substituted.static_value(), Some(&Val::string("jbloggs")));

    // Unknown names still bind as field references
    let field = binder
        .bind(&mut fields, &mut state, &Token::new(TokenKind::Field, "other", 0))
        .unwrap();
    assert_eq!(field.static_value(), None);
    assert_eq!(fields.len(), 1);
}

#[test]
fn test_malformed_literals_fail_at_bind_time() {
    let binder = ParamBinder::new();
    let mut fields = FieldIndex::new();
    let mut state = StateIndex::new();

    let cases = [
        (TokenKind::Number, "12x"),
        (TokenKind::DateLiteral, "2014-99-99T00:00:00Z"),
        (TokenKind::DurationLiteral, "five minutes"),
    ];
    for (kind, text) in cases {
        let result = binder.bind(&mut fields, &mut state, &Token::new(kind, text, 9));
        match result {
            Err(ExprError::Token { position, .. }) => assert_eq!(position, 9),
            other => panic!("expected a token error for '{}', got {:?}", text, other),
        }
    }
}

#[test]
fn test_arity_failures_are_bind_time_not_runtime() {
    let mut state = StateIndex::new();
    let result = create_function(
        &ctx(),
        "if",
        vec![Param::Value(Val::Boolean(true))],
        &mut state,
    );
    match result {
        Err(ExprError::Arity { function, actual, .. }) => {
            assert_eq!(function, "if");
            assert_eq!(actual, 1);
        }
        other => panic!("expected an arity error, got {:?}", other.err()),
    }
}

#[test]
fn test_unknown_function_is_a_bind_failure() {
    let mut state = StateIndex::new();
    let result = create_function(&ctx(), "foo", vec![], &mut state);
    assert!(matches!(result, Err(ExprError::UnknownFunction { .. })));
}

#[test]
fn test_expression_wrapper_is_transparent() {
    let binder = ParamBinder::new();
    let mut fields = FieldIndex::new();
    let mut state = StateIndex::new();
    let field = binder
        .bind(&mut fields, &mut state, &Token::new(TokenKind::Field, "val1", 0))
        .unwrap();
    let sum = create_function(&ctx(), "sum", vec![field], &mut state).unwrap();
    let expression = bind_expression(vec![Param::Function(sum)]).unwrap();

    assert!(expression.has_aggregate());
    assert!(!expression.requires_child_data());

    let mut generator = expression.create_generator();
    let mut storage = state.create_stored_values();
    generator.set(&[Val::Double(3.0)], &mut storage);
    generator.set(&[Val::Double(4.0)], &mut storage);
    assert_eq!(generator.eval(&storage, None), Val::Double(7.0));
}

#[test]
fn test_state_index_sizes_storage_for_all_slots() {
    let binder = ParamBinder::new();
    let mut fields = FieldIndex::new();
    let mut state = StateIndex::new();
    // Two field refs and two aggregates claim four slots between them
    let a = binder
        .bind(&mut fields, &mut state, &Token::new(TokenKind::Field, "a", 0))
        .unwrap();
    let b = binder
        .bind(&mut fields, &mut state, &Token::new(TokenKind::Field, "b", 0))
        .unwrap();
    create_function(&ctx(), "sum", vec![a], &mut state).unwrap();
    create_function(&ctx(), "min", vec![b], &mut state).unwrap();

    assert_eq!(state.size(), 4);
    assert_eq!(state.create_stored_values().size(), 4);
}
