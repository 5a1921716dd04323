//! The value model from the outside: total coercions, rendering, casts
//! through the factory and JSON serialization.

use tablecalc::Val;

use super::support::Compiled;

#[test]
fn test_every_variant_renders() {
    let values = [
        (Val::Null, ""),
        (Val::err("boom"), "Err: boom"),
        (Val::Boolean(true), "true"),
        (Val::Byte(7), "7"),
        (Val::Short(300), "300"),
        (Val::Integer(42), "42"),
        (Val::Long(42), "42"),
        (Val::Float(1.5), "1.5"),
        (Val::Double(2.0), "2"),
        (Val::Date(1393071132888), "2014-02-22T12:12:12.888Z"),
        (Val::Duration(300_000), "5m"),
        (Val::string("text"), "text"),
        (Val::Xml("<a/>".to_string()), "<a/>"),
    ];
    for (value, expected) in values {
        assert_eq!(value.to_display_string(), expected, "{:?}", value);
    }
}

#[test]
fn test_casts_through_the_factory() {
    assert_eq!(
        Compiled::with_values("toBoolean", vec![Val::string("true")]).run(),
        Val::Boolean(true)
    );
    assert_eq!(
        Compiled::with_values("toDouble", vec![Val::string("100")]).run(),
        Val::Double(100.0)
    );
    assert_eq!(
        Compiled::with_values("toInteger", vec![Val::string("12")]).run(),
        Val::Integer(12)
    );
    assert_eq!(
        Compiled::with_values("toLong", vec![Val::Date(1000)]).run(),
        Val::Long(1000)
    );
    assert_eq!(
        Compiled::with_values("toString", vec![Val::Double(50.0)]).run(),
        Val::string("50")
    );
}

#[test]
fn test_type_of_through_the_factory() {
    assert_eq!(
        Compiled::with_values("typeOf", vec![Val::string("x")]).run(),
        Val::string("string")
    );
    assert_eq!(
        Compiled::with_values("typeOf", vec![Val::Null]).run(),
        Val::string("null")
    );
    assert_eq!(
        Compiled::with_values("typeOf", vec![Val::err("x")]).run(),
        Val::string("error")
    );
}

#[test]
fn test_failed_cast_is_an_error_value_not_a_panic() {
    let out = Compiled::with_values("toInteger", vec![Val::Xml("<a/>".to_string())]).run();
    assert!(out.is_err());
}

#[test]
fn test_equality_coerces_across_types() {
    for (a, b, expected) in [
        (Val::string("10"), Val::Double(10.0), true),
        (Val::Boolean(true), Val::string("true"), true),
        (Val::Date(1000), Val::Long(1000), true),
        (Val::string("abc"), Val::string("ABC"), true), // context default is case-insensitive
        (Val::Null, Val::Null, true),
        (Val::string("1.23"), Val::Integer(10), false),
    ] {
        assert_eq!(
            Compiled::with_values("equals", vec![a.clone(), b.clone()]).run(),
            Val::Boolean(expected),
            "equals({:?}, {:?})",
            a,
            b
        );
    }
}

#[test]
fn test_ordering_functions_agree_with_comparator() {
    assert_eq!(
        Compiled::with_values("greaterThan", vec![Val::Double(1.0), Val::Double(0.0)]).run(),
        Val::Boolean(true)
    );
    assert_eq!(
        Compiled::with_values("lessThan", vec![Val::Double(1.0), Val::Double(0.0)]).run(),
        Val::Boolean(false)
    );
    assert_eq!(
        Compiled::with_values(
            "greaterThanOrEqualTo",
            vec![Val::string("20"), Val::Integer(20)]
        )
        .run(),
        Val::Boolean(true)
    );
}

#[test]
fn test_json_serialization() {
    assert_eq!(serde_json::to_string(&Val::Integer(42)).unwrap(), "42");
    assert_eq!(serde_json::to_string(&Val::Double(1.5)).unwrap(), "1.5");
    assert_eq!(serde_json::to_string(&Val::Boolean(true)).unwrap(), "true");
    assert_eq!(serde_json::to_string(&Val::Null).unwrap(), "null");
    assert_eq!(
        serde_json::to_string(&Val::string("x")).unwrap(),
        "\"x\""
    );
    assert_eq!(
        serde_json::to_string(&Val::Date(1393071132888)).unwrap(),
        "\"2014-02-22T12:12:12.888Z\""
    );
    assert_eq!(serde_json::to_string(&Val::Duration(500)).unwrap(), "500");
    assert_eq!(
        serde_json::to_string(&Val::err("bad")).unwrap(),
        "\"Err: bad\""
    );
}

#[test]
fn test_error_dominates_null_in_binary_operations() {
    let err = Val::err("bad");
    assert_eq!(
        Compiled::with_values("add", vec![Val::Null, err.clone()]).run(),
        err
    );
    assert_eq!(
        Compiled::with_values("multiply", vec![err.clone(), Val::Null]).run(),
        err
    );
}
