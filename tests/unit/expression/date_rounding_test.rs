//! Date rounding through the factory: the calendar-unit family table and
//! the floor/ceiling ordering invariants.

use tablecalc::{create_function, ExpressionContext, Param, StateIndex, Val};

use super::support::Compiled;

fn ms_of(text: &str) -> i64 {
    let compiled = Compiled::with_values("parseDate", vec![Val::string(text)]);
    match compiled.run() {
        Val::Date(ms) => ms,
        other => panic!("unparseable test date {}: {:?}", text, other),
    }
}

fn eval_rounding(name: &str, input: &str) -> Val {
    Compiled::with_values(name, vec![Val::string(input)]).run()
}

const T: &str = "2014-02-22T12:12:12.888Z";

#[test]
fn test_rounding_family_table() {
    let cases = [
        ("floorSecond", "2014-02-22T12:12:12.000Z"),
        ("floorMinute", "2014-02-22T12:12:00.000Z"),
        ("floorHour", "2014-02-22T12:00:00.000Z"),
        ("floorDay", "2014-02-22T00:00:00.000Z"),
        ("floorMonth", "2014-02-01T00:00:00.000Z"),
        ("floorYear", "2014-01-01T00:00:00.000Z"),
        ("ceilingSecond", "2014-02-22T12:12:13.000Z"),
        ("ceilingMinute", "2014-02-22T12:13:00.000Z"),
        ("ceilingHour", "2014-02-22T13:00:00.000Z"),
        ("ceilingDay", "2014-02-23T00:00:00.000Z"),
        ("ceilingMonth", "2014-03-01T00:00:00.000Z"),
        ("ceilingYear", "2015-01-01T00:00:00.000Z"),
        ("roundSecond", "2014-02-22T12:12:13.000Z"),
        ("roundMinute", "2014-02-22T12:12:00.000Z"),
        ("roundHour", "2014-02-22T12:00:00.000Z"),
        ("roundDay", "2014-02-23T00:00:00.000Z"),
        ("roundMonth", "2014-03-01T00:00:00.000Z"),
        ("roundYear", "2014-01-01T00:00:00.000Z"),
    ];
    for (name, expected) in cases {
        assert_eq!(eval_rounding(name, T), Val::Date(ms_of(expected)), "{}", name);
    }
}

#[test]
fn test_floor_le_input_le_ceiling() {
    let input_ms = ms_of(T);
    for unit in ["Second", "Minute", "Hour", "Day", "Week", "Month", "Year"] {
        let Val::Date(floor) = eval_rounding(&format!("floor{}", unit), T) else {
            panic!("floor{} did not produce a date", unit);
        };
        let Val::Date(ceiling) = eval_rounding(&format!("ceiling{}", unit), T) else {
            panic!("ceiling{} did not produce a date", unit);
        };
        assert!(
            floor <= input_ms && input_ms <= ceiling,
            "{}: {} <= {} <= {} violated",
            unit,
            floor,
            input_ms,
            ceiling
        );
    }
}

#[test]
fn test_boundary_input_is_fixed_point() {
    let boundary = "2014-02-01T00:00:00.000Z";
    let expected = Val::Date(ms_of(boundary));
    for name in ["floorMonth", "ceilingMonth", "floorDay", "ceilingDay"] {
        assert_eq!(eval_rounding(name, boundary), expected, "{}", name);
    }
}

#[test]
fn test_floor_time_and_ceiling_time_by_duration() {
    let five_minutes = 300_000i64;
    let input_ms = ms_of(T);

    let floor = Compiled::with_values(
        "floorTime",
        vec![Val::string(T), Val::string("PT5M")],
    )
    .run();
    let ceiling = Compiled::with_values(
        "ceilingTime",
        vec![Val::string(T), Val::string("PT5M")],
    )
    .run();

    let (Val::Date(f), Val::Date(c)) = (&floor, &ceiling) else {
        panic!("expected dates, got {:?} / {:?}", floor, ceiling);
    };
    assert!(*f <= input_ms && input_ms <= *c);
    assert_eq!(f % five_minutes, 0);
    assert_eq!(c % five_minutes, 0);
    assert_eq!(c - f, five_minutes);

    // Flooring the ceiling of the same duration returns the same instant
    let refloored = Compiled::with_values(
        "floorTime",
        vec![ceiling.clone(), Val::string("PT5M")],
    )
    .run();
    assert_eq!(refloored, ceiling);
}

#[test]
fn test_rounding_under_fixed_offset_zone() {
    // floorDay in +04:00 lands on the zone's midnight, i.e. 20:00 UTC of
    // the previous day
    let ctx = ExpressionContext::new(
        tablecalc::TimeZonePolicy::Offset { minutes: 240 },
        0,
        tablecalc::CaseSensitivity::Insensitive,
    );
    let mut state = StateIndex::new();
    let floor_day = create_function(
        &ctx,
        "floorDay",
        vec![Param::Value(Val::string(T))],
        &mut state,
    )
    .unwrap();
    let storage = state.create_stored_values();
    assert_eq!(
        floor_day.create_generator().eval(&storage, None),
        Val::Date(ms_of("2014-02-21T20:00:00.000Z"))
    );
}

#[test]
fn test_rounding_propagates_null_and_error() {
    assert_eq!(
        Compiled::with_values("floorDay", vec![Val::Null]).run(),
        Val::Null
    );
    assert_eq!(
        Compiled::with_values("floorDay", vec![Val::err("upstream")]).run(),
        Val::err("upstream")
    );
    assert!(Compiled::with_values("floorDay", vec![Val::string("not a date")])
        .run()
        .is_err());
}
