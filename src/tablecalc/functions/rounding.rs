//! Numeric and date/time rounding.
//!
//! Numeric `floor`/`ceiling`/`round` scale by an optional decimal precision.
//! Date rounding is a family of one calculator shape parameterised by an
//! adjustment (floor, ceiling, nearest) per calendar unit, plus the
//! arbitrary-duration variants that work on plain millisecond epoch
//! arithmetic. All calendar maths happens in the working zone resolved once
//! per query from the expression context.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, Timelike};

use super::super::context::{ExpressionContext, ResolvedZone};
use super::super::error::{BindResult, ExprError};
use super::super::expr::{
    check_arity, eval_children, merge_children, set_children, ChildDataSupplier, Function,
    Generator, Param, StoredValues,
};
use super::super::values::{datetime, Val};

/// Which way a rounding calculator adjusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Floor,
    Ceiling,
    Nearest,
}

/// Numeric rounding with optional decimal precision:
/// `floor(8.42)`, `round(x, 2)`.
pub struct RoundNumeric {
    name: &'static str,
    adjustment: Adjustment,
    value: Param,
    scale: f64,
}

impl RoundNumeric {
    pub fn new(
        name: &'static str,
        adjustment: Adjustment,
        params: Vec<Param>,
    ) -> BindResult<Self> {
        check_arity(name, 1, 2, &params)?;
        let mut params = params;
        let scale = match params.get(1) {
            Some(param) => {
                // The precision must be statically known; a field-driven
                // precision would make column typing undecidable
                let precision = param
                    .static_value()
                    .and_then(Val::to_integer)
                    .ok_or_else(|| ExprError::argument(name, "invalid precision"))?;
                10f64.powi(precision)
            }
            None => 1.0,
        };
        let value = params.remove(0);
        Ok(Self {
            name,
            adjustment,
            value,
            scale,
        })
    }
}

impl Function for RoundNumeric {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(RoundNumericGenerator {
            name: self.name,
            adjustment: self.adjustment,
            child: self.value.create_generator(),
            scale: self.scale,
        })
    }

    fn has_aggregate(&self) -> bool {
        self.value.has_aggregate()
    }

    fn requires_child_data(&self) -> bool {
        self.value.requires_child_data()
    }
}

struct RoundNumericGenerator {
    name: &'static str,
    adjustment: Adjustment,
    child: Box<dyn Generator>,
    scale: f64,
}

impl Generator for RoundNumericGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.child.set(values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let value = self.child.eval(storage, child_data);
        if !value.is_value() {
            return value;
        }
        match value.to_double() {
            Some(v) => {
                let scaled = v * self.scale;
                let adjusted = match self.adjustment {
                    Adjustment::Floor => scaled.floor(),
                    Adjustment::Ceiling => scaled.ceil(),
                    Adjustment::Nearest => scaled.round(),
                };
                Val::Double(adjusted / self.scale)
            }
            None => Val::err(format!("Unable to {} {}", self.name, value.type_name())),
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.child.merge(target, source);
    }
}

/// Calendar unit for date rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    fn floor(&self, dt: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            TimeUnit::Second => dt.with_nanosecond(0),
            TimeUnit::Minute => dt.with_second(0)?.with_nanosecond(0),
            TimeUnit::Hour => dt.date().and_hms_opt(dt.hour(), 0, 0),
            TimeUnit::Day => dt.date().and_hms_opt(0, 0, 0),
            TimeUnit::Week => {
                let days_into_week = dt.weekday().num_days_from_monday() as u64;
                dt.date()
                    .checked_sub_days(Days::new(days_into_week))?
                    .and_hms_opt(0, 0, 0)
            }
            TimeUnit::Month => dt.date().with_day(1)?.and_hms_opt(0, 0, 0),
            TimeUnit::Year => NaiveDate::from_ymd_opt(dt.year(), 1, 1)?.and_hms_opt(0, 0, 0),
        }
    }

    fn advance(&self, dt: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            TimeUnit::Second => dt.checked_add_signed(chrono::Duration::seconds(1)),
            TimeUnit::Minute => dt.checked_add_signed(chrono::Duration::minutes(1)),
            TimeUnit::Hour => dt.checked_add_signed(chrono::Duration::hours(1)),
            TimeUnit::Day => dt.checked_add_signed(chrono::Duration::days(1)),
            TimeUnit::Week => dt.checked_add_signed(chrono::Duration::weeks(1)),
            TimeUnit::Month => dt.checked_add_months(Months::new(1)),
            TimeUnit::Year => dt.checked_add_months(Months::new(12)),
        }
    }

    /// The instant past which "round to nearest" advances a unit.
    ///
    /// Weeks, months and years use the fixed 3.5-day / 15-day / 6-month
    /// midpoints rather than exact calendar midpoints; a deliberate,
    /// simple tie-break kept from the original behaviour.
    fn midpoint(&self, floor: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            TimeUnit::Second => floor.checked_add_signed(chrono::Duration::milliseconds(500)),
            TimeUnit::Minute => floor.checked_add_signed(chrono::Duration::seconds(30)),
            TimeUnit::Hour => floor.checked_add_signed(chrono::Duration::minutes(30)),
            TimeUnit::Day => floor.checked_add_signed(chrono::Duration::hours(12)),
            TimeUnit::Week => floor.checked_add_signed(chrono::Duration::hours(84)),
            TimeUnit::Month => floor.checked_add_signed(chrono::Duration::days(15)),
            TimeUnit::Year => floor.checked_add_months(Months::new(6)),
        }
    }
}

/// Coerce an input value to a millisecond epoch instant: dates directly,
/// text through the ISO parser, plain numbers as raw milliseconds.
fn to_instant_ms(value: &Val) -> Option<i64> {
    match value {
        Val::Date(ms) => Some(*ms),
        Val::String(s) => datetime::parse_iso(s),
        other if other.is_numeric() => other.to_long(),
        _ => None,
    }
}

/// Calendar-unit date rounding: `floorDay`, `ceilingMonth`, `roundMinute`
/// and the rest of the family.
pub struct RoundDate {
    name: &'static str,
    unit: TimeUnit,
    adjustment: Adjustment,
    zone: ResolvedZone,
    value: Param,
}

impl RoundDate {
    pub fn new(
        name: &'static str,
        unit: TimeUnit,
        adjustment: Adjustment,
        ctx: &ExpressionContext,
        params: Vec<Param>,
    ) -> BindResult<Self> {
        check_arity(name, 1, 1, &params)?;
        let mut params = params;
        Ok(Self {
            name,
            unit,
            adjustment,
            zone: ctx.resolve_zone()?,
            value: params.remove(0),
        })
    }
}

impl Function for RoundDate {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(RoundDateGenerator {
            name: self.name,
            unit: self.unit,
            adjustment: self.adjustment,
            zone: self.zone.clone(),
            child: self.value.create_generator(),
        })
    }

    fn has_aggregate(&self) -> bool {
        self.value.has_aggregate()
    }

    fn requires_child_data(&self) -> bool {
        self.value.requires_child_data()
    }
}

struct RoundDateGenerator {
    name: &'static str,
    unit: TimeUnit,
    adjustment: Adjustment,
    zone: ResolvedZone,
    child: Box<dyn Generator>,
}

impl RoundDateGenerator {
    fn adjust(&self, ms: i64) -> Option<i64> {
        let local = self.zone.to_local(ms)?;
        let floor = self.unit.floor(local)?;
        let adjusted = match self.adjustment {
            Adjustment::Floor => floor,
            Adjustment::Ceiling => {
                if local > floor {
                    self.unit.advance(floor)?
                } else {
                    floor
                }
            }
            Adjustment::Nearest => {
                if local >= self.unit.midpoint(floor)? {
                    self.unit.advance(floor)?
                } else {
                    floor
                }
            }
        };
        self.zone.from_local(adjusted)
    }
}

impl Generator for RoundDateGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.child.set(values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let value = self.child.eval(storage, child_data);
        if !value.is_value() {
            return value;
        }
        match to_instant_ms(&value).and_then(|ms| self.adjust(ms)) {
            Some(adjusted) => Val::Date(adjusted),
            None => Val::err(format!(
                "Unable to {} value '{}' as a date",
                self.name,
                value.to_display_string()
            )),
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.child.merge(target, source);
    }
}

/// Arbitrary-duration rounding on millisecond epoch arithmetic:
/// `floorTime(date, 'PT5M')`, `ceilingTime(date, '1h')`, `roundTime`.
///
/// `floor = t - (t mod d)`; `ceiling` advances one duration when the
/// remainder is nonzero; `nearest` advances past the half-duration point.
pub struct RoundTime {
    name: &'static str,
    adjustment: Adjustment,
    params: Vec<Param>,
}

impl RoundTime {
    pub fn new(
        name: &'static str,
        adjustment: Adjustment,
        params: Vec<Param>,
    ) -> BindResult<Self> {
        check_arity(name, 2, 2, &params)?;
        Ok(Self {
            name,
            adjustment,
            params,
        })
    }
}

impl Function for RoundTime {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(RoundTimeGenerator {
            name: self.name,
            adjustment: self.adjustment,
            children: self.params.iter().map(|p| p.create_generator()).collect(),
        })
    }

    fn has_aggregate(&self) -> bool {
        super::super::expr::any_aggregate(&self.params)
    }

    fn requires_child_data(&self) -> bool {
        super::super::expr::any_child_data(&self.params)
    }
}

struct RoundTimeGenerator {
    name: &'static str,
    adjustment: Adjustment,
    children: Vec<Box<dyn Generator>>,
}

fn to_duration_ms(value: &Val) -> Option<i64> {
    match value {
        Val::Duration(ms) => Some(*ms),
        Val::String(s) => datetime::parse_duration(s),
        other if other.is_numeric() => other.to_long(),
        _ => None,
    }
}

impl Generator for RoundTimeGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        set_children(&mut self.children, values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let values = match eval_children(&self.children, storage, child_data) {
            Ok(values) => values,
            Err(error) => return error,
        };
        let Some(t) = to_instant_ms(&values[0]) else {
            return Val::err(format!(
                "Unable to {} value '{}' as a date",
                self.name,
                values[0].to_display_string()
            ));
        };
        let duration = match to_duration_ms(&values[1]) {
            Some(d) if d > 0 => d,
            _ => {
                return Val::err(format!(
                    "Unable to {}: '{}' is not a positive duration",
                    self.name,
                    values[1].to_display_string()
                ))
            }
        };

        let remainder = t.rem_euclid(duration);
        let floor = t - remainder;
        let adjusted = match self.adjustment {
            Adjustment::Floor => floor,
            Adjustment::Ceiling => {
                if remainder != 0 {
                    floor + duration
                } else {
                    t
                }
            }
            Adjustment::Nearest => {
                if remainder * 2 >= duration {
                    floor + duration
                } else {
                    floor
                }
            }
        };
        Val::Date(adjusted)
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        merge_children(&self.children, target, source);
    }
}
