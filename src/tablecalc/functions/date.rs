//! Date parsing, formatting and the query's reference instant.
//!
//! Patterns are chrono format strings. With no pattern, `parseDate` reads
//! ISO-8601 and `formatDate` writes ISO-8601 UTC. An explicit zone argument
//! overrides the context's timezone policy for that one call; both pattern
//! and zone must be statically known.

use super::super::context::{parse_zone_argument, ExpressionContext, ResolvedZone};
use super::super::error::{BindResult, ExprError};
use super::super::expr::{
    check_arity, ChildDataSupplier, Function, Generator, Param, StaticValueFunction, StoredValues,
};
use super::super::values::{datetime, Val};

fn static_text(name: &'static str, param: &Param, what: &str) -> BindResult<String> {
    param
        .static_value()
        .map(Val::to_display_string)
        .ok_or_else(|| ExprError::argument(name, format!("{} must be constant", what)))
}

fn bind_zone(
    name: &'static str,
    param: Option<&Param>,
    ctx: &ExpressionContext,
) -> BindResult<ResolvedZone> {
    match param {
        Some(param) => parse_zone_argument(&static_text(name, param, "time zone")?),
        None => ctx.resolve_zone(),
    }
}

/// `parseDate(text[, pattern[, zone]])`.
pub struct ParseDate {
    value: Param,
    pattern: Option<String>,
    zone: ResolvedZone,
}

impl ParseDate {
    pub fn new(ctx: &ExpressionContext, params: Vec<Param>) -> BindResult<Self> {
        check_arity("parseDate", 1, 3, &params)?;
        let mut params = params;
        let zone = bind_zone("parseDate", params.get(2), ctx)?;
        let pattern = match params.get(1) {
            Some(param) => Some(static_text("parseDate", param, "pattern")?),
            None => None,
        };
        Ok(Self {
            value: params.remove(0),
            pattern,
            zone,
        })
    }
}

impl Function for ParseDate {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(ParseDateGenerator {
            child: self.value.create_generator(),
            pattern: self.pattern.clone(),
            zone: self.zone.clone(),
        })
    }

    fn has_aggregate(&self) -> bool {
        self.value.has_aggregate()
    }

    fn requires_child_data(&self) -> bool {
        self.value.requires_child_data()
    }
}

struct ParseDateGenerator {
    child: Box<dyn Generator>,
    pattern: Option<String>,
    zone: ResolvedZone,
}

impl Generator for ParseDateGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.child.set(values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let value = self.child.eval(storage, child_data);
        if !value.is_value() {
            return value;
        }
        let text = value.to_display_string();
        let parsed = match &self.pattern {
            Some(pattern) => self.zone.parse_with_pattern(&text, pattern),
            None => datetime::parse_iso(&text),
        };
        match parsed {
            Some(ms) => Val::Date(ms),
            None => Val::err(format!("Unable to parse date '{}'", text)),
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.child.merge(target, source);
    }
}

/// `formatDate(date[, pattern[, zone]])`.
pub struct FormatDate {
    value: Param,
    pattern: Option<String>,
    zone: ResolvedZone,
}

impl FormatDate {
    pub fn new(ctx: &ExpressionContext, params: Vec<Param>) -> BindResult<Self> {
        check_arity("formatDate", 1, 3, &params)?;
        let mut params = params;
        let zone = bind_zone("formatDate", params.get(2), ctx)?;
        let pattern = match params.get(1) {
            Some(param) => Some(static_text("formatDate", param, "pattern")?),
            None => None,
        };
        Ok(Self {
            value: params.remove(0),
            pattern,
            zone,
        })
    }
}

impl Function for FormatDate {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(FormatDateGenerator {
            child: self.value.create_generator(),
            pattern: self.pattern.clone(),
            zone: self.zone.clone(),
        })
    }

    fn has_aggregate(&self) -> bool {
        self.value.has_aggregate()
    }

    fn requires_child_data(&self) -> bool {
        self.value.requires_child_data()
    }
}

struct FormatDateGenerator {
    child: Box<dyn Generator>,
    pattern: Option<String>,
    zone: ResolvedZone,
}

impl Generator for FormatDateGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.child.set(values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let value = self.child.eval(storage, child_data);
        if !value.is_value() {
            return value;
        }
        let ms = match &value {
            Val::Date(ms) => Some(*ms),
            Val::String(s) => datetime::parse_iso(s),
            other if other.is_numeric() => other.to_long(),
            _ => None,
        };
        let Some(ms) = ms else {
            return Val::err(format!(
                "Unable to format '{}' as a date",
                value.to_display_string()
            ));
        };
        match &self.pattern {
            Some(pattern) => match self.zone.format_with_pattern(ms, pattern) {
                Some(formatted) => Val::String(formatted),
                None => Val::err(format!("Unable to format date {}", ms)),
            },
            None => Val::String(datetime::format_iso_utc(ms)),
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.child.merge(target, source);
    }
}

/// `currentTime()`: the context's reference instant, fixed for the whole
/// query so every row sees the same "now".
pub fn current_time(ctx: &ExpressionContext, params: Vec<Param>) -> BindResult<StaticValueFunction> {
    check_arity("currentTime", 0, 0, &params)?;
    Ok(StaticValueFunction::new(Val::Date(ctx.reference_time_ms())))
}
