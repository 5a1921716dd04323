//! The function catalogue and its factory.
//!
//! [`create`] is the single construction point for named functions: the
//! upstream grammar hands over a function name and its already-bound
//! parameters, and gets back an arity-checked node of the function tree.
//! Operator spellings (`+`, `=`, `>=`, ...) resolve to the same functions
//! as their written names, mirroring how the expression text treats them
//! interchangeably.

pub mod aggregate;
pub mod arithmetic;
pub mod cast;
pub mod constant;
pub mod date;
pub mod link;
pub mod logic;
pub mod rounding;
pub mod selector;
pub mod string;

use std::sync::Arc;

use super::context::ExpressionContext;
use super::error::{BindResult, ExprError};
use super::expr::{Function, Param, StateIndex};

use aggregate::{Count, CountGroups, CountUnique, FoldFunction, FoldKind, Joining, Statistic, StatisticKind};
use arithmetic::{Arithmetic, Calculator, Negate};
use cast::{Cast, CastKind, TypeOf};
use date::{current_time, FormatDate, ParseDate};
use link::{LinkFunction, LinkKind};
use logic::{Comparison, ComparisonOp, If, Junction, Logic, Not, Predicate, PredicateKind};
use rounding::{Adjustment, RoundDate, RoundNumeric, RoundTime, TimeUnit};
use selector::Selector;
use string::{Concat, IndexOf, Match, Replace, Substring, Text, TextOp};

/// Resolve a date-rounding function name to its unit and adjustment.
fn date_rounding(name: &str) -> Option<(&'static str, TimeUnit, Adjustment)> {
    use Adjustment::{Ceiling, Floor, Nearest};
    use TimeUnit::{Day, Hour, Minute, Month, Second, Week, Year};
    Some(match name {
        "floorSecond" => ("floorSecond", Second, Floor),
        "floorMinute" => ("floorMinute", Minute, Floor),
        "floorHour" => ("floorHour", Hour, Floor),
        "floorDay" => ("floorDay", Day, Floor),
        "floorWeek" => ("floorWeek", Week, Floor),
        "floorMonth" => ("floorMonth", Month, Floor),
        "floorYear" => ("floorYear", Year, Floor),
        "ceilingSecond" => ("ceilingSecond", Second, Ceiling),
        "ceilingMinute" => ("ceilingMinute", Minute, Ceiling),
        "ceilingHour" => ("ceilingHour", Hour, Ceiling),
        "ceilingDay" => ("ceilingDay", Day, Ceiling),
        "ceilingWeek" => ("ceilingWeek", Week, Ceiling),
        "ceilingMonth" => ("ceilingMonth", Month, Ceiling),
        "ceilingYear" => ("ceilingYear", Year, Ceiling),
        "roundSecond" => ("roundSecond", Second, Nearest),
        "roundMinute" => ("roundMinute", Minute, Nearest),
        "roundHour" => ("roundHour", Hour, Nearest),
        "roundDay" => ("roundDay", Day, Nearest),
        "roundWeek" => ("roundWeek", Week, Nearest),
        "roundMonth" => ("roundMonth", Month, Nearest),
        "roundYear" => ("roundYear", Year, Nearest),
        _ => return None,
    })
}

/// Build a named function over bound parameters.
///
/// Fails with [`ExprError::UnknownFunction`] for an unrecognised name and
/// with the function's own bind-time errors for arity or argument problems.
pub fn create(
    ctx: &ExpressionContext,
    name: &str,
    params: Vec<Param>,
    state: &mut StateIndex,
) -> BindResult<Arc<dyn Function>> {
    log::trace!("create() - {}", name);

    if let Some((family_name, unit, adjustment)) = date_rounding(name) {
        return Ok(Arc::new(RoundDate::new(
            family_name,
            unit,
            adjustment,
            ctx,
            params,
        )?));
    }

    let function: Arc<dyn Function> = match name {
        // Arithmetic
        "+" | "add" => Arc::new(Arithmetic::new(Calculator::Add, params)?),
        "-" | "subtract" => Arc::new(Arithmetic::new(Calculator::Subtract, params)?),
        "*" | "multiply" => Arc::new(Arithmetic::new(Calculator::Multiply, params)?),
        "/" | "divide" => Arc::new(Arithmetic::new(Calculator::Divide, params)?),
        "%" | "modulo" => Arc::new(Arithmetic::new(Calculator::Modulo, params)?),
        "^" | "power" => Arc::new(Arithmetic::new(Calculator::Power, params)?),
        "negate" => Arc::new(Negate::new(params)?),

        // Numeric rounding
        "floor" => Arc::new(RoundNumeric::new("floor", Adjustment::Floor, params)?),
        "ceiling" => Arc::new(RoundNumeric::new("ceiling", Adjustment::Ceiling, params)?),
        "round" => Arc::new(RoundNumeric::new("round", Adjustment::Nearest, params)?),

        // Duration rounding
        "floorTime" => Arc::new(RoundTime::new("floorTime", Adjustment::Floor, params)?),
        "ceilingTime" => Arc::new(RoundTime::new("ceilingTime", Adjustment::Ceiling, params)?),
        "roundTime" => Arc::new(RoundTime::new("roundTime", Adjustment::Nearest, params)?),

        // Comparison
        "=" | "equals" => Arc::new(Comparison::new(ComparisonOp::Equals, ctx, params)?),
        "!=" | "notEquals" => Arc::new(Comparison::new(ComparisonOp::NotEquals, ctx, params)?),
        ">" | "greaterThan" => Arc::new(Comparison::new(ComparisonOp::GreaterThan, ctx, params)?),
        ">=" | "greaterThanOrEqualTo" => Arc::new(Comparison::new(
            ComparisonOp::GreaterThanOrEqualTo,
            ctx,
            params,
        )?),
        "<" | "lessThan" => Arc::new(Comparison::new(ComparisonOp::LessThan, ctx, params)?),
        "<=" | "lessThanOrEqualTo" => Arc::new(Comparison::new(
            ComparisonOp::LessThanOrEqualTo,
            ctx,
            params,
        )?),

        // Logic
        "if" => Arc::new(If::new(params)?),
        "not" => Arc::new(Not::new(params)?),
        "and" => Arc::new(Logic::new(Junction::And, params)?),
        "or" => Arc::new(Logic::new(Junction::Or, params)?),
        "isNull" => Arc::new(Predicate::new(PredicateKind::IsNull, params)?),
        "isError" => Arc::new(Predicate::new(PredicateKind::IsError, params)?),

        // Casts
        "toBoolean" => Arc::new(Cast::new(CastKind::Boolean, params)?),
        "toInteger" => Arc::new(Cast::new(CastKind::Integer, params)?),
        "toLong" => Arc::new(Cast::new(CastKind::Long, params)?),
        "toFloat" => Arc::new(Cast::new(CastKind::Float, params)?),
        "toDouble" => Arc::new(Cast::new(CastKind::Double, params)?),
        "toString" => Arc::new(Cast::new(CastKind::String, params)?),
        "typeOf" => Arc::new(TypeOf::new(params)?),

        // Strings
        "concat" => Arc::new(Concat::new(params)?),
        "upperCase" => Arc::new(Text::new(TextOp::UpperCase, params)?),
        "lowerCase" => Arc::new(Text::new(TextOp::LowerCase, params)?),
        "stringLength" => Arc::new(Text::new(TextOp::Length, params)?),
        "encodeUrl" => Arc::new(Text::new(TextOp::EncodeUrl, params)?),
        "decodeUrl" => Arc::new(Text::new(TextOp::DecodeUrl, params)?),
        "substring" => Arc::new(Substring::new(params)?),
        "indexOf" => Arc::new(IndexOf::new(params)?),
        "replace" => Arc::new(Replace::new(params)?),
        "match" => Arc::new(Match::new(params)?),

        // Constants
        "true" => Arc::new(constant::true_fn(params)?),
        "false" => Arc::new(constant::false_fn(params)?),
        "null" => Arc::new(constant::null_fn(params)?),
        "err" => Arc::new(constant::err_fn(params)?),

        // Dates
        "parseDate" => Arc::new(ParseDate::new(ctx, params)?),
        "formatDate" => Arc::new(FormatDate::new(ctx, params)?),
        "currentTime" => Arc::new(current_time(ctx, params)?),

        // Links
        "link" => Arc::new(LinkFunction::new(LinkKind::Link, params)?),
        "dashboard" => Arc::new(LinkFunction::new(LinkKind::Dashboard, params)?),

        // Folding aggregates
        "sum" => Arc::new(FoldFunction::new(FoldKind::Sum, ctx, params, state)?),
        "min" => Arc::new(FoldFunction::new(FoldKind::Min, ctx, params, state)?),
        "max" => Arc::new(FoldFunction::new(FoldKind::Max, ctx, params, state)?),
        "average" | "mean" => Arc::new(Statistic::new(StatisticKind::Average, params, state)?),
        "variance" => Arc::new(Statistic::new(StatisticKind::Variance, params, state)?),
        "stDev" => Arc::new(Statistic::new(StatisticKind::StandardDeviation, params, state)?),
        "count" => Arc::new(Count::new(params, state)?),
        "countGroups" => Arc::new(CountGroups::new(params)?),
        "countUnique" => Arc::new(CountUnique::new(params, state)?),
        "joining" => Arc::new(Joining::new(params, state)?),

        // Selectors
        "any" => Arc::new(Selector::any(params)?),
        "first" => Arc::new(Selector::first(params)?),
        "last" => Arc::new(Selector::last(params)?),
        "nth" => Arc::new(Selector::nth(params)?),
        "top" => Arc::new(Selector::top(params)?),
        "bottom" => Arc::new(Selector::bottom(params)?),

        _ => return Err(ExprError::unknown_function(name)),
    };
    Ok(function)
}
