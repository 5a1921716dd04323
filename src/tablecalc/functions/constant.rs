//! The literal-producing functions: `true()`, `false()`, `null()`, `err()`.
//!
//! Each is just the constant fast path with an arity check; `err()` exists
//! so expressions (and tests) can introduce an error value deliberately.

use super::super::error::BindResult;
use super::super::expr::{check_arity, Param, StaticValueFunction};
use super::super::values::Val;

pub fn true_fn(params: Vec<Param>) -> BindResult<StaticValueFunction> {
    check_arity("true", 0, 0, &params)?;
    Ok(StaticValueFunction::new(Val::Boolean(true)))
}

pub fn false_fn(params: Vec<Param>) -> BindResult<StaticValueFunction> {
    check_arity("false", 0, 0, &params)?;
    Ok(StaticValueFunction::new(Val::Boolean(false)))
}

pub fn null_fn(params: Vec<Param>) -> BindResult<StaticValueFunction> {
    check_arity("null", 0, 0, &params)?;
    Ok(StaticValueFunction::new(Val::Null))
}

pub fn err_fn(params: Vec<Param>) -> BindResult<StaticValueFunction> {
    check_arity("err", 0, 0, &params)?;
    Ok(StaticValueFunction::new(Val::err("err")))
}
