//! Boolean logic and comparison functions.
//!
//! Conditions coerce through [`Val::to_boolean`]; a value with no boolean
//! reading becomes an error value carrying the offending type, never a
//! panic. Comparison functions all route through the one generic comparator
//! so equality, ordering and min/max agree on how mixed types relate, and
//! all honour the expression context's string case-sensitivity.

use std::cmp::Ordering;

use super::arithmetic::MANY;
use super::super::context::ExpressionContext;
use super::super::error::BindResult;
use super::super::expr::{
    any_aggregate, any_child_data, check_arity, eval_children, merge_children, set_children,
    ChildDataSupplier, Function, Generator, Param, StoredValues,
};
use super::super::values::{compare, CaseSensitivity, Val};

fn condition(value: &Val) -> Result<bool, Val> {
    match value.to_boolean() {
        Some(b) => Ok(b),
        None => Err(Val::err(format!(
            "Expecting a condition, found {}",
            value.type_name()
        ))),
    }
}

/// `if(condition, then, otherwise)`: branch on a coerced boolean.
pub struct If {
    params: Vec<Param>,
}

impl If {
    pub fn new(params: Vec<Param>) -> BindResult<Self> {
        check_arity("if", 3, 3, &params)?;
        Ok(Self { params })
    }
}

impl Function for If {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(IfGenerator {
            children: self.params.iter().map(|p| p.create_generator()).collect(),
        })
    }

    fn has_aggregate(&self) -> bool {
        any_aggregate(&self.params)
    }

    fn requires_child_data(&self) -> bool {
        any_child_data(&self.params)
    }
}

struct IfGenerator {
    children: Vec<Box<dyn Generator>>,
}

impl Generator for IfGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        set_children(&mut self.children, values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let cond = self.children[0].eval(storage, child_data);
        if !cond.is_value() {
            return cond;
        }
        match condition(&cond) {
            // Only the selected branch is evaluated
            Ok(true) => self.children[1].eval(storage, child_data),
            Ok(false) => self.children[2].eval(storage, child_data),
            Err(error) => error,
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        merge_children(&self.children, target, source);
    }
}

/// `not(condition)`.
pub struct Not {
    param: Param,
}

impl Not {
    pub fn new(params: Vec<Param>) -> BindResult<Self> {
        let mut params = params;
        check_arity("not", 1, 1, &params)?;
        Ok(Self {
            param: params.remove(0),
        })
    }
}

impl Function for Not {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(NotGenerator {
            child: self.param.create_generator(),
        })
    }

    fn has_aggregate(&self) -> bool {
        self.param.has_aggregate()
    }

    fn requires_child_data(&self) -> bool {
        self.param.requires_child_data()
    }
}

struct NotGenerator {
    child: Box<dyn Generator>,
}

impl Generator for NotGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.child.set(values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let value = self.child.eval(storage, child_data);
        if !value.is_value() {
            return value;
        }
        match condition(&value) {
            Ok(b) => Val::Boolean(!b),
            Err(error) => error,
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.child.merge(target, source);
    }
}

/// N-ary conjunction/disjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Junction {
    And,
    Or,
}

impl Junction {
    pub fn name(&self) -> &'static str {
        match self {
            Junction::And => "and",
            Junction::Or => "or",
        }
    }
}

/// `and(...)` / `or(...)` over two or more conditions.
pub struct Logic {
    junction: Junction,
    params: Vec<Param>,
}

impl Logic {
    pub fn new(junction: Junction, params: Vec<Param>) -> BindResult<Self> {
        check_arity(junction.name(), 2, MANY, &params)?;
        Ok(Self { junction, params })
    }
}

impl Function for Logic {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(LogicGenerator {
            junction: self.junction,
            children: self.params.iter().map(|p| p.create_generator()).collect(),
        })
    }

    fn has_aggregate(&self) -> bool {
        any_aggregate(&self.params)
    }

    fn requires_child_data(&self) -> bool {
        any_child_data(&self.params)
    }
}

struct LogicGenerator {
    junction: Junction,
    children: Vec<Box<dyn Generator>>,
}

impl Generator for LogicGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        set_children(&mut self.children, values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let values = match eval_children(&self.children, storage, child_data) {
            Ok(values) => values,
            Err(error) => return error,
        };
        let mut result = matches!(self.junction, Junction::And);
        for value in &values {
            match condition(value) {
                Ok(b) => match self.junction {
                    Junction::And => result = result && b,
                    Junction::Or => result = result || b,
                },
                Err(error) => return error,
            }
        }
        Val::Boolean(result)
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        merge_children(&self.children, target, source);
    }
}

/// The threshold a comparison function applies to the comparator's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
}

impl ComparisonOp {
    pub fn name(&self) -> &'static str {
        match self {
            ComparisonOp::Equals => "equals",
            ComparisonOp::NotEquals => "notEquals",
            ComparisonOp::GreaterThan => "greaterThan",
            ComparisonOp::GreaterThanOrEqualTo => "greaterThanOrEqualTo",
            ComparisonOp::LessThan => "lessThan",
            ComparisonOp::LessThanOrEqualTo => "lessThanOrEqualTo",
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Equals => ordering == Ordering::Equal,
            ComparisonOp::NotEquals => ordering != Ordering::Equal,
            ComparisonOp::GreaterThan => ordering == Ordering::Greater,
            ComparisonOp::GreaterThanOrEqualTo => ordering != Ordering::Less,
            ComparisonOp::LessThan => ordering == Ordering::Less,
            ComparisonOp::LessThanOrEqualTo => ordering != Ordering::Greater,
        }
    }
}

/// A binary comparison through the generic comparator.
pub struct Comparison {
    op: ComparisonOp,
    case: CaseSensitivity,
    params: Vec<Param>,
}

impl Comparison {
    pub fn new(op: ComparisonOp, ctx: &ExpressionContext, params: Vec<Param>) -> BindResult<Self> {
        check_arity(op.name(), 2, 2, &params)?;
        Ok(Self {
            op,
            case: ctx.case_sensitivity(),
            params,
        })
    }
}

impl Function for Comparison {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(ComparisonGenerator {
            op: self.op,
            case: self.case,
            children: self.params.iter().map(|p| p.create_generator()).collect(),
        })
    }

    fn has_aggregate(&self) -> bool {
        any_aggregate(&self.params)
    }

    fn requires_child_data(&self) -> bool {
        any_child_data(&self.params)
    }
}

struct ComparisonGenerator {
    op: ComparisonOp,
    case: CaseSensitivity,
    children: Vec<Box<dyn Generator>>,
}

impl Generator for ComparisonGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        set_children(&mut self.children, values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        match eval_children(&self.children, storage, child_data) {
            Ok(values) => {
                let ordering = compare(&values[0], &values[1], self.case);
                Val::Boolean(self.op.accepts(ordering))
            }
            Err(error) => error,
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        merge_children(&self.children, target, source);
    }
}

/// The classification a predicate function tests for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateKind {
    /// `isNull(value)` — errors still propagate
    IsNull,
    /// `isError(value)` — necessarily consumes errors instead of
    /// propagating them
    IsError,
}

/// `isNull` / `isError` classification predicates.
pub struct Predicate {
    kind: PredicateKind,
    param: Param,
}

impl Predicate {
    pub fn new(kind: PredicateKind, params: Vec<Param>) -> BindResult<Self> {
        let mut params = params;
        let name = match kind {
            PredicateKind::IsNull => "isNull",
            PredicateKind::IsError => "isError",
        };
        check_arity(name, 1, 1, &params)?;
        Ok(Self {
            kind,
            param: params.remove(0),
        })
    }
}

impl Function for Predicate {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(PredicateGenerator {
            kind: self.kind,
            child: self.param.create_generator(),
        })
    }

    fn has_aggregate(&self) -> bool {
        self.param.has_aggregate()
    }

    fn requires_child_data(&self) -> bool {
        self.param.requires_child_data()
    }
}

struct PredicateGenerator {
    kind: PredicateKind,
    child: Box<dyn Generator>,
}

impl Generator for PredicateGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.child.set(values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let value = self.child.eval(storage, child_data);
        match self.kind {
            PredicateKind::IsNull => {
                if value.is_err() {
                    value
                } else {
                    Val::Boolean(value.is_null())
                }
            }
            PredicateKind::IsError => Val::Boolean(value.is_err()),
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.child.merge(target, source);
    }
}
