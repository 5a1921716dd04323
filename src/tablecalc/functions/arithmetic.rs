//! Arithmetic operators and the calculator contract they share.
//!
//! A [`Calculator`] wraps one binary numeric operation and owns the error
//! semantics every numeric fold in the engine relies on: errors propagate
//! unchanged, a Null running value absorbs the operand, operands that fail
//! numeric coercion are skipped, and non-finite results (divide by zero,
//! power overflow) are trapped and converted to error values at this
//! boundary. Nothing downstream of a calculator ever sees a NaN or an
//! exception.
//!
//! N-ary operators (`4+4/2+2` style chains and multi-parameter calls) are
//! left-folds of the same calculator across the operands in argument order.

use super::super::expr::{
    any_aggregate, any_child_data, check_arity, eval_children, merge_children, set_children,
    ChildDataSupplier, Function, Generator, Param, StoredValues,
};
use super::super::error::BindResult;
use super::super::values::Val;

/// Functions that take any reasonable number of parameters.
pub const MANY: usize = usize::MAX;

/// One binary numeric operation with the shared error contract.
///
/// `Add` is special-cased: when an operand has no numeric reading the fold
/// degrades to string concatenation (with Null rendering empty), which is
/// what makes `+` serve as both addition and joining in expression text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calculator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl Calculator {
    /// The function name this calculator is registered under.
    pub fn name(&self) -> &'static str {
        match self {
            Calculator::Add => "add",
            Calculator::Subtract => "subtract",
            Calculator::Multiply => "multiply",
            Calculator::Divide => "divide",
            Calculator::Modulo => "modulo",
            Calculator::Power => "power",
        }
    }

    fn op(&self, a: f64, b: f64) -> f64 {
        match self {
            Calculator::Add => a + b,
            Calculator::Subtract => a - b,
            Calculator::Multiply => a * b,
            Calculator::Divide => a / b,
            Calculator::Modulo => a % b,
            Calculator::Power => a.powf(b),
        }
    }

    /// Fold one operand into the running value.
    ///
    /// Total: every input pair produces a value or an error value, never a
    /// panic and never a non-finite number.
    pub fn calc(&self, current: Val, next: Val) -> Val {
        // Error dominance, in evaluation order
        if current.is_err() {
            return current;
        }
        if next.is_err() {
            return next;
        }
        // A Null running value absorbs the operand
        if current.is_null() {
            return next;
        }
        // A Null operand is skipped
        if next.is_null() {
            return current;
        }

        match (current.to_double(), next.to_double()) {
            (Some(a), Some(b)) => self.finish(&current, &next, a, b),
            _ if *self == Calculator::Add => {
                // Non-numeric operand: + degrades to concatenation
                Val::String(format!(
                    "{}{}",
                    current.to_display_string(),
                    next.to_display_string()
                ))
            }
            // The non-coercible side is skipped; if that was the running
            // value the fold restarts from the operand
            (Some(_), None) => current,
            (None, _) => next,
        }
    }

    fn finish(&self, current: &Val, next: &Val, a: f64, b: f64) -> Val {
        let result = self.op(a, b);
        if !result.is_finite() {
            return Val::err(format!(
                "Unable to {} {} and {}: result is not a number",
                self.name(),
                a,
                b
            ));
        }
        // Date and duration arithmetic keeps its temporal typing:
        // date ± duration is a date, date - date is a duration, and
        // durations combine into durations
        match (self, current, next) {
            (Calculator::Add, Val::Date(_), Val::Duration(_))
            | (Calculator::Add, Val::Duration(_), Val::Date(_))
            | (Calculator::Subtract, Val::Date(_), Val::Duration(_)) => Val::Date(result as i64),
            (Calculator::Subtract, Val::Date(_), Val::Date(_))
            | (Calculator::Add, Val::Duration(_), Val::Duration(_))
            | (Calculator::Subtract, Val::Duration(_), Val::Duration(_)) => {
                Val::Duration(result as i64)
            }
            _ => Val::Double(result),
        }
    }
}

/// An n-ary arithmetic function: `divide(x, y, z)` or the bound form of an
/// operator chain. Operands fold left in declared argument order, which is
/// what makes the non-commutative operators well defined.
pub struct Arithmetic {
    calculator: Calculator,
    params: Vec<Param>,
}

impl Arithmetic {
    pub fn new(calculator: Calculator, params: Vec<Param>) -> BindResult<Self> {
        check_arity(calculator.name(), 2, MANY, &params)?;
        Ok(Self { calculator, params })
    }
}

impl Function for Arithmetic {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(ArithmeticGenerator {
            calculator: self.calculator,
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

struct ArithmeticGenerator {
    calculator: Calculator,
    children: Vec<Box<dyn Generator>>,
}

impl Generator for ArithmeticGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        set_children(&mut self.children, values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        match eval_children(&self.children, storage, child_data) {
            Ok(values) => values
                .into_iter()
                .fold(Val::Null, |current, next| self.calculator.calc(current, next)),
            Err(error) => error,
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        merge_children(&self.children, target, source);
    }
}

/// Numeric negation of a single operand.
///
/// Typed variants negate in place; anything else that coerces negates as a
/// double, and values with no numeric reading become an error value.
pub struct Negate {
    param: Param,
}

impl Negate {
    pub fn new(params: Vec<Param>) -> BindResult<Self> {
        let mut params = params;
        check_arity("negate", 1, 1, &params)?;
        Ok(Self {
            param: params.remove(0),
        })
    }
}

impl Function for Negate {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(NegateGenerator {
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

struct NegateGenerator {
    child: Box<dyn Generator>,
}

impl Generator for NegateGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.child.set(values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let value = self.child.eval(storage, child_data);
        match value {
            Val::Null | Val::Err(_) => value,
            Val::Integer(v) => Val::Integer(-v),
            Val::Long(v) => Val::Long(-v),
            Val::Float(v) => Val::Float(-v),
            Val::Double(v) => Val::Double(-v),
            Val::Duration(v) => Val::Duration(-v),
            other => match other.to_double() {
                Some(v) => Val::Double(-v),
                None => Val::err(format!("Unable to negate {}", other.type_name())),
            },
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.child.merge(target, source);
    }
}
