//! Bindable tree-node parameters.
//!
//! A [`Param`] is what a function's child slot holds after binding: either a
//! nested function subtree or a literal value. Literals are evaluable like
//! any other child (their generator is a [`StaticGenerator`]), so composite
//! code never branches on which kind it got.

use std::sync::Arc;

use super::function::Function;
use super::generator::{Generator, StaticGenerator};
use crate::tablecalc::values::Val;

/// A bound child of a function node: a subtree or a literal.
///
/// Parameter lists are positional and immutable once bound; cloning a param
/// shares the underlying function tree.
#[derive(Clone)]
pub enum Param {
    /// A literal value, evaluated as a constant
    Value(Val),
    /// A nested function subtree
    Function(Arc<dyn Function>),
}

impl Param {
    /// True when this subtree contains an aggregate operator anywhere.
    pub fn has_aggregate(&self) -> bool {
        match self {
            Param::Value(_) => false,
            Param::Function(function) => function.has_aggregate(),
        }
    }

    /// True when this subtree needs group membership data anywhere.
    pub fn requires_child_data(&self) -> bool {
        match self {
            Param::Value(_) => false,
            Param::Function(function) => function.requires_child_data(),
        }
    }

    /// Build the runtime evaluator for this child.
    pub fn create_generator(&self) -> Box<dyn Generator> {
        match self {
            Param::Value(value) => Box::new(StaticGenerator::new(value.clone())),
            Param::Function(function) => function.create_generator(),
        }
    }

    /// The literal this param holds, if it is a constant.
    ///
    /// Used by functions whose arguments must be statically known (regex
    /// patterns, precisions, delimiters) and by constant-folding callers.
    pub fn static_value(&self) -> Option<&Val> {
        match self {
            Param::Value(value) => Some(value),
            Param::Function(function) => function.static_value(),
        }
    }
}

impl std::fmt::Debug for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Param::Value(value) => write!(f, "Param::Value({:?})", value),
            Param::Function(_) => write!(f, "Param::Function(..)"),
        }
    }
}

/// True when any param in the slice contains an aggregate.
pub fn any_aggregate(params: &[Param]) -> bool {
    params.iter().any(|p| p.has_aggregate())
}

/// True when any param in the slice needs child data.
pub fn any_child_data(params: &[Param]) -> bool {
    params.iter().any(|p| p.requires_child_data())
}
