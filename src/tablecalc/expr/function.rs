//! Compile-time function-tree nodes.
//!
//! A [`Function`] is built once per query, validates its own arity at
//! construction and is immutable afterwards, which is what makes function
//! trees safe to share across concurrent evaluation passes. Each node knows
//! whether it aggregates, whether it needs group membership data, and how to
//! build its runtime [`Generator`].
//!
//! This module carries the structural nodes: the constant fast path, field
//! references, bracket pass-through and the top-level expression wrapper.
//! The function catalogue itself lives under `functions/`.

use std::sync::Arc;

use super::child_data::ChildDataSupplier;
use super::generator::{Generator, StaticGenerator};
use super::param::Param;
use super::stored::{StateCell, StateRef, StoredValues};
use crate::tablecalc::error::{BindResult, ExprError};
use crate::tablecalc::values::Val;

/// A bound expression node.
///
/// Implementations are stateless after construction (literal substitutions
/// are bound statically) and shareable behind an [`Arc`] across threads.
pub trait Function: Send + Sync {
    /// Build a fresh runtime evaluator for this subtree.
    ///
    /// Called once per concurrent evaluation unit; the returned generator
    /// tree is independent of every other one.
    fn create_generator(&self) -> Box<dyn Generator>;

    /// True when this node is an aggregate operator or any bound child
    /// contains one.
    fn has_aggregate(&self) -> bool;

    /// True when this node (or any child) needs access to the group's
    /// member rows. Consulted by the planner to decide whether per-group
    /// row membership must be materialised at all.
    fn requires_child_data(&self) -> bool;

    /// The constant this node folds to, if it is statically known.
    ///
    /// Lets constant-folding callers skip generator machinery for literal
    /// subtrees.
    fn static_value(&self) -> Option<&Val> {
        None
    }
}

/// Enforce a declared parameter-count range at bind time.
///
/// Out-of-range arity aborts query compilation with a descriptive error; it
/// is never deferred to evaluation.
pub fn check_arity(name: &str, min: usize, max: usize, params: &[Param]) -> BindResult<()> {
    if params.len() < min || params.len() > max {
        Err(ExprError::arity(name, min, max, params.len()))
    } else {
        Ok(())
    }
}

/// The constant fast path: a function that always produces one value.
///
/// Bare literals bound into a child slot become one of these (or a plain
/// [`Param::Value`]); callers that detect `static_value()` can skip
/// generator construction entirely.
#[derive(Debug, Clone)]
pub struct StaticValueFunction {
    value: Val,
}

impl StaticValueFunction {
    pub fn new(value: Val) -> Self {
        Self { value }
    }
}

impl Function for StaticValueFunction {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(StaticGenerator::new(self.value.clone()))
    }

    fn has_aggregate(&self) -> bool {
        false
    }

    fn requires_child_data(&self) -> bool {
        false
    }

    fn static_value(&self) -> Option<&Val> {
        Some(&self.value)
    }
}

/// A field reference: reads one column of the current row by position.
///
/// The column position comes from the query's
/// [`FieldIndex`](super::field_index::FieldIndex); the storage slot is
/// claimed at bind time so the captured value survives into grouped
/// evaluation and merge.
#[derive(Debug, Clone)]
pub struct Ref {
    name: String,
    column: usize,
    slot: StateRef,
}

impl Ref {
    pub fn new(name: impl Into<String>, column: usize, slot: StateRef) -> Self {
        Self {
            name: name.into(),
            column,
            slot,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

impl Function for Ref {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(RefGenerator {
            column: self.column,
            slot: self.slot,
        })
    }

    fn has_aggregate(&self) -> bool {
        false
    }

    fn requires_child_data(&self) -> bool {
        false
    }
}

struct RefGenerator {
    column: usize,
    slot: StateRef,
}

impl Generator for RefGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        let value = values.get(self.column).cloned().unwrap_or(Val::Null);
        storage.set_cell(self.slot, StateCell::Single(value));
    }

    fn eval(&self, storage: &StoredValues, _child_data: Option<&dyn ChildDataSupplier>) -> Val {
        storage.cell(self.slot).single()
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        // First-set wins across partitions; the ordering tie-break belongs
        // to the engine, not to a plain field capture
        if matches!(target.cell(self.slot), StateCell::Empty) {
            target.set_cell(self.slot, source.cell(self.slot).clone());
        }
    }
}

/// Bracketed grouping: a transparent wrapper around one child.
///
/// Exists to preserve evaluation-order metadata from the expression text.
/// Its generator is exactly the child's generator and every capability
/// question delegates unchanged.
pub struct Brackets {
    child: Param,
}

impl Brackets {
    pub fn new(params: Vec<Param>) -> BindResult<Self> {
        check_arity("brackets", 1, 1, &params)?;
        let mut params = params;
        Ok(Self {
            child: params.remove(0),
        })
    }
}

impl Function for Brackets {
    fn create_generator(&self) -> Box<dyn Generator> {
        self.child.create_generator()
    }

    fn has_aggregate(&self) -> bool {
        self.child.has_aggregate()
    }

    fn requires_child_data(&self) -> bool {
        self.child.requires_child_data()
    }

    fn static_value(&self) -> Option<&Val> {
        self.child.static_value()
    }
}

/// The top-level expression wrapper handed back by the bind entry point.
///
/// Transparent like [`Brackets`]; it exists so callers have a concrete
/// anchor for top-level aggregate detection and generator construction.
pub struct Expression {
    child: Param,
}

impl Expression {
    pub fn new(child: Param) -> Self {
        Self { child }
    }

    pub fn create_generator(&self) -> Box<dyn Generator> {
        self.child.create_generator()
    }

    pub fn has_aggregate(&self) -> bool {
        self.child.has_aggregate()
    }

    pub fn requires_child_data(&self) -> bool {
        self.child.requires_child_data()
    }

    /// The constant this whole expression folds to, if statically known.
    pub fn static_value(&self) -> Option<&Val> {
        self.child.static_value()
    }
}

impl From<Expression> for Arc<dyn Function> {
    fn from(expression: Expression) -> Self {
        match expression.child {
            Param::Value(value) => Arc::new(StaticValueFunction::new(value)),
            Param::Function(function) => function,
        }
    }
}
