//! The runtime evaluation protocol.
//!
//! A [`Generator`] is the runtime mirror of one function-tree node. The
//! engine drives each generator tree with the same three calls everywhere:
//! `set` once per input row, `eval` whenever a value is wanted, and `merge`
//! when two independently accumulated partial states must be combined.
//! Because all accumulated state lives in [`StoredValues`] rather than on
//! the generator, `eval` is idempotent for unchanged storage and `merge`
//! composes arbitrarily across partitions.

use super::child_data::ChildDataSupplier;
use super::stored::StoredValues;
use crate::tablecalc::values::Val;

/// Runtime evaluator for one function node.
///
/// A generator tree serves exactly one concurrent evaluation unit; it is
/// `Send` so the engine can move it onto a worker, but it is never shared
/// between rows or groups being processed at the same time.
pub trait Generator: Send {
    /// Fold one input row into held state.
    ///
    /// Leaf field readers extract their column from `values`; composite
    /// nodes forward the call to all children. Must be called once per row
    /// before any `eval` that depends on that row.
    fn set(&mut self, values: &[Val], storage: &mut StoredValues);

    /// Produce the node's current value.
    ///
    /// May be called repeatedly and must be idempotent for unchanged
    /// storage. `child_data` carries lazy access to the group's member rows
    /// and is only consulted by selector functions.
    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val;

    /// Combine the partial state in `source` into `target`.
    ///
    /// Both storages were accumulated through this same generator tree on
    /// disjoint row sets. True aggregates must merge order-independently;
    /// order-sensitive selectors preserve their defined tie-break.
    fn merge(&self, target: &mut StoredValues, source: &StoredValues);
}

/// Forward `set` to every child in declared order.
pub fn set_children(
    children: &mut [Box<dyn Generator>],
    values: &[Val],
    storage: &mut StoredValues,
) {
    for child in children.iter_mut() {
        child.set(values, storage);
    }
}

/// Forward `merge` to every child in declared order.
pub fn merge_children(
    children: &[Box<dyn Generator>],
    target: &mut StoredValues,
    source: &StoredValues,
) {
    for child in children {
        child.merge(target, source);
    }
}

/// Evaluate every child in declared argument order, stopping at the first
/// error value.
///
/// This is the uniform error-propagation rule for composite generators:
/// the returned `Err` carries the child's error `Val` unchanged and later
/// children are not evaluated.
pub fn eval_children(
    children: &[Box<dyn Generator>],
    storage: &StoredValues,
    child_data: Option<&dyn ChildDataSupplier>,
) -> Result<Vec<Val>, Val> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        let val = child.eval(storage, child_data);
        if val.is_err() {
            return Err(val);
        }
        out.push(val);
    }
    Ok(out)
}

/// Generator for a constant: ignores rows and storage entirely.
#[derive(Debug, Clone)]
pub struct StaticGenerator {
    value: Val,
}

impl StaticGenerator {
    pub fn new(value: Val) -> Self {
        Self { value }
    }
}

impl Generator for StaticGenerator {
    fn set(&mut self, _values: &[Val], _storage: &mut StoredValues) {}

    fn eval(&self, _storage: &StoredValues, _child_data: Option<&dyn ChildDataSupplier>) -> Val {
        self.value.clone()
    }

    fn merge(&self, _target: &mut StoredValues, _source: &StoredValues) {}
}
