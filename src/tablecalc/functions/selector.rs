//! Selector functions: aggregates that pick a member row instead of
//! folding an accumulator.
//!
//! A selector evaluates its single value child against one selected member
//! row's storage, chosen from the group's [`ChildData`]. Selectors keep no
//! storage of their own; `set` and `merge` forward to the child so the
//! child's captured state (and its tie-break under merge) is the only state
//! there is. When no child data is available (an ungrouped context) every
//! selector falls back to evaluating the child directly against the current
//! row's storage rather than failing.
//!
//! `any` is the deliberate odd one out: it does not care which member row
//! it reports, so it reads the current row and reports that it does not
//! require child data at all. The planner uses that to skip materialising
//! group membership when nothing else needs it.

use super::super::error::{BindResult, ExprError};
use super::super::expr::{
    check_arity, ChildData, ChildDataSupplier, Function, Generator, Param, StoredValues,
};
use super::super::values::Val;

/// Which member row(s) a selector picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    /// Any member; serviced from the current row without child data
    Any,
    /// The first member in the group's current ordering
    First,
    /// The last member in the group's current ordering
    Last,
    /// The member at a fixed position
    Nth { pos: usize },
    /// Up to `limit` members from the start, joined with a delimiter
    Top { limit: usize },
    /// Up to `limit` members from the end, joined with a delimiter
    Bottom { limit: usize },
}

/// A selector function: `any`, `first`, `last`, `nth`, `top`, `bottom`.
pub struct Selector {
    name: &'static str,
    selection: Selection,
    value: Param,
    delimiter: Option<String>,
}

fn static_usize(name: &'static str, param: &Param, what: &str) -> BindResult<usize> {
    param
        .static_value()
        .and_then(Val::to_integer)
        .filter(|n| *n >= 0)
        .map(|n| n as usize)
        .ok_or_else(|| ExprError::argument(name, format!("invalid {}", what)))
}

fn static_string(name: &'static str, param: &Param, what: &str) -> BindResult<String> {
    param
        .static_value()
        .map(Val::to_display_string)
        .ok_or_else(|| ExprError::argument(name, format!("{} must be constant", what)))
}

impl Selector {
    pub fn any(params: Vec<Param>) -> BindResult<Self> {
        Self::single("any", Selection::Any, params)
    }

    pub fn first(params: Vec<Param>) -> BindResult<Self> {
        Self::single("first", Selection::First, params)
    }

    pub fn last(params: Vec<Param>) -> BindResult<Self> {
        Self::single("last", Selection::Last, params)
    }

    fn single(name: &'static str, selection: Selection, params: Vec<Param>) -> BindResult<Self> {
        let mut params = params;
        check_arity(name, 1, 1, &params)?;
        Ok(Self {
            name,
            selection,
            value: params.remove(0),
            delimiter: None,
        })
    }

    /// `nth(value, pos)` — zero-based position into the group.
    pub fn nth(params: Vec<Param>) -> BindResult<Self> {
        let mut params = params;
        check_arity("nth", 2, 2, &params)?;
        let pos = static_usize("nth", &params[1], "position")?;
        Ok(Self {
            name: "nth",
            selection: Selection::Nth { pos },
            value: params.remove(0),
            delimiter: None,
        })
    }

    /// `top(value, delimiter, limit)` — the first `limit` member values
    /// joined with `delimiter`.
    pub fn top(params: Vec<Param>) -> BindResult<Self> {
        Self::joined("top", params, |limit| Selection::Top { limit })
    }

    /// `bottom(value, delimiter, limit)` — the last `limit` member values
    /// joined with `delimiter`, in group order.
    pub fn bottom(params: Vec<Param>) -> BindResult<Self> {
        Self::joined("bottom", params, |limit| Selection::Bottom { limit })
    }

    fn joined(
        name: &'static str,
        params: Vec<Param>,
        selection: impl FnOnce(usize) -> Selection,
    ) -> BindResult<Self> {
        let mut params = params;
        check_arity(name, 3, 3, &params)?;
        let delimiter = static_string(name, &params[1], "delimiter")?;
        let limit = static_usize(name, &params[2], "limit")?;
        Ok(Self {
            name,
            selection: selection(limit),
            value: params.remove(0),
            delimiter: Some(delimiter),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Function for Selector {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(SelectorGenerator {
            selection: self.selection,
            child: self.value.create_generator(),
            delimiter: self.delimiter.clone().unwrap_or_default(),
        })
    }

    fn has_aggregate(&self) -> bool {
        // A selector is by definition an aggregate operator: it reduces a
        // group to one value even though it folds nothing
        true
    }

    fn requires_child_data(&self) -> bool {
        // `any` is serviced from whatever row state is at hand, so the
        // engine need not materialise membership for it
        !matches!(self.selection, Selection::Any)
    }
}

struct SelectorGenerator {
    selection: Selection,
    child: Box<dyn Generator>,
    delimiter: String,
}

impl SelectorGenerator {
    fn select(&self, data: &dyn ChildData, fallback: &StoredValues) -> Val {
        // Member rows are evaluated through the child generator against
        // that member's storage; a missing member falls back to the
        // current row, never to a failure
        let eval_member = |member: Option<&StoredValues>| match member {
            Some(storage) => self.child.eval(storage, None),
            None => self.child.eval(fallback, None),
        };
        match self.selection {
            Selection::Any => self.child.eval(fallback, None),
            Selection::First => eval_member(data.first()),
            Selection::Last => eval_member(data.last()),
            Selection::Nth { pos } => eval_member(data.nth(pos)),
            Selection::Top { limit } => self.join(data.top(limit), fallback),
            Selection::Bottom { limit } => self.join(data.bottom(limit), fallback),
        }
    }

    fn join(&self, members: Vec<&StoredValues>, fallback: &StoredValues) -> Val {
        if members.is_empty() {
            return self.child.eval(fallback, None);
        }
        let mut rendered = Vec::with_capacity(members.len());
        for member in members {
            let value = self.child.eval(member, None);
            if value.is_err() {
                return value;
            }
            rendered.push(value.to_display_string());
        }
        Val::String(rendered.join(&self.delimiter))
    }
}

impl Generator for SelectorGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.child.set(values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        match child_data.and_then(|supplier| supplier.child_data()) {
            Some(data) => self.select(data, storage),
            // Not a grouped context: service the selector from the current
            // row directly
            None => self.child.eval(storage, None),
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.child.merge(target, source);
    }
}
