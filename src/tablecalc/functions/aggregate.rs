//! Folding aggregate functions.
//!
//! These maintain a running accumulator in storage: `set` folds the current
//! row's child value in, `merge` folds one accumulator into another with the
//! same operator (so the operator must be associative and commutative), and
//! `eval` reads the accumulator out. None of them need group membership
//! data; that is what separates them from the selectors and lets the
//! planner skip materialising per-group rows when only folds are present.
//!
//! Following the original behaviour, the statistics-shaped functions (sum,
//! min, max, average, variance, stDev) are dual-mode: with a single
//! parameter they aggregate across rows, with several parameters they
//! compute across the parameters of the current row as plain scalars.

use std::collections::HashSet;

use super::arithmetic::{Calculator, MANY};
use super::super::context::ExpressionContext;
use super::super::error::{BindResult, ExprError};
use super::super::expr::{
    any_aggregate, any_child_data, check_arity, eval_children, merge_children, set_children,
    ChildDataSupplier, Function, Generator, Param, StateCell, StateIndex, StateRef, StoredValues,
};
use super::super::values::{compare, CaseSensitivity, Val};

/// The fold a [`FoldFunction`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldKind {
    Sum,
    Min,
    Max,
}

impl FoldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FoldKind::Sum => "sum",
            FoldKind::Min => "min",
            FoldKind::Max => "max",
        }
    }

    /// Fold one value into the running value. Associative and commutative
    /// over the values it accepts, which is what licenses `merge`.
    fn fold(&self, case: CaseSensitivity, current: Val, next: Val) -> Val {
        match self {
            FoldKind::Sum => Calculator::Add.calc(current, next),
            FoldKind::Min | FoldKind::Max => {
                if current.is_err() {
                    return current;
                }
                if next.is_err() {
                    return next;
                }
                if current.is_null() {
                    return next;
                }
                if next.is_null() {
                    return current;
                }
                let keep_next = match self {
                    FoldKind::Min => compare(&next, &current, case).is_lt(),
                    _ => compare(&next, &current, case).is_gt(),
                };
                if keep_next {
                    next
                } else {
                    current
                }
            }
        }
    }
}

/// `sum`, `min`, `max`: a running-value fold.
pub struct FoldFunction {
    kind: FoldKind,
    case: CaseSensitivity,
    params: Vec<Param>,
    /// Claimed only in single-parameter (aggregating) mode
    slot: Option<StateRef>,
}

impl FoldFunction {
    pub fn new(
        kind: FoldKind,
        ctx: &ExpressionContext,
        params: Vec<Param>,
        state: &mut StateIndex,
    ) -> BindResult<Self> {
        check_arity(kind.name(), 1, MANY, &params)?;
        let slot = (params.len() == 1).then(|| state.next());
        Ok(Self {
            kind,
            case: ctx.case_sensitivity(),
            params,
            slot,
        })
    }
}

impl Function for FoldFunction {
    fn create_generator(&self) -> Box<dyn Generator> {
        match self.slot {
            Some(slot) => Box::new(FoldAggregateGenerator {
                kind: self.kind,
                case: self.case,
                child: self.params[0].create_generator(),
                slot,
            }),
            None => Box::new(FoldScalarGenerator {
                kind: self.kind,
                case: self.case,
                children: self.params.iter().map(|p| p.create_generator()).collect(),
            }),
        }
    }

    fn has_aggregate(&self) -> bool {
        self.slot.is_some() || any_aggregate(&self.params)
    }

    fn requires_child_data(&self) -> bool {
        any_child_data(&self.params)
    }
}

struct FoldAggregateGenerator {
    kind: FoldKind,
    case: CaseSensitivity,
    child: Box<dyn Generator>,
    slot: StateRef,
}

impl Generator for FoldAggregateGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.child.set(values, storage);
        let next = self.child.eval(storage, None);
        let current = storage.cell(self.slot).single();
        let folded = self.kind.fold(self.case, current, next);
        storage.set_cell(self.slot, StateCell::Single(folded));
    }

    fn eval(&self, storage: &StoredValues, _child_data: Option<&dyn ChildDataSupplier>) -> Val {
        storage.cell(self.slot).single()
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.child.merge(target, source);
        let current = target.cell(self.slot).single();
        let other = source.cell(self.slot).single();
        let folded = self.kind.fold(self.case, current, other);
        target.set_cell(self.slot, StateCell::Single(folded));
    }
}

struct FoldScalarGenerator {
    kind: FoldKind,
    case: CaseSensitivity,
    children: Vec<Box<dyn Generator>>,
}

impl Generator for FoldScalarGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        set_children(&mut self.children, values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        match eval_children(&self.children, storage, child_data) {
            Ok(values) => values
                .into_iter()
                .fold(Val::Null, |current, next| self.kind.fold(self.case, current, next)),
            Err(error) => error,
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        merge_children(&self.children, target, source);
    }
}

/// `count()`: the number of rows folded into the group.
pub struct Count {
    slot: StateRef,
}

impl Count {
    pub fn new(params: Vec<Param>, state: &mut StateIndex) -> BindResult<Self> {
        check_arity("count", 0, 0, &params)?;
        Ok(Self { slot: state.next() })
    }
}

impl Function for Count {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(CountGenerator { slot: self.slot })
    }

    fn has_aggregate(&self) -> bool {
        true
    }

    fn requires_child_data(&self) -> bool {
        false
    }
}

struct CountGenerator {
    slot: StateRef,
}

impl CountGenerator {
    fn current(&self, storage: &StoredValues) -> u64 {
        match storage.cell(self.slot) {
            StateCell::Count(n) => *n,
            _ => 0,
        }
    }
}

impl Generator for CountGenerator {
    fn set(&mut self, _values: &[Val], storage: &mut StoredValues) {
        let n = self.current(storage) + 1;
        storage.set_cell(self.slot, StateCell::Count(n));
    }

    fn eval(&self, storage: &StoredValues, _child_data: Option<&dyn ChildDataSupplier>) -> Val {
        Val::Long(self.current(storage) as i64)
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        let n = self.current(target) + self.current(source);
        target.set_cell(self.slot, StateCell::Count(n));
    }
}

/// `countGroups()`: the number of member rows in the current group, read
/// from child data. Null outside a grouped context.
pub struct CountGroups;

impl CountGroups {
    pub fn new(params: Vec<Param>) -> BindResult<Self> {
        check_arity("countGroups", 0, 0, &params)?;
        Ok(Self)
    }
}

impl Function for CountGroups {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(CountGroupsGenerator)
    }

    fn has_aggregate(&self) -> bool {
        true
    }

    fn requires_child_data(&self) -> bool {
        true
    }
}

struct CountGroupsGenerator;

impl Generator for CountGroupsGenerator {
    fn set(&mut self, _values: &[Val], _storage: &mut StoredValues) {}

    fn eval(&self, _storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        match child_data.and_then(|supplier| supplier.child_data()) {
            Some(data) => Val::Long(data.count() as i64),
            None => Val::Null,
        }
    }

    fn merge(&self, _target: &mut StoredValues, _source: &StoredValues) {}
}

/// `countUnique(value)`: the number of distinct rendered values seen.
pub struct CountUnique {
    param: Param,
    slot: StateRef,
}

impl CountUnique {
    pub fn new(params: Vec<Param>, state: &mut StateIndex) -> BindResult<Self> {
        let mut params = params;
        check_arity("countUnique", 1, 1, &params)?;
        Ok(Self {
            param: params.remove(0),
            slot: state.next(),
        })
    }
}

impl Function for CountUnique {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(CountUniqueGenerator {
            child: self.param.create_generator(),
            slot: self.slot,
        })
    }

    fn has_aggregate(&self) -> bool {
        true
    }

    fn requires_child_data(&self) -> bool {
        false
    }
}

struct CountUniqueGenerator {
    child: Box<dyn Generator>,
    slot: StateRef,
}

impl Generator for CountUniqueGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.child.set(values, storage);
        let value = self.child.eval(storage, None);
        if !value.is_value() {
            return;
        }
        let rendered = value.to_display_string();
        match storage.cell_mut(self.slot) {
            StateCell::Distinct(seen) => {
                seen.insert(rendered);
            }
            cell => {
                let mut seen = HashSet::new();
                seen.insert(rendered);
                *cell = StateCell::Distinct(seen);
            }
        }
    }

    fn eval(&self, storage: &StoredValues, _child_data: Option<&dyn ChildDataSupplier>) -> Val {
        match storage.cell(self.slot) {
            StateCell::Distinct(seen) => Val::Integer(seen.len() as i32),
            _ => Val::Integer(0),
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.child.merge(target, source);
        let StateCell::Distinct(other) = source.cell(self.slot) else {
            return;
        };
        match target.cell_mut(self.slot) {
            StateCell::Distinct(seen) => {
                seen.extend(other.iter().cloned());
            }
            cell => *cell = StateCell::Distinct(other.clone()),
        }
    }
}

/// `joining(value[, delimiter[, limit]])`: collected values rendered in
/// arrival order. Merge appends source after target, preserving the
/// partition order the engine established.
pub struct Joining {
    param: Param,
    delimiter: String,
    limit: usize,
    slot: StateRef,
}

impl Joining {
    pub fn new(params: Vec<Param>, state: &mut StateIndex) -> BindResult<Self> {
        check_arity("joining", 1, 3, &params)?;
        let mut params = params;
        let delimiter = match params.get(1) {
            Some(param) => param
                .static_value()
                .map(|v| v.to_display_string())
                .ok_or_else(|| ExprError::argument("joining", "delimiter must be constant"))?,
            None => String::new(),
        };
        let limit = match params.get(2) {
            Some(param) => param
                .static_value()
                .and_then(Val::to_integer)
                .filter(|n| *n >= 0)
                .map(|n| n as usize)
                .ok_or_else(|| ExprError::argument("joining", "invalid limit"))?,
            None => usize::MAX,
        };
        Ok(Self {
            param: params.remove(0),
            delimiter,
            limit,
            slot: state.next(),
        })
    }
}

impl Function for Joining {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(JoiningGenerator {
            child: self.param.create_generator(),
            delimiter: self.delimiter.clone(),
            limit: self.limit,
            slot: self.slot,
        })
    }

    fn has_aggregate(&self) -> bool {
        true
    }

    fn requires_child_data(&self) -> bool {
        false
    }
}

struct JoiningGenerator {
    child: Box<dyn Generator>,
    delimiter: String,
    limit: usize,
    slot: StateRef,
}

impl Generator for JoiningGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.child.set(values, storage);
        let value = self.child.eval(storage, None);
        if !value.is_value() {
            return;
        }
        match storage.cell_mut(self.slot) {
            StateCell::Sequence(seq) => {
                if seq.len() < self.limit {
                    seq.push(value);
                }
            }
            cell => *cell = StateCell::Sequence(vec![value]),
        }
    }

    fn eval(&self, storage: &StoredValues, _child_data: Option<&dyn ChildDataSupplier>) -> Val {
        match storage.cell(self.slot) {
            StateCell::Sequence(seq) => Val::String(
                seq.iter()
                    .map(Val::to_display_string)
                    .collect::<Vec<_>>()
                    .join(&self.delimiter),
            ),
            _ => Val::String(String::new()),
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.child.merge(target, source);
        let StateCell::Sequence(other) = source.cell(self.slot) else {
            return;
        };
        match target.cell_mut(self.slot) {
            StateCell::Sequence(seq) => {
                for value in other {
                    if seq.len() >= self.limit {
                        break;
                    }
                    seq.push(value.clone());
                }
            }
            cell => *cell = StateCell::Sequence(other.clone()),
        }
    }
}

/// Which statistic a [`Statistic`] function reports from its accumulated
/// sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticKind {
    Average,
    Variance,
    StandardDeviation,
}

impl StatisticKind {
    pub fn name(&self) -> &'static str {
        match self {
            StatisticKind::Average => "average",
            StatisticKind::Variance => "variance",
            StatisticKind::StandardDeviation => "stDev",
        }
    }

    fn finish(&self, count: u64, mean: f64, m2: f64) -> Val {
        if count == 0 {
            return Val::Null;
        }
        match self {
            StatisticKind::Average => Val::Double(mean),
            StatisticKind::Variance => Val::Double(m2 / count as f64),
            StatisticKind::StandardDeviation => Val::Double((m2 / count as f64).sqrt()),
        }
    }
}

/// `average`, `variance`, `stDev`: streamed through Welford's online
/// algorithm so the accumulator is O(1) and two partial accumulators
/// combine exactly.
pub struct Statistic {
    kind: StatisticKind,
    params: Vec<Param>,
    slot: Option<StateRef>,
}

impl Statistic {
    pub fn new(
        kind: StatisticKind,
        params: Vec<Param>,
        state: &mut StateIndex,
    ) -> BindResult<Self> {
        check_arity(kind.name(), 1, MANY, &params)?;
        let slot = (params.len() == 1).then(|| state.next());
        Ok(Self { kind, params, slot })
    }
}

impl Function for Statistic {
    fn create_generator(&self) -> Box<dyn Generator> {
        match self.slot {
            Some(slot) => Box::new(StatisticAggregateGenerator {
                kind: self.kind,
                child: self.params[0].create_generator(),
                slot,
            }),
            None => Box::new(StatisticScalarGenerator {
                kind: self.kind,
                children: self.params.iter().map(|p| p.create_generator()).collect(),
            }),
        }
    }

    fn has_aggregate(&self) -> bool {
        self.slot.is_some() || any_aggregate(&self.params)
    }

    fn requires_child_data(&self) -> bool {
        any_child_data(&self.params)
    }
}

fn welford_update(count: &mut u64, mean: &mut f64, m2: &mut f64, x: f64) {
    *count += 1;
    let delta = x - *mean;
    *mean += delta / *count as f64;
    *m2 += delta * (x - *mean);
}

struct StatisticAggregateGenerator {
    kind: StatisticKind,
    child: Box<dyn Generator>,
    slot: StateRef,
}

impl Generator for StatisticAggregateGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.child.set(values, storage);
        let value = self.child.eval(storage, None);
        // A child error poisons the accumulator; it will be reported by eval
        if value.is_err() {
            storage.set_cell(self.slot, StateCell::Single(value));
            return;
        }
        if matches!(storage.cell(self.slot), StateCell::Single(_)) {
            return;
        }
        let Some(x) = value.to_double() else {
            // Null and non-numeric inputs are skipped, not folded
            return;
        };
        match storage.cell_mut(self.slot) {
            StateCell::Welford { count, mean, m2 } => welford_update(count, mean, m2, x),
            cell => {
                let (mut count, mut mean, mut m2) = (0u64, 0f64, 0f64);
                welford_update(&mut count, &mut mean, &mut m2, x);
                *cell = StateCell::Welford { count, mean, m2 };
            }
        }
    }

    fn eval(&self, storage: &StoredValues, _child_data: Option<&dyn ChildDataSupplier>) -> Val {
        match storage.cell(self.slot) {
            StateCell::Welford { count, mean, m2 } => self.kind.finish(*count, *mean, *m2),
            StateCell::Single(error) => error.clone(),
            _ => Val::Null,
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.child.merge(target, source);
        match (target.cell(self.slot).clone(), source.cell(self.slot)) {
            (StateCell::Single(_), _) => {}
            (_, StateCell::Single(error)) => {
                target.set_cell(self.slot, StateCell::Single(error.clone()));
            }
            (
                StateCell::Welford { count, mean, m2 },
                StateCell::Welford {
                    count: count_b,
                    mean: mean_b,
                    m2: m2_b,
                },
            ) => {
                // Chan et al. parallel combination of two Welford states
                let total = count + count_b;
                let delta = mean_b - mean;
                let merged_mean = mean + delta * (*count_b as f64) / total as f64;
                let merged_m2 = m2
                    + m2_b
                    + delta * delta * (count as f64) * (*count_b as f64) / total as f64;
                target.set_cell(
                    self.slot,
                    StateCell::Welford {
                        count: total,
                        mean: merged_mean,
                        m2: merged_m2,
                    },
                );
            }
            (_, other) => target.set_cell(self.slot, other.clone()),
        }
    }
}

struct StatisticScalarGenerator {
    kind: StatisticKind,
    children: Vec<Box<dyn Generator>>,
}

impl Generator for StatisticScalarGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        set_children(&mut self.children, values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let values = match eval_children(&self.children, storage, child_data) {
            Ok(values) => values,
            Err(error) => return error,
        };
        let (mut count, mut mean, mut m2) = (0u64, 0f64, 0f64);
        for value in &values {
            if let Some(x) = value.to_double() {
                welford_update(&mut count, &mut mean, &mut m2, x);
            }
        }
        self.kind.finish(count, mean, m2)
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        merge_children(&self.children, target, source);
    }
}
