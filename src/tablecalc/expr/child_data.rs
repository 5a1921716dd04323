//! Group membership views for selector functions.
//!
//! When the surrounding engine groups rows, a selector function (first,
//! last, nth, top, bottom) needs to see the storage of the member rows that
//! make up the group. [`ChildData`] is that read-only view. It is expensive
//! to materialise, so the engine never hands it over directly: generators
//! receive a [`ChildDataSupplier`] and only functions that really need the
//! membership invoke it. [`LazyChildData`] wraps an engine callback so the
//! materialisation happens at most once per evaluation however many nodes
//! ask.

use std::cell::OnceCell;

use super::stored::StoredValues;

/// Read-only view over the rows composing one group, in the group's current
/// ordering. Positions are zero-based.
pub trait ChildData {
    /// Storage of the first member row, if the group is non-empty
    fn first(&self) -> Option<&StoredValues>;
    /// Storage of the last member row
    fn last(&self) -> Option<&StoredValues>;
    /// Storage of the member row at `pos`
    fn nth(&self, pos: usize) -> Option<&StoredValues>;
    /// Up to `limit` member rows from the start of the group
    fn top(&self, limit: usize) -> Vec<&StoredValues>;
    /// Up to `limit` member rows from the end of the group, in order
    fn bottom(&self, limit: usize) -> Vec<&StoredValues>;
    /// Number of member rows in the group
    fn count(&self) -> u64;
}

/// Lazy access to a group's [`ChildData`].
///
/// `child_data()` may be called repeatedly; implementations materialise the
/// view at most once. Returning `None` means the evaluation is not running
/// in a grouped context, which selectors treat as a signal to fall back to
/// the current row.
pub trait ChildDataSupplier {
    fn child_data(&self) -> Option<&dyn ChildData>;
}

/// A [`ChildDataSupplier`] over an engine callback, invoked at most once.
pub struct LazyChildData<F>
where
    F: Fn() -> Option<Box<dyn ChildData>>,
{
    supplier: F,
    materialised: OnceCell<Option<Box<dyn ChildData>>>,
}

impl<F> LazyChildData<F>
where
    F: Fn() -> Option<Box<dyn ChildData>>,
{
    pub fn new(supplier: F) -> Self {
        Self {
            supplier,
            materialised: OnceCell::new(),
        }
    }
}

impl<F> ChildDataSupplier for LazyChildData<F>
where
    F: Fn() -> Option<Box<dyn ChildData>>,
{
    fn child_data(&self) -> Option<&dyn ChildData> {
        self.materialised
            .get_or_init(|| (self.supplier)())
            .as_deref()
    }
}

/// The plain in-memory [`ChildData`] implementation: a vector of member-row
/// storage in group order. The engine builds one per selector evaluation;
/// tests build them directly.
#[derive(Debug, Default)]
pub struct GroupRows {
    rows: Vec<StoredValues>,
}

impl GroupRows {
    pub fn new(rows: Vec<StoredValues>) -> Self {
        Self { rows }
    }

    pub fn push(&mut self, row: StoredValues) {
        self.rows.push(row);
    }
}

impl ChildData for GroupRows {
    fn first(&self) -> Option<&StoredValues> {
        self.rows.first()
    }

    fn last(&self) -> Option<&StoredValues> {
        self.rows.last()
    }

    fn nth(&self, pos: usize) -> Option<&StoredValues> {
        self.rows.get(pos)
    }

    fn top(&self, limit: usize) -> Vec<&StoredValues> {
        self.rows.iter().take(limit).collect()
    }

    fn bottom(&self, limit: usize) -> Vec<&StoredValues> {
        let skip = self.rows.len().saturating_sub(limit);
        self.rows.iter().skip(skip).collect()
    }

    fn count(&self) -> u64 {
        self.rows.len() as u64
    }
}
