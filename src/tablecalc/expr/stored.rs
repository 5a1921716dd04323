//! Per-row and per-group evaluation storage.
//!
//! Generators never hold accumulated state on themselves; everything a node
//! accumulates lives in a [`StoredValues`] owned by the surrounding engine,
//! addressed through integer slots handed out at bind time by a
//! [`StateIndex`]. That split is what makes merge possible: two
//! `StoredValues` built independently on different partitions can be
//! combined cell by cell, because each generator knows how to merge its own
//! slot.

use std::collections::HashSet;

use crate::tablecalc::values::Val;

/// Bind-time allocator of storage slots.
///
/// Each stateful node (field readers, folding aggregates, counters) claims
/// one slot while the function tree is built. The final size tells the
/// engine how large each row's [`StoredValues`] must be.
#[derive(Debug, Default)]
pub struct StateIndex {
    size: usize,
}

/// A claimed position in [`StoredValues`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateRef(usize);

impl StateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next free slot.
    pub fn next(&mut self) -> StateRef {
        let slot = StateRef(self.size);
        self.size += 1;
        slot
    }

    /// Number of slots claimed so far; the required `StoredValues` size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Allocate a storage instance sized for every claimed slot.
    pub fn create_stored_values(&self) -> StoredValues {
        StoredValues::with_size(self.size)
    }
}

/// The closed set of accumulator shapes generators keep in storage.
///
/// Every cell starts [`StateCell::Empty`]; the generator that owns the slot
/// decides which shape it becomes on first `set` and keeps it that shape
/// for the lifetime of the row/group.
#[derive(Debug, Clone, PartialEq)]
pub enum StateCell {
    /// Nothing stored yet
    Empty,
    /// A single running value (field capture, sum, min, max)
    Single(Val),
    /// A running row counter
    Count(u64),
    /// Values collected in arrival order (joining)
    Sequence(Vec<Val>),
    /// Distinct rendered values (countUnique)
    Distinct(HashSet<String>),
    /// Welford running statistics (average, variance, standard deviation)
    Welford { count: u64, mean: f64, m2: f64 },
}

impl StateCell {
    /// The stored value of a `Single` cell, Null when empty.
    pub fn single(&self) -> Val {
        match self {
            StateCell::Single(v) => v.clone(),
            _ => Val::Null,
        }
    }
}

/// Opaque storage for one row or one group, indexed by [`StateRef`].
///
/// Allocated by the external row/grouping engine (via
/// [`StateIndex::create_stored_values`]) and mutated only through generator
/// `set`/`merge` calls. Never accessed concurrently.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValues {
    cells: Vec<StateCell>,
}

impl StoredValues {
    pub fn with_size(size: usize) -> Self {
        Self {
            cells: vec![StateCell::Empty; size],
        }
    }

    pub fn cell(&self, slot: StateRef) -> &StateCell {
        &self.cells[slot.0]
    }

    pub fn cell_mut(&mut self, slot: StateRef) -> &mut StateCell {
        &mut self.cells[slot.0]
    }

    pub fn set_cell(&mut self, slot: StateRef, cell: StateCell) {
        self.cells[slot.0] = cell;
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_index_hands_out_sequential_slots() {
        let mut index = StateIndex::new();
        let a = index.next();
        let b = index.next();
        assert_ne!(a, b);
        assert_eq!(index.size(), 2);
    }

    #[test]
    fn test_stored_values_start_empty() {
        let mut index = StateIndex::new();
        let slot = index.next();
        let storage = index.create_stored_values();
        assert_eq!(storage.cell(slot), &StateCell::Empty);
        assert_eq!(storage.cell(slot).single(), Val::Null);
    }

    #[test]
    fn test_cell_round_trip() {
        let mut index = StateIndex::new();
        let slot = index.next();
        let mut storage = index.create_stored_values();
        storage.set_cell(slot, StateCell::Single(Val::Integer(42)));
        assert_eq!(storage.cell(slot).single(), Val::Integer(42));
    }
}
