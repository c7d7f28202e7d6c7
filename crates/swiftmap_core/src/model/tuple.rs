//! Positional value storage backing one resource.
//!
//! # Invariants
//! - Slot `i` always holds the value of header field `i`.
//! - The slot count is fixed at construction.

use crate::model::value::Value;

/// Ordered field values of one resource; `None` marks an absent value.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    values: Vec<Option<Value>>,
}

impl Tuple {
    /// Creates a tuple with `len` absent slots.
    pub fn absent(len: usize) -> Self {
        Self {
            values: vec![None; len],
        }
    }

    pub(crate) fn from_values(values: Vec<Option<Value>>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    pub(crate) fn set(&mut self, index: usize, value: Option<Value>) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
    }

    /// Clones the slots at `indices`, preserving absence.
    pub fn values_at(&self, indices: &[usize]) -> Vec<Option<Value>> {
        indices
            .iter()
            .map(|index| self.values.get(*index).cloned().flatten())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&Value>> {
        self.values.iter().map(Option::as_ref)
    }
}
