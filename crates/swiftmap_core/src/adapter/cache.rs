//! Per-adapter prepared statement cache.
//!
//! # Invariants
//! - At most one statement is ever stored per `(scheme identity, kind)`.
//! - Population is single-flight: concurrent first callers for one key
//!   block on a shared slot while exactly one of them prepares.
//! - A failed preparation leaves the slot empty; the next caller retries.
//! - The map lock is never held while a statement is being prepared.

use crate::adapter::statement::StatementKind;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

type Slot<S> = Arc<OnceCell<Arc<S>>>;

/// Cache key: scheme identity plus statement kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementKey {
    pub scheme: String,
    pub kind: StatementKind,
}

pub struct StatementCache<S> {
    slots: Mutex<HashMap<StatementKey, Slot<S>>>,
}

impl<S> Default for StatementCache<S> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<S> StatementCache<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached statement for `key`, preparing it on first use.
    ///
    /// The returned flag is `true` when this call ran `prepare`.
    pub fn get_or_prepare<E>(
        &self,
        key: StatementKey,
        prepare: impl FnOnce() -> Result<S, E>,
    ) -> Result<(Arc<S>, bool), E> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key).or_default())
        };

        let mut prepared = false;
        let statement = slot.get_or_try_init(|| {
            prepared = true;
            prepare().map(Arc::new)
        })?;
        Ok((Arc::clone(statement), prepared))
    }

    /// Number of populated statements.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached statement.
    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
