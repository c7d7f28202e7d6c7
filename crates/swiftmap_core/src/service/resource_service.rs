//! Scheme-bound resource service.
//!
//! # Responsibility
//! - Provide `create`/`get`/`update`/`destroy` for one scheme.
//! - Delegate persistence to the adapter unchanged.
//!
//! # Invariants
//! - Service APIs never bypass adapter key validation or lifecycle rules.
//! - `update` applies changes in memory only if every change is valid.

use crate::adapter::{Adapter, AdapterResult, StatementFactory};
use crate::model::mapping::FieldMapping;
use crate::model::resource::Resource;
use crate::model::scheme::Scheme;
use std::sync::Arc;

/// Use-case wrapper binding an adapter to one scheme.
pub struct ResourceService<'a, F: StatementFactory> {
    adapter: &'a Adapter<F>,
    scheme: Arc<Scheme>,
}

impl<'a, F: StatementFactory> ResourceService<'a, F> {
    pub fn new(adapter: &'a Adapter<F>, scheme: Arc<Scheme>) -> Self {
        Self { adapter, scheme }
    }

    pub fn scheme(&self) -> &Arc<Scheme> {
        &self.scheme
    }

    /// Creates one resource from field values, defaults applied.
    pub fn create(&self, values: FieldMapping) -> AdapterResult<Resource> {
        self.adapter.create_one(&self.scheme, values)
    }

    /// Creates several resources in order, stopping at the first failure.
    pub fn create_all(&self, values: Vec<FieldMapping>) -> AdapterResult<Vec<Resource>> {
        self.adapter.create_many(&self.scheme, values)
    }

    /// Loads one resource by key; `Ok(None)` when no row matches.
    pub fn get(&self, keys: &FieldMapping) -> AdapterResult<Option<Resource>> {
        self.adapter.get(&self.scheme, keys)
    }

    /// Applies `changes` to `resource` and persists it.
    ///
    /// # Contract
    /// - Invalid changes leave `resource` untouched and execute nothing.
    /// - Returns the updated resource; the row is not re-read.
    pub fn update(&self, mut resource: Resource, changes: FieldMapping) -> AdapterResult<Resource> {
        resource.apply(changes)?;
        self.adapter.update_one(&self.scheme, resource)
    }

    /// Deletes `resource` by key.
    ///
    /// Returns whether a row was removed. `resource` is frozen either way
    /// once the delete has executed.
    pub fn destroy(&self, resource: &mut Resource) -> AdapterResult<bool> {
        let result = self.adapter.delete_one(&self.scheme, resource)?;
        Ok(result.affected_rows() > 0)
    }
}
