//! Dialect-independent CRUD orchestration over prepared statements.
//!
//! # Responsibility
//! - Turn `(scheme, resources)` into positional statement parameters.
//! - Reconcile results back into resources: serial id back-fill on create,
//!   row materialization on get, freeze on delete.
//! - Cache one prepared statement per `(scheme, kind)` for the adapter's
//!   lifetime.
//!
//! # Invariants
//! - Batches run strictly in input order and stop at the first error; items
//!   already executed are not rolled back.
//! - Key completeness is checked before a statement executes for an item.
//! - Output shape mirrors input shape (`Batch::One` ↔ `Batch::One`).
//! - The adapter keeps no reference to a resource after a call returns.
//!
//! # See also
//! - `crate::db::SqliteDriver` for the reference statement factory.

mod batch;
mod cache;
mod error;
mod statement;

pub use batch::{Batch, DeleteInput, Input, ResourceInput};
pub use cache::{StatementCache, StatementKey};
pub use error::{AdapterError, AdapterResult};
pub use statement::{
    ExecutionError, PreparedStatement, Row, StatementFactory, StatementKind, StatementResult,
};

use crate::model::mapping::FieldMapping;
use crate::model::resource::Resource;
use crate::model::scheme::Scheme;
use crate::model::value::Value;
use log::{debug, error, warn};
use std::sync::Arc;
use std::time::Instant;

/// CRUD entry points over a [`StatementFactory`] chosen at construction.
pub struct Adapter<F: StatementFactory> {
    factory: F,
    statements: StatementCache<F::Statement>,
}

impl<F: StatementFactory> Adapter<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            statements: StatementCache::new(),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Number of statements prepared and cached so far.
    pub fn cached_statements(&self) -> usize {
        self.statements.len()
    }

    /// Forgets every cached statement, e.g. after the store was migrated.
    pub fn clear_statements(&self) {
        self.statements.clear();
    }

    /// Loads one resource by its complete key.
    ///
    /// `keys` must name exactly the scheme's key fields. Zero matching rows
    /// is `Ok(None)`.
    ///
    /// # Errors
    /// - `MissingKey` when a key field is absent.
    /// - `UnexpectedKeyField` when a non-key field is supplied.
    pub fn get(&self, scheme: &Arc<Scheme>, keys: &FieldMapping) -> AdapterResult<Option<Resource>> {
        let params = key_params(scheme, keys).inspect_err(|err| log_rejected("get", scheme, err))?;
        self.run(StatementKind::Get, scheme, 1, |statement| {
            let Some(row) = statement.execute(&params)?.into_iter().next() else {
                return Ok(None);
            };
            scheme
                .materialize(row.into_columns())
                .map(Some)
                .map_err(|source| AdapterError::InvalidRow {
                    scheme: scheme.store().to_string(),
                    source,
                })
        })
    }

    /// Inserts one resource or a sequence of them, back-filling serial ids.
    ///
    /// Mappings are coerced through [`Scheme::resource`], so declared
    /// defaults apply.
    pub fn create(
        &self,
        scheme: &Arc<Scheme>,
        resources: impl Into<Batch<ResourceInput>>,
    ) -> AdapterResult<Batch<Resource>> {
        let resources = resources.into();
        self.run(StatementKind::Create, scheme, resources.len(), |statement| {
            resources.try_map(|input| create_item(scheme, statement, input))
        })
    }

    pub fn create_one(
        &self,
        scheme: &Arc<Scheme>,
        resource: impl Into<ResourceInput>,
    ) -> AdapterResult<Resource> {
        self.run(StatementKind::Create, scheme, 1, |statement| {
            create_item(scheme, statement, resource.into())
        })
    }

    pub fn create_many(
        &self,
        scheme: &Arc<Scheme>,
        resources: impl IntoIterator<Item = impl Into<ResourceInput>>,
    ) -> AdapterResult<Vec<Resource>> {
        let resources: Vec<ResourceInput> = resources.into_iter().map(Into::into).collect();
        self.run(StatementKind::Create, scheme, resources.len(), |statement| {
            resources
                .into_iter()
                .map(|input| create_item(scheme, statement, input))
                .collect()
        })
    }

    /// Writes updatable fields of one resource or a sequence of them.
    ///
    /// The row is not re-read afterwards.
    pub fn update(
        &self,
        scheme: &Arc<Scheme>,
        resources: impl Into<Batch<ResourceInput>>,
    ) -> AdapterResult<Batch<Resource>> {
        let resources = resources.into();
        self.run(StatementKind::Update, scheme, resources.len(), |statement| {
            resources.try_map(|input| update_item(scheme, statement, input))
        })
    }

    pub fn update_one(
        &self,
        scheme: &Arc<Scheme>,
        resource: impl Into<ResourceInput>,
    ) -> AdapterResult<Resource> {
        self.run(StatementKind::Update, scheme, 1, |statement| {
            update_item(scheme, statement, resource.into())
        })
    }

    pub fn update_many(
        &self,
        scheme: &Arc<Scheme>,
        resources: impl IntoIterator<Item = impl Into<ResourceInput>>,
    ) -> AdapterResult<Vec<Resource>> {
        let resources: Vec<ResourceInput> = resources.into_iter().map(Into::into).collect();
        self.run(StatementKind::Update, scheme, resources.len(), |statement| {
            resources
                .into_iter()
                .map(|input| update_item(scheme, statement, input))
                .collect()
        })
    }

    /// Deletes one resource or a sequence of them by key.
    ///
    /// Each resource whose delete executed without error is frozen, whether
    /// or not a row matched. The raw execution outcomes are returned, not
    /// the resources.
    pub fn delete<'r>(
        &self,
        scheme: &Arc<Scheme>,
        resources: impl Into<Batch<DeleteInput<'r>>>,
    ) -> AdapterResult<Batch<StatementResult>> {
        let resources = resources.into();
        self.run(StatementKind::Delete, scheme, resources.len(), |statement| {
            resources.try_map(|input| delete_item(scheme, statement, input))
        })
    }

    pub fn delete_one<'r>(
        &self,
        scheme: &Arc<Scheme>,
        resource: impl Into<DeleteInput<'r>>,
    ) -> AdapterResult<StatementResult> {
        self.run(StatementKind::Delete, scheme, 1, |statement| {
            delete_item(scheme, statement, resource.into())
        })
    }

    pub fn delete_many<'r>(
        &self,
        scheme: &Arc<Scheme>,
        resources: impl IntoIterator<Item = impl Into<DeleteInput<'r>>>,
    ) -> AdapterResult<Vec<StatementResult>> {
        let resources: Vec<DeleteInput<'r>> = resources.into_iter().map(Into::into).collect();
        self.run(StatementKind::Delete, scheme, resources.len(), |statement| {
            resources
                .into_iter()
                .map(|input| delete_item(scheme, statement, input))
                .collect()
        })
    }

    /// Shared body of every operation: fetch the cached statement, run, log.
    fn run<T>(
        &self,
        kind: StatementKind,
        scheme: &Scheme,
        count: usize,
        body: impl FnOnce(&F::Statement) -> AdapterResult<T>,
    ) -> AdapterResult<T> {
        let started_at = Instant::now();
        let statement = self.statement(scheme, kind)?;
        let outcome = body(statement.as_ref());
        match &outcome {
            Ok(_) => debug!(
                "event=resource_{} module=adapter status=ok scheme={} count={} duration_ms={}",
                kind,
                scheme.store(),
                count,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failed(kind.as_str(), scheme, err),
        }
        outcome
    }

    fn statement(&self, scheme: &Scheme, kind: StatementKind) -> AdapterResult<Arc<F::Statement>> {
        let key = StatementKey {
            scheme: scheme.identity().to_string(),
            kind,
        };
        let started_at = Instant::now();
        match self
            .statements
            .get_or_prepare(key, || self.factory.prepare(scheme, kind))
        {
            Ok((statement, prepared)) => {
                if prepared {
                    debug!(
                        "event=statement_prepare module=adapter status=ok scheme={} kind={} duration_ms={}",
                        scheme.store(),
                        kind,
                        started_at.elapsed().as_millis()
                    );
                }
                Ok(statement)
            }
            Err(err) => {
                error!(
                    "event=statement_prepare module=adapter status=error scheme={} kind={} error={}",
                    scheme.store(),
                    kind,
                    err
                );
                Err(err.into())
            }
        }
    }
}

fn create_item(
    scheme: &Arc<Scheme>,
    statement: &impl PreparedStatement,
    input: ResourceInput,
) -> AdapterResult<Resource> {
    let mut resource = resolve(scheme, input)?;
    resource.ensure_live()?;

    let header = scheme.header();
    let missing: Vec<String> = resource
        .missing_keys()
        .into_iter()
        .filter(|name| header.serial() != Some(*name))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(incomplete_key(scheme, &resource, missing));
    }

    let result = statement.execute(&resource.tuple().values_at(header.insertable_indices()))?;
    if let Some(index) = header.serial_index() {
        let id = result
            .insert_id()
            .ok_or_else(|| AdapterError::MissingInsertId {
                scheme: scheme.store().to_string(),
            })?;
        resource.assign(index, Value::Integer(id))?;
    }
    Ok(resource)
}

fn update_item(
    scheme: &Arc<Scheme>,
    statement: &impl PreparedStatement,
    input: ResourceInput,
) -> AdapterResult<Resource> {
    let resource = resolve(scheme, input)?;
    let keys = complete_key(scheme, &resource)?;

    let mut params = resource
        .tuple()
        .values_at(scheme.header().updatable_indices());
    params.extend(keys);
    statement.execute(&params)?;
    Ok(resource)
}

fn delete_item(
    scheme: &Arc<Scheme>,
    statement: &impl PreparedStatement,
    input: DeleteInput<'_>,
) -> AdapterResult<StatementResult> {
    let mut coerced;
    let resource: &mut Resource = match input {
        Input::Resource(resource) => {
            ensure_scheme(scheme, resource)?;
            resource
        }
        Input::Mapping(mapping) => {
            coerced = scheme.resource(mapping)?;
            &mut coerced
        }
    };

    let keys = complete_key(scheme, resource)?;
    let result = statement.execute(&keys)?;
    resource.mark_deleted();
    Ok(result)
}

fn resolve(scheme: &Arc<Scheme>, input: ResourceInput) -> AdapterResult<Resource> {
    match input {
        Input::Resource(resource) => {
            ensure_scheme(scheme, &resource)?;
            Ok(resource)
        }
        Input::Mapping(mapping) => Ok(scheme.resource(mapping)?),
    }
}

fn ensure_scheme(scheme: &Arc<Scheme>, resource: &Resource) -> AdapterResult<()> {
    let other = resource.scheme();
    if Arc::ptr_eq(scheme, other)
        || (scheme.identity() == other.identity() && scheme.header().same_layout(other.header()))
    {
        return Ok(());
    }
    Err(AdapterError::SchemeMismatch {
        expected: scheme.store().to_string(),
        found: resource.scheme().store().to_string(),
    })
}

/// Key values in header key order, or `IncompleteKey` naming what is absent.
fn complete_key(scheme: &Scheme, resource: &Resource) -> AdapterResult<Vec<Option<Value>>> {
    let missing = resource.missing_keys();
    if !missing.is_empty() {
        let missing = missing.into_iter().map(str::to_string).collect();
        return Err(incomplete_key(scheme, resource, missing));
    }
    Ok(resource.key_values())
}

fn incomplete_key(scheme: &Scheme, resource: &Resource, fields: Vec<String>) -> AdapterError {
    AdapterError::IncompleteKey {
        scheme: scheme.store().to_string(),
        fields,
        resource: format!("{resource:?}"),
    }
}

fn key_params(scheme: &Scheme, keys: &FieldMapping) -> AdapterResult<Vec<Option<Value>>> {
    let header = scheme.header();
    for (name, _) in keys {
        if !header.field(name).is_some_and(|field| field.is_key()) {
            return Err(AdapterError::UnexpectedKeyField {
                scheme: scheme.store().to_string(),
                field: name.clone(),
            });
        }
    }

    let mut params = Vec::with_capacity(header.key_indices().len());
    let mut missing = Vec::new();
    for &index in header.key_indices() {
        let name = header.fields()[index].name();
        match keys.get(name) {
            Some(value) => params.push(Some(scheme.coerce(index, value.clone())?)),
            None => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(AdapterError::MissingKey {
            scheme: scheme.store().to_string(),
            fields: missing,
        });
    }
    Ok(params)
}

fn log_rejected(op: &str, scheme: &Scheme, err: &AdapterError) {
    warn!(
        "event=resource_{} module=adapter status=error scheme={} error_code={} error={}",
        op,
        scheme.store(),
        err.code(),
        err
    );
}

fn log_failed(op: &str, scheme: &Scheme, err: &AdapterError) {
    match err {
        AdapterError::Execution(_) | AdapterError::MissingInsertId { .. } => error!(
            "event=resource_{} module=adapter status=error scheme={} error_code={} error={}",
            op,
            scheme.store(),
            err.code(),
            err
        ),
        _ => log_rejected(op, scheme, err),
    }
}
