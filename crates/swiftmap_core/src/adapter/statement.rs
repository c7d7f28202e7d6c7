//! Prepared statement contracts implemented by drivers.
//!
//! # Responsibility
//! - Define the four statement kinds and the factory that prepares them.
//! - Define the execution outcome shared by read and write statements.
//!
//! # Invariants
//! - Parameters are positional; absence is bound as SQL `NULL`.
//! - A prepared statement is a stateless template: executing it
//!   concurrently with different parameters must be safe.
//! - `insert_id` is only reported by create statements of schemes with a
//!   serial field.

use crate::model::scheme::Scheme;
use crate::model::value::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// The fixed CRUD statement shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatementKind {
    /// Parameters: key values.
    Get,
    /// Parameters: insertable values.
    Create,
    /// Parameters: updatable values, then key values.
    Update,
    /// Parameters: key values.
    Delete,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl Display for StatementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque driver failure during preparation or execution.
#[derive(Debug)]
pub enum ExecutionError {
    Driver(Box<dyn Error + Send + Sync + 'static>),
    Message(String),
}

impl ExecutionError {
    pub fn driver(err: impl Error + Send + Sync + 'static) -> Self {
        Self::Driver(Box::new(err))
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl Display for ExecutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Driver(err) => write!(f, "{err}"),
            Self::Message(message) => f.write_str(message),
        }
    }
}

impl Error for ExecutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Driver(err) => Some(err.as_ref()),
            Self::Message(_) => None,
        }
    }
}

/// One result row: column name → value, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Option<Value>)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Option<Value>)>) -> Self {
        Self { columns }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.columns
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn into_columns(self) -> Vec<(String, Option<Value>)> {
        self.columns
    }
}

/// Outcome of one statement execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementResult {
    rows: Vec<Row>,
    affected_rows: u64,
    insert_id: Option<i64>,
}

impl StatementResult {
    /// Read outcome.
    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Write outcome.
    pub fn write(affected_rows: u64, insert_id: Option<i64>) -> Self {
        Self {
            rows: Vec::new(),
            affected_rows,
            insert_id,
        }
    }

    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    pub fn insert_id(&self) -> Option<i64> {
        self.insert_id
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }
}

impl IntoIterator for StatementResult {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// A reusable parameterized command bound to one scheme and statement kind.
pub trait PreparedStatement: Send + Sync {
    fn execute(&self, params: &[Option<Value>]) -> Result<StatementResult, ExecutionError>;
}

/// Driver seam: builds dialect-specific statements for a scheme.
///
/// Parameter order is part of the contract, see [`StatementKind`].
pub trait StatementFactory {
    type Statement: PreparedStatement;

    fn prepare_get(&self, scheme: &Scheme) -> Result<Self::Statement, ExecutionError>;
    fn prepare_create(&self, scheme: &Scheme) -> Result<Self::Statement, ExecutionError>;
    fn prepare_update(&self, scheme: &Scheme) -> Result<Self::Statement, ExecutionError>;
    fn prepare_delete(&self, scheme: &Scheme) -> Result<Self::Statement, ExecutionError>;

    /// Dispatches to the matching `prepare_*` method.
    fn prepare(
        &self,
        scheme: &Scheme,
        kind: StatementKind,
    ) -> Result<Self::Statement, ExecutionError> {
        match kind {
            StatementKind::Get => self.prepare_get(scheme),
            StatementKind::Create => self.prepare_create(scheme),
            StatementKind::Update => self.prepare_update(scheme),
            StatementKind::Delete => self.prepare_delete(scheme),
        }
    }
}
