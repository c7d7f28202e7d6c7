//! SQLite reference driver.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Implement `StatementFactory` with SQLite dialect statements.
//! - Create store tables from scheme headers (`migrate`).
//! - Explicit transactions around adapter calls.
//!
//! # Invariants
//! - Identifiers are always double-quoted; values are always bound.
//! - One connection is shared by the driver and its statements; every
//!   execution holds the connection lock for its whole duration.

use crate::adapter::{AdapterError, ExecutionError};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod config;
mod convert;
mod driver;
mod migrate;
mod open;
mod sql;

pub use config::SqliteOptions;
pub use driver::{SqliteDriver, SqliteStatement};
pub use open::{open_db, open_db_in_memory, open_with_options};
pub use sql::quote_ident;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The scheme cannot be represented as a SQLite table.
    UnsupportedScheme {
        scheme: String,
        reason: String,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedScheme { scheme, reason } => {
                write!(f, "scheme {scheme} is not supported by sqlite: {reason}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedScheme { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<rusqlite::Error> for ExecutionError {
    fn from(value: rusqlite::Error) -> Self {
        Self::driver(value)
    }
}

impl From<DbError> for ExecutionError {
    fn from(value: DbError) -> Self {
        Self::driver(value)
    }
}

impl From<DbError> for AdapterError {
    fn from(value: DbError) -> Self {
        Self::Execution(value.into())
    }
}
