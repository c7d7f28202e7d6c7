//! `StatementFactory` implementation over one rusqlite connection.
//!
//! # Responsibility
//! - Render and validate dialect statements per scheme and kind.
//! - Execute them with positional parameters and report rows, changes and
//!   generated ids.
//!
//! # Invariants
//! - `insert_id` is read under the same connection lock as the insert, so
//!   it always belongs to that insert.
//! - Statements are validated at preparation; a malformed statement never
//!   reaches the adapter cache.
//! - Transaction control takes the connection lock only for `BEGIN`,
//!   `COMMIT` and `ROLLBACK`, so adapter calls can run inside a transaction.
//!   Every statement executed on this driver between begin and commit joins
//!   it, including statements from other threads.

use super::config::SqliteOptions;
use super::convert::read_value;
use super::migrate::migrate_scheme;
use super::open::open_with_options;
use super::sql::{delete_sql, insert_sql, select_sql, update_sql};
use super::{DbError, DbResult};
use crate::adapter::{
    ExecutionError, PreparedStatement, Row, StatementFactory, StatementKind, StatementResult,
};
use crate::model::scheme::Scheme;
use crate::model::value::Value;
use log::{debug, error};
use rusqlite::{params_from_iter, Connection, InterruptHandle};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Shared = Arc<Mutex<Connection>>;

fn lock(conn: &Shared) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

/// SQLite statement factory.
pub struct SqliteDriver {
    conn: Shared,
    interrupt: InterruptHandle,
    trace: bool,
}

impl SqliteDriver {
    /// Wraps an already configured connection.
    pub fn new(conn: Connection) -> Self {
        let interrupt = conn.get_interrupt_handle();
        Self {
            conn: Arc::new(Mutex::new(conn)),
            interrupt,
            trace: false,
        }
    }

    /// Opens a connection from `options` and wraps it.
    pub fn open(options: &SqliteOptions) -> DbResult<Self> {
        Ok(Self::new(open_with_options(options)?).with_trace(options.trace))
    }

    pub fn in_memory() -> DbResult<Self> {
        Self::open(&SqliteOptions::in_memory())
    }

    /// Logs every executed statement at debug level when enabled.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Drops and recreates the table backing `scheme`.
    pub fn migrate(&self, scheme: &Scheme) -> DbResult<()> {
        migrate_scheme(&mut *lock(&self.conn), scheme)
    }

    /// Handle that aborts the statement currently running on this driver's
    /// connection. The aborted call fails with an `ExecutionError`.
    pub fn interrupt_handle(&self) -> &InterruptHandle {
        &self.interrupt
    }

    /// Opens an explicit transaction on the shared connection.
    pub fn begin(&self) -> DbResult<()> {
        self.control("begin", "BEGIN IMMEDIATE;")
    }

    pub fn commit(&self) -> DbResult<()> {
        self.control("commit", "COMMIT;")
    }

    pub fn rollback(&self) -> DbResult<()> {
        self.control("rollback", "ROLLBACK;")
    }

    /// Whether an explicit transaction is open.
    pub fn in_transaction(&self) -> bool {
        !lock(&self.conn).is_autocommit()
    }

    /// Runs `f` inside a transaction: commits on `Ok`, rolls back on `Err`.
    ///
    /// `f` typically calls adapter operations backed by this driver.
    ///
    /// # Errors
    /// - `begin`/`commit` failures, converted into `E`.
    /// - The error returned by `f`; a failed rollback is logged and the
    ///   original error is kept.
    pub fn transaction<T, E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        self.begin()?;
        match f() {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback() {
                    error!(
                        "event=db_transaction module=db status=error step=rollback error={}",
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }

    fn control(&self, step: &str, sql: &str) -> DbResult<()> {
        match lock(&self.conn).execute_batch(sql) {
            Ok(()) => {
                debug!("event=db_transaction module=db status=ok step={step}");
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=db_transaction module=db status=error step={} error={}",
                    step, err
                );
                Err(err.into())
            }
        }
    }

    /// Runs `f` with exclusive access to the underlying connection.
    ///
    /// Adapter calls backed by this driver must not be made from `f`; they
    /// wait on the same connection lock.
    pub fn with_connection<T>(&self, f: impl FnOnce(&mut Connection) -> T) -> T {
        f(&mut *lock(&self.conn))
    }

    fn prepare_sql(
        &self,
        scheme: &Scheme,
        kind: StatementKind,
        sql: String,
    ) -> Result<SqliteStatement, ExecutionError> {
        lock(&self.conn).prepare_cached(&sql)?;
        debug!(
            "event=statement_render module=db status=ok scheme={} kind={} sql={}",
            scheme.store(),
            kind,
            sql
        );
        Ok(SqliteStatement {
            conn: Arc::clone(&self.conn),
            sql,
            kind,
            store: scheme.store().to_string(),
            serial: scheme.header().serial().is_some(),
            trace: self.trace,
        })
    }
}

impl StatementFactory for SqliteDriver {
    type Statement = SqliteStatement;

    fn prepare_get(&self, scheme: &Scheme) -> Result<SqliteStatement, ExecutionError> {
        self.prepare_sql(scheme, StatementKind::Get, select_sql(scheme))
    }

    fn prepare_create(&self, scheme: &Scheme) -> Result<SqliteStatement, ExecutionError> {
        self.prepare_sql(scheme, StatementKind::Create, insert_sql(scheme))
    }

    fn prepare_update(&self, scheme: &Scheme) -> Result<SqliteStatement, ExecutionError> {
        self.prepare_sql(scheme, StatementKind::Update, update_sql(scheme))
    }

    fn prepare_delete(&self, scheme: &Scheme) -> Result<SqliteStatement, ExecutionError> {
        self.prepare_sql(scheme, StatementKind::Delete, delete_sql(scheme))
    }
}

/// One rendered SQLite statement; compiled form lives in rusqlite's cache.
pub struct SqliteStatement {
    conn: Shared,
    sql: String,
    kind: StatementKind,
    store: String,
    serial: bool,
    trace: bool,
}

impl SqliteStatement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }
}

impl PreparedStatement for SqliteStatement {
    fn execute(&self, params: &[Option<Value>]) -> Result<StatementResult, ExecutionError> {
        let conn = lock(&self.conn);
        if self.trace {
            debug!(
                "event=statement_execute module=db scheme={} kind={} params={} sql={}",
                self.store,
                self.kind,
                params.len(),
                self.sql
            );
        }

        let mut stmt = conn.prepare_cached(&self.sql)?;
        if self.kind == StatementKind::Get {
            let names: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect();
            let mut rows = stmt.query(params_from_iter(params.iter()))?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut columns = Vec::with_capacity(names.len());
                for (index, name) in names.iter().enumerate() {
                    columns.push((name.clone(), read_value(row.get_ref(index)?)?));
                }
                out.push(Row::new(columns));
            }
            return Ok(StatementResult::rows(out));
        }

        let changes = stmt.execute(params_from_iter(params.iter()))?;
        let insert_id = (self.kind == StatementKind::Create && self.serial)
            .then(|| conn.last_insert_rowid());
        Ok(StatementResult::write(changes as u64, insert_id))
    }
}
