//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Apply connection pragmas and statement cache sizing from options.
//!
//! # Invariants
//! - Returned connections are fully configured or not returned at all.

use super::config::SqliteOptions;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a SQLite database file with default options.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with_options(&SqliteOptions::file(path.as_ref()))
}

/// Opens a private in-memory SQLite database with default options.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with_options(&SqliteOptions::in_memory())
}

/// Opens and configures a connection described by `options`.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_with_options(options: &SqliteOptions) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = options.mode();
    info!("event=db_open module=db status=start mode={mode}");

    let opened = match &options.path {
        Some(path) => Connection::open(path),
        None => Connection::open_in_memory(),
    };
    let conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match configure_connection(&conn, options) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_configure_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn configure_connection(conn: &Connection, options: &SqliteOptions) -> DbResult<()> {
    let foreign_keys = if options.foreign_keys { "ON" } else { "OFF" };
    conn.execute_batch(&format!("PRAGMA foreign_keys = {foreign_keys};"))?;
    conn.busy_timeout(Duration::from_millis(options.busy_timeout_ms))?;
    conn.set_prepared_statement_cache_capacity(options.statement_cache_capacity);
    Ok(())
}
