//! Store table (re)creation from scheme headers.
//!
//! # Invariants
//! - Drop and create run in one transaction; a failed create keeps the
//!   previous table.
//! - Migrating discards existing rows of the store.

use super::sql::{create_table_sql, drop_table_sql};
use super::DbResult;
use crate::model::scheme::Scheme;
use log::info;
use rusqlite::Connection;
use std::time::Instant;

/// Drops and recreates the table backing `scheme`.
pub(crate) fn migrate_scheme(conn: &mut Connection, scheme: &Scheme) -> DbResult<()> {
    let started_at = Instant::now();
    let ddl = create_table_sql(scheme)?;

    let tx = conn.transaction()?;
    tx.execute_batch(&drop_table_sql(scheme))?;
    tx.execute_batch(&ddl)?;
    tx.commit()?;
    conn.flush_prepared_statement_cache();

    info!(
        "event=scheme_migrate module=db status=ok scheme={} fields={} duration_ms={}",
        scheme.store(),
        scheme.header().len(),
        started_at.elapsed().as_millis()
    );
    Ok(())
}
