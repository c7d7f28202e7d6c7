//! Connection options for the SQLite driver.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_STATEMENT_CACHE_CAPACITY: usize = 64;

/// SQLite connection options, deserializable from configuration files.
///
/// Missing keys take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SqliteOptions {
    /// Database file; `None` opens a private in-memory database.
    pub path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
    pub foreign_keys: bool,
    /// Capacity of rusqlite's per-connection prepared statement cache.
    pub statement_cache_capacity: usize,
    /// Log every executed statement at debug level.
    pub trace: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            foreign_keys: true,
            statement_cache_capacity: DEFAULT_STATEMENT_CACHE_CAPACITY,
            trace: false,
        }
    }
}

impl SqliteOptions {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub(crate) fn mode(&self) -> &'static str {
        if self.path.is_some() {
            "file"
        } else {
            "memory"
        }
    }
}
