//! Data-mapping core for swiftmap.
//!
//! Declared schemes describe record shapes; the [`Adapter`] turns CRUD calls
//! on scheme resources into cached prepared statements supplied by a
//! pluggable [`StatementFactory`], and reconciles results back into the
//! resources. [`db::SqliteDriver`] is the bundled reference factory.

pub mod adapter;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;

pub use adapter::{
    Adapter, AdapterError, AdapterResult, Batch, DeleteInput, ExecutionError, Input,
    PreparedStatement, ResourceInput, Row, StatementFactory, StatementKind, StatementResult,
};
pub use db::{DbError, DbResult, SqliteDriver, SqliteOptions};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::header::{Field, FieldDefault, Header, SchemeError};
pub use model::mapping::FieldMapping;
pub use model::resource::{Resource, ResourceError, ResourceState};
pub use model::scheme::Scheme;
pub use model::tuple::Tuple;
pub use model::value::{FieldType, Value};
pub use service::resource_service::ResourceService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
