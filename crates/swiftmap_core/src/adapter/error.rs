//! Adapter operation errors.

use crate::adapter::statement::ExecutionError;
use crate::model::resource::ResourceError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors surfaced by `Adapter` operations.
///
/// Key errors are caller bugs and are not retryable. `Execution` carries the
/// driver failure unchanged.
#[derive(Debug)]
pub enum AdapterError {
    /// `get` was called without every key field.
    MissingKey {
        scheme: String,
        fields: Vec<String>,
    },
    /// `get` received a field that is not part of the key.
    UnexpectedKeyField {
        scheme: String,
        field: String,
    },
    /// `update`/`delete` received a resource with absent key values.
    IncompleteKey {
        scheme: String,
        fields: Vec<String>,
        resource: String,
    },
    /// A resource of another scheme was passed.
    SchemeMismatch {
        expected: String,
        found: String,
    },
    /// A create against a serial scheme reported no generated id.
    MissingInsertId {
        scheme: String,
    },
    /// A stored row could not be decoded into the scheme.
    InvalidRow {
        scheme: String,
        source: ResourceError,
    },
    Resource(ResourceError),
    Execution(ExecutionError),
}

impl AdapterError {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingKey { .. } => "missing_key",
            Self::UnexpectedKeyField { .. } => "unexpected_key_field",
            Self::IncompleteKey { .. } => "incomplete_key",
            Self::SchemeMismatch { .. } => "scheme_mismatch",
            Self::MissingInsertId { .. } => "missing_insert_id",
            Self::InvalidRow { .. } => "invalid_row",
            Self::Resource(ResourceError::Immutable { .. }) => "immutable_resource",
            Self::Resource(_) => "invalid_resource",
            Self::Execution(_) => "execution_failed",
        }
    }
}

impl Display for AdapterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingKey { scheme, fields } => write!(
                f,
                "{scheme} get is missing key field(s): {}",
                fields.join(", ")
            ),
            Self::UnexpectedKeyField { scheme, field } => {
                write!(f, "{scheme} get received non-key field `{field}`")
            }
            Self::IncompleteKey {
                scheme,
                fields,
                resource,
            } => write!(
                f,
                "{scheme} resource has incomplete key (missing {}): {resource}",
                fields.join(", ")
            ),
            Self::SchemeMismatch { expected, found } => {
                write!(f, "expected a {expected} resource, got a {found} resource")
            }
            Self::MissingInsertId { scheme } => {
                write!(f, "{scheme} create did not report a generated id")
            }
            Self::InvalidRow { scheme, source } => {
                write!(f, "invalid stored {scheme} row: {source}")
            }
            Self::Resource(err) => write!(f, "{err}"),
            Self::Execution(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AdapterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRow { source, .. } => Some(source),
            Self::Resource(err) => Some(err),
            Self::Execution(err) => Some(err),
            Self::MissingKey { .. }
            | Self::UnexpectedKeyField { .. }
            | Self::IncompleteKey { .. }
            | Self::SchemeMismatch { .. }
            | Self::MissingInsertId { .. } => None,
        }
    }
}

impl From<ResourceError> for AdapterError {
    fn from(value: ResourceError) -> Self {
        Self::Resource(value)
    }
}

impl From<ExecutionError> for AdapterError {
    fn from(value: ExecutionError) -> Self {
        Self::Execution(value)
    }
}
