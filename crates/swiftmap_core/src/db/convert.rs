//! Conversions between model values and SQLite values.

use crate::adapter::ExecutionError;
use crate::model::value::Value;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Integer(v) | Self::Timestamp(v) => ToSqlOutput::from(*v),
            Self::Real(v) => ToSqlOutput::from(*v),
            Self::Text(v) => ToSqlOutput::from(v.as_str()),
            Self::Blob(v) => ToSqlOutput::from(v.as_slice()),
            Self::Boolean(v) => ToSqlOutput::from(*v),
            Self::Uuid(v) => ToSqlOutput::from(v.to_string()),
        })
    }
}

/// Reads one raw column value. Scheme type coercion happens later, when the
/// row is materialized.
pub(crate) fn read_value(value: ValueRef<'_>) -> Result<Option<Value>, ExecutionError> {
    Ok(match value {
        ValueRef::Null => None,
        ValueRef::Integer(v) => Some(Value::Integer(v)),
        ValueRef::Real(v) => Some(Value::Real(v)),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(ExecutionError::driver)?;
            Some(Value::Text(text.to_string()))
        }
        ValueRef::Blob(bytes) => Some(Value::Blob(bytes.to_vec())),
    })
}
