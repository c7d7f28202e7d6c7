//! Typed field values and field type coercion.
//!
//! # Responsibility
//! - Define the scalar values carried by tuples, statements and rows.
//! - Own the single widening rule shared by setters, mapping coercion and
//!   row materialization.
//!
//! # Invariants
//! - Absence is `Option<Value>::None`; there is no null variant.
//! - Coercion is lossless: a value is either accepted as-is, widened, or
//!   rejected.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Largest integer magnitude an `f64` represents exactly.
const MAX_EXACT_REAL_INTEGER: u64 = 1 << 53;

/// Declared storage type of one scheme field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Integer,
    Real,
    Text,
    Blob,
    Boolean,
    /// Unix epoch milliseconds.
    Timestamp,
    Uuid,
}

impl FieldType {
    /// Stable lowercase name used in messages and serialized metadata.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
            Self::Blob => "blob",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::Uuid => "uuid",
        }
    }

    /// Converts `value` into this type, widening where no information is lost.
    ///
    /// Integers widen to `Real` only within ±2^53, where `f64` is exact.
    /// Returns the untouched value as `Err` when it cannot represent this type.
    pub fn coerce(self, value: Value) -> Result<Value, Value> {
        match (self, value) {
            (Self::Integer, value @ Value::Integer(_)) => Ok(value),
            (Self::Real, value @ Value::Real(_)) => Ok(value),
            (Self::Real, Value::Integer(v)) if v.unsigned_abs() <= MAX_EXACT_REAL_INTEGER => {
                Ok(Value::Real(v as f64))
            }
            (Self::Text, value @ Value::Text(_)) => Ok(value),
            (Self::Blob, value @ Value::Blob(_)) => Ok(value),
            (Self::Boolean, value @ Value::Boolean(_)) => Ok(value),
            (Self::Boolean, Value::Integer(0)) => Ok(Value::Boolean(false)),
            (Self::Boolean, Value::Integer(1)) => Ok(Value::Boolean(true)),
            (Self::Timestamp, value @ Value::Timestamp(_)) => Ok(value),
            (Self::Timestamp, Value::Integer(v)) => Ok(Value::Timestamp(v)),
            (Self::Uuid, value @ Value::Uuid(_)) => Ok(value),
            (Self::Uuid, Value::Text(text)) => match Uuid::parse_str(&text) {
                Ok(uuid) => Ok(Value::Uuid(uuid)),
                Err(_) => Err(Value::Text(text)),
            },
            (_, value) => Err(value),
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One present field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
    Timestamp(i64),
    Uuid(Uuid),
}

impl Value {
    /// Natural field type of this value before any coercion.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Integer(_) => FieldType::Integer,
            Self::Real(_) => FieldType::Real,
            Self::Text(_) => FieldType::Text,
            Self::Blob(_) => FieldType::Blob,
            Self::Boolean(_) => FieldType::Boolean,
            Self::Timestamp(_) => FieldType::Timestamp,
            Self::Uuid(_) => FieldType::Uuid,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) | Self::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(v) | Self::Timestamp(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Blob(v) => write!(f, "<{} bytes>", v.len()),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Uuid(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}
