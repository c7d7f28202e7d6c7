//! Field-role metadata for one scheme.
//!
//! # Responsibility
//! - Describe fields in declaration order with their key/serial roles.
//! - Derive the read-only views used to build statement parameters.
//!
//! # Invariants
//! - Field names are unique identifiers.
//! - At most one serial field exists; it is an `Integer` key.
//! - At least one key field exists.
//! - `updatable` never contains a key or serial field.
//! - A header is immutable once constructed.

use crate::model::value::{FieldType, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern must compile")
});

/// Returns whether `name` is usable as a store or field identifier.
pub(crate) fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Value supplied for an absent field when a resource is constructed.
#[derive(Debug, Clone)]
pub enum FieldDefault {
    Value(Value),
    /// Evaluated once per constructed resource.
    Generator(fn() -> Value),
}

impl FieldDefault {
    pub fn resolve(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Generator(generate) => generate(),
        }
    }
}

/// One field descriptor.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldType,
    key: bool,
    serial: bool,
    default: Option<FieldDefault>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            kind,
            key: false,
            serial: false,
            default: None,
        }
    }

    /// Marks the field as part of the primary key.
    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    /// Marks the field as store-generated. A serial field is always a key.
    pub fn serial(mut self) -> Self {
        self.serial = true;
        self.key = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    pub fn default_with(mut self, generate: fn() -> Value) -> Self {
        self.default = Some(FieldDefault::Generator(generate));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldType {
        self.kind
    }

    pub fn is_key(&self) -> bool {
        self.key
    }

    pub fn is_serial(&self) -> bool {
        self.serial
    }

    /// Serial values come from the store, so they are never inserted.
    pub fn is_insertable(&self) -> bool {
        !self.serial
    }

    pub fn is_updatable(&self) -> bool {
        !self.key && !self.serial
    }

    pub fn default(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }
}

/// Scheme declaration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemeError {
    EmptyHeader,
    InvalidIdentifier(String),
    DuplicateField(String),
    MultipleSerial { first: String, second: String },
    SerialNotInteger { field: String, kind: FieldType },
    NoKey,
    InvalidDefault { field: String, kind: FieldType },
}

impl Display for SchemeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyHeader => write!(f, "scheme must declare at least one field"),
            Self::InvalidIdentifier(name) => write!(f, "invalid identifier `{name}`"),
            Self::DuplicateField(name) => write!(f, "field `{name}` is declared more than once"),
            Self::MultipleSerial { first, second } => write!(
                f,
                "only one serial field is allowed, found `{first}` and `{second}`"
            ),
            Self::SerialNotInteger { field, kind } => {
                write!(f, "serial field `{field}` must be integer, got {kind}")
            }
            Self::NoKey => write!(f, "scheme must declare at least one key field"),
            Self::InvalidDefault { field, kind } => {
                write!(f, "default for field `{field}` is not a valid {kind}")
            }
        }
    }
}

impl Error for SchemeError {}

/// Ordered field metadata with derived role views.
#[derive(Debug, Clone)]
pub struct Header {
    fields: Vec<Field>,
    keys: Vec<usize>,
    serial: Option<usize>,
    insertable: Vec<usize>,
    updatable: Vec<usize>,
}

impl Header {
    /// Validates field declarations and derives role views.
    pub fn new(fields: Vec<Field>) -> Result<Self, SchemeError> {
        if fields.is_empty() {
            return Err(SchemeError::EmptyHeader);
        }

        let mut seen = HashSet::new();
        let mut serial: Option<usize> = None;
        for (index, field) in fields.iter().enumerate() {
            if !is_identifier(&field.name) {
                return Err(SchemeError::InvalidIdentifier(field.name.clone()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemeError::DuplicateField(field.name.clone()));
            }
            if let Some(FieldDefault::Value(value)) = &field.default {
                if field.kind.coerce(value.clone()).is_err() {
                    return Err(SchemeError::InvalidDefault {
                        field: field.name.clone(),
                        kind: field.kind,
                    });
                }
            }
            if field.serial {
                if field.kind != FieldType::Integer {
                    return Err(SchemeError::SerialNotInteger {
                        field: field.name.clone(),
                        kind: field.kind,
                    });
                }
                if let Some(first) = serial {
                    return Err(SchemeError::MultipleSerial {
                        first: fields[first].name.clone(),
                        second: field.name.clone(),
                    });
                }
                serial = Some(index);
            }
        }

        let select = |predicate: fn(&Field) -> bool| -> Vec<usize> {
            fields
                .iter()
                .enumerate()
                .filter(|(_, field)| predicate(field))
                .map(|(index, _)| index)
                .collect()
        };
        let keys = select(Field::is_key);
        if keys.is_empty() {
            return Err(SchemeError::NoKey);
        }
        let insertable = select(Field::is_insertable);
        let updatable = select(Field::is_updatable);

        Ok(Self {
            fields,
            keys,
            serial,
            insertable,
            updatable,
        })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Tuple positions of key fields, in declaration order.
    pub fn key_indices(&self) -> &[usize] {
        &self.keys
    }

    pub fn serial_index(&self) -> Option<usize> {
        self.serial
    }

    pub fn insertable_indices(&self) -> &[usize] {
        &self.insertable
    }

    pub fn updatable_indices(&self) -> &[usize] {
        &self.updatable
    }

    pub fn keys(&self) -> Vec<&str> {
        self.names(&self.keys)
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.map(|index| self.fields[index].name.as_str())
    }

    pub fn insertable(&self) -> Vec<&str> {
        self.names(&self.insertable)
    }

    pub fn updatable(&self) -> Vec<&str> {
        self.names(&self.updatable)
    }

    /// Whether `other` declares the same fields, types and roles in the
    /// same order. Defaults are not compared.
    pub fn same_layout(&self, other: &Header) -> bool {
        self.fields.len() == other.fields.len()
            && self.fields.iter().zip(&other.fields).all(|(left, right)| {
                left.name == right.name
                    && left.kind == right.kind
                    && left.key == right.key
                    && left.serial == right.serial
            })
    }

    /// Field names at the given positions.
    pub fn names(&self, indices: &[usize]) -> Vec<&str> {
        indices
            .iter()
            .map(|index| self.fields[*index].name.as_str())
            .collect()
    }
}
