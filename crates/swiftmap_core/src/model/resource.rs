//! Live instances of a scheme.
//!
//! # Responsibility
//! - Own one tuple and expose typed field access by name.
//! - Track the logical lifecycle (`Live` → `Deleted`).
//!
//! # Invariants
//! - Every mutator checks the lifecycle state before touching the tuple.
//! - A `Deleted` resource stays readable and never becomes `Live` again.
//! - Resources are not shared: mutation assumes exclusive access.

use crate::model::mapping::FieldMapping;
use crate::model::scheme::Scheme;
use crate::model::tuple::Tuple;
use crate::model::value::{FieldType, Value};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Logical lifecycle of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Live,
    /// Set after a successful delete; the resource is frozen.
    Deleted,
}

/// Field access and mutation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    Immutable {
        scheme: String,
    },
    UnknownField {
        scheme: String,
        field: String,
    },
    TypeMismatch {
        scheme: String,
        field: String,
        expected: FieldType,
        found: FieldType,
    },
}

impl Display for ResourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immutable { scheme } => {
                write!(f, "{scheme} resource was deleted and can no longer be modified")
            }
            Self::UnknownField { scheme, field } => {
                write!(f, "{scheme} has no field `{field}`")
            }
            Self::TypeMismatch {
                scheme,
                field,
                expected,
                found,
            } => write!(
                f,
                "{scheme}.{field} expects {expected}, got incompatible {found} value"
            ),
        }
    }
}

impl Error for ResourceError {}

/// One instance of a scheme: `(scheme, tuple, state)`.
#[derive(Clone)]
pub struct Resource {
    scheme: Arc<Scheme>,
    tuple: Tuple,
    state: ResourceState,
}

impl Resource {
    pub(crate) fn from_parts(scheme: Arc<Scheme>, tuple: Tuple) -> Self {
        Self {
            scheme,
            tuple,
            state: ResourceState::Live,
        }
    }

    pub fn scheme(&self) -> &Arc<Scheme> {
        &self.scheme
    }

    pub fn tuple(&self) -> &Tuple {
        &self.tuple
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn is_deleted(&self) -> bool {
        self.state == ResourceState::Deleted
    }

    /// Returns the present value of `name`; unknown and absent fields are `None`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scheme
            .header()
            .position(name)
            .and_then(|index| self.tuple.get(index))
    }

    /// Sets one field after lifecycle and type checks.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ResourceError> {
        self.ensure_live()?;
        let index = self.scheme.position_of(name)?;
        let value = self.scheme.coerce(index, value.into())?;
        self.tuple.set(index, Some(value));
        Ok(())
    }

    /// Marks one field absent.
    pub fn clear(&mut self, name: &str) -> Result<(), ResourceError> {
        self.ensure_live()?;
        let index = self.scheme.position_of(name)?;
        self.tuple.set(index, None);
        Ok(())
    }

    /// Applies every change or none of them.
    pub fn apply(&mut self, changes: FieldMapping) -> Result<(), ResourceError> {
        self.ensure_live()?;
        let mut staged = Vec::with_capacity(changes.len());
        for (name, value) in changes {
            let index = self.scheme.position_of(&name)?;
            staged.push((index, self.scheme.coerce(index, value)?));
        }
        for (index, value) in staged {
            self.tuple.set(index, Some(value));
        }
        Ok(())
    }

    /// Fields in header order with their present value, if any.
    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.scheme
            .header()
            .fields()
            .iter()
            .zip(self.tuple.iter())
            .map(|(field, value)| (field.name(), value))
    }

    /// Present values as an untyped mapping.
    pub fn to_mapping(&self) -> FieldMapping {
        self.fields()
            .filter_map(|(name, value)| value.map(|value| (name, value.clone())))
            .collect()
    }

    /// Key values in header key order, absence preserved.
    pub fn key_values(&self) -> Vec<Option<Value>> {
        self.tuple.values_at(self.scheme.header().key_indices())
    }

    /// Names of key fields that currently have no value.
    pub fn missing_keys(&self) -> Vec<&str> {
        let header = self.scheme.header();
        header
            .key_indices()
            .iter()
            .filter(|index| self.tuple.get(**index).is_none())
            .map(|index| header.fields()[*index].name())
            .collect()
    }

    pub(crate) fn assign(&mut self, index: usize, value: Value) -> Result<(), ResourceError> {
        self.ensure_live()?;
        let value = self.scheme.coerce(index, value)?;
        self.tuple.set(index, Some(value));
        Ok(())
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.state = ResourceState::Deleted;
    }

    pub(crate) fn ensure_live(&self) -> Result<(), ResourceError> {
        match self.state {
            ResourceState::Live => Ok(()),
            ResourceState::Deleted => Err(ResourceError::Immutable {
                scheme: self.scheme.store().to_string(),
            }),
        }
    }
}

impl Debug for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        struct Fields<'a>(&'a Resource);

        impl Debug for Fields<'_> {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.debug_map().entries(self.0.fields()).finish()
            }
        }

        f.debug_struct("Resource")
            .field("scheme", &self.scheme.store())
            .field("state", &self.state)
            .field("fields", &Fields(self))
            .finish()
    }
}
