//! Declared resource shapes.
//!
//! # Responsibility
//! - Pair a stable store identity with its field header.
//! - Construct resources from mappings (defaults applied) and from stored
//!   rows (defaults not applied).
//!
//! # Invariants
//! - `store` is a valid identifier and is the statement cache identity.
//! - Constructed resources always start `Live` with a header-aligned tuple.

use crate::model::header::{is_identifier, Field, Header, SchemeError};
use crate::model::mapping::FieldMapping;
use crate::model::resource::{Resource, ResourceError};
use crate::model::tuple::Tuple;
use crate::model::value::Value;
use std::sync::Arc;

/// A declared resource shape backed by one store (table).
#[derive(Debug)]
pub struct Scheme {
    store: String,
    header: Header,
}

impl Scheme {
    /// Declares a scheme. Returned shared because resources keep a handle to
    /// their scheme.
    pub fn new(store: impl Into<String>, fields: Vec<Field>) -> Result<Arc<Self>, SchemeError> {
        let store = store.into();
        if !is_identifier(&store) {
            return Err(SchemeError::InvalidIdentifier(store));
        }
        let header = Header::new(fields)?;
        Ok(Arc::new(Self { store, header }))
    }

    /// Store (table) name.
    pub fn store(&self) -> &str {
        &self.store
    }

    /// Stable identity used to key cached statements.
    pub fn identity(&self) -> &str {
        &self.store
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Builds a live resource from `mapping`, filling absent fields from
    /// declared defaults.
    ///
    /// # Errors
    /// - `UnknownField` when the mapping names a field outside the header.
    /// - `TypeMismatch` when a value cannot be coerced to its field type.
    pub fn resource(self: &Arc<Self>, mapping: FieldMapping) -> Result<Resource, ResourceError> {
        let mut tuple = Tuple::absent(self.header.len());
        for (name, value) in mapping {
            let index = self.position_of(&name)?;
            tuple.set(index, Some(self.coerce(index, value)?));
        }

        for (index, field) in self.header.fields().iter().enumerate() {
            if tuple.get(index).is_some() {
                continue;
            }
            if let Some(default) = field.default() {
                tuple.set(index, Some(self.coerce(index, default.resolve())?));
            }
        }

        Ok(Resource::from_parts(Arc::clone(self), tuple))
    }

    /// Builds a live resource from stored columns without applying defaults.
    ///
    /// Columns that are not header fields are ignored; header fields missing
    /// from the columns stay absent.
    pub fn materialize<N: AsRef<str>>(
        self: &Arc<Self>,
        columns: impl IntoIterator<Item = (N, Option<Value>)>,
    ) -> Result<Resource, ResourceError> {
        let mut values = vec![None; self.header.len()];
        for (name, value) in columns {
            let Some(index) = self.header.position(name.as_ref()) else {
                continue;
            };
            values[index] = match value {
                Some(value) => Some(self.coerce(index, value)?),
                None => None,
            };
        }
        Ok(Resource::from_parts(
            Arc::clone(self),
            Tuple::from_values(values),
        ))
    }

    pub(crate) fn position_of(&self, name: &str) -> Result<usize, ResourceError> {
        self.header
            .position(name)
            .ok_or_else(|| ResourceError::UnknownField {
                scheme: self.store.clone(),
                field: name.to_string(),
            })
    }

    pub(crate) fn coerce(&self, index: usize, value: Value) -> Result<Value, ResourceError> {
        let field = &self.header.fields()[index];
        field
            .kind()
            .coerce(value)
            .map_err(|rejected| ResourceError::TypeMismatch {
                scheme: self.store.clone(),
                field: field.name().to_string(),
                expected: field.kind(),
                found: rejected.field_type(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::Scheme;
    use crate::model::header::{Field, SchemeError};
    use crate::model::mapping::FieldMapping;
    use crate::model::resource::ResourceError;
    use crate::model::value::{FieldType, Value};

    fn stamp() -> Value {
        Value::Timestamp(42)
    }

    fn user() -> std::sync::Arc<Scheme> {
        Scheme::new(
            "users",
            vec![
                Field::new("id", FieldType::Integer).serial(),
                Field::new("name", FieldType::Text),
                Field::new("optional", FieldType::Text).default_value("woot"),
                Field::new("created", FieldType::Timestamp).default_with(stamp),
            ],
        )
        .unwrap()
    }

    #[test]
    fn resource_applies_defaults_only_to_absent_fields() {
        let scheme = user();
        let resource = scheme
            .resource(FieldMapping::new().with("name", "A").with("optional", "set"))
            .unwrap();

        assert_eq!(resource.get("optional"), Some(&Value::from("set")));
        assert_eq!(resource.get("created"), Some(&Value::Timestamp(42)));
        assert_eq!(resource.get("id"), None);
    }

    #[test]
    fn resource_rejects_unknown_field() {
        let err = user()
            .resource(FieldMapping::new().with("nickname", "x"))
            .unwrap_err();
        assert!(matches!(err, ResourceError::UnknownField { field, .. } if field == "nickname"));
    }

    #[test]
    fn materialize_skips_defaults_and_widens_integers() {
        let scheme = user();
        let resource = scheme
            .materialize(vec![
                ("id", Some(Value::Integer(9))),
                ("name", None),
                ("created", Some(Value::Integer(1000))),
                ("extra", Some(Value::from("ignored"))),
            ])
            .unwrap();

        assert_eq!(resource.get("id"), Some(&Value::Integer(9)));
        assert_eq!(resource.get("name"), None);
        assert_eq!(resource.get("optional"), None);
        assert_eq!(resource.get("created"), Some(&Value::Timestamp(1000)));
    }

    #[test]
    fn store_name_must_be_identifier() {
        let err = Scheme::new("user table", vec![Field::new("id", FieldType::Integer).key()])
            .unwrap_err();
        assert_eq!(err, SchemeError::InvalidIdentifier("user table".to_string()));
    }
}
