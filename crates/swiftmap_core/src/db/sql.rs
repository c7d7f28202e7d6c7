//! SQLite statement text for the fixed CRUD shapes and table DDL.
//!
//! Placeholders are numbered in the order the adapter binds parameters:
//! - get/delete: key fields
//! - create: insertable fields
//! - update: updatable fields, then key fields

use crate::db::{DbError, DbResult};
use crate::model::header::Header;
use crate::model::scheme::Scheme;
use crate::model::value::FieldType;

/// Double-quotes an identifier, escaping embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quoted_list(header: &Header, indices: &[usize]) -> String {
    header
        .names(indices)
        .into_iter()
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `"a" = ?n AND "b" = ?n+1 ...` starting at placeholder `first`.
fn assignments(header: &Header, indices: &[usize], first: usize, separator: &str) -> String {
    header
        .names(indices)
        .into_iter()
        .enumerate()
        .map(|(offset, name)| format!("{} = ?{}", quote_ident(name), first + offset))
        .collect::<Vec<_>>()
        .join(separator)
}

pub(crate) fn select_sql(scheme: &Scheme) -> String {
    let header = scheme.header();
    let all: Vec<usize> = (0..header.len()).collect();
    format!(
        "SELECT {} FROM {} WHERE {} LIMIT 1",
        quoted_list(header, &all),
        quote_ident(scheme.store()),
        assignments(header, header.key_indices(), 1, " AND ")
    )
}

pub(crate) fn insert_sql(scheme: &Scheme) -> String {
    let header = scheme.header();
    let insertable = header.insertable_indices();
    if insertable.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", quote_ident(scheme.store()));
    }
    let placeholders = (1..=insertable.len())
        .map(|position| format!("?{position}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(scheme.store()),
        quoted_list(header, insertable),
        placeholders
    )
}

pub(crate) fn update_sql(scheme: &Scheme) -> String {
    let header = scheme.header();
    let updatable = header.updatable_indices();
    // A key-only scheme has nothing to set; keep the statement valid and
    // binding only the key parameters.
    let set = if updatable.is_empty() {
        let first_key = quote_ident(header.keys()[0]);
        format!("{first_key} = {first_key}")
    } else {
        assignments(header, updatable, 1, ", ")
    };
    format!(
        "UPDATE {} SET {} WHERE {}",
        quote_ident(scheme.store()),
        set,
        assignments(header, header.key_indices(), updatable.len() + 1, " AND ")
    )
}

pub(crate) fn delete_sql(scheme: &Scheme) -> String {
    let header = scheme.header();
    format!(
        "DELETE FROM {} WHERE {}",
        quote_ident(scheme.store()),
        assignments(header, header.key_indices(), 1, " AND ")
    )
}

fn column_type(kind: FieldType) -> &'static str {
    match kind {
        FieldType::Integer | FieldType::Boolean | FieldType::Timestamp => "INTEGER",
        FieldType::Real => "REAL",
        FieldType::Text | FieldType::Uuid => "TEXT",
        FieldType::Blob => "BLOB",
    }
}

pub(crate) fn drop_table_sql(scheme: &Scheme) -> String {
    format!("DROP TABLE IF EXISTS {};", quote_ident(scheme.store()))
}

/// Table DDL derived from the header.
///
/// A serial field becomes SQLite's rowid alias, which cannot be combined
/// with other key columns.
pub(crate) fn create_table_sql(scheme: &Scheme) -> DbResult<String> {
    let header = scheme.header();
    if header.serial().is_some() && header.key_indices().len() > 1 {
        return Err(DbError::UnsupportedScheme {
            scheme: scheme.store().to_string(),
            reason: "a serial field cannot be part of a composite key".to_string(),
        });
    }

    let mut columns: Vec<String> = header
        .fields()
        .iter()
        .map(|field| {
            let mut column = format!("{} {}", quote_ident(field.name()), column_type(field.kind()));
            if field.is_serial() {
                column.push_str(" PRIMARY KEY AUTOINCREMENT");
            } else if field.is_key() {
                column.push_str(" NOT NULL");
            }
            column
        })
        .collect();
    if header.serial().is_none() {
        columns.push(format!(
            "PRIMARY KEY ({})",
            quoted_list(header, header.key_indices())
        ));
    }

    Ok(format!(
        "CREATE TABLE {} (\n    {}\n);",
        quote_ident(scheme.store()),
        columns.join(",\n    ")
    ))
}

#[cfg(test)]
mod tests {
    use super::{
        create_table_sql, delete_sql, insert_sql, quote_ident, select_sql, update_sql,
    };
    use crate::db::DbError;
    use crate::model::header::Field;
    use crate::model::scheme::Scheme;
    use crate::model::value::FieldType;
    use std::sync::Arc;

    fn user() -> Arc<Scheme> {
        Scheme::new(
            "users",
            vec![
                Field::new("id", FieldType::Integer).serial(),
                Field::new("name", FieldType::Text),
                Field::new("email", FieldType::Text),
            ],
        )
        .unwrap()
    }

    fn address() -> Arc<Scheme> {
        Scheme::new(
            "user_addresses",
            vec![
                Field::new("user_id", FieldType::Integer).key(),
                Field::new("address_id", FieldType::Integer).key(),
                Field::new("label", FieldType::Text),
            ],
        )
        .unwrap()
    }

    #[test]
    fn quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn crud_statements_number_parameters_in_bind_order() {
        let scheme = user();
        assert_eq!(
            select_sql(&scheme),
            "SELECT \"id\", \"name\", \"email\" FROM \"users\" WHERE \"id\" = ?1 LIMIT 1"
        );
        assert_eq!(
            insert_sql(&scheme),
            "INSERT INTO \"users\" (\"name\", \"email\") VALUES (?1, ?2)"
        );
        assert_eq!(
            update_sql(&scheme),
            "UPDATE \"users\" SET \"name\" = ?1, \"email\" = ?2 WHERE \"id\" = ?3"
        );
        assert_eq!(delete_sql(&scheme), "DELETE FROM \"users\" WHERE \"id\" = ?1");
    }

    #[test]
    fn composite_keys_join_with_and() {
        let scheme = address();
        assert_eq!(
            delete_sql(&scheme),
            "DELETE FROM \"user_addresses\" WHERE \"user_id\" = ?1 AND \"address_id\" = ?2"
        );
        assert_eq!(
            update_sql(&scheme),
            "UPDATE \"user_addresses\" SET \"label\" = ?1 WHERE \"user_id\" = ?2 AND \"address_id\" = ?3"
        );
    }

    #[test]
    fn key_only_schemes_still_render_valid_writes() {
        let tags = Scheme::new("tags", vec![Field::new("name", FieldType::Text).key()]).unwrap();
        assert_eq!(
            update_sql(&tags),
            "UPDATE \"tags\" SET \"name\" = \"name\" WHERE \"name\" = ?1"
        );
        let counters =
            Scheme::new("counters", vec![Field::new("id", FieldType::Integer).serial()]).unwrap();
        assert_eq!(insert_sql(&counters), "INSERT INTO \"counters\" DEFAULT VALUES");
    }

    #[test]
    fn create_table_uses_rowid_alias_for_serial() {
        let ddl = create_table_sql(&user()).unwrap();
        assert!(ddl.contains("\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(!ddl.contains("PRIMARY KEY (\"id\")"));

        let ddl = create_table_sql(&address()).unwrap();
        assert!(ddl.contains("PRIMARY KEY (\"user_id\", \"address_id\")"));
    }

    #[test]
    fn create_table_rejects_serial_in_composite_key() {
        let scheme = Scheme::new(
            "events",
            vec![
                Field::new("id", FieldType::Integer).serial(),
                Field::new("day", FieldType::Text).key(),
            ],
        )
        .unwrap();
        assert!(matches!(
            create_table_sql(&scheme),
            Err(DbError::UnsupportedScheme { .. })
        ));
    }
}
