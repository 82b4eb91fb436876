//! Referential checks run in application code before any mutation.
//!
//! Storage may or may not enforce foreign keys itself; these checks give
//! the caller a specific error kind instead of a raw constraint failure.

use rusqlite::types::Value;
use rusqlite::Connection;

use super::input::EntityInput;
use crate::catalog::{self, EntitySchema};
use crate::db::statement;
use crate::db::DatabaseError;
use crate::error::EditorError;

/// Key column/value pairs taken from the input. Every key part is required.
pub fn key_values(
    schema: &EntitySchema,
    input: &EntityInput,
) -> Result<Vec<(&'static str, Value)>, EditorError> {
    schema
        .key_fields()
        .map(|field| match input.get(field.column) {
            Some(value) => Ok((field.column, value.to_sql())),
            None => Err(EditorError::MissingKey {
                label: field.label.to_string(),
            }),
        })
        .collect()
}

/// `col=value, col=value` for messages and prompts.
pub fn describe_key(key: &[(&str, Value)]) -> String {
    key.iter()
        .map(|(column, value)| format!("{column}={}", value_text(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(n) => n.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => String::from_utf8_lossy(b).into_owned(),
    }
}

/// Whether a row matching every key pair exists in `table`.
pub fn exists(conn: &Connection, table: &str, key: &[(&str, Value)]) -> Result<bool, DatabaseError> {
    Ok(statement::count_where(table, key).count(conn)? > 0)
}

/// Entity-specific checks before INSERT: composite keys must be new and
/// checked references must resolve.
pub fn check_add(
    conn: &Connection,
    schema: &EntitySchema,
    input: &EntityInput,
    key: &[(&str, Value)],
) -> Result<(), EditorError> {
    if schema.key.is_composite() && exists(conn, schema.table, key)? {
        return Err(EditorError::DuplicateKey {
            entity: schema.entity.to_string(),
            key: describe_key(key),
        });
    }

    for fk in schema.foreign_keys.iter().filter(|fk| fk.checked_on_add) {
        let Some(value) = input.get(fk.column) else {
            continue;
        };
        let target = catalog::schema(fk.target);
        if !exists(conn, target.table, &[(fk.target_column, value.to_sql())])? {
            return Err(EditorError::ReferentialViolation {
                label: schema
                    .field(fk.column)
                    .map(|f| f.label)
                    .unwrap_or(fk.column)
                    .to_string(),
                value: value.to_string(),
                target: target.entity.to_string(),
            });
        }
    }

    Ok(())
}

/// Refuse deletion while dependent rows still reference the key.
pub fn check_delete(
    conn: &Connection,
    schema: &EntitySchema,
    key: &[(&str, Value)],
) -> Result<(), EditorError> {
    let blockers = catalog::delete_blockers(schema.entity);
    if blockers.is_empty() {
        return Ok(());
    }

    let mut dependents = Vec::with_capacity(blockers.len());
    for (dependent, fk) in blockers {
        let Some((_, value)) = key.iter().find(|(column, _)| *column == fk.target_column) else {
            continue;
        };
        let count = statement::count_where(dependent.table, &[(fk.column, value.clone())])
            .count(conn)
            .map_err(DatabaseError::from)?;
        dependents.push((dependent.table.to_string(), count));
    }

    if dependents.iter().any(|(_, count)| *count > 0) {
        return Err(EditorError::ReferentialConflict {
            entity: schema.entity.to_string(),
            key: describe_key(key),
            dependents,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::schema;
    use crate::db::open_memory_database;
    use crate::models::Entity;

    fn seed(conn: &Connection) {
        conn.execute_batch(
            "INSERT INTO department (dept_id, name) VALUES ('D1', 'Cardiology'), ('D2', 'Empty');
             INSERT INTO doctor (doctor_id, name, dept_id) VALUES ('DR1', 'Ada', 'D1');
             INSERT INTO room (room_id, address, dept_id) VALUES ('R1', 'Ward 3', 'D1'), ('R2', 'Ward 4', 'D1');
             INSERT INTO drug (drug_id, name) VALUES ('G1', 'Aspirin');
             INSERT INTO patient (patient_id, name, doctor_id) VALUES ('P1', 'Lin', 'DR1');
             INSERT INTO patient_drug (drug_id, patient_id, quantity) VALUES ('G1', 'P1', 3);",
        )
        .unwrap();
    }

    fn text(s: &str) -> Value {
        Value::Text(s.into())
    }

    #[test]
    fn missing_key_part_reported_by_label() {
        let mut input = EntityInput::empty(schema(Entity::PatientDrug));
        input.set("drug_id", "G1").unwrap();
        let err = key_values(schema(Entity::PatientDrug), &input).unwrap_err();
        assert!(matches!(err, EditorError::MissingKey { ref label } if label == "Patient ID"));
    }

    #[test]
    fn duplicate_composite_key_rejected() {
        let conn = open_memory_database().unwrap();
        seed(&conn);
        let s = schema(Entity::PatientDrug);
        let mut input = EntityInput::empty(s);
        input.set("drug_id", "G1").unwrap();
        input.set("patient_id", "P1").unwrap();
        let key = key_values(s, &input).unwrap();
        let err = check_add(&conn, s, &input, &key).unwrap_err();
        assert!(matches!(err, EditorError::DuplicateKey { .. }));
    }

    #[test]
    fn unknown_doctor_is_referential_violation() {
        let conn = open_memory_database().unwrap();
        seed(&conn);
        let s = schema(Entity::Patient);
        let mut input = EntityInput::empty(s);
        input.set("patient_id", "P2").unwrap();
        input.set("doctor_id", "DR9").unwrap();
        let key = key_values(s, &input).unwrap();
        let err = check_add(&conn, s, &input, &key).unwrap_err();
        assert_eq!(err.kind(), "ReferentialViolation");
        assert!(err.to_string().contains("DR9"));
    }

    #[test]
    fn blank_doctor_is_not_checked() {
        let conn = open_memory_database().unwrap();
        let s = schema(Entity::Patient);
        let mut input = EntityInput::empty(s);
        input.set("patient_id", "P2").unwrap();
        let key = key_values(s, &input).unwrap();
        assert!(check_add(&conn, s, &input, &key).is_ok());
    }

    #[test]
    fn department_with_dependents_blocked() {
        let conn = open_memory_database().unwrap();
        seed(&conn);
        let err = check_delete(&conn, schema(Entity::Department), &[("dept_id", text("D1"))])
            .unwrap_err();
        match err {
            EditorError::ReferentialConflict { dependents, .. } => {
                assert_eq!(
                    dependents,
                    vec![("doctor".to_string(), 1), ("room".to_string(), 2)]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn department_without_dependents_allowed() {
        let conn = open_memory_database().unwrap();
        seed(&conn);
        assert!(check_delete(&conn, schema(Entity::Department), &[("dept_id", text("D2"))]).is_ok());
    }

    #[test]
    fn describe_key_joins_pairs() {
        assert_eq!(
            describe_key(&[("drug_id", text("G1")), ("patient_id", text("P1"))]),
            "drug_id=G1, patient_id=P1"
        );
    }
}
