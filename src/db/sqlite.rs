use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing;

use super::{DatabaseError, SharedConnection};

/// Tables the schema bootstrap must produce.
pub const HOSPITAL_TABLES: &[&str] = &[
    "department",
    "doctor",
    "patient",
    "drug",
    "room",
    "patient_drug",
];

/// Open a SQLite connection to the given path and ensure the schema exists
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Wrap a connection so several editors can hold it at once.
pub fn share(conn: Connection) -> SharedConnection {
    Arc::new(Mutex::new(conn))
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    // Substring filters are case-sensitive.
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;
         PRAGMA case_sensitive_like=ON;"
    )?;
    Ok(())
}

/// Create any missing hospital table. Idempotent.
pub fn ensure_schema(conn: &Connection) -> Result<(), DatabaseError> {
    let existing = count_tables(conn)?;
    conn.execute_batch(include_str!("../../resources/schema.sql"))
        .map_err(|e| DatabaseError::SchemaFailed {
            reason: e.to_string(),
        })?;
    if existing == 0 {
        tracing::info!("Created hospital schema");
    }
    Ok(())
}

/// Count tables in the database (for verification)
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

/// Count rows of one of the hospital tables.
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64, DatabaseError> {
    if !HOSPITAL_TABLES.contains(&table) {
        return Err(DatabaseError::UnknownTable(table.to_string()));
    }
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_initializes_all_tables() {
        let conn = open_memory_database().unwrap();
        let count = count_tables(&conn).unwrap();
        assert_eq!(count, HOSPITAL_TABLES.len() as i64);
    }

    #[test]
    fn schema_idempotent() {
        let conn = open_memory_database().unwrap();
        assert!(ensure_schema(&conn).is_ok());
        assert_eq!(count_tables(&conn).unwrap(), 6);
    }

    #[test]
    fn foreign_keys_enabled() {
        let conn = open_memory_database().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn file_database_persists_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hospital.db");
        {
            let conn = open_database(&path).unwrap();
            conn.execute(
                "INSERT INTO department (dept_id, name) VALUES ('D1', 'Cardiology')",
                [],
            )
            .unwrap();
        }
        let conn = open_database(&path).unwrap();
        assert_eq!(count_rows(&conn, "department").unwrap(), 1);
    }

    #[test]
    fn count_rows_rejects_unknown_table() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(
            count_rows(&conn, "sqlite_master"),
            Err(DatabaseError::UnknownTable(ref t)) if t == "sqlite_master"
        ));
    }

    #[test]
    fn department_delete_blocked_by_storage_foreign_key() {
        let conn = open_memory_database().unwrap();
        conn.execute_batch(
            "INSERT INTO department (dept_id, name) VALUES ('D1', 'Cardiology');
             INSERT INTO room (room_id, address, dept_id) VALUES ('R1', 'Ward 3', 'D1');",
        )
        .unwrap();
        let result = conn.execute("DELETE FROM department WHERE dept_id = 'D1'", []);
        assert!(result.is_err());
    }
}
