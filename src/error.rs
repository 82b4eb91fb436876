use thiserror::Error;

use crate::db::DatabaseError;

/// Outcome kinds of an editor operation. Every variant is reported to the
/// caller; none are retried.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("No field configuration for {0}")]
    NotConfigured(String),

    #[error("Key field {label} must not be empty")]
    MissingKey { label: String },

    #[error("{entity} record {key} already exists")]
    DuplicateKey { entity: String, key: String },

    #[error("{label} {value} does not exist in {target}; add it there first")]
    ReferentialViolation {
        label: String,
        value: String,
        target: String,
    },

    #[error("{entity} {key} is still referenced by {}", format_dependents(.dependents))]
    ReferentialConflict {
        entity: String,
        key: String,
        dependents: Vec<(String, i64)>,
    },

    #[error("{entity} record {key} not found")]
    NotFound { entity: String, key: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Enter at least one field to update")]
    NoFieldsToUpdate,

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

impl From<rusqlite::Error> for EditorError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(DatabaseError::Sqlite(e))
    }
}

impl EditorError {
    /// Stable kind name shown alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConfigured(_) => "NotConfigured",
            Self::MissingKey { .. } => "MissingKey",
            Self::DuplicateKey { .. } => "DuplicateKey",
            Self::ReferentialViolation { .. } => "ReferentialViolation",
            Self::ReferentialConflict { .. } => "ReferentialConflict",
            Self::NotFound { .. } => "NotFound",
            Self::InvalidInput { .. } => "InvalidInput",
            Self::NoFieldsToUpdate => "NoFieldsToUpdate",
            Self::Storage(_) => "StorageError",
        }
    }
}

fn format_dependents(dependents: &[(String, i64)]) -> String {
    dependents
        .iter()
        .map(|(table, count)| format!("{count} {table} row(s)"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_lists_every_dependent() {
        let err = EditorError::ReferentialConflict {
            entity: "Department".into(),
            key: "dept_id=D1".into(),
            dependents: vec![("doctor".into(), 2), ("room".into(), 0)],
        };
        assert_eq!(
            err.to_string(),
            "Department dept_id=D1 is still referenced by 2 doctor row(s), 0 room row(s)"
        );
        assert_eq!(err.kind(), "ReferentialConflict");
    }

    #[test]
    fn sqlite_errors_become_storage_errors() {
        let err: EditorError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.kind(), "StorageError");
        assert!(err.to_string().starts_with("Storage error"));
    }
}
