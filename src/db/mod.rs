pub mod sqlite;
pub mod statement;

pub use sqlite::*;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use thiserror::Error;

/// Connection handle shared by every editor opened from one workspace.
pub type SharedConnection = Arc<Mutex<Connection>>;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Schema setup failed: {reason}")]
    SchemaFailed { reason: String },

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Connection lock poisoned")]
    LockPoisoned,
}
