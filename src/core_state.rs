//! Application state shared by every editor session.
//!
//! `CoreState` owns the one database connection. Editors opened from it
//! share that connection, so a write through one editor is visible to the
//! next reload of any other.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::catalog;
use crate::db::{self, SharedConnection};
use crate::editor::EntityEditor;
use crate::error::EditorError;
use crate::models::Entity;

/// Menu entry for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySummary {
    pub entity: Entity,
    pub table: &'static str,
    pub field_count: usize,
    pub row_count: i64,
}

pub struct CoreState {
    conn: SharedConnection,
    /// `None` for in-memory state.
    db_path: Option<PathBuf>,
}

impl CoreState {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let conn = db::open_database(path)?;
        tracing::info!(path = %path.display(), "Hospital database opened");
        Ok(Self {
            conn: db::share(conn),
            db_path: Some(path.to_path_buf()),
        })
    }

    pub fn in_memory() -> Result<Self, CoreError> {
        Ok(Self {
            conn: db::share(db::open_memory_database()?),
            db_path: None,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Handle to the shared connection.
    pub fn connection(&self) -> SharedConnection {
        self.conn.clone()
    }

    /// Entities in menu order with their current row counts.
    pub fn entities(&self) -> Result<Vec<EntitySummary>, CoreError> {
        let conn = self.conn.lock().map_err(|_| CoreError::LockPoisoned)?;
        Entity::ALL
            .iter()
            .map(|entity| {
                let schema = catalog::schema(*entity);
                Ok(EntitySummary {
                    entity: *entity,
                    table: schema.table,
                    field_count: schema.fields.len(),
                    row_count: db::count_rows(&conn, schema.table)?,
                })
            })
            .collect()
    }

    /// Editor for an entity named by display or table name.
    pub fn open_editor(&self, entity_name: &str) -> Result<EntityEditor, EditorError> {
        let editor = EntityEditor::open(self.connection(), entity_name)?;
        tracing::debug!(entity = %editor.entity(), "Editor opened");
        Ok(editor)
    }
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}
