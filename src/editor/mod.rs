//! Generic entity editor: add / query / update / delete for one entity,
//! driven entirely by the field catalog and join definitions.
//!
//! Every mutation runs inside a transaction: explicit commit on success,
//! explicit rollback before any error is returned. After a successful
//! mutation the inputs are cleared and the displayed rows reloaded.

pub mod input;
pub mod integrity;

pub use input::EntityInput;

use chrono::{Local, NaiveDate};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction};

use crate::catalog::{self, EntitySchema};
use crate::db::statement::{self, ColumnRef, Predicate, SelectQuery, Statement, TableRef};
use crate::db::{DatabaseError, SharedConnection};
use crate::error::EditorError;
use crate::joins::{self, JoinDefinition};
use crate::models::{render_cell, Entity, FieldKind, RowSet, Sex};

// ═══════════════════════════════════════════
// Outcomes
// ═══════════════════════════════════════════

/// Result of a filtered query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Rows are displayed.
    Rows(usize),
    /// The filter matched nothing; the empty set is displayed.
    NoMatch { label: String, value: String },
}

/// Result of a committed add or update.
#[derive(Debug)]
pub struct MutationOutcome {
    pub affected: usize,
    /// Set when the post-commit reload failed; the write itself stands.
    pub reload_error: Option<EditorError>,
}

/// Result of a delete request.
#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted(MutationOutcome),
    /// The caller declined the confirmation; nothing was touched.
    Cancelled,
}

/// What the presentation layer is asked to confirm before a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePrompt {
    pub entity: Entity,
    /// `column=value` pairs of the targeted row.
    pub key: String,
}

impl std::fmt::Display for DeletePrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Delete {} record [{}]?", self.entity, self.key)
    }
}

/// Yes/no decision injected by the presentation layer.
pub trait DeleteConfirmation {
    fn confirm(&mut self, prompt: &DeletePrompt) -> bool;
}

impl<F> DeleteConfirmation for F
where
    F: FnMut(&DeletePrompt) -> bool,
{
    fn confirm(&mut self, prompt: &DeletePrompt) -> bool {
        self(prompt)
    }
}

// ═══════════════════════════════════════════
// EntityEditor
// ═══════════════════════════════════════════

pub struct EntityEditor {
    schema: &'static EntitySchema,
    view: Option<&'static JoinDefinition>,
    conn: SharedConnection,
    inputs: EntityInput,
    filter_value: String,
    rows: RowSet,
}

impl EntityEditor {
    /// Bind an editor to an entity (by display or table name) over a
    /// shared connection. Nothing is loaded yet.
    pub fn open(conn: SharedConnection, entity_name: &str) -> Result<Self, EditorError> {
        let schema = catalog::schema_named(entity_name)?;
        let view = joins::join_definition(schema.entity);
        let labels = match view {
            Some(def) => def.labels(),
            None => schema.labels(),
        };
        Ok(Self {
            schema,
            view,
            conn,
            inputs: EntityInput::with_defaults(schema, today()),
            filter_value: String::new(),
            rows: RowSet::new(labels.into_iter().map(String::from).collect()),
        })
    }

    pub fn entity(&self) -> Entity {
        self.schema.entity
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    /// Currently displayed rows.
    pub fn rows(&self) -> &RowSet {
        &self.rows
    }

    pub fn inputs(&self) -> &EntityInput {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut EntityInput {
        &mut self.inputs
    }

    /// Pending filter text typed by the user.
    pub fn filter_value(&self) -> &str {
        &self.filter_value
    }

    pub fn set_filter_value(&mut self, value: &str) {
        self.filter_value = value.to_string();
    }

    /// Reset every input slot to its kind default and drop the pending filter.
    pub fn clear_inputs(&mut self) {
        self.inputs.reset(today());
        self.filter_value.clear();
    }

    // ── Reads ───────────────────────────────────────────────

    /// Reload every row. On failure the previous rows stay displayed.
    pub fn load_all(&mut self) -> Result<&RowSet, EditorError> {
        let rows = self.fetch(None)?;
        self.rows = rows;
        Ok(&self.rows)
    }

    /// Substring filter on one field. A blank value reloads everything.
    pub fn query(&mut self, label: &str, raw_value: &str) -> Result<QueryOutcome, EditorError> {
        let raw_value = raw_value.trim();
        if raw_value.is_empty() {
            let count = self.load_all()?.len();
            return Ok(QueryOutcome::Rows(count));
        }

        let field = self
            .schema
            .field_by_label(label)
            .or_else(|| self.schema.field(label))
            .ok_or_else(|| EditorError::InvalidInput {
                field: label.to_string(),
                reason: format!("no such field on {}", self.schema.entity),
            })?;

        let needle = match field.kind {
            FieldKind::Choice2 => raw_value
                .parse::<Sex>()
                .map_err(|_| EditorError::InvalidInput {
                    field: field.label.to_string(),
                    reason: "enter \"male\" or \"female\"".into(),
                })?
                .to_storage()
                .to_string(),
            _ => raw_value.to_string(),
        };

        let rows = self.fetch(Some((field.column, needle)))?;
        self.rows = rows;
        if self.rows.is_empty() {
            return Ok(QueryOutcome::NoMatch {
                label: field.label.to_string(),
                value: raw_value.to_string(),
            });
        }
        Ok(QueryOutcome::Rows(self.rows.len()))
    }

    // ── Mutations ───────────────────────────────────────────

    /// Insert one row built from every field in catalog order.
    pub fn add(&mut self, input: &EntityInput) -> Result<MutationOutcome, EditorError> {
        let schema = self.schema;
        let input = self.checked(input)?;
        let key = integrity::key_values(schema, input)?;

        let affected = self.in_transaction("add", |tx| {
            integrity::check_add(tx, schema, input, &key)?;
            let row = input
                .iter()
                .map(|(field, value)| (field.column, value.map_or(Value::Null, |v| v.to_sql())))
                .collect();
            Ok(statement::insert(schema.table, row).execute(tx)?)
        })?;

        tracing::info!(entity = %schema.entity, key = %integrity::describe_key(&key), "Record added");
        Ok(self.finish(affected))
    }

    /// Overwrite the non-key fields that have a value; empty slots are left
    /// unchanged.
    pub fn update(&mut self, input: &EntityInput) -> Result<MutationOutcome, EditorError> {
        let schema = self.schema;
        let input = self.checked(input)?;
        let key = integrity::key_values(schema, input)?;

        let affected = self.in_transaction("update", |tx| {
            if !integrity::exists(tx, schema.table, &key)? {
                return Err(EditorError::NotFound {
                    entity: schema.entity.to_string(),
                    key: integrity::describe_key(&key),
                });
            }

            let set: Vec<(&str, Value)> = input
                .iter()
                .filter(|(field, _)| !schema.is_key(field.column))
                .filter_map(|(field, value)| value.map(|v| (field.column, v.to_sql())))
                .collect();
            if set.is_empty() {
                return Err(EditorError::NoFieldsToUpdate);
            }

            Ok(statement::update(schema.table, set, &key).execute(tx)?)
        })?;

        tracing::info!(entity = %schema.entity, key = %integrity::describe_key(&key), affected, "Record updated");
        Ok(self.finish(affected))
    }

    /// Delete the row addressed by the key inputs after the caller confirms.
    pub fn delete(
        &mut self,
        input: &EntityInput,
        confirmation: &mut dyn DeleteConfirmation,
    ) -> Result<DeleteOutcome, EditorError> {
        let schema = self.schema;
        let input = self.checked(input)?;
        let key = integrity::key_values(schema, input)?;

        {
            let conn = self.lock()?;
            integrity::check_delete(&conn, schema, &key)?;
            if !integrity::exists(&conn, schema.table, &key)? {
                return Err(EditorError::NotFound {
                    entity: schema.entity.to_string(),
                    key: integrity::describe_key(&key),
                });
            }
        }

        let prompt = DeletePrompt {
            entity: schema.entity,
            key: integrity::describe_key(&key),
        };
        if !confirmation.confirm(&prompt) {
            tracing::debug!(entity = %schema.entity, "Delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        let affected = self.in_transaction("delete", |tx| {
            Ok(statement::delete(schema.table, &key).execute(tx)?)
        })?;

        tracing::info!(entity = %schema.entity, key = %prompt.key, affected, "Record deleted");
        Ok(DeleteOutcome::Deleted(self.finish(affected)))
    }

    // ── Internals ───────────────────────────────────────────

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, EditorError> {
        self.conn
            .lock()
            .map_err(|_| EditorError::Storage(DatabaseError::LockPoisoned))
    }

    /// Inputs must have been built for this editor's entity.
    fn checked<'i>(&self, input: &'i EntityInput) -> Result<&'i EntityInput, EditorError> {
        if input.schema().entity != self.schema.entity {
            return Err(EditorError::InvalidInput {
                field: input.schema().entity.to_string(),
                reason: format!("inputs do not belong to {}", self.schema.entity),
            });
        }
        Ok(input)
    }

    fn in_transaction<T>(
        &self,
        operation: &str,
        body: impl FnOnce(&Transaction<'_>) -> Result<T, EditorError>,
    ) -> Result<T, EditorError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;
        match body(&tx) {
            Ok(value) => {
                tx.commit().map_err(DatabaseError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback() {
                    tracing::error!(operation, "Rollback failed: {rollback}");
                }
                tracing::warn!(entity = %self.schema.entity, operation, kind = err.kind(), "Rolled back: {err}");
                Err(err)
            }
        }
    }

    /// Post-commit bookkeeping: clear inputs, reload rows.
    fn finish(&mut self, affected: usize) -> MutationOutcome {
        self.clear_inputs();
        let reload_error = self.load_all().err();
        if let Some(e) = &reload_error {
            tracing::warn!(entity = %self.schema.entity, "Reload after commit failed: {e}");
        }
        MutationOutcome {
            affected,
            reload_error,
        }
    }

    fn select(&self) -> (SelectQuery<'static>, Vec<String>, Vec<FieldKind>, &'static str) {
        match self.view {
            Some(def) => (
                def.select(),
                def.labels().into_iter().map(String::from).collect(),
                def.kinds(),
                def.base_alias(),
            ),
            None => {
                let query = self.schema.fields.iter().fold(
                    SelectQuery::from(TableRef::new(self.schema.table)),
                    |q, f| q.column(ColumnRef::bare(f.column)),
                );
                (
                    query,
                    self.schema.labels().into_iter().map(String::from).collect(),
                    self.schema.fields.iter().map(|f| f.kind).collect(),
                    self.schema.table,
                )
            }
        }
    }

    fn fetch(&self, filter: Option<(&'static str, String)>) -> Result<RowSet, EditorError> {
        let (query, labels, kinds, qualifier) = self.select();
        let query = match filter {
            Some((column, needle)) => query.filter(Predicate::Contains(
                ColumnRef::qualified(qualifier, column),
                needle,
            )),
            None => query,
        };
        let stmt = query.build();
        let conn = self.lock()?;
        read_rows(&conn, &stmt, labels, &kinds).map_err(|e| {
            tracing::warn!(entity = %self.schema.entity, "Load failed: {e}");
            EditorError::from(e)
        })
    }
}

fn read_rows(
    conn: &Connection,
    stmt: &Statement,
    labels: Vec<String>,
    kinds: &[FieldKind],
) -> Result<RowSet, DatabaseError> {
    tracing::debug!(sql = %stmt.sql, "query");
    let mut prepared = conn.prepare(&stmt.sql)?;
    let mut cursor = prepared.query(params_from_iter(stmt.params.iter()))?;
    let mut set = RowSet::new(labels);
    while let Some(row) = cursor.next()? {
        let mut cells = Vec::with_capacity(kinds.len());
        for (idx, kind) in kinds.iter().enumerate() {
            cells.push(render_cell(*kind, row.get_ref(idx)?));
        }
        set.rows.push(cells);
    }
    Ok(set)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
