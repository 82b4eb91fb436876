//! Join definitions: read-only display queries for entities whose rows
//! only make sense next to related records.
//!
//! Doctor rows show their department; Patient rows show attending doctor,
//! that doctor's department and the room. Filters on these views are
//! always qualified with the entity's own alias.

use serde::Serialize;

use crate::db::statement::{ColumnRef, JoinClause, JoinKind, SelectQuery, TableRef};
use crate::models::{Entity, FieldKind, AMOUNT};

/// One displayed column: `alias.column AS label`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JoinColumn {
    pub alias: &'static str,
    pub column: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

const fn col(alias: &'static str, column: &'static str, label: &'static str, kind: FieldKind) -> JoinColumn {
    JoinColumn {
        alias,
        column,
        label,
        kind,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinDefinition {
    pub entity: Entity,
    /// The entity's own table and alias.
    pub base: TableRef<'static>,
    pub joins: &'static [JoinClause<'static>],
    pub columns: &'static [JoinColumn],
}

impl JoinDefinition {
    /// Alias that qualifies predicates on the entity's own fields.
    pub fn base_alias(&self) -> &'static str {
        self.base.alias.unwrap_or(self.base.table)
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.label).collect()
    }

    pub fn kinds(&self) -> Vec<FieldKind> {
        self.columns.iter().map(|c| c.kind).collect()
    }

    /// Unfiltered select over the joined tables.
    pub fn select(&self) -> SelectQuery<'static> {
        let query = self
            .joins
            .iter()
            .fold(SelectQuery::from(self.base), |q, join| q.join(*join));
        self.columns.iter().fold(query, |q, c| {
            q.column(ColumnRef::qualified(c.alias, c.column))
        })
    }

    /// Query text with table aliases, and display labels.
    pub fn query_text(&self) -> (String, Vec<&'static str>) {
        (self.select().build().sql, self.labels())
    }
}

static DOCTOR_VIEW: JoinDefinition = JoinDefinition {
    entity: Entity::Doctor,
    base: TableRef::aliased("doctor", "d"),
    joins: &[JoinClause {
        kind: JoinKind::Left,
        table: TableRef::aliased("department", "de"),
        left: ColumnRef::qualified("d", "dept_id"),
        right: ColumnRef::qualified("de", "dept_id"),
    }],
    columns: &[
        col("d", "doctor_id", "Doctor ID", FieldKind::Text),
        col("d", "name", "Doctor Name", FieldKind::Text),
        col("d", "title", "Title", FieldKind::Text),
        col("d", "sex", "Sex", FieldKind::Choice2),
        col("d", "age", "Age", AMOUNT),
        col("d", "dept_id", "Department ID", FieldKind::Text),
        col("de", "name", "Department Name", FieldKind::Text),
        col("de", "address", "Department Address", FieldKind::Text),
    ],
};

static PATIENT_VIEW: JoinDefinition = JoinDefinition {
    entity: Entity::Patient,
    base: TableRef::aliased("patient", "p"),
    joins: &[
        JoinClause {
            kind: JoinKind::Left,
            table: TableRef::aliased("doctor", "d"),
            left: ColumnRef::qualified("p", "doctor_id"),
            right: ColumnRef::qualified("d", "doctor_id"),
        },
        JoinClause {
            kind: JoinKind::Left,
            table: TableRef::aliased("department", "de"),
            left: ColumnRef::qualified("d", "dept_id"),
            right: ColumnRef::qualified("de", "dept_id"),
        },
        JoinClause {
            kind: JoinKind::Left,
            table: TableRef::aliased("room", "r"),
            left: ColumnRef::qualified("p", "room_id"),
            right: ColumnRef::qualified("r", "room_id"),
        },
    ],
    columns: &[
        col("p", "patient_id", "Patient ID", FieldKind::Text),
        col("p", "name", "Patient Name", FieldKind::Text),
        col("p", "sex", "Sex", FieldKind::Choice2),
        col("p", "age", "Age", AMOUNT),
        col("p", "doctor_id", "Attending Doctor ID", FieldKind::Text),
        col("d", "name", "Attending Doctor", FieldKind::Text),
        col("d", "dept_id", "Department ID", FieldKind::Text),
        col("de", "name", "Department Name", FieldKind::Text),
        col("p", "room_id", "Room ID", FieldKind::Text),
        col("r", "address", "Room Address", FieldKind::Text),
        col("p", "illness", "Illness", FieldKind::Text),
        col("p", "admit_date", "Admission Date", FieldKind::Date),
        col("p", "expected_discharge_date", "Expected Discharge Date", FieldKind::Date),
    ],
};

/// Join definition for an entity, if its display needs one.
pub fn join_definition(entity: Entity) -> Option<&'static JoinDefinition> {
    match entity {
        Entity::Doctor => Some(&DOCTOR_VIEW),
        Entity::Patient => Some(&PATIENT_VIEW),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::db::open_memory_database;

    #[test]
    fn only_doctor_and_patient_are_joined() {
        let joined: Vec<Entity> = Entity::ALL
            .into_iter()
            .filter(|e| join_definition(*e).is_some())
            .collect();
        assert_eq!(joined, vec![Entity::Doctor, Entity::Patient]);
    }

    #[test]
    fn doctor_query_text() {
        let (sql, labels) = join_definition(Entity::Doctor).unwrap().query_text();
        assert_eq!(
            sql,
            "SELECT d.doctor_id, d.name, d.title, d.sex, d.age, d.dept_id, de.name, de.address \
             FROM doctor d LEFT JOIN department de ON d.dept_id = de.dept_id"
        );
        assert_eq!(labels.len(), 8);
    }

    #[test]
    fn room_is_left_joined_for_patients() {
        let (sql, _) = join_definition(Entity::Patient).unwrap().query_text();
        assert!(sql.contains("LEFT JOIN room r ON p.room_id = r.room_id"));
    }

    #[test]
    fn base_alias_columns_are_entity_fields() {
        for entity in [Entity::Doctor, Entity::Patient] {
            let def = join_definition(entity).unwrap();
            let schema = catalog::schema(entity);
            assert_eq!(def.base.table, schema.table);
            for c in def.columns.iter().filter(|c| c.alias == def.base_alias()) {
                let field = schema.field(c.column).unwrap();
                assert_eq!(field.label, c.label);
                assert_eq!(field.kind, c.kind);
            }
        }
    }

    #[test]
    fn join_queries_prepare_against_schema() {
        let conn = open_memory_database().unwrap();
        for entity in [Entity::Doctor, Entity::Patient] {
            let (sql, labels) = join_definition(entity).unwrap().query_text();
            let stmt = conn.prepare(&sql).unwrap();
            assert_eq!(stmt.column_count(), labels.len());
        }
    }
}
