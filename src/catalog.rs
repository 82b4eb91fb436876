//! Field catalog: the static per-entity configuration every editor runs on.
//!
//! For each entity: its table, ordered fields (display label, storage
//! column, kind), explicit primary key, and the foreign keys the editor
//! enforces before touching storage. Field order is input order, display
//! order and INSERT column order.

use std::str::FromStr;

use serde::Serialize;

use crate::error::EditorError;
use crate::models::{Entity, FieldKind, AMOUNT};

// ═══════════════════════════════════════════
// Types
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub label: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn new(label: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            label,
            column,
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryKey {
    Single(&'static str),
    /// Ordered key columns.
    Composite(&'static [&'static str]),
}

impl PrimaryKey {
    pub fn columns(&self) -> &[&'static str] {
        match self {
            Self::Single(column) => std::slice::from_ref(column),
            Self::Composite(columns) => *columns,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }
}

/// A reference from one of this entity's columns to another entity's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub column: &'static str,
    pub target: Entity,
    pub target_column: &'static str,
    /// Verify the target exists before INSERT (when the column is non-empty).
    pub checked_on_add: bool,
    /// Refuse to delete the target while rows here still point at it.
    pub blocks_delete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntitySchema {
    pub entity: Entity,
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
    pub key: PrimaryKey,
    pub foreign_keys: &'static [ForeignKey],
}

impl EntitySchema {
    /// Ordered `label -> column` mapping.
    pub fn field_map(&self) -> Vec<(&'static str, &'static str)> {
        self.fields.iter().map(|f| (f.label, f.column)).collect()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.label).collect()
    }

    pub fn field_by_label(&self, label: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.label == label)
    }

    pub fn field(&self, column: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.column == column)
    }

    /// Position of a field addressed by label or by column name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.label == name)
            .or_else(|| self.fields.iter().position(|f| f.column == name))
    }

    pub fn is_key(&self, column: &str) -> bool {
        self.key.columns().contains(&column)
    }

    pub fn key_fields(&self) -> impl Iterator<Item = &'static FieldSpec> + '_ {
        self.key.columns().iter().filter_map(|c| self.field(c))
    }

    pub fn non_key_fields(&self) -> impl Iterator<Item = &'static FieldSpec> + '_ {
        self.fields.iter().filter(|f| !self.is_key(f.column))
    }
}

// ═══════════════════════════════════════════
// Catalog data
// ═══════════════════════════════════════════

const DEPARTMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Department ID", "dept_id", FieldKind::Text),
    FieldSpec::new("Department Name", "name", FieldKind::Text),
    FieldSpec::new("Department Address", "address", FieldKind::Text),
    FieldSpec::new("Department Phone", "phone", FieldKind::Text),
];

const DOCTOR_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Doctor ID", "doctor_id", FieldKind::Text),
    FieldSpec::new("Doctor Name", "name", FieldKind::Text),
    FieldSpec::new("Title", "title", FieldKind::Text),
    FieldSpec::new("Sex", "sex", FieldKind::Choice2),
    FieldSpec::new("Age", "age", AMOUNT),
    FieldSpec::new("Department ID", "dept_id", FieldKind::Text),
];

const PATIENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Patient ID", "patient_id", FieldKind::Text),
    FieldSpec::new("Patient Name", "name", FieldKind::Text),
    FieldSpec::new("Sex", "sex", FieldKind::Choice2),
    FieldSpec::new("Age", "age", AMOUNT),
    FieldSpec::new("Attending Doctor ID", "doctor_id", FieldKind::Text),
    FieldSpec::new("Room ID", "room_id", FieldKind::Text),
    FieldSpec::new("Illness", "illness", FieldKind::Text),
    FieldSpec::new("Admission Date", "admit_date", FieldKind::Date),
    FieldSpec::new("Expected Discharge Date", "expected_discharge_date", FieldKind::Date),
];

const DRUG_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Drug ID", "drug_id", FieldKind::Text),
    FieldSpec::new("Drug Name", "name", FieldKind::Text),
    FieldSpec::new("Manufacturer", "manufacturer", FieldKind::Text),
    FieldSpec::new("Stock Quantity", "stock", AMOUNT),
    FieldSpec::new("Price", "price", AMOUNT),
];

const ROOM_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Room ID", "room_id", FieldKind::Text),
    FieldSpec::new("Room Address", "address", FieldKind::Text),
    FieldSpec::new("Department ID", "dept_id", FieldKind::Text),
];

const PATIENT_DRUG_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Drug ID", "drug_id", FieldKind::Text),
    FieldSpec::new("Patient ID", "patient_id", FieldKind::Text),
    FieldSpec::new("Quantity", "quantity", AMOUNT),
];

static DEPARTMENT: EntitySchema = EntitySchema {
    entity: Entity::Department,
    table: "department",
    fields: DEPARTMENT_FIELDS,
    key: PrimaryKey::Single("dept_id"),
    foreign_keys: &[],
};

static DOCTOR: EntitySchema = EntitySchema {
    entity: Entity::Doctor,
    table: "doctor",
    fields: DOCTOR_FIELDS,
    key: PrimaryKey::Single("doctor_id"),
    foreign_keys: &[ForeignKey {
        column: "dept_id",
        target: Entity::Department,
        target_column: "dept_id",
        checked_on_add: false,
        blocks_delete: true,
    }],
};

static PATIENT: EntitySchema = EntitySchema {
    entity: Entity::Patient,
    table: "patient",
    fields: PATIENT_FIELDS,
    key: PrimaryKey::Single("patient_id"),
    foreign_keys: &[
        ForeignKey {
            column: "doctor_id",
            target: Entity::Doctor,
            target_column: "doctor_id",
            checked_on_add: true,
            blocks_delete: false,
        },
        ForeignKey {
            column: "room_id",
            target: Entity::Room,
            target_column: "room_id",
            checked_on_add: false,
            blocks_delete: false,
        },
    ],
};

static DRUG: EntitySchema = EntitySchema {
    entity: Entity::Drug,
    table: "drug",
    fields: DRUG_FIELDS,
    key: PrimaryKey::Single("drug_id"),
    foreign_keys: &[],
};

static ROOM: EntitySchema = EntitySchema {
    entity: Entity::Room,
    table: "room",
    fields: ROOM_FIELDS,
    key: PrimaryKey::Single("room_id"),
    foreign_keys: &[ForeignKey {
        column: "dept_id",
        target: Entity::Department,
        target_column: "dept_id",
        checked_on_add: false,
        blocks_delete: true,
    }],
};

static PATIENT_DRUG: EntitySchema = EntitySchema {
    entity: Entity::PatientDrug,
    table: "patient_drug",
    fields: PATIENT_DRUG_FIELDS,
    key: PrimaryKey::Composite(&["drug_id", "patient_id"]),
    foreign_keys: &[
        ForeignKey {
            column: "drug_id",
            target: Entity::Drug,
            target_column: "drug_id",
            checked_on_add: false,
            blocks_delete: false,
        },
        ForeignKey {
            column: "patient_id",
            target: Entity::Patient,
            target_column: "patient_id",
            checked_on_add: false,
            blocks_delete: false,
        },
    ],
};

// ═══════════════════════════════════════════
// Lookups
// ═══════════════════════════════════════════

pub fn schema(entity: Entity) -> &'static EntitySchema {
    match entity {
        Entity::Department => &DEPARTMENT,
        Entity::Doctor => &DOCTOR,
        Entity::Patient => &PATIENT,
        Entity::Drug => &DRUG,
        Entity::Room => &ROOM,
        Entity::PatientDrug => &PATIENT_DRUG,
    }
}

/// Resolve an entity by display name or table name.
pub fn schema_named(name: &str) -> Result<&'static EntitySchema, EditorError> {
    let name = name.trim();
    if let Ok(entity) = Entity::from_str(name) {
        return Ok(schema(entity));
    }
    Entity::ALL
        .iter()
        .map(|e| schema(*e))
        .find(|s| s.table == name)
        .ok_or_else(|| EditorError::NotConfigured(name.to_string()))
}

/// Ordered `label -> column` mapping for an entity.
pub fn fields(entity_name: &str) -> Result<Vec<(&'static str, &'static str)>, EditorError> {
    Ok(schema_named(entity_name)?.field_map())
}

/// Every `(schema, foreign key)` that blocks deleting `target`.
pub fn delete_blockers(target: Entity) -> Vec<(&'static EntitySchema, &'static ForeignKey)> {
    Entity::ALL
        .iter()
        .map(|e| schema(*e))
        .flat_map(|s| s.foreign_keys.iter().map(move |fk| (s, fk)))
        .filter(|(_, fk)| fk.target == target && fk.blocks_delete)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_by_label_convention(label: &str) -> FieldKind {
        let label = label.to_lowercase();
        if label.contains("sex") {
            FieldKind::Choice2
        } else if label.contains("date") {
            FieldKind::Date
        } else if ["age", "quantity", "price"].iter().any(|w| label.contains(w)) {
            AMOUNT
        } else {
            FieldKind::Text
        }
    }

    #[test]
    fn every_entity_is_configured() {
        for entity in Entity::ALL {
            let schema = schema(entity);
            assert_eq!(schema.entity, entity);
            assert!(!schema.fields.is_empty());
        }
    }

    #[test]
    fn declared_kinds_follow_label_convention() {
        for entity in Entity::ALL {
            for field in schema(entity).fields {
                assert_eq!(
                    field.kind,
                    kind_by_label_convention(field.label),
                    "{entity}.{}",
                    field.column
                );
            }
        }
    }

    #[test]
    fn keys_reference_declared_fields() {
        for entity in Entity::ALL {
            let schema = schema(entity);
            assert_eq!(schema.key_fields().count(), schema.key.columns().len());
            for fk in schema.foreign_keys {
                assert!(schema.field(fk.column).is_some());
                assert!(super::schema(fk.target).field(fk.target_column).is_some());
            }
        }
    }

    #[test]
    fn labels_are_unique_within_entity() {
        for entity in Entity::ALL {
            let mut labels = schema(entity).labels();
            let total = labels.len();
            labels.sort_unstable();
            labels.dedup();
            assert_eq!(labels.len(), total, "{entity}");
        }
    }

    #[test]
    fn department_field_order() {
        let map = fields("Department").unwrap();
        assert_eq!(
            map.iter().map(|(_, c)| *c).collect::<Vec<_>>(),
            vec!["dept_id", "name", "address", "phone"]
        );
    }

    #[test]
    fn patient_drug_has_composite_key() {
        let schema = schema(Entity::PatientDrug);
        assert!(schema.key.is_composite());
        assert_eq!(schema.key.columns(), &["drug_id", "patient_id"]);
        assert_eq!(
            schema.non_key_fields().map(|f| f.column).collect::<Vec<_>>(),
            vec!["quantity"]
        );
    }

    #[test]
    fn lookup_by_table_name() {
        assert_eq!(schema_named("patient_drug").unwrap().entity, Entity::PatientDrug);
    }

    #[test]
    fn unknown_entity_not_configured() {
        let err = fields("Pharmacy").unwrap_err();
        assert!(matches!(err, EditorError::NotConfigured(ref n) if n == "Pharmacy"));
    }

    #[test]
    fn position_accepts_label_or_column() {
        let schema = schema(Entity::Patient);
        assert_eq!(schema.position("Room ID"), Some(5));
        assert_eq!(schema.position("room_id"), Some(5));
        assert_eq!(schema.position("ward"), None);
    }

    #[test]
    fn department_deletion_blocked_by_doctor_and_room() {
        let tables: Vec<&str> = delete_blockers(Entity::Department)
            .iter()
            .map(|(s, _)| s.table)
            .collect();
        assert_eq!(tables, vec!["doctor", "room"]);
        assert!(delete_blockers(Entity::Drug).is_empty());
    }
}
