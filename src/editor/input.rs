use chrono::NaiveDate;

use crate::catalog::{EntitySchema, FieldSpec};
use crate::error::EditorError;
use crate::models::FieldValue;

/// One typed slot per field of an entity, in catalog order. `None` is an
/// empty input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInput {
    schema: &'static EntitySchema,
    slots: Vec<Option<FieldValue>>,
}

impl EntityInput {
    /// All slots empty.
    pub fn empty(schema: &'static EntitySchema) -> Self {
        Self {
            schema,
            slots: vec![None; schema.fields.len()],
        }
    }

    /// All slots at their kind default.
    pub fn with_defaults(schema: &'static EntitySchema, today: NaiveDate) -> Self {
        let mut input = Self::empty(schema);
        input.reset(today);
        input
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    /// Reset every slot to its kind default.
    pub fn reset(&mut self, today: NaiveDate) {
        for (slot, field) in self.slots.iter_mut().zip(self.schema.fields) {
            *slot = field.kind.default_value(today);
        }
    }

    /// Parse raw text into the slot addressed by label or column name.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<(), EditorError> {
        let (idx, field) = self.locate(name)?;
        let value = field
            .kind
            .parse(raw)
            .map_err(|reason| EditorError::InvalidInput {
                field: field.label.to_string(),
                reason,
            })?;
        self.slots[idx] = value;
        Ok(())
    }

    pub fn clear(&mut self, name: &str) -> Result<(), EditorError> {
        let (idx, _) = self.locate(name)?;
        self.slots[idx] = None;
        Ok(())
    }

    /// Value held for a column (or label), if any.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.schema
            .position(name)
            .and_then(|idx| self.slots[idx].as_ref())
    }

    /// Text value of a slot, blank when empty.
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(|v| v.to_string()).unwrap_or_default()
    }

    /// `(field, slot)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static FieldSpec, Option<&FieldValue>)> + '_ {
        self.schema
            .fields
            .iter()
            .zip(self.slots.iter().map(Option::as_ref))
    }

    fn locate(&self, name: &str) -> Result<(usize, &'static FieldSpec), EditorError> {
        let idx = self
            .schema
            .position(name)
            .ok_or_else(|| EditorError::InvalidInput {
                field: name.to_string(),
                reason: format!("no such field on {}", self.schema.entity),
            })?;
        Ok((idx, &self.schema.fields[idx]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::schema;
    use crate::models::{Entity, Sex};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn empty_input_has_no_values() {
        let input = EntityInput::empty(schema(Entity::Doctor));
        assert!(input.iter().all(|(_, v)| v.is_none()));
    }

    #[test]
    fn defaults_follow_field_kinds() {
        let input = EntityInput::with_defaults(schema(Entity::Patient), today());
        assert_eq!(input.get("name"), None);
        assert_eq!(input.get("Sex"), Some(&FieldValue::Sex(Sex::Male)));
        assert_eq!(input.get("age"), Some(&FieldValue::Int(0)));
        assert_eq!(input.get("admit_date"), Some(&FieldValue::Date(today())));
    }

    #[test]
    fn set_by_label_or_column() {
        let mut input = EntityInput::empty(schema(Entity::Doctor));
        input.set("Doctor ID", "DR1").unwrap();
        input.set("sex", "female").unwrap();
        assert_eq!(input.text("doctor_id"), "DR1");
        assert_eq!(input.text("Sex"), "female");
    }

    #[test]
    fn invalid_raw_value_reports_label() {
        let mut input = EntityInput::empty(schema(Entity::Doctor));
        let err = input.set("age", "old").unwrap_err();
        assert!(matches!(err, EditorError::InvalidInput { ref field, .. } if field == "Age"));
    }

    #[test]
    fn unknown_field_rejected() {
        let mut input = EntityInput::empty(schema(Entity::Room));
        assert!(input.set("Bed Count", "4").is_err());
    }

    #[test]
    fn blank_text_clears_slot() {
        let mut input = EntityInput::empty(schema(Entity::Room));
        input.set("Room Address", "Ward 3").unwrap();
        input.set("Room Address", "  ").unwrap();
        assert_eq!(input.get("address"), None);
    }
}
