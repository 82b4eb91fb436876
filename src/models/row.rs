use rusqlite::types::ValueRef;
use serde::Serialize;

use super::enums::Sex;
use super::field::FieldKind;

/// Rows as displayed: header labels plus rendered text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Rows whose cell under `label` equals `value`.
    pub fn rows_where(&self, label: &str, value: &str) -> Vec<&[String]> {
        match self.column_index(label) {
            Some(idx) => self
                .rows
                .iter()
                .filter(|row| row.get(idx).map(String::as_str) == Some(value))
                .map(Vec::as_slice)
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Render one stored value for display. NULL is always blank; sex
/// columns show their domain token.
pub fn render_cell(kind: FieldKind, value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(n) if kind == FieldKind::Choice2 => {
            Sex::from_storage(n).as_str().to_string()
        }
        ValueRef::Text(t) if kind == FieldKind::Choice2 => {
            let n = std::str::from_utf8(t)
                .ok()
                .and_then(|s| s.trim().parse::<i64>().ok())
                .unwrap_or(0);
            Sex::from_storage(n).as_str().to_string()
        }
        ValueRef::Integer(n) => n.to_string(),
        ValueRef::Real(r) => r.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field::AMOUNT;

    #[test]
    fn sex_cells_render_domain_tokens() {
        assert_eq!(render_cell(FieldKind::Choice2, ValueRef::Integer(1)), "male");
        assert_eq!(render_cell(FieldKind::Choice2, ValueRef::Integer(0)), "female");
        assert_eq!(render_cell(FieldKind::Choice2, ValueRef::Text(b"1")), "male");
    }

    #[test]
    fn null_renders_blank_even_for_sex() {
        assert_eq!(render_cell(FieldKind::Choice2, ValueRef::Null), "");
        assert_eq!(render_cell(FieldKind::Text, ValueRef::Null), "");
    }

    #[test]
    fn plain_values_render_as_text() {
        assert_eq!(render_cell(AMOUNT, ValueRef::Integer(42)), "42");
        assert_eq!(render_cell(FieldKind::Date, ValueRef::Text(b"2025-01-02")), "2025-01-02");
    }

    #[test]
    fn rows_where_matches_by_label() {
        let mut set = RowSet::new(vec!["ID".into(), "Name".into()]);
        set.rows.push(vec!["D1".into(), "Cardiology".into()]);
        set.rows.push(vec!["D2".into(), "Oncology".into()]);
        assert_eq!(set.rows_where("ID", "D2").len(), 1);
        assert!(set.rows_where("Missing", "D2").is_empty());
        assert_eq!(set.len(), 2);
    }
}
