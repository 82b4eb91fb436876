use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::Value;
use serde::Serialize;

use super::enums::Sex;
use crate::config::DATE_FORMAT;

/// How a field is entered, validated, bound and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Two-value choice stored as an integer (sex).
    Choice2,
    /// Calendar date stored as `YYYY-MM-DD`.
    Date,
    /// Non-negative integer within `min..=max`.
    BoundedInt { min: u16, max: u16 },
}

/// Bounds shared by age, quantity, stock and price fields.
pub const AMOUNT: FieldKind = FieldKind::BoundedInt { min: 0, max: 999 };

impl FieldKind {
    /// Parse raw text for this kind. Blank input yields `None`.
    pub fn parse(&self, raw: &str) -> Result<Option<FieldValue>, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let value = match self {
            Self::Text => FieldValue::Text(raw.to_string()),
            Self::Choice2 => FieldValue::Sex(
                Sex::from_str(raw).map_err(|_| "expected \"male\" or \"female\"".to_string())?,
            ),
            Self::Date => FieldValue::Date(
                NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .map_err(|_| "expected a date as YYYY-MM-DD".to_string())?,
            ),
            Self::BoundedInt { min, max } => {
                let n: u16 = raw
                    .parse()
                    .map_err(|_| format!("expected a whole number between {min} and {max}"))?;
                if n < *min || n > *max {
                    return Err(format!("{n} is outside {min}..={max}"));
                }
                FieldValue::Int(n)
            }
        };
        Ok(Some(value))
    }

    /// Value a freshly cleared input slot holds.
    pub fn default_value(&self, today: NaiveDate) -> Option<FieldValue> {
        match self {
            Self::Text => None,
            Self::Choice2 => Some(FieldValue::Sex(Sex::Male)),
            Self::Date => Some(FieldValue::Date(today)),
            Self::BoundedInt { min, .. } => Some(FieldValue::Int(*min)),
        }
    }
}

/// A typed input value for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Sex(Sex),
    Date(NaiveDate),
    Int(u16),
}

impl FieldValue {
    /// Storage representation bound as a statement parameter.
    pub fn to_sql(&self) -> Value {
        match self {
            Self::Text(s) => Value::Text(s.clone()),
            Self::Sex(sex) => Value::Integer(sex.to_storage()),
            Self::Date(d) => Value::Text(d.format(DATE_FORMAT).to_string()),
            Self::Int(n) => Value::Integer(i64::from(*n)),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Sex(sex) => f.write_str(sex.as_str()),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}
