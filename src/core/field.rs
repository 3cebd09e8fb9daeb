//! Field value types used by filtering and ordering

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Compare two values of the same kind. Mixed kinds are unordered.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::String(a), FieldValue::String(b)) => Some(a.cmp(b)),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// The declared type of a filterable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Boolean,
    DateTime,
}

impl FieldKind {
    /// Parse a raw query-string value into a value of this kind
    pub fn parse(self, raw: &str) -> Result<FieldValue, String> {
        match self {
            FieldKind::String => Ok(FieldValue::String(raw.to_string())),
            FieldKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| "Enter a number.".to_string()),
            FieldKind::Boolean => match raw.trim() {
                "true" | "True" | "1" => Ok(FieldValue::Boolean(true)),
                "false" | "False" | "0" => Ok(FieldValue::Boolean(false)),
                _ => Err("Select a valid choice.".to_string()),
            },
            FieldKind::DateTime => parse_datetime(raw.trim())
                .map(FieldValue::DateTime)
                .ok_or_else(|| "Enter a valid date/time.".to_string()),
        }
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Dynamic field access for records that can be filtered and ordered
pub trait Filterable {
    /// Declared kind of a field, `None` if the record has no such field
    fn field_kind(field: &str) -> Option<FieldKind>;

    /// Current value of a field
    fn field_value(&self, field: &str) -> Option<FieldValue>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer() {
        assert_eq!(FieldKind::Integer.parse("42"), Ok(FieldValue::Integer(42)));
        assert!(FieldKind::Integer.parse("x").is_err());
    }

    #[test]
    fn test_parse_boolean_variants() {
        assert_eq!(FieldKind::Boolean.parse("True"), Ok(FieldValue::Boolean(true)));
        assert_eq!(FieldKind::Boolean.parse("0"), Ok(FieldValue::Boolean(false)));
        assert!(FieldKind::Boolean.parse("maybe").is_err());
    }

    #[test]
    fn test_parse_datetime_formats() {
        let a = FieldKind::DateTime.parse("2024-03-01T10:00:00Z").unwrap();
        let b = FieldKind::DateTime.parse("2024-03-01 10:00:00").unwrap();
        assert_eq!(a, b);

        let day = FieldKind::DateTime.parse("2024-03-01").unwrap();
        assert_eq!(day.compare(&a), Some(Ordering::Less));
    }

    #[test]
    fn test_compare_mixed_kinds_is_none() {
        let a = FieldValue::Integer(1);
        let b = FieldValue::String("1".to_string());
        assert_eq!(a.compare(&b), None);
    }
}
