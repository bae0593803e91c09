#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types shared by every displacement and conflict dataset.
//!
//! A [`RawRow`] is one header-keyed row exactly as it was read from a
//! delimited file. Parsing coerces the declared fields into a [`Record`]
//! whose values are typed [`FieldValue`]s. Records are immutable once
//! built; every aggregate is derived from them on demand.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One row of a delimited file, keyed by trimmed header name.
pub type RawRow = BTreeMap<String, String>;

/// How a raw string field should be coerced during parsing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldKind {
    /// Kept as text.
    #[default]
    String,
    /// Parsed as a floating point number.
    Number,
    /// Parsed as a calendar date.
    Date,
}

/// Policy applied when a declared field cannot be coerced.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CoercionMode {
    /// Unparseable numbers become zero and unparseable dates become
    /// [`FieldValue::Date(None)`]. Parsing never fails.
    #[default]
    Lenient,
    /// The first unparseable value aborts the parse.
    Strict,
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Undeclared or string-typed field.
    Text(String),
    /// Numeric field. Always finite.
    Number(f64),
    /// Date field; `None` when the raw string was not a recognizable date.
    Date(Option<NaiveDate>),
}

impl FieldValue {
    /// Returns the text content, if this is a [`FieldValue::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number, if this is a [`FieldValue::Number`].
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the resolved date, if this is a valid [`FieldValue::Date`].
    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => *d,
            _ => None,
        }
    }
}

/// Reason a raw value failed coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CoercionFailure {
    /// The field was absent from the row.
    Missing,
    /// The field was present but blank.
    Empty,
    /// The field held text that is not a number.
    NotNumeric,
    /// The field held text that is not a recognizable date.
    NotDate,
}

/// A single lossy coercion observed while parsing in lenient mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoercionIssue {
    /// Zero-based index of the row within the parsed input.
    pub row: usize,
    /// Field name.
    pub field: String,
    /// Raw value as read, empty when the field was missing.
    pub raw: String,
    /// Why the value could not be coerced.
    pub failure: CoercionFailure,
}

/// A parsed row with declared fields coerced to their typed values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert used when constructing records by hand.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Inserts or replaces a field.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Returns the raw typed value of a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Returns a text field.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    /// Returns a numeric field.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_number)
    }

    /// Returns a valid date field.
    #[must_use]
    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.get(name).and_then(FieldValue::as_date)
    }

    /// Reads a field as a summable measure.
    ///
    /// Numbers are returned as-is, text is coerced leniently and anything
    /// else (missing fields, dates) counts as zero.
    #[must_use]
    pub fn measure(&self, name: &str) -> f64 {
        match self.get(name) {
            Some(FieldValue::Number(n)) => *n,
            Some(FieldValue::Text(s)) => lenient_number(s),
            Some(FieldValue::Date(_)) | None => 0.0,
        }
    }

    /// Iterates over the fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Parses a numeric string, returning `None` for blank, non-numeric or
/// non-finite input.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses a numeric string, resolving anything unparseable to zero.
#[must_use]
pub fn lenient_number(raw: &str) -> f64 {
    parse_number(raw).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_padded_numbers() {
        assert_eq!(parse_number("100"), Some(100.0));
        assert_eq!(parse_number("  42.5 "), Some(42.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
    }

    #[test]
    fn rejects_blank_and_garbage() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("bad"), None);
        assert_eq!(parse_number("1,000"), None);
    }

    #[test]
    fn rejects_non_finite() {
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert!((lenient_number("infinity") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn measure_coerces_text_and_defaults_missing() {
        let record = Record::new()
            .with("arrivals", FieldValue::Number(12.0))
            .with("departures", FieldValue::Text("7".to_string()))
            .with("note", FieldValue::Text("n/a".to_string()));

        assert!((record.measure("arrivals") - 12.0).abs() < f64::EPSILON);
        assert!((record.measure("departures") - 7.0).abs() < f64::EPSILON);
        assert!((record.measure("note") - 0.0).abs() < f64::EPSILON);
        assert!((record.measure("absent") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn field_kind_round_trips_through_strings() {
        assert_eq!("number".parse::<FieldKind>().unwrap(), FieldKind::Number);
        assert_eq!(FieldKind::Date.to_string(), "date");
        assert_eq!(CoercionMode::Strict.as_ref(), "strict");
    }

    #[test]
    fn record_serializes_as_field_map() {
        let record = Record::new().with("province", FieldValue::Text("Kabul".to_string()));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"province": {"kind": "text", "value": "Kabul"}})
        );
    }
}
