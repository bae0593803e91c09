//! Field coercion from raw strings to typed [`Record`]s.
//!
//! Lenient mode is lossy on purpose: a numeric field that fails to parse
//! becomes zero and a malformed date becomes `Date(None)`, so a single bad
//! cell never takes a chart down. Every such substitution is reported as a
//! [`CoercionIssue`] so data-quality checks can still see it. Strict mode
//! turns the first substitution into an error instead.

use std::collections::BTreeMap;

use idp_map_dataset_models::{
    CoercionFailure, CoercionIssue, CoercionMode, FieldKind, FieldValue, RawRow, Record,
    parse_number,
};

use crate::DatasetError;
use crate::parsing::parse_date;

/// Declared kind per field name. Undeclared fields stay text.
pub type FieldCoercions = BTreeMap<String, FieldKind>;

/// Parsed records together with every lossy coercion that was applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRecords {
    /// The coerced records, in input order.
    pub records: Vec<Record>,
    /// Values that were replaced by a default during lenient parsing.
    pub issues: Vec<CoercionIssue>,
}

/// Coerces raw rows into records, discarding the issue report.
///
/// # Errors
///
/// Only in [`CoercionMode::Strict`]: returns [`DatasetError::Coercion`] for
/// the first value that cannot be coerced. Lenient parsing never fails.
pub fn parse_records<I>(
    rows: I,
    coercions: &FieldCoercions,
    mode: CoercionMode,
) -> Result<Vec<Record>, DatasetError>
where
    I: IntoIterator<Item = RawRow>,
{
    parse_records_with_report(rows, coercions, mode).map(|parsed| parsed.records)
}

/// Coerces raw rows into records and reports every lossy coercion.
///
/// Declared fields that are absent from a row are filled in as well
/// (`0` for numbers, `Date(None)` for dates) so that every record carries
/// the full declared schema.
///
/// # Errors
///
/// Only in [`CoercionMode::Strict`]: returns [`DatasetError::Coercion`] for
/// the first value that cannot be coerced.
pub fn parse_records_with_report<I>(
    rows: I,
    coercions: &FieldCoercions,
    mode: CoercionMode,
) -> Result<ParsedRecords, DatasetError>
where
    I: IntoIterator<Item = RawRow>,
{
    let mut parsed = ParsedRecords::default();

    for (row_index, row) in rows.into_iter().enumerate() {
        let mut record = Record::new();

        for (field, raw) in &row {
            let kind = coercions.get(field).copied().unwrap_or_default();
            let (value, failure) = coerce_value(raw, kind);
            if let Some(failure) = failure {
                note_failure(&mut parsed, mode, row_index, field, raw, kind, failure)?;
            }
            record.insert(field.clone(), value);
        }

        for (field, kind) in coercions {
            if row.contains_key(field) || *kind == FieldKind::String {
                continue;
            }
            note_failure(
                &mut parsed,
                mode,
                row_index,
                field,
                "",
                *kind,
                CoercionFailure::Missing,
            )?;
            record.insert(field.clone(), default_value(*kind));
        }

        parsed.records.push(record);
    }

    if !parsed.issues.is_empty() {
        log::warn!(
            "{} of {} records had values that could not be coerced and were defaulted",
            count_rows(&parsed.issues),
            parsed.records.len()
        );
    }

    Ok(parsed)
}

/// Coerces one raw value, returning the failure reason when a default had
/// to be substituted.
fn coerce_value(raw: &str, kind: FieldKind) -> (FieldValue, Option<CoercionFailure>) {
    match kind {
        FieldKind::String => (FieldValue::Text(raw.to_owned()), None),
        FieldKind::Number => match parse_number(raw) {
            Some(n) => (FieldValue::Number(n), None),
            None if raw.trim().is_empty() => (FieldValue::Number(0.0), Some(CoercionFailure::Empty)),
            None => (FieldValue::Number(0.0), Some(CoercionFailure::NotNumeric)),
        },
        FieldKind::Date => match parse_date(raw) {
            Some(date) => (FieldValue::Date(Some(date)), None),
            None if raw.trim().is_empty() => (FieldValue::Date(None), Some(CoercionFailure::Empty)),
            None => (FieldValue::Date(None), Some(CoercionFailure::NotDate)),
        },
    }
}

const fn default_value(kind: FieldKind) -> FieldValue {
    match kind {
        FieldKind::Number => FieldValue::Number(0.0),
        FieldKind::Date => FieldValue::Date(None),
        FieldKind::String => FieldValue::Text(String::new()),
    }
}

fn note_failure(
    parsed: &mut ParsedRecords,
    mode: CoercionMode,
    row: usize,
    field: &str,
    raw: &str,
    kind: FieldKind,
    failure: CoercionFailure,
) -> Result<(), DatasetError> {
    match mode {
        CoercionMode::Strict => Err(DatasetError::Coercion {
            row,
            field: field.to_owned(),
            raw: raw.to_owned(),
            kind,
            failure,
        }),
        CoercionMode::Lenient => {
            log::debug!("Row {row}: field '{field}' value '{raw}' defaulted ({failure})");
            parsed.issues.push(CoercionIssue {
                row,
                field: field.to_owned(),
                raw: raw.to_owned(),
                failure,
            });
            Ok(())
        }
    }
}

fn count_rows(issues: &[CoercionIssue]) -> usize {
    let mut rows: Vec<usize> = issues.iter().map(|issue| issue.row).collect();
    rows.dedup();
    rows.len()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn coercions(pairs: &[(&str, FieldKind)]) -> FieldCoercions {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn non_numeric_measure_becomes_zero() {
        let rows = vec![
            row(&[("province", "Kabul"), ("arrivals", "100")]),
            row(&[("province", "Kabul"), ("arrivals", "bad")]),
        ];
        let records = parse_records(
            rows,
            &coercions(&[("arrivals", FieldKind::Number)]),
            CoercionMode::Lenient,
        )
        .unwrap();

        assert_eq!(records[0].number("arrivals"), Some(100.0));
        assert_eq!(records[1].number("arrivals"), Some(0.0));
        assert_eq!(records[1].text("province"), Some("Kabul"));
    }

    #[test]
    fn lenient_parse_reports_issues() {
        let rows = vec![
            row(&[("arrivals", ""), ("Date", "2019-01-01")]),
            row(&[("arrivals", "x"), ("Date", "soon")]),
        ];
        let parsed = parse_records_with_report(
            rows,
            &coercions(&[("arrivals", FieldKind::Number), ("Date", FieldKind::Date)]),
            CoercionMode::Lenient,
        )
        .unwrap();

        let failures: Vec<(usize, &str, CoercionFailure)> = parsed
            .issues
            .iter()
            .map(|i| (i.row, i.field.as_str(), i.failure))
            .collect();
        assert_eq!(
            failures,
            vec![
                (0, "arrivals", CoercionFailure::Empty),
                (1, "Date", CoercionFailure::NotDate),
                (1, "arrivals", CoercionFailure::NotNumeric),
            ]
        );
        assert_eq!(
            parsed.records[0].date("Date"),
            NaiveDate::from_ymd_opt(2019, 1, 1)
        );
        assert_eq!(parsed.records[1].get("Date"), Some(&FieldValue::Date(None)));
    }

    #[test]
    fn missing_declared_fields_are_filled() {
        let rows = vec![row(&[("province", "Herat")])];
        let parsed = parse_records_with_report(
            rows,
            &coercions(&[
                ("arrivals", FieldKind::Number),
                ("name", FieldKind::String),
            ]),
            CoercionMode::Lenient,
        )
        .unwrap();

        assert_eq!(parsed.records[0].number("arrivals"), Some(0.0));
        assert_eq!(parsed.records[0].get("name"), None);
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].failure, CoercionFailure::Missing);
    }

    #[test]
    fn strict_mode_rejects_first_bad_value() {
        let rows = vec![
            row(&[("arrivals", "10")]),
            row(&[("arrivals", "ten")]),
        ];
        let err = parse_records(
            rows,
            &coercions(&[("arrivals", FieldKind::Number)]),
            CoercionMode::Strict,
        )
        .unwrap_err();

        match err {
            DatasetError::Coercion {
                row, field, raw, ..
            } => {
                assert_eq!(row, 1);
                assert_eq!(field, "arrivals");
                assert_eq!(raw, "ten");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn strict_mode_accepts_clean_input() {
        let rows = vec![row(&[("arrivals", "10"), ("Date", "2020-05-01")])];
        let records = parse_records(
            rows,
            &coercions(&[("arrivals", FieldKind::Number), ("Date", FieldKind::Date)]),
            CoercionMode::Strict,
        )
        .unwrap();
        assert_eq!(records[0].number("arrivals"), Some(10.0));
    }

    #[test]
    fn undeclared_fields_stay_text() {
        let rows = vec![row(&[("code", "007")])];
        let records = parse_records(rows, &FieldCoercions::new(), CoercionMode::Lenient).unwrap();
        assert_eq!(records[0].text("code"), Some("007"));
    }

    #[test]
    fn parsing_is_restartable() {
        let rows = vec![row(&[("arrivals", "5")])];
        let kinds = coercions(&[("arrivals", FieldKind::Number)]);
        let first = parse_records(rows.clone(), &kinds, CoercionMode::Lenient).unwrap();
        let second = parse_records(rows, &kinds, CoercionMode::Lenient).unwrap();
        assert_eq!(first, second);
    }
}
