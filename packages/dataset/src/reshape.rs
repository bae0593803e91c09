//! Wide-to-long reshaping of year-suffixed tables.
//!
//! The provincial IDP export stores one column per measure and year
//! (`ArrivalIDPs2019`, `FledIDPs2019`, `ArrivalIDPs2012_18`, ...). Summaries
//! need one record per period instead, so each wide row is split into one
//! long record per distinct period suffix.

use std::collections::{BTreeMap, BTreeSet};

use idp_map_analytics_models::Period;
use idp_map_dataset_models::{FieldValue, Record};
use serde::{Deserialize, Serialize};

/// A family of period-suffixed columns that map to one measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodColumn {
    /// Column name prefix, e.g. `ArrivalIDPs`.
    pub prefix: String,
    /// Measure name written into the long records, e.g. `arrivals`.
    pub measure: String,
}

/// Finds the column family a field belongs to and the period its suffix
/// names. The longest matching prefix wins.
///
/// Returns `Some((column, Err(suffix)))` when the field has a known prefix
/// but an unparseable suffix.
pub fn match_column<'a>(
    field: &'a str,
    columns: &'a [PeriodColumn],
) -> Option<(&'a PeriodColumn, Result<Period, &'a str>)> {
    let column = columns
        .iter()
        .filter(|c| field.starts_with(c.prefix.as_str()))
        .max_by_key(|c| c.prefix.len())?;
    let suffix = field[column.prefix.len()..].trim_start_matches(['_', ' ']);
    Some((column, suffix.parse::<Period>().map_err(|_| suffix)))
}

/// Splits each wide record into one long record per period suffix.
///
/// Fields outside every column family (the province name, settlement codes,
/// ...) are copied onto each long record. The period is written as a text
/// label into `period_field`. Columns whose suffix is not a period are
/// dropped with a warning.
#[must_use]
pub fn unpivot_period_columns(
    records: &[Record],
    period_field: &str,
    columns: &[PeriodColumn],
) -> Vec<Record> {
    let mut skipped: BTreeSet<String> = BTreeSet::new();
    let mut output = Vec::new();

    for record in records {
        let mut shared = Record::new();
        let mut by_period: BTreeMap<Period, Record> = BTreeMap::new();

        for (field, value) in record.iter() {
            match match_column(field, columns) {
                None => shared.insert(field, value.clone()),
                Some((column, Ok(period))) => {
                    by_period
                        .entry(period)
                        .or_default()
                        .insert(column.measure.clone(), value.clone());
                }
                Some((_, Err(_))) => {
                    skipped.insert(field.to_owned());
                }
            }
        }

        for (period, measures) in by_period {
            let mut long = shared.clone();
            long.insert(period_field, FieldValue::Text(period.to_string()));
            for (measure, value) in measures.iter() {
                long.insert(measure, value.clone());
            }
            output.push(long);
        }
    }

    for field in &skipped {
        log::warn!("Column '{field}' has no recognizable period suffix; skipped");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<PeriodColumn> {
        vec![
            PeriodColumn {
                prefix: "ArrivalIDPs".to_string(),
                measure: "arrivals".to_string(),
            },
            PeriodColumn {
                prefix: "FledIDPs".to_string(),
                measure: "departures".to_string(),
            },
        ]
    }

    fn wide(province: &str, cells: &[(&str, f64)]) -> Record {
        let mut record =
            Record::new().with("ADM1NameEnglish", FieldValue::Text(province.to_string()));
        for (field, value) in cells {
            record.insert(*field, FieldValue::Number(*value));
        }
        record
    }

    #[test]
    fn splits_rows_per_period() {
        let records = vec![wide(
            "Kabul",
            &[
                ("ArrivalIDPs2019", 10.0),
                ("FledIDPs2019", 3.0),
                ("ArrivalIDPs2020", 20.0),
                ("FledIDPs2020", 4.0),
            ],
        )];

        let long = unpivot_period_columns(&records, "period", &columns());

        assert_eq!(long.len(), 2);
        assert_eq!(long[0].text("period"), Some("2019"));
        assert_eq!(long[0].number("arrivals"), Some(10.0));
        assert_eq!(long[0].number("departures"), Some(3.0));
        assert_eq!(long[1].text("period"), Some("2020"));
        assert_eq!(long[1].text("ADM1NameEnglish"), Some("Kabul"));
        assert_eq!(long[1].get("ArrivalIDPs2020"), None);
    }

    #[test]
    fn understands_range_suffixes() {
        let records = vec![wide("Herat", &[("ArrivalIDPs2012_18", 7.0)])];
        let long = unpivot_period_columns(&records, "period", &columns());
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].text("period"), Some("2012-2018"));
    }

    #[test]
    fn drops_unparseable_suffixes() {
        let records = vec![wide(
            "Herat",
            &[("ArrivalIDPsTotal", 7.0), ("ArrivalIDPs2021", 1.0)],
        )];
        let long = unpivot_period_columns(&records, "period", &columns());
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].get("ArrivalIDPsTotal"), None);
    }

    #[test]
    fn longest_prefix_wins() {
        let columns = vec![
            PeriodColumn {
                prefix: "Arrival".to_string(),
                measure: "all_arrivals".to_string(),
            },
            PeriodColumn {
                prefix: "ArrivalIDPs".to_string(),
                measure: "arrivals".to_string(),
            },
        ];
        let (column, period) = match_column("ArrivalIDPs2021", &columns).unwrap();
        assert_eq!(column.measure, "arrivals");
        assert_eq!(period, Ok(Period::Year(2021)));
    }
}
