//! Config-driven dataset definition.
//!
//! [`DatasetDefinition`] captures everything unique about one source table:
//! which file it lives in, which field names the province, how its periods
//! are laid out and which fields are numeric. A single generic loader
//! handles every table.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use idp_map_analytics_models::{EntityKey, PeriodExtractor};
use idp_map_dataset_models::{CoercionIssue, CoercionMode, FieldKind, Record};
use serde::Deserialize;

use crate::DatasetError;
use crate::coerce::{FieldCoercions, parse_records_with_report};
use crate::csv_file::read_raw_table;
use crate::reshape::{PeriodColumn, match_column, unpivot_period_columns};

/// A complete, config-driven dataset definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatasetDefinition {
    /// Unique identifier (e.g. `"idp_by_year"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// File name, relative to the data directory.
    pub file: String,
    /// Single-character field delimiter. Defaults to a comma.
    #[serde(default)]
    pub delimiter: Option<String>,
    /// Where each record's province (entity) name comes from.
    pub entity: EntityKey,
    /// Declared field kinds. Wide-layout columns are numeric implicitly.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldKind>,
    /// Declared fields whose whole column may be absent from the file.
    #[serde(default)]
    pub optional: BTreeSet<String>,
    /// How periods and measures are arranged in the file.
    pub layout: Layout,
}

/// Arrangement of periods and measures within a table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layout {
    /// One row per observation; periods come from a field.
    Long {
        /// How to derive each row's period.
        period: PeriodExtractor,
        /// Fields summed as measures.
        measures: Vec<String>,
    },
    /// One column per measure and period (e.g. `ArrivalIDPs2021`).
    Wide {
        /// Name of the period label field added to reshaped records.
        #[serde(default = "default_period_field")]
        period_field: String,
        /// Column families to unpivot.
        columns: Vec<PeriodColumn>,
    },
}

fn default_period_field() -> String {
    "period".to_string()
}

/// Records produced by loading one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    /// Id of the definition that produced these records.
    pub id: String,
    /// Parsed (and, for wide tables, reshaped) records.
    pub records: Vec<Record>,
    /// Lossy coercions applied during lenient parsing.
    pub issues: Vec<CoercionIssue>,
}

impl DatasetDefinition {
    /// Returns the delimiter byte.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Format`] if the configured delimiter is not a
    /// single ASCII character.
    pub fn delimiter_byte(&self) -> Result<u8, DatasetError> {
        match self.delimiter.as_deref() {
            None => Ok(b','),
            Some(delim) if delim.len() == 1 && delim.is_ascii() => Ok(delim.as_bytes()[0]),
            Some(delim) => Err(DatasetError::Format {
                message: format!(
                    "{}: delimiter must be a single ASCII character, got '{delim}'",
                    self.id
                ),
            }),
        }
    }

    /// Names of the measures summed for this dataset, in declaration order.
    #[must_use]
    pub fn measures(&self) -> Vec<&str> {
        match &self.layout {
            Layout::Long { measures, .. } => measures.iter().map(String::as_str).collect(),
            Layout::Wide { columns, .. } => {
                let mut names: Vec<&str> = Vec::new();
                for column in columns {
                    if !names.contains(&column.measure.as_str()) {
                        names.push(&column.measure);
                    }
                }
                names
            }
        }
    }

    /// How periods are derived from the loaded (post-reshape) records.
    #[must_use]
    pub fn period_extractor(&self) -> PeriodExtractor {
        match &self.layout {
            Layout::Long { period, .. } => period.clone(),
            Layout::Wide { period_field, .. } => PeriodExtractor::Label {
                field: period_field.clone(),
            },
        }
    }

    /// Field coercions for a file with the given headers.
    ///
    /// Wide-layout columns are declared numeric so bad cells show up in the
    /// coercion report. Optional fields are only declared when their column
    /// is present.
    #[must_use]
    pub fn coercions_for<'a>(&self, headers: impl IntoIterator<Item = &'a str>) -> FieldCoercions {
        let headers: BTreeSet<&str> = headers.into_iter().collect();
        let mut coercions: FieldCoercions = self
            .fields
            .iter()
            .filter(|(field, _)| {
                !self.optional.contains(*field) || headers.contains(field.as_str())
            })
            .map(|(field, kind)| (field.clone(), *kind))
            .collect();

        for field in &self.optional {
            if !headers.contains(field.as_str()) {
                log::debug!("[{}] Optional column {field} not present", self.id);
            }
        }

        if let Layout::Wide { columns, .. } = &self.layout {
            for header in headers {
                if let Some((_, Ok(_))) = match_column(header, columns) {
                    coercions
                        .entry(header.to_owned())
                        .or_insert(FieldKind::Number);
                }
            }
        }
        coercions
    }

    /// Reads, coerces and reshapes this dataset from `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the input cannot be read, or if a value
    /// cannot be coerced in [`CoercionMode::Strict`].
    pub fn load<R: Read>(&self, reader: R, mode: CoercionMode) -> Result<LoadedDataset, DatasetError> {
        let table = read_raw_table(reader, self.delimiter_byte()?)?;
        let coercions = self.coercions_for(table.headers.iter().map(String::as_str));
        let parsed = parse_records_with_report(table.rows, &coercions, mode)?;

        let records = match &self.layout {
            Layout::Long { .. } => parsed.records,
            Layout::Wide {
                period_field,
                columns,
            } => unpivot_period_columns(&parsed.records, period_field, columns),
        };

        log::info!(
            "[{}] Loaded {} records ({} coercion issues)",
            self.id,
            records.len(),
            parsed.issues.len()
        );

        Ok(LoadedDataset {
            id: self.id.clone(),
            records,
            issues: parsed.issues,
        })
    }
}

/// Parses a [`DatasetDefinition`] from a TOML string.
///
/// # Errors
///
/// Returns [`DatasetError::Toml`] if the TOML is malformed or missing
/// required fields.
pub fn parse_dataset_toml(toml_str: &str) -> Result<DatasetDefinition, DatasetError> {
    Ok(toml::de::from_str(toml_str)?)
}

#[cfg(test)]
mod tests {
    use idp_map_analytics_models::Period;
    use idp_map_dataset_models::{CoercionFailure, FieldValue};

    use super::*;

    const WIDE: &str = r#"
id = "wide"
name = "Wide"
file = "wide.csv"
entity = { field = "ADM1NameEnglish" }

[layout]
type = "wide"
columns = [
  { prefix = "ArrivalIDPs", measure = "arrivals" },
  { prefix = "FledIDPs", measure = "departures" },
]
"#;

    const LONG: &str = r#"
id = "long"
name = "Long"
file = "long.tsv"
delimiter = "	"
entity = { constant = "Afghanistan" }

[fields]
Date = "date"
Fatalities = "number"

[layout]
type = "long"
measures = ["Fatalities"]
period = { type = "date_month", field = "Date" }
"#;

    #[test]
    fn parses_wide_definition() {
        let def = parse_dataset_toml(WIDE).unwrap();
        assert_eq!(def.entity, EntityKey::Field("ADM1NameEnglish".to_string()));
        assert_eq!(def.measures(), vec!["arrivals", "departures"]);
        assert_eq!(
            def.period_extractor(),
            PeriodExtractor::Label {
                field: "period".to_string()
            }
        );
        assert_eq!(def.delimiter_byte().unwrap(), b',');
    }

    #[test]
    fn parses_long_definition() {
        let def = parse_dataset_toml(LONG).unwrap();
        assert_eq!(def.delimiter_byte().unwrap(), b'\t');
        assert_eq!(def.fields["Date"], FieldKind::Date);
        assert_eq!(
            def.period_extractor(),
            PeriodExtractor::DateMonth {
                field: "Date".to_string()
            }
        );
    }

    #[test]
    fn rejects_multi_character_delimiter() {
        let mut def = parse_dataset_toml(WIDE).unwrap();
        def.delimiter = Some("::".to_string());
        assert!(matches!(
            def.delimiter_byte(),
            Err(DatasetError::Format { .. })
        ));
    }

    #[test]
    fn loads_wide_file_into_long_records() {
        let def = parse_dataset_toml(WIDE).unwrap();
        let csv = "ADM1NameEnglish,ArrivalIDPs2021,FledIDPs2021,ArrivalIDPs2022,FledIDPs2022\n\
                   Kabul,100,bad,5,6\n";
        let loaded = def.load(csv.as_bytes(), CoercionMode::Lenient).unwrap();

        assert_eq!(loaded.records.len(), 2);
        let first = &loaded.records[0];
        assert_eq!(def.period_extractor().extract(first), Period::Year(2021));
        assert_eq!(first.number("arrivals"), Some(100.0));
        assert_eq!(first.number("departures"), Some(0.0));
        assert_eq!(loaded.issues.len(), 1);
        assert_eq!(loaded.issues[0].field, "FledIDPs2021");
    }

    #[test]
    fn loads_long_file() {
        let def = parse_dataset_toml(LONG).unwrap();
        let tsv = "Date\tFatalities\n2019-01-01\t12\n2019-02-01\t\n";
        let loaded = def.load(tsv.as_bytes(), CoercionMode::Lenient).unwrap();

        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[1].get("Fatalities"), Some(&FieldValue::Number(0.0)));
        assert_eq!(
            def.period_extractor().extract(&loaded.records[0]),
            Period::YearMonth {
                year: 2019,
                month: 1
            }
        );
    }

    #[test]
    fn strict_load_fails_on_bad_cell() {
        let def = parse_dataset_toml(WIDE).unwrap();
        let csv = "ADM1NameEnglish,ArrivalIDPs2021\nKabul,lots\n";
        assert!(matches!(
            def.load(csv.as_bytes(), CoercionMode::Strict),
            Err(DatasetError::Coercion { .. })
        ));
    }

    #[test]
    fn wide_columns_come_from_header_not_first_row() {
        let def = parse_dataset_toml(WIDE).unwrap();
        let csv = "ADM1NameEnglish,ArrivalIDPs2021\nKabul\nHerat,lots\n";

        let loaded = def.load(csv.as_bytes(), CoercionMode::Lenient).unwrap();
        let fields: Vec<(&str, CoercionFailure)> = loaded
            .issues
            .iter()
            .map(|issue| (issue.field.as_str(), issue.failure))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("ArrivalIDPs2021", CoercionFailure::Missing),
                ("ArrivalIDPs2021", CoercionFailure::NotNumeric),
            ]
        );
        assert_eq!(loaded.records[1].number("arrivals"), Some(0.0));

        assert!(matches!(
            def.load(csv.as_bytes(), CoercionMode::Strict),
            Err(DatasetError::Coercion { .. })
        ));
    }

    #[test]
    fn absent_optional_column_is_not_an_issue() {
        let mut def = parse_dataset_toml(LONG).unwrap();
        def.fields.insert("Events".to_string(), FieldKind::Number);
        def.optional.insert("Events".to_string());

        let without = "Date\tFatalities\n2019-01-01\t12\n";
        let loaded = def.load(without.as_bytes(), CoercionMode::Strict).unwrap();
        assert!(loaded.issues.is_empty());
        assert_eq!(loaded.records[0].get("Events"), None);

        let with = "Date\tEvents\tFatalities\n2019-01-01\tmany\t12\n";
        assert!(matches!(
            def.load(with.as_bytes(), CoercionMode::Strict),
            Err(DatasetError::Coercion { .. })
        ));
    }
}
