#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregate and view types for province-level displacement analytics.
//!
//! A [`Summary`] maps each `(entity, period)` pair seen in the source
//! records to per-measure totals. Buckets that no record fell into are
//! simply absent, and [`TotalsLookup::NotFound`] keeps that case apart
//! from a bucket whose totals happen to be zero.

pub mod period;

use std::collections::BTreeMap;

use idp_map_dataset_models::{FieldValue, Record};
use serde::{Deserialize, Serialize};

pub use period::{ParsePeriodError, Period};

/// Per-measure totals for one bucket, keyed by measure name.
pub type Measures = BTreeMap<String, f64>;

/// Where the entity name of a record comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKey {
    /// Read the entity name from this field.
    Field(String),
    /// Every record belongs to the same entity (national series).
    Constant(String),
}

impl EntityKey {
    /// Resolves the entity name of a record.
    ///
    /// A missing key field resolves to the empty string so the record
    /// still lands in exactly one bucket.
    #[must_use]
    pub fn resolve(&self, record: &Record) -> String {
        match self {
            Self::Constant(name) => name.clone(),
            Self::Field(field) => match record.get(field) {
                Some(FieldValue::Text(s)) => s.clone(),
                Some(FieldValue::Number(n)) => n.to_string(),
                Some(FieldValue::Date(Some(d))) => d.to_string(),
                Some(FieldValue::Date(None)) | None => String::new(),
            },
        }
    }
}

impl From<&str> for EntityKey {
    fn from(field: &str) -> Self {
        Self::Field(field.to_string())
    }
}

/// Derives a [`Period`] from a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeriodExtractor {
    /// A numeric or textual year column.
    YearField {
        /// Column holding the year.
        field: String,
    },
    /// The year of a date column.
    DateYear {
        /// Column holding the date.
        field: String,
    },
    /// The month of a date column.
    DateMonth {
        /// Column holding the date.
        field: String,
    },
    /// A column holding a period label such as `2021` or `2012_18`.
    Label {
        /// Column holding the label.
        field: String,
    },
    /// Every record falls in the same period.
    Constant {
        /// The period.
        period: Period,
    },
}

impl PeriodExtractor {
    /// Extracts the period of a record, falling back to
    /// [`Period::Undated`] when the source value is missing or invalid.
    #[must_use]
    pub fn extract(&self, record: &Record) -> Period {
        match self {
            Self::YearField { field } => match record.get(field) {
                #[allow(clippy::cast_possible_truncation)]
                Some(FieldValue::Number(n)) if n.fract().abs() < f64::EPSILON => Period::Year(*n as i32),
                Some(FieldValue::Text(s)) => match s.parse::<Period>() {
                    Ok(period @ Period::Year(_)) => period,
                    _ => Period::Undated,
                },
                Some(FieldValue::Date(Some(d))) => Period::year_of(*d),
                _ => Period::Undated,
            },
            Self::DateYear { field } => record.date(field).map_or(Period::Undated, Period::year_of),
            Self::DateMonth { field } => {
                record.date(field).map_or(Period::Undated, Period::month_of)
            }
            Self::Label { field } => record
                .text(field)
                .and_then(|s| s.parse().ok())
                .unwrap_or(Period::Undated),
            Self::Constant { period } => *period,
        }
    }
}

/// Aggregated totals keyed by entity, then period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    buckets: BTreeMap<String, BTreeMap<Period, Measures>>,
}

impl Summary {
    /// Creates an empty summary.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }

    /// Returns the bucket for `(entity, period)`, creating it with every
    /// listed measure at zero.
    pub fn bucket_mut(&mut self, entity: &str, period: Period, measures: &[&str]) -> &mut Measures {
        let bucket = self
            .buckets
            .entry(entity.to_string())
            .or_default()
            .entry(period)
            .or_default();
        for measure in measures {
            bucket.entry((*measure).to_string()).or_insert(0.0);
        }
        bucket
    }

    /// Inserts a whole bucket, replacing any existing one.
    pub fn insert(&mut self, entity: impl Into<String>, period: Period, measures: Measures) {
        self.buckets
            .entry(entity.into())
            .or_default()
            .insert(period, measures);
    }

    /// Returns the totals for `(entity, period)` if any record matched.
    #[must_use]
    pub fn get(&self, entity: &str, period: Period) -> Option<&Measures> {
        self.buckets.get(entity)?.get(&period)
    }

    /// Returns every period recorded for an entity.
    #[must_use]
    pub fn entity(&self, entity: &str) -> Option<&BTreeMap<Period, Measures>> {
        self.buckets.get(entity)
    }

    /// Iterates over `(entity, period, measures)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Period, &Measures)> {
        self.buckets.iter().flat_map(|(entity, periods)| {
            periods
                .iter()
                .map(move |(period, measures)| (entity.as_str(), *period, measures))
        })
    }

    /// Number of `(entity, period)` buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.values().map(BTreeMap::len).sum()
    }

    /// Whether the summary holds no buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Flattens the summary into serializable rows.
    #[must_use]
    pub fn entries(&self) -> Vec<SummaryEntry> {
        self.iter()
            .map(|(entity, period, measures)| SummaryEntry {
                entity: entity.to_string(),
                period,
                measures: measures.clone(),
            })
            .collect()
    }
}

/// One flattened row of a [`Summary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEntry {
    /// Entity name.
    pub entity: String,
    /// Period bucket.
    pub period: Period,
    /// Totals for the bucket.
    pub measures: Measures,
}

/// Result of looking up one `(entity, period)` bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "measures", rename_all = "snake_case")]
pub enum TotalsLookup {
    /// At least one record matched; totals may still be zero.
    Found(Measures),
    /// No record ever matched the key.
    NotFound,
}

impl TotalsLookup {
    /// Whether the bucket existed.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The totals, if the bucket existed.
    #[must_use]
    pub const fn measures(&self) -> Option<&Measures> {
        match self {
            Self::Found(measures) => Some(measures),
            Self::NotFound => None,
        }
    }

    /// A single measure total, if the bucket existed.
    ///
    /// A found bucket without the named measure reports zero.
    #[must_use]
    pub fn measure(&self, name: &str) -> Option<f64> {
        self.measures()
            .map(|measures| measures.get(name).copied().unwrap_or(0.0))
    }
}

impl From<Option<&Measures>> for TotalsLookup {
    fn from(value: Option<&Measures>) -> Self {
        value.map_or(Self::NotFound, |measures| Self::Found(measures.clone()))
    }
}

/// Inclusive value range, used as a color or axis domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
}

impl Extent {
    /// Computes the extent of a set of values. `None` when empty.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, value| match acc {
            None => Some(Self {
                min: value,
                max: value,
            }),
            Some(Self { min, max }) => Some(Self {
                min: min.min(value),
                max: max.max(value),
            }),
        })
    }
}

/// One bar of a province bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bar {
    /// Measure name.
    pub measure: String,
    /// Total for the selected province and period.
    pub value: f64,
}

/// Data behind the per-province bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BarChartView {
    /// The province had records for the period.
    Bars {
        /// Province name.
        entity: String,
        /// Selected period.
        period: Period,
        /// One bar per measure, in the requested order.
        bars: Vec<Bar>,
    },
    /// No record matched; render "no available data".
    NoData {
        /// Province name.
        entity: String,
        /// Selected period.
        period: Period,
    },
}

/// One cell of the month-by-year heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    /// Calendar year (row).
    pub year: i32,
    /// Month 1-12 (column).
    pub month: u32,
    /// Value of the colored measure.
    pub value: f64,
    /// Every measure of the bucket, for hover details.
    pub measures: Measures,
}

/// Data behind the monthly heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapView {
    /// Measure used for coloring.
    pub measure: String,
    /// Cells in chronological order. Months without data are absent.
    pub cells: Vec<HeatmapCell>,
    /// Value domain of `cells`, `None` when there are none.
    pub extent: Option<Extent>,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn entity_key_reads_field_or_constant() {
        let record = Record::new().with("province", text("Kabul"));
        assert_eq!(EntityKey::from("province").resolve(&record), "Kabul");
        assert_eq!(
            EntityKey::Constant("Afghanistan".to_string()).resolve(&record),
            "Afghanistan"
        );
        assert_eq!(EntityKey::from("missing").resolve(&record), "");
    }

    #[test]
    fn year_field_accepts_numbers_and_text() {
        let extractor = PeriodExtractor::YearField {
            field: "year".to_string(),
        };
        let numeric = Record::new().with("year", FieldValue::Number(2021.0));
        let textual = Record::new().with("year", text("2020"));
        let broken = Record::new().with("year", text("twenty"));

        assert_eq!(extractor.extract(&numeric), Period::Year(2021));
        assert_eq!(extractor.extract(&textual), Period::Year(2020));
        assert_eq!(extractor.extract(&broken), Period::Undated);
    }

    #[test]
    fn date_extractors_fall_back_to_undated() {
        let date = NaiveDate::from_ymd_opt(2019, 4, 1).unwrap();
        let valid = Record::new().with("Date", FieldValue::Date(Some(date)));
        let invalid = Record::new().with("Date", FieldValue::Date(None));
        let month = PeriodExtractor::DateMonth {
            field: "Date".to_string(),
        };
        let year = PeriodExtractor::DateYear {
            field: "Date".to_string(),
        };

        assert_eq!(
            month.extract(&valid),
            Period::YearMonth {
                year: 2019,
                month: 4
            }
        );
        assert_eq!(year.extract(&valid), Period::Year(2019));
        assert_eq!(month.extract(&invalid), Period::Undated);
    }

    #[test]
    fn extractor_deserializes_from_toml() {
        let extractor: PeriodExtractor =
            toml::from_str("type = \"date_month\"\nfield = \"Date\"").unwrap();
        assert_eq!(
            extractor,
            PeriodExtractor::DateMonth {
                field: "Date".to_string()
            }
        );

        let constant: PeriodExtractor =
            toml::from_str("type = \"constant\"\nperiod = \"all\"").unwrap();
        assert_eq!(
            constant,
            PeriodExtractor::Constant {
                period: Period::All
            }
        );
    }

    #[test]
    fn summary_keeps_zero_buckets_distinct_from_missing() {
        let mut summary = Summary::new();
        summary.bucket_mut("Kabul", Period::Year(2021), &["arrivals"]);

        let found = TotalsLookup::from(summary.get("Kabul", Period::Year(2021)));
        let missing = TotalsLookup::from(summary.get("Herat", Period::Year(2021)));

        assert_eq!(found.measure("arrivals"), Some(0.0));
        assert_eq!(missing, TotalsLookup::NotFound);
        assert_eq!(missing.measure("arrivals"), None);
    }

    #[test]
    fn summary_iterates_in_key_order() {
        let mut summary = Summary::new();
        summary.insert("Kandahar", Period::Year(2020), Measures::new());
        summary.insert("Kabul", Period::Year(2021), Measures::new());
        summary.insert("Kabul", Period::Year(2019), Measures::new());

        let keys: Vec<(&str, Period)> = summary.iter().map(|(e, p, _)| (e, p)).collect();
        assert_eq!(
            keys,
            vec![
                ("Kabul", Period::Year(2019)),
                ("Kabul", Period::Year(2021)),
                ("Kandahar", Period::Year(2020)),
            ]
        );
        assert_eq!(summary.len(), 3);
    }

    #[test]
    fn extent_of_values() {
        assert_eq!(Extent::from_values(Vec::new()), None);
        assert_eq!(
            Extent::from_values([3.0, -1.0, 7.5]),
            Some(Extent { min: -1.0, max: 7.5 })
        );
    }

    #[test]
    fn totals_lookup_serializes_with_status() {
        let json = serde_json::to_value(TotalsLookup::NotFound).unwrap();
        assert_eq!(json, serde_json::json!({"status": "not_found"}));
    }
}
