//! Joining boundary features to measure values by name.
//!
//! Names are compared byte-for-byte: `"Kabul "` and `"Kabul"` do not match.
//! Mismatches are not corrected here, only reported in a [`JoinReport`].

use std::collections::{BTreeMap, BTreeSet};

use idp_map_analytics_models::Measures;
use idp_map_dataset_models::Record;
use idp_map_geography_models::{AnnotatedFeature, GeometryDocument, JoinReport, JoinedGeometry};

/// A source of per-entity measure values.
pub trait MeasureTable {
    /// Whether any row is keyed by `key`.
    fn contains(&self, key: &str) -> bool;

    /// The value of `measure` in the row keyed by `key`.
    fn value(&self, key: &str, measure: &str) -> Option<f64>;

    /// Every distinct key, in table order.
    fn keys(&self) -> Vec<String>;
}

/// Parsed records keyed by one of their text fields. The first record with
/// a given key wins.
#[derive(Debug, Clone, Copy)]
pub struct RecordTable<'a> {
    /// The records.
    pub records: &'a [Record],
    /// Field holding each record's entity name.
    pub key_field: &'a str,
}

impl<'a> RecordTable<'a> {
    /// Creates a table keyed by `key_field`.
    #[must_use]
    pub const fn new(records: &'a [Record], key_field: &'a str) -> Self {
        Self { records, key_field }
    }

    fn row(&self, key: &str) -> Option<&'a Record> {
        self.records
            .iter()
            .find(|record| record.text(self.key_field) == Some(key))
    }
}

impl MeasureTable for RecordTable<'_> {
    fn contains(&self, key: &str) -> bool {
        self.row(key).is_some()
    }

    fn value(&self, key: &str, measure: &str) -> Option<f64> {
        let record = self.row(key)?;
        record.get(measure).map(|_| record.measure(measure))
    }

    fn keys(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.records
            .iter()
            .filter_map(|record| record.text(self.key_field))
            .filter(|key| seen.insert(*key))
            .map(str::to_string)
            .collect()
    }
}

impl MeasureTable for BTreeMap<String, Measures> {
    fn contains(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    fn value(&self, key: &str, measure: &str) -> Option<f64> {
        self.get(key)?.get(measure).copied()
    }

    fn keys(&self) -> Vec<String> {
        BTreeMap::keys(self).cloned().collect()
    }
}

/// Annotates every feature of `document` with the value of `measure` from
/// the first record whose `data_key` field equals the feature's
/// `geometry_key` property.
///
/// Features without a match keep `value: None`.
#[must_use]
pub fn join_geometry_to_measure(
    document: &GeometryDocument,
    records: &[Record],
    geometry_key: &str,
    data_key: &str,
    measure: &str,
) -> JoinedGeometry {
    join_table(
        document,
        &RecordTable::new(records, data_key),
        geometry_key,
        measure,
    )
}

/// Annotates every feature of `document` with the value of `measure` from
/// `table`, matching the feature's `geometry_key` property against the
/// table's keys.
#[must_use]
pub fn join_table<T: MeasureTable + ?Sized>(
    document: &GeometryDocument,
    table: &T,
    geometry_key: &str,
    measure: &str,
) -> JoinedGeometry {
    let mut report = JoinReport::default();

    let features: Vec<AnnotatedFeature> = document
        .features
        .iter()
        .map(|feature| {
            let entity = feature.name(geometry_key);
            let value = match entity {
                None => {
                    report.unnamed_features += 1;
                    None
                }
                Some(name) if !table.contains(name) => {
                    report.unmatched_features.push(name.to_string());
                    None
                }
                Some(name) => table.value(name, measure),
            };
            AnnotatedFeature {
                id: feature.id.clone(),
                entity: entity.map(str::to_string),
                properties: feature.properties.clone(),
                geometry: feature.geometry.clone(),
                value,
            }
        })
        .collect();

    let names: BTreeSet<&str> = document.names(geometry_key).collect();
    report.unmatched_entities = table
        .keys()
        .into_iter()
        .filter(|key| !names.contains(key.as_str()))
        .collect();

    if !report.unmatched_features.is_empty() {
        log::warn!(
            "{} boundaries have no '{measure}' data: {:?}",
            report.unmatched_features.len(),
            report.unmatched_features
        );
    }
    if !report.unmatched_entities.is_empty() {
        log::warn!(
            "{} data keys match no boundary '{geometry_key}': {:?}",
            report.unmatched_entities.len(),
            report.unmatched_entities
        );
    }
    if report.unnamed_features > 0 {
        log::warn!(
            "{} boundaries have no '{geometry_key}' property",
            report.unnamed_features
        );
    }

    JoinedGeometry {
        measure: measure.to_string(),
        features,
        report,
    }
}
