//! Derived per-record measures.

use idp_map_dataset_models::{FieldValue, Record};

/// Field names of the five settlement-level flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplacementFields {
    /// IDPs arriving in the settlement.
    pub arrivals: String,
    /// IDPs leaving the settlement.
    pub fled: String,
    /// IDPs returning home.
    pub returned: String,
    /// People leaving the country.
    pub outmigrants: String,
    /// People returning from abroad.
    pub returnees: String,
}

impl Default for DisplacementFields {
    fn default() -> Self {
        Self {
            arrivals: "Arrival IDPs".to_string(),
            fled: "Fled IDPs".to_string(),
            returned: "Returned IDPs".to_string(),
            outmigrants: "Outmigrants".to_string(),
            returnees: "Returnees from Abroad".to_string(),
        }
    }
}

/// Net population change of a settlement:
/// `(arrivals - fled) + (returned - outmigrants) + returnees`.
///
/// Missing or non-numeric fields count as zero.
#[must_use]
pub fn net_displacement(record: &Record, fields: &DisplacementFields) -> f64 {
    (record.measure(&fields.arrivals) - record.measure(&fields.fled))
        + (record.measure(&fields.returned) - record.measure(&fields.outmigrants))
        + record.measure(&fields.returnees)
}

/// Copies `records`, adding the net displacement of each as a numeric
/// field called `name`.
#[must_use]
pub fn with_net_displacement(
    records: &[Record],
    fields: &DisplacementFields,
    name: &str,
) -> Vec<Record> {
    records
        .iter()
        .map(|record| {
            record
                .clone()
                .with(name, FieldValue::Number(net_displacement(record, fields)))
        })
        .collect()
}
