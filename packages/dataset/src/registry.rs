//! Registry of the built-in dataset definitions, embedded as TOML.
//!
//! Each `.toml` file in `packages/dataset/datasets/` is baked into the
//! binary at compile time via [`include_str!`]. Adding a dataset means
//! adding a TOML file and listing it below.

use crate::DatasetError;
use crate::definition::{DatasetDefinition, parse_dataset_toml};

/// Id of the per-province, per-year arrivals/departures table.
pub const IDP_BY_YEAR: &str = "idp_by_year";
/// Id of the all-time per-province totals table.
pub const PROVINCE_TOTALS: &str = "province_totals";
/// Id of the national monthly conflict table.
pub const CONFLICT_MONTHLY: &str = "conflict_monthly";
/// Id of the settlement-level flows table.
pub const SETTLEMENTS: &str = "settlements";

/// TOML configs embedded at compile time.
const DATASET_TOMLS: &[(&str, &str)] = &[
    (IDP_BY_YEAR, include_str!("../datasets/idp_by_year.toml")),
    (
        PROVINCE_TOTALS,
        include_str!("../datasets/province_totals.toml"),
    ),
    (
        CONFLICT_MONTHLY,
        include_str!("../datasets/conflict_monthly.toml"),
    ),
    (SETTLEMENTS, include_str!("../datasets/settlements.toml")),
];

/// Returns all configured dataset definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so
/// this is caught by the registry tests).
#[must_use]
pub fn all_datasets() -> Vec<DatasetDefinition> {
    DATASET_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_dataset_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the definition registered under `id`.
///
/// # Errors
///
/// Returns [`DatasetError::UnknownDataset`] if no such dataset exists, or
/// [`DatasetError::Toml`] if its embedded config is malformed.
pub fn dataset(id: &str) -> Result<DatasetDefinition, DatasetError> {
    let (_, toml) = DATASET_TOMLS
        .iter()
        .find(|(name, _)| *name == id)
        .ok_or_else(|| DatasetError::UnknownDataset { id: id.to_owned() })?;
    parse_dataset_toml(toml)
}
