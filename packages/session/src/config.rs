//! Dashboard configuration.
//!
//! Loaded from TOML; every key is optional and falls back to the layout of
//! the published dashboard (`data/` plus `map/afghan.topojson`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use idp_map_analytics_models::Period;
use idp_map_dataset::definition::DatasetDefinition;
use idp_map_dataset_models::CoercionMode;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::SessionError;

/// Environment variable that overrides [`DashboardConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "IDP_MAP_DATA_DIR";

/// Encoding of the boundary file.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GeometryFormat {
    /// A TopoJSON topology; features come from one named object.
    #[default]
    Topojson,
    /// A GeoJSON feature collection.
    Geojson,
}

/// The quantity a choropleth map is colored by.
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
pub enum MapMeasure {
    /// IDPs arriving in a province.
    #[default]
    Arrivals,
    /// IDPs leaving a province.
    Departures,
    /// Arrivals minus departures (all-time totals also count returns and
    /// migration abroad).
    Net,
}

/// Measure names of the yearly table.
pub const YEARLY_ARRIVALS: &str = "arrivals";
/// Measure names of the yearly table.
pub const YEARLY_DEPARTURES: &str = "departures";
/// Measure names of the all-time table.
pub const TOTAL_ARRIVALS: &str = "Arrival IDPs";
/// Measure names of the all-time table.
pub const TOTAL_DEPARTURES: &str = "Fled IDPs";
/// Derived net measure, present in both tables.
pub const NET: &str = "net";

impl MapMeasure {
    /// The summary measure backing this map measure for `period`.
    ///
    /// [`Period::All`] reads the all-time province table, whose columns are
    /// named differently from the yearly one.
    #[must_use]
    pub const fn field(self, period: Period) -> &'static str {
        match (self, matches!(period, Period::All)) {
            (Self::Arrivals, false) => YEARLY_ARRIVALS,
            (Self::Departures, false) => YEARLY_DEPARTURES,
            (Self::Arrivals, true) => TOTAL_ARRIVALS,
            (Self::Departures, true) => TOTAL_DEPARTURES,
            (Self::Net, _) => NET,
        }
    }
}

/// Dashboard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding the dataset files.
    pub data_dir: PathBuf,
    /// Boundary file path.
    pub geometry_file: PathBuf,
    /// Encoding of [`Self::geometry_file`].
    pub geometry_format: GeometryFormat,
    /// TopoJSON object holding the province boundaries.
    pub geometry_object: String,
    /// Boundary property holding the province name.
    pub geometry_key: String,
    /// How malformed numeric and date cells are handled.
    pub coercion_mode: CoercionMode,
    /// Upper bound on loading every input.
    pub load_timeout_secs: u64,
    /// Province selected when the dashboard opens.
    pub default_province: String,
    /// Period selected when the dashboard opens.
    pub default_period: Period,
    /// Measure the map is colored by when the dashboard opens.
    pub default_measure: MapMeasure,
    /// Per-dataset file name overrides, keyed by dataset id.
    pub datasets: BTreeMap<String, String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            geometry_file: PathBuf::from("map/afghan.topojson"),
            geometry_format: GeometryFormat::Topojson,
            geometry_object: "AFGADM2gbOpen".to_string(),
            geometry_key: idp_map_geography_models::DEFAULT_NAME_PROPERTY.to_string(),
            coercion_mode: CoercionMode::Lenient,
            load_timeout_secs: 30,
            default_province: "Kabul".to_string(),
            default_period: Period::All,
            default_measure: MapMeasure::Arrivals,
            datasets: BTreeMap::new(),
        }
    }
}

impl DashboardConfig {
    /// Parses a configuration from TOML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] if the TOML is malformed.
    pub fn from_toml_str(text: &str) -> Result<Self, SessionError> {
        Ok(toml::de::from_str(text)?)
    }

    /// Reads a configuration file, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, SessionError> {
        let text = std::fs::read_to_string(path)?;
        log::debug!("Read dashboard config from {}", path.display());
        Ok(Self::from_toml_str(&text)?.with_env_overrides())
    }

    /// Applies [`DATA_DIR_ENV`] if it is set.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.is_empty() => self.with_data_dir(dir),
            _ => self,
        }
    }

    /// Replaces the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Path of a dataset's file, honoring [`Self::datasets`] overrides.
    #[must_use]
    pub fn dataset_path(&self, definition: &DatasetDefinition) -> PathBuf {
        let file = self
            .datasets
            .get(&definition.id)
            .unwrap_or(&definition.file);
        self.data_dir.join(file)
    }
}
