#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Province boundary loading and joining boundaries to aggregated data.
//!
//! Boundaries come from GeoJSON ([`load_geojson`]) or TopoJSON
//! ([`topojson::feature`]). [`join::join_geometry_to_measure`] annotates
//! each boundary with the matching data value by exact name comparison.

pub mod geojson_file;
pub mod join;
pub mod topojson;

pub use geojson_file::load_geojson;
pub use join::{MeasureTable, RecordTable, join_geometry_to_measure, join_table};

use thiserror::Error;

/// Errors that can occur during geography operations.
#[derive(Debug, Error)]
pub enum GeoError {
    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// GeoJSON structure was invalid.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The requested TopoJSON object does not exist.
    #[error("TopoJSON object '{name}' not found")]
    MissingObject {
        /// The requested object name.
        name: String,
    },

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
