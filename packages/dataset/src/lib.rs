#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading and coercion of the displacement and conflict tables.
//!
//! Every dataset is described by a [`definition::DatasetDefinition`]
//! (embedded TOML, see [`registry`]). Loading reads the delimited file into
//! header-keyed [`RawRow`](idp_map_dataset_models::RawRow)s, coerces the
//! declared fields with [`coerce::parse_records`], and reshapes year-suffixed
//! wide tables into one record per period.

pub mod coerce;
pub mod csv_file;
pub mod definition;
pub mod parsing;
pub mod registry;
pub mod reshape;

use idp_map_dataset_models::{CoercionFailure, FieldKind};
use thiserror::Error;

/// Errors that can occur while loading a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited-file parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A dataset definition could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value could not be coerced in strict mode.
    #[error("Coercion error at row {row}, field '{field}': '{raw}' is not a valid {kind} ({failure})")]
    Coercion {
        /// Zero-based row index.
        row: usize,
        /// Field name.
        field: String,
        /// Raw value as read.
        raw: String,
        /// Declared kind of the field.
        kind: FieldKind,
        /// Why coercion failed.
        failure: CoercionFailure,
    },

    /// The file's layout does not match what the definition expects.
    #[error("Format error: {message}")]
    Format {
        /// Description of what went wrong.
        message: String,
    },

    /// No dataset is registered under the requested id.
    #[error("Unknown dataset: {id}")]
    UnknownDataset {
        /// The requested id.
        id: String,
    },
}
