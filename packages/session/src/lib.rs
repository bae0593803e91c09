#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard session: loading, the rendering interface and selection state.
//!
//! [`loader::load_dashboard`] reads every configured input concurrently and
//! produces an immutable [`data::DashboardData`], or nothing at all if any
//! input fails. A [`selection::Session`] tracks the user's province, period
//! and measure, and uses [`generation::RequestGenerations`] to drop view
//! results that a newer selection has superseded.

pub mod config;
pub mod data;
pub mod generation;
pub mod loader;
pub mod selection;

use std::path::PathBuf;

use idp_map_dataset::DatasetError;
use idp_map_geography::GeoError;
use thiserror::Error;

/// Errors that can occur while loading or serving dashboard data.
#[derive(Debug, Error)]
pub enum SessionError {
    /// An input file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A dataset file could not be parsed.
    #[error("Failed to load {}: {source}", path.display())]
    Load {
        /// The file.
        path: PathBuf,
        /// Underlying dataset error.
        source: DatasetError,
    },

    /// The boundary file could not be decoded.
    #[error("Failed to load geometry {}: {source}", path.display())]
    Geometry {
        /// The file.
        path: PathBuf,
        /// Underlying geography error.
        source: GeoError,
    },

    /// Dataset registry lookup failed.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Loading took longer than the configured limit.
    #[error("Loading timed out after {secs}s")]
    Timeout {
        /// The configured limit in seconds.
        secs: u64,
    },

    /// A background task panicked or was cancelled.
    #[error("Task error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is malformed.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}
