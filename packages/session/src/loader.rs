//! Concurrent loading of every dashboard input.
//!
//! Files are read with `tokio::fs` and parsed on the blocking pool. All
//! inputs are joined with `try_join!` under one timeout: the first failure
//! (or the timeout) fails the whole load, and no partial
//! [`DashboardData`] is produced.

use std::path::{Path, PathBuf};
use std::time::Duration;

use idp_map_dataset::registry;
use idp_map_dataset_models::CoercionMode;
use idp_map_geography::{load_geojson, topojson};
use idp_map_geography_models::GeometryDocument;

use crate::SessionError;
use crate::config::{DashboardConfig, GeometryFormat};
use crate::data::{DashboardData, DatasetInput};

async fn read(path: &Path) -> Result<Vec<u8>, SessionError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| SessionError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Reads and parses one registered dataset.
///
/// # Errors
///
/// Returns [`SessionError`] if the dataset id is unknown, or its file
/// cannot be read or parsed.
pub async fn load_dataset(
    config: &DashboardConfig,
    id: &str,
) -> Result<DatasetInput, SessionError> {
    let definition = registry::dataset(id)?;
    let path = config.dataset_path(&definition);
    let bytes = read(&path).await?;
    let mode: CoercionMode = config.coercion_mode;

    log::debug!("[{id}] Read {} bytes from {}", bytes.len(), path.display());

    tokio::task::spawn_blocking(move || {
        let loaded = definition
            .load(bytes.as_slice(), mode)
            .map_err(|source| SessionError::Load { path, source })?;
        Ok(DatasetInput { definition, loaded })
    })
    .await?
}

/// Reads and decodes the boundary file.
///
/// # Errors
///
/// Returns [`SessionError`] if the file cannot be read or decoded.
pub async fn load_geometry(config: &DashboardConfig) -> Result<GeometryDocument, SessionError> {
    let path: PathBuf = config.geometry_file.clone();
    let bytes = read(&path).await?;
    let format = config.geometry_format;
    let object = config.geometry_object.clone();

    tokio::task::spawn_blocking(move || {
        let text = String::from_utf8_lossy(&bytes);
        let document = match format {
            GeometryFormat::Geojson => load_geojson(&text),
            GeometryFormat::Topojson => topojson::feature(&text, &object),
        };
        document.map_err(|source| SessionError::Geometry { path, source })
    })
    .await?
}

/// Loads every input named by `config` and aggregates it.
///
/// # Errors
///
/// Returns the first [`SessionError`] raised by any input, or
/// [`SessionError::Timeout`] if loading exceeds
/// [`DashboardConfig::load_timeout_secs`].
pub async fn load_dashboard(config: &DashboardConfig) -> Result<DashboardData, SessionError> {
    let secs = config.load_timeout_secs;
    log::info!(
        "Loading dashboard from {} (timeout {secs}s)",
        config.data_dir.display()
    );

    let inputs = async {
        tokio::try_join!(
            load_dataset(config, registry::IDP_BY_YEAR),
            load_dataset(config, registry::PROVINCE_TOTALS),
            load_dataset(config, registry::SETTLEMENTS),
            load_dataset(config, registry::CONFLICT_MONTHLY),
            load_geometry(config),
        )
    };

    let (yearly, totals, settlements, conflict, geometry) =
        tokio::time::timeout(Duration::from_secs(secs), inputs)
            .await
            .map_err(|_| SessionError::Timeout { secs })??;

    for input in [&yearly, &totals, &settlements, &conflict] {
        if !input.loaded.issues.is_empty() {
            log::warn!(
                "[{}] {} values could not be coerced and were defaulted",
                input.loaded.id,
                input.loaded.issues.len()
            );
        }
    }

    Ok(DashboardData::new(
        &yearly,
        &totals,
        &settlements,
        &conflict,
        geometry,
        config.geometry_key.clone(),
    ))
}
