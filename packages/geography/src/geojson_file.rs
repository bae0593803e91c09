//! GeoJSON boundary loading.

use geojson::{Feature, GeoJson, JsonObject, feature::Id};
use idp_map_geography_models::{GeometryDocument, GeometryFeature};

use crate::GeoError;

/// Parses a GeoJSON document into boundary features.
///
/// Accepts a `FeatureCollection`, a single `Feature`, or a bare geometry
/// (which becomes one feature without properties).
///
/// # Errors
///
/// Returns [`GeoError::GeoJson`] if the text is not valid GeoJSON.
pub fn load_geojson(text: &str) -> Result<GeometryDocument, GeoError> {
    let features = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .map(from_feature)
            .collect(),
        GeoJson::Feature(feature) => vec![from_feature(feature)],
        GeoJson::Geometry(geometry) => vec![GeometryFeature {
            id: None,
            properties: JsonObject::new(),
            geometry: Some(geometry),
        }],
    };

    log::debug!("Loaded {} GeoJSON features", features.len());

    Ok(GeometryDocument { features })
}

fn from_feature(feature: Feature) -> GeometryFeature {
    GeometryFeature {
        id: feature.id.map(|id| match id {
            Id::String(s) => s,
            Id::Number(n) => n.to_string(),
        }),
        properties: feature.properties.unwrap_or_default(),
        geometry: feature.geometry,
    }
}
