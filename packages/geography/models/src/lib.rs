#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Province boundary types.
//!
//! Boundaries are only ever rendered. They are matched to aggregated data by
//! exact comparison of a name property against entity names, and the result
//! of that match is recorded per feature as [`AnnotatedFeature::value`].

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};

/// Default property holding a province's name in geoBoundaries files.
pub const DEFAULT_NAME_PROPERTY: &str = "shapeName";

/// One named boundary shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryFeature {
    /// Feature id, if the source had one.
    pub id: Option<String>,
    /// Source properties (names, codes, ...).
    pub properties: JsonObject,
    /// The shape. `None` for features with a null geometry.
    pub geometry: Option<Geometry>,
}

impl GeometryFeature {
    /// The string value of property `key`, if present.
    #[must_use]
    pub fn name(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(JsonValue::as_str)
    }
}

/// An immutable collection of boundary features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryDocument {
    /// Features in source order.
    pub features: Vec<GeometryFeature>,
}

impl GeometryDocument {
    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the document has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// The values of property `key` across all features, skipping features
    /// without one.
    pub fn names<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.features.iter().filter_map(move |feature| feature.name(key))
    }
}

/// A boundary feature joined to a measure value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedFeature {
    /// Id of the source feature.
    pub id: Option<String>,
    /// The feature's name, read from the join property.
    pub entity: Option<String>,
    /// Source properties.
    pub properties: JsonObject,
    /// The shape.
    pub geometry: Option<Geometry>,
    /// Joined value. `None` means no data row matched, which renders
    /// differently from a zero.
    pub value: Option<f64>,
}

/// Keys that failed to match on either side of a join.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinReport {
    /// Feature names with no matching data row.
    pub unmatched_features: Vec<String>,
    /// Features that had no name property at all.
    pub unnamed_features: usize,
    /// Data keys with no matching feature.
    pub unmatched_entities: Vec<String>,
}

impl JoinReport {
    /// Whether every feature and every data key found a partner.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unmatched_features.is_empty()
            && self.unnamed_features == 0
            && self.unmatched_entities.is_empty()
    }
}

/// The result of joining a [`GeometryDocument`] to one measure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedGeometry {
    /// Measure the values were taken from.
    pub measure: String,
    /// One entry per source feature, in source order.
    pub features: Vec<AnnotatedFeature>,
    /// Name mismatches seen during the join.
    pub report: JoinReport,
}

impl JoinedGeometry {
    /// Joined values, skipping unannotated features.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.features.iter().filter_map(|feature| feature.value)
    }

    /// Looks up the annotated feature with the given name.
    #[must_use]
    pub fn feature(&self, entity: &str) -> Option<&AnnotatedFeature> {
        self.features
            .iter()
            .find(|feature| feature.entity.as_deref() == Some(entity))
    }

    /// Converts to a GeoJSON feature collection with the joined value
    /// written to `property`. Unannotated features do not get the property.
    #[must_use]
    pub fn to_feature_collection(&self, property: &str) -> FeatureCollection {
        let features = self
            .features
            .iter()
            .map(|feature| {
                let mut properties = feature.properties.clone();
                if let Some(value) = feature.value {
                    properties.insert(property.to_string(), JsonValue::from(value));
                }
                Feature {
                    bbox: None,
                    geometry: feature.geometry.clone(),
                    id: feature.id.clone().map(Id::String),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}
