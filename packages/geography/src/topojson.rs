//! TopoJSON decoding.
//!
//! A topology stores shared boundary arcs once; geometries reference arcs by
//! index, with a negative index `!i` meaning arc `i` reversed. Quantized
//! topologies carry a `transform` and delta-encode arc positions.

use std::collections::BTreeMap;

use geojson::{Geometry, JsonObject, JsonValue, Position, Value};
use idp_map_geography_models::{GeometryDocument, GeometryFeature};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::GeoError;

#[derive(Debug, Deserialize)]
struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
    objects: BTreeMap<String, TopoObject>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

impl Transform {
    fn apply(self, x: f64, y: f64) -> Position {
        vec![
            x.mul_add(self.scale[0], self.translate[0]),
            y.mul_add(self.scale[1], self.translate[1]),
        ]
    }
}

/// A topology object. The `arcs` and `coordinates` nesting depth depends
/// on `type`, so both are kept as raw JSON until the type is known.
#[derive(Debug, Deserialize)]
struct TopoObject {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    arcs: JsonValue,
    #[serde(default)]
    coordinates: JsonValue,
    #[serde(default)]
    geometries: Vec<TopoObject>,
    #[serde(default)]
    properties: Option<JsonObject>,
    #[serde(default)]
    id: Option<JsonValue>,
}

/// Decoded arcs in absolute coordinates.
struct Arcs {
    arcs: Vec<Vec<Position>>,
    transform: Option<Transform>,
}

impl Arcs {
    fn decode(topology: &Topology) -> Self {
        let arcs = topology
            .arcs
            .iter()
            .map(|arc| match topology.transform {
                None => arc.clone(),
                Some(transform) => {
                    let (mut x, mut y) = (0.0, 0.0);
                    arc.iter()
                        .map(|delta| {
                            x += delta.first().copied().unwrap_or(0.0);
                            y += delta.get(1).copied().unwrap_or(0.0);
                            transform.apply(x, y)
                        })
                        .collect()
                }
            })
            .collect();

        Self {
            arcs,
            transform: topology.transform,
        }
    }

    fn point(&self, raw: &[f64]) -> Position {
        match (self.transform, raw) {
            (Some(transform), [x, y, ..]) => transform.apply(*x, *y),
            _ => raw.to_vec(),
        }
    }

    fn arc(&self, index: i64) -> Result<Vec<Position>, GeoError> {
        let (position, reversed) = if index < 0 {
            (!index, true)
        } else {
            (index, false)
        };
        let arc = usize::try_from(position)
            .ok()
            .and_then(|i| self.arcs.get(i))
            .ok_or_else(|| GeoError::Conversion {
                message: format!("arc index {index} out of range ({} arcs)", self.arcs.len()),
            })?;

        let mut points = arc.clone();
        if reversed {
            points.reverse();
        }
        Ok(points)
    }

    /// Stitches arcs into one line. Consecutive arcs share an endpoint,
    /// which is kept once.
    fn line(&self, indexes: &[i64]) -> Result<Vec<Position>, GeoError> {
        let mut points: Vec<Position> = Vec::new();
        for index in indexes {
            let arc = self.arc(*index)?;
            let skip = usize::from(!points.is_empty());
            points.extend(arc.into_iter().skip(skip));
        }
        if points.len() == 1 {
            points.push(points[0].clone());
        }
        Ok(points)
    }

    /// A closed ring has at least four positions.
    fn ring(&self, indexes: &[i64]) -> Result<Vec<Position>, GeoError> {
        let mut points = self.line(indexes)?;
        if let Some(first) = points.first().cloned() {
            while points.len() < 4 {
                points.push(first.clone());
            }
        }
        Ok(points)
    }

    fn polygon(&self, rings: &[Vec<i64>]) -> Result<Vec<Vec<Position>>, GeoError> {
        rings.iter().map(|ring| self.ring(ring)).collect()
    }
}

fn nested<T: DeserializeOwned>(value: &JsonValue, kind: &str) -> Result<T, GeoError> {
    T::deserialize(value).map_err(|e| GeoError::Conversion {
        message: format!("invalid {kind}: {e}"),
    })
}

fn geometry(object: &TopoObject, arcs: &Arcs) -> Result<Option<Geometry>, GeoError> {
    let Some(kind) = object.kind.as_deref() else {
        return Ok(None);
    };

    let value = match kind {
        "Point" => Value::Point(arcs.point(&nested::<Vec<f64>>(&object.coordinates, kind)?)),
        "MultiPoint" => Value::MultiPoint(
            nested::<Vec<Vec<f64>>>(&object.coordinates, kind)?
                .iter()
                .map(|p| arcs.point(p))
                .collect(),
        ),
        "LineString" => Value::LineString(arcs.line(&nested::<Vec<i64>>(&object.arcs, kind)?)?),
        "MultiLineString" => Value::MultiLineString(
            nested::<Vec<Vec<i64>>>(&object.arcs, kind)?
                .iter()
                .map(|line| arcs.line(line))
                .collect::<Result<_, _>>()?,
        ),
        "Polygon" => Value::Polygon(arcs.polygon(&nested::<Vec<Vec<i64>>>(&object.arcs, kind)?)?),
        "MultiPolygon" => Value::MultiPolygon(
            nested::<Vec<Vec<Vec<i64>>>>(&object.arcs, kind)?
                .iter()
                .map(|polygon| arcs.polygon(polygon))
                .collect::<Result<_, _>>()?,
        ),
        "GeometryCollection" => Value::GeometryCollection(
            object
                .geometries
                .iter()
                .map(|child| geometry(child, arcs))
                .filter_map(Result::transpose)
                .collect::<Result<_, _>>()?,
        ),
        other => {
            return Err(GeoError::Conversion {
                message: format!("unsupported TopoJSON geometry type '{other}'"),
            });
        }
    };

    Ok(Some(Geometry::new(value)))
}

fn to_feature(object: &TopoObject, arcs: &Arcs) -> Result<GeometryFeature, GeoError> {
    Ok(GeometryFeature {
        id: object.id.as_ref().and_then(|id| match id {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }),
        properties: object.properties.clone().unwrap_or_default(),
        geometry: geometry(object, arcs)?,
    })
}

/// Converts the named object of a TopoJSON topology to features.
///
/// A `GeometryCollection` object yields one feature per member geometry;
/// any other object yields a single feature. Members with a null type
/// become features without geometry.
///
/// # Errors
///
/// Returns [`GeoError::MissingObject`] if the topology has no object named
/// `object_name`, [`GeoError::Json`] if the text is not a topology, or
/// [`GeoError::Conversion`] on bad arc references or geometry types.
pub fn feature(text: &str, object_name: &str) -> Result<GeometryDocument, GeoError> {
    let topology: Topology = serde_json::from_str(text)?;
    let object = topology
        .objects
        .get(object_name)
        .ok_or_else(|| GeoError::MissingObject {
            name: object_name.to_string(),
        })?;
    let arcs = Arcs::decode(&topology);

    let features = if object.kind.as_deref() == Some("GeometryCollection") {
        object
            .geometries
            .iter()
            .map(|member| to_feature(member, &arcs))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        vec![to_feature(object, &arcs)?]
    };

    log::debug!(
        "Decoded {} features from TopoJSON object '{object_name}' ({} arcs)",
        features.len(),
        arcs.arcs.len()
    );

    Ok(GeometryDocument { features })
}
