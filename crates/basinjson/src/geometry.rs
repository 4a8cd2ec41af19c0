//! GeoJSON model: geometries, features and feature collections.
//!
//! Positions are kept as `Vec<f64>` so that sources carrying a third (height)
//! component survive a round trip; only the first two components (longitude,
//! latitude) take part in simplification.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{Error, GeometryError, Result};

/// `[longitude, latitude, ...]`
pub type Position = Vec<f64>;

/// Free-form feature properties.
pub type Properties = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

const GEOMETRY_KINDS: [&str; 7] = [
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
];

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::LineString { .. } => "LineString",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
            Geometry::GeometryCollection { .. } => "GeometryCollection",
        }
    }

    /// Parse a GeoJSON geometry object.
    pub fn from_value(value: &Value) -> std::result::Result<Self, GeometryError> {
        Geometry::deserialize(value).map_err(|err| GeometryError::Malformed {
            detail: err.to_string(),
        })
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Total number of positions, summed over every ring, line and member.
    pub fn position_count(&self) -> usize {
        match self {
            Geometry::Point { .. } => 1,
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.len()
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().map(Vec::len).sum()
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .flat_map(|polygon| polygon.iter())
                .map(Vec::len)
                .sum(),
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().map(Geometry::position_count).sum()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureTag {
    #[default]
    Feature,
}

/// A GeoJSON Feature.
///
/// The geometry member is kept exactly as read: a geometry that does not fit
/// the typed model still loads, and members this crate does not know about
/// (`bbox`, `title`, ...) are carried through to the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub tag: FeatureTag,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// `null` geometries are legal GeoJSON and are carried through untouched.
    #[serde(default)]
    pub geometry: Option<Value>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Properties,

    #[serde(flatten)]
    pub foreign_members: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Properties) -> Self {
        Self {
            tag: FeatureTag::Feature,
            id: None,
            geometry: Some(geometry.to_value()),
            properties,
            foreign_members: Map::new(),
        }
    }

    pub fn source_file(&self) -> Option<&str> {
        self.properties.get("source_file").and_then(Value::as_str)
    }

    /// Typed view of the geometry member; `None` for a null or absent geometry.
    pub fn parsed_geometry(&self) -> Option<std::result::Result<Geometry, GeometryError>> {
        self.geometry
            .as_ref()
            .filter(|value| !value.is_null())
            .map(Geometry::from_value)
    }

    /// Replace the geometry with a processed one.
    ///
    /// Foreign members of the old geometry object survive, except `bbox`,
    /// which no longer describes the new coordinates.
    pub fn replace_geometry(&mut self, geometry: Geometry) {
        let mut value = geometry.to_value();

        if let (Some(Value::Object(old)), Value::Object(new)) = (self.geometry.take(), &mut value) {
            for (key, member) in old {
                if key != "bbox" && !new.contains_key(&key) {
                    new.insert(key, member);
                }
            }
        }

        self.geometry = Some(value);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionTag {
    #[default]
    FeatureCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub tag: CollectionTag,

    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            tag: CollectionTag::FeatureCollection,
            features,
        }
    }

    pub fn position_count(&self) -> usize {
        self.features
            .iter()
            .filter_map(|feature| feature.parsed_geometry()?.ok())
            .map(|geometry| geometry.position_count())
            .sum()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Properties, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Properties>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Parse any GeoJSON document into its features.
///
/// A FeatureCollection yields its features in file order, a single Feature
/// yields itself and a bare geometry is wrapped in a Feature with empty
/// properties. `path` is only used for error context.
pub fn parse_features(text: &str, path: &Path) -> Result<Vec<Feature>> {
    let json_err = |source| Error::Json {
        path: path.to_path_buf(),
        source,
    };

    let value: Value = serde_json::from_str(text).map_err(json_err)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    match kind.as_str() {
        "FeatureCollection" => {
            let collection: FeatureCollection =
                serde_json::from_value(value).map_err(json_err)?;
            Ok(collection.features)
        }
        "Feature" => Ok(vec![serde_json::from_value(value).map_err(json_err)?]),
        k if GEOMETRY_KINDS.contains(&k) => Ok(vec![Feature {
            tag: FeatureTag::Feature,
            id: None,
            geometry: Some(value),
            properties: Properties::new(),
            foreign_members: Map::new(),
        }]),
        _ => Err(Error::UnsupportedDocument {
            path: path.to_path_buf(),
            kind,
        }),
    }
}
