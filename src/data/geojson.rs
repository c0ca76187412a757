//! GeoJSON documents, reduced to what boundary loading reads: features,
//! their properties and polygonal geometry.

use geo_types::{LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: Vec<f64>,
    },
    LineString {
        coordinates: Vec<Vec<f64>>,
    },
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPoint {
        coordinates: Vec<Vec<f64>>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

impl GeoJsonGeometry {
    /// Polygonal content of this geometry, `None` for points and lines
    pub fn to_multi_polygon(&self) -> Option<MultiPolygon<f64>> {
        let polygons: Vec<Polygon<f64>> = match self {
            GeoJsonGeometry::Polygon { coordinates } => {
                to_polygon(coordinates).into_iter().collect()
            }
            GeoJsonGeometry::MultiPolygon { coordinates } => {
                coordinates.iter().filter_map(|p| to_polygon(p)).collect()
            }
            GeoJsonGeometry::GeometryCollection { geometries } => geometries
                .iter()
                .filter_map(|g| g.to_multi_polygon())
                .flat_map(|mp| mp.0)
                .collect(),
            _ => Vec::new(),
        };

        if polygons.is_empty() {
            None
        } else {
            Some(MultiPolygon::new(polygons))
        }
    }
}

fn to_ring(coordinates: &[Vec<f64>]) -> Option<LineString<f64>> {
    let coords: Vec<(f64, f64)> = coordinates
        .iter()
        .filter(|c| c.len() >= 2 && c[0].is_finite() && c[1].is_finite())
        .map(|c| (c[0], c[1]))
        .collect();
    // A closed ring needs at least three distinct vertices
    if coords.len() < 3 {
        return None;
    }
    Some(LineString::from(coords))
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let mut rings = rings.iter().filter_map(|r| to_ring(r));
    let exterior = rings.next()?;
    Some(Polygon::new(exterior, rings.collect()))
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    pub id: Option<serde_json::Value>,
    pub geometry: Option<GeoJsonGeometry>,
    pub properties: Option<HashMap<String, serde_json::Value>>,
}

impl GeoJsonFeature {
    /// Reads a string-like property, accepting numbers as well
    pub fn property_string(&self, key: &str) -> Option<String> {
        self.properties
            .as_ref()
            .and_then(|p| p.get(key))
            .and_then(value_to_key)
    }

    pub fn id_string(&self) -> Option<String> {
        self.id.as_ref().and_then(value_to_key)
    }
}

/// Renders a JSON scalar as a region key
pub(crate) fn value_to_key(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Root GeoJSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJson {
    Feature(GeoJsonFeature),
    FeatureCollection { features: Vec<GeoJsonFeature> },
}

impl GeoJson {
    /// Gets all features in the document
    pub fn features(&self) -> Vec<&GeoJsonFeature> {
        match self {
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::FeatureCollection { features } => features.iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature_collection() {
        let doc: GeoJson = serde_json::from_str(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": { "ZIP": 60601 },
                    "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]] }
                }]
            }"#,
        )
        .unwrap();

        let features = doc.features();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].property_string("ZIP").as_deref(), Some("60601"));
        let polygons = features[0].geometry.as_ref().unwrap().to_multi_polygon().unwrap();
        assert_eq!(polygons.0.len(), 1);
    }

    #[test]
    fn test_non_polygonal_geometry_has_no_area() {
        let point = GeoJsonGeometry::Point {
            coordinates: vec![1.0, 2.0],
        };
        assert!(point.to_multi_polygon().is_none());

        let degenerate = GeoJsonGeometry::Polygon {
            coordinates: vec![vec![vec![0.0, 0.0], vec![1.0, 1.0]]],
        };
        assert!(degenerate.to_multi_polygon().is_none());
    }
}
