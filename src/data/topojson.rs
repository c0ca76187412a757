//! TopoJSON topology decoding.
//!
//! Arcs are shared between neighbouring polygons; each ring lists arc indices,
//! where a negative index `i` means arc `!i` traversed in reverse. Quantized
//! topologies store delta-encoded integer positions plus a transform.

use crate::{
    data::geojson::{value_to_key, GeoJsonGeometry},
    Error, Result,
};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<TopologyTransform>,
    pub arcs: Vec<Vec<Vec<f64>>>,
    pub objects: HashMap<String, TopoGeometry>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TopologyTransform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum TopoGeometry {
    GeometryCollection {
        geometries: Vec<TopoGeometry>,
    },
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        id: Option<serde_json::Value>,
        #[serde(default)]
        properties: Option<HashMap<String, serde_json::Value>>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        id: Option<serde_json::Value>,
        #[serde(default)]
        properties: Option<HashMap<String, serde_json::Value>>,
    },
    #[serde(other)]
    Unsupported,
}

/// A polygonal feature recovered from a topology
#[derive(Debug, Clone, PartialEq)]
pub struct TopoFeature {
    pub id: Option<String>,
    pub properties: HashMap<String, serde_json::Value>,
    pub geometry: GeoJsonGeometry,
}

impl TopoFeature {
    pub fn property_string(&self, key: &str) -> Option<String> {
        self.properties.get(key).and_then(value_to_key)
    }
}

impl Topology {
    /// Decodes every polygonal geometry of the named object.
    pub fn features(&self, object: &str) -> Result<Vec<TopoFeature>> {
        let root = self.objects.get(object).ok_or_else(|| {
            Error::BoundaryLoad(format!("topology has no object named {object:?}"))
        })?;
        let arcs = self.decoded_arcs();

        let mut features = Vec::new();
        self.collect(root, &arcs, &mut features)?;
        Ok(features)
    }

    fn collect(
        &self,
        geometry: &TopoGeometry,
        arcs: &[Vec<[f64; 2]>],
        out: &mut Vec<TopoFeature>,
    ) -> Result<()> {
        match geometry {
            TopoGeometry::GeometryCollection { geometries } => {
                for child in geometries {
                    self.collect(child, arcs, out)?;
                }
            }
            TopoGeometry::Polygon {
                arcs: rings,
                id,
                properties,
            } => {
                let coordinates = rings
                    .iter()
                    .map(|ring| stitch_ring(ring, arcs))
                    .collect::<Result<Vec<_>>>()?;
                out.push(TopoFeature {
                    id: id.as_ref().and_then(value_to_key),
                    properties: properties.clone().unwrap_or_default(),
                    geometry: GeoJsonGeometry::Polygon { coordinates },
                });
            }
            TopoGeometry::MultiPolygon {
                arcs: polygons,
                id,
                properties,
            } => {
                let coordinates = polygons
                    .iter()
                    .map(|rings| {
                        rings
                            .iter()
                            .map(|ring| stitch_ring(ring, arcs))
                            .collect::<Result<Vec<_>>>()
                    })
                    .collect::<Result<Vec<_>>>()?;
                out.push(TopoFeature {
                    id: id.as_ref().and_then(value_to_key),
                    properties: properties.clone().unwrap_or_default(),
                    geometry: GeoJsonGeometry::MultiPolygon { coordinates },
                });
            }
            TopoGeometry::Unsupported => {}
        }
        Ok(())
    }

    /// Absolute `(lng, lat)` positions of every arc
    fn decoded_arcs(&self) -> Vec<Vec<[f64; 2]>> {
        self.arcs
            .iter()
            .map(|arc| {
                let mut x = 0.0;
                let mut y = 0.0;
                arc.iter()
                    .filter(|position| position.len() >= 2)
                    .map(|position| match self.transform {
                        Some(t) => {
                            x += position[0];
                            y += position[1];
                            [x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]]
                        }
                        None => [position[0], position[1]],
                    })
                    .collect()
            })
            .collect()
    }
}

fn stitch_ring(indices: &[i64], arcs: &[Vec<[f64; 2]>]) -> Result<Vec<Vec<f64>>> {
    let mut ring: Vec<[f64; 2]> = Vec::new();
    for &index in indices {
        let (arc_index, reversed) = if index < 0 {
            ((!index) as usize, true)
        } else {
            (index as usize, false)
        };
        let arc = arcs.get(arc_index).ok_or_else(|| {
            Error::BoundaryLoad(format!("arc index {index} out of range ({} arcs)", arcs.len()))
        })?;

        let mut points: Vec<[f64; 2]> = arc.clone();
        if reversed {
            points.reverse();
        }
        // Consecutive arcs share their junction point
        if !ring.is_empty() && !points.is_empty() {
            points.remove(0);
        }
        ring.extend(points);
    }
    Ok(ring.into_iter().map(|p| p.to_vec()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARES: &str = r#"{
        "type": "Topology",
        "transform": { "scale": [1, 1], "translate": [0, 0] },
        "arcs": [
            [[1, 0], [0, 1]],
            [[1, 1], [-1, 0], [0, -1], [1, 0]],
            [[1, 0], [1, 0], [0, 1], [-1, 0]]
        ],
        "objects": {
            "zipcodes": {
                "type": "GeometryCollection",
                "geometries": [
                    { "type": "Polygon", "arcs": [[0, 1]], "properties": { "ZIP": "A" } },
                    { "type": "Polygon", "arcs": [[-1, 2]], "properties": { "ZIP": 2 } },
                    { "type": "LineString", "arcs": [0] }
                ]
            }
        }
    }"#;

    #[test]
    fn test_decode_shared_arcs() {
        let topology: Topology = serde_json::from_str(SQUARES).unwrap();
        let features = topology.features("zipcodes").unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].property_string("ZIP").as_deref(), Some("A"));
        assert_eq!(features[1].property_string("ZIP").as_deref(), Some("2"));

        let GeoJsonGeometry::Polygon { coordinates } = &features[0].geometry else {
            panic!("expected polygon");
        };
        // Arc 0 (2 points) + arc 1 minus the shared junction (3 points)
        let ring = &coordinates[0];
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], vec![1.0, 0.0]);
        assert_eq!(ring[1], vec![1.0, 1.0]);
        assert_eq!(ring.last().unwrap(), &vec![1.0, 0.0]);
    }

    #[test]
    fn test_reversed_arc() {
        let topology: Topology = serde_json::from_str(SQUARES).unwrap();
        let features = topology.features("zipcodes").unwrap();
        let GeoJsonGeometry::Polygon { coordinates } = &features[1].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(coordinates[0][0], vec![1.0, 1.0]);
        assert_eq!(coordinates[0][1], vec![1.0, 0.0]);
    }

    #[test]
    fn test_missing_object_and_bad_arc() {
        let topology: Topology = serde_json::from_str(SQUARES).unwrap();
        assert!(matches!(topology.features("tracts"), Err(Error::BoundaryLoad(_))));

        let broken: Topology = serde_json::from_str(
            r#"{ "type": "Topology", "arcs": [], "objects": { "z": { "type": "Polygon", "arcs": [[3]] } } }"#,
        )
        .unwrap();
        assert!(broken.features("z").is_err());
    }
}
