//! Named polygon regions (postal codes) used for choropleth aggregation.

use crate::{
    core::{bounds::Bounds, config::BoundaryConfig, geo::LatLng, geo::Point},
    data::{geojson::GeoJson, topojson::Topology},
    spatial::index::{SpatialIndex, SpatialItem},
    Error, Result,
};
use geo::{BoundingRect, Contains};
use geo_types::MultiPolygon;
use log::{debug, info};

/// One named area, geometry kept in raw `(lng, lat)` degrees
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryRegion {
    pub region_id: String,
    pub geometry: MultiPolygon<f64>,
}

impl BoundaryRegion {
    pub fn new(region_id: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            region_id: region_id.into(),
            geometry,
        }
    }

    /// Builds a single-ring region from `(lng, lat)` pairs
    pub fn from_ring(region_id: impl Into<String>, ring: &[(f64, f64)]) -> Self {
        let polygon = geo_types::Polygon::new(ring.to_vec().into(), Vec::new());
        Self::new(region_id, MultiPolygon::new(vec![polygon]))
    }

    /// Rings of every polygon, exterior first, as `(lng, lat)` pairs
    pub fn rings(&self) -> Vec<Vec<(f64, f64)>> {
        self.geometry
            .iter()
            .flat_map(|polygon| {
                std::iter::once(polygon.exterior())
                    .chain(polygon.interiors())
                    .map(|ring| ring.coords().map(|c| (c.x, c.y)).collect())
            })
            .collect()
    }

    /// Geographic bounding box in `(lng, lat)` space
    pub fn geo_bounds(&self) -> Option<Bounds> {
        self.geometry
            .bounding_rect()
            .map(|rect| Bounds::from_coords(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    pub fn contains(&self, position: &LatLng) -> bool {
        self.geometry
            .contains(&geo_types::Point::new(position.lng, position.lat))
    }
}

/// The set of regions loaded for a view. Region ids are unique.
pub struct BoundarySet {
    regions: Vec<BoundaryRegion>,
    index: SpatialIndex<usize>,
    by_id: fxhash::FxHashMap<String, usize>,
}

impl BoundarySet {
    pub fn new(regions: Vec<BoundaryRegion>) -> Result<Self> {
        let mut by_id = fxhash::FxHashMap::default();
        let mut index = SpatialIndex::new();

        for (position, region) in regions.iter().enumerate() {
            if by_id.insert(region.region_id.clone(), position).is_some() {
                return Err(Error::BoundaryLoad(format!(
                    "duplicate region id {:?}",
                    region.region_id
                )));
            }
            if let Some(bounds) = region.geo_bounds() {
                index.insert(SpatialItem::new(region.region_id.clone(), bounds, position));
            }
        }

        Ok(Self {
            regions,
            index,
            by_id,
        })
    }

    /// Parses a GeoJSON `FeatureCollection` or a TopoJSON topology.
    pub fn from_json_str(text: &str, config: &BoundaryConfig) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| Error::BoundaryLoad(format!("geometry document is not JSON: {e}")))?;

        let is_topology = value.get("type").and_then(|t| t.as_str()) == Some("Topology");
        let regions = if is_topology {
            Self::regions_from_topology(value, config)?
        } else {
            Self::regions_from_geojson(value, config)?
        };

        if regions.is_empty() {
            return Err(Error::BoundaryLoad(
                "geometry document contains no polygon regions".into(),
            ));
        }
        info!("loaded {} boundary regions", regions.len());
        Self::new(regions)
    }

    fn regions_from_topology(
        value: serde_json::Value,
        config: &BoundaryConfig,
    ) -> Result<Vec<BoundaryRegion>> {
        let topology: Topology = serde_json::from_value(value)
            .map_err(|e| Error::BoundaryLoad(format!("malformed topology: {e}")))?;

        let mut regions = Vec::new();
        for feature in topology.features(&config.topology_object)? {
            let region_id = feature
                .property_string(&config.region_property)
                .or_else(|| feature.id.clone())
                .ok_or_else(|| {
                    Error::BoundaryLoad(format!(
                        "region without {:?} property or id",
                        config.region_property
                    ))
                })?;
            match feature.geometry.to_multi_polygon() {
                Some(geometry) => regions.push(BoundaryRegion::new(region_id, geometry)),
                None => debug!("region {region_id} has no usable polygon, skipped"),
            }
        }
        Ok(regions)
    }

    fn regions_from_geojson(
        value: serde_json::Value,
        config: &BoundaryConfig,
    ) -> Result<Vec<BoundaryRegion>> {
        let doc: GeoJson = serde_json::from_value(value)
            .map_err(|e| Error::BoundaryLoad(format!("malformed GeoJSON: {e}")))?;

        let mut regions = Vec::new();
        for feature in doc.features() {
            let Some(geometry) = feature.geometry.as_ref().and_then(|g| g.to_multi_polygon())
            else {
                continue;
            };
            let region_id = feature
                .property_string(&config.region_property)
                .or_else(|| feature.id_string())
                .ok_or_else(|| {
                    Error::BoundaryLoad(format!(
                        "feature without {:?} property or id",
                        config.region_property
                    ))
                })?;
            regions.push(BoundaryRegion::new(region_id, geometry));
        }
        Ok(regions)
    }

    pub fn regions(&self) -> &[BoundaryRegion] {
        &self.regions
    }

    pub fn get(&self, region_id: &str) -> Option<&BoundaryRegion> {
        self.by_id.get(region_id).map(|&i| &self.regions[i])
    }

    pub fn contains_id(&self, region_id: &str) -> bool {
        self.by_id.contains_key(region_id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Region whose polygon contains the coordinate. The first match in load
    /// order wins where polygons overlap.
    pub fn locate(&self, position: &LatLng) -> Option<&BoundaryRegion> {
        let probe = Point::new(position.lng, position.lat);
        let mut candidates: Vec<usize> = self
            .index
            .query(&Bounds::at(probe))
            .into_iter()
            .map(|item| item.data)
            .collect();
        candidates.sort_unstable();
        candidates
            .into_iter()
            .map(|i| &self.regions[i])
            .find(|region| region.contains(position))
    }
}

impl std::fmt::Debug for BoundarySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundarySet")
            .field("regions", &self.regions.len())
            .finish()
    }
}
