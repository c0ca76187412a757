//! Configuration for the inspection map engine
//!
//! Every section deserializes with defaults, so a partial JSON document
//! (or none at all) yields a working configuration. Density tuning also has
//! presets through [`DensityQuality`].

use crate::{
    core::{
        constants::{
            DEFAULT_BANDWIDTH_PX, DEFAULT_CELL_SIZE_PX, DEFAULT_CENTER, DEFAULT_DENSITY_THRESHOLDS,
            DEFAULT_MARKER_RADIUS, DEFAULT_REGION_PROPERTY, DEFAULT_REVEAL_DURATION_MS,
            DEFAULT_SCALE, DEFAULT_STAGGER_MS, DEFAULT_TOPOLOGY_OBJECT, DEFAULT_VIEWPORT,
            MAX_DENSITY_CELLS,
        },
        geo::{LatLng, MAX_LATITUDE},
    },
    density::{kernel, AggregationMode},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub projection: ProjectionConfig,
    pub stream: StreamConfig,
    pub boundary: BoundaryConfig,
    pub markers: MarkerConfig,
    pub density: DensityConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Rejects values that would make projection or aggregation degenerate
    pub fn validate(&self) -> Result<()> {
        let (w, h) = self.projection.viewport;
        if !(w > 0.0 && h > 0.0) {
            return Err(Error::Config(format!("viewport must be positive, got {w}x{h}")));
        }
        let (lng, lat) = self.projection.center;
        if !LatLng::new(lat, lng).is_valid() || lat.abs() >= MAX_LATITUDE {
            return Err(Error::InvalidCoordinates(format!(
                "projection center ({lng}, {lat}) is outside the Mercator range"
            )));
        }
        if !(self.projection.scale > 0.0 && self.projection.scale.is_finite()) {
            return Err(Error::Config(format!(
                "projection scale must be positive, got {}",
                self.projection.scale
            )));
        }
        if !(self.density.bandwidth > 0.0) {
            return Err(Error::Config("density bandwidth must be positive".into()));
        }
        if !(self.density.cell_size > 0.0) {
            return Err(Error::Config("density cell size must be positive".into()));
        }
        if self.density.thresholds == 0 {
            return Err(Error::Config("density needs at least one threshold".into()));
        }
        self.density.check_grid(w, h)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// `(longitude, latitude)` mapped to the middle of the viewport
    pub center: (f64, f64),
    pub scale: f64,
    /// `(width, height)` in pixels
    pub viewport: (f64, f64),
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            scale: DEFAULT_SCALE,
            viewport: DEFAULT_VIEWPORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// First page URL of the paginated inspection endpoint
    pub endpoint: String,
    pub user_agent: String,
    /// Per-request timeout in milliseconds, 0 disables it
    pub request_timeout_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/api/inspections/".to_string(),
            user_agent: concat!("inspectmap/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Feature property holding the region identifier
    pub region_property: String,
    /// TopoJSON object name; ignored for GeoJSON documents
    pub topology_object: String,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            region_property: DEFAULT_REGION_PROPERTY.to_string(),
            topology_object: DEFAULT_TOPOLOGY_OBJECT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub radius: f64,
    pub opacity: f32,
    pub sort_by_timestamp: bool,
    pub stagger_ms: u64,
    pub duration_ms: u64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_MARKER_RADIUS,
            opacity: 0.7,
            sort_by_timestamp: true,
            stagger_ms: DEFAULT_STAGGER_MS,
            duration_ms: DEFAULT_REVEAL_DURATION_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    pub mode: AggregationMode,
    /// Kernel smoothing radius in pixels
    pub bandwidth: f64,
    /// Raster cell size in pixels
    pub cell_size: f64,
    /// Number of iso-value bands
    pub thresholds: usize,
    pub opacity: f32,
}

impl Default for DensityConfig {
    fn default() -> Self {
        DensityQuality::default().resolve()
    }
}

impl DensityConfig {
    /// Fails when a `width` x `height` viewport would need a raster larger
    /// than [`MAX_DENSITY_CELLS`]
    pub fn check_grid(&self, width: f64, height: f64) -> Result<()> {
        let cells = kernel::padded_cell_count(width, height, self.cell_size, self.bandwidth);
        if !(cells <= MAX_DENSITY_CELLS as f64) {
            return Err(Error::Config(format!(
                "density raster of {cells} cells for a {width}x{height} viewport exceeds {MAX_DENSITY_CELLS}"
            )));
        }
        Ok(())
    }
}

/// Density raster presets trading resolution for recompute cost
#[derive(Debug, Clone, PartialEq)]
pub enum DensityQuality {
    Coarse,
    Balanced,
    Fine,
    Custom(DensityConfig),
}

impl DensityQuality {
    pub fn resolve(&self) -> DensityConfig {
        let base = DensityConfig {
            mode: AggregationMode::PerRegionCount,
            bandwidth: DEFAULT_BANDWIDTH_PX,
            cell_size: DEFAULT_CELL_SIZE_PX,
            thresholds: DEFAULT_DENSITY_THRESHOLDS,
            opacity: 0.8,
        };
        match self {
            Self::Coarse => DensityConfig {
                cell_size: 8.0,
                thresholds: 10,
                ..base
            },
            Self::Balanced => base,
            Self::Fine => DensityConfig {
                cell_size: 2.0,
                thresholds: 30,
                ..base
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for DensityQuality {
    fn default() -> Self {
        Self::Balanced
    }
}
