//! Aggregation of inspection points into choropleth counts or a continuous
//! density surface.

pub mod contours;
pub mod kernel;
pub mod region_count;
pub mod scale;

pub use kernel::DensityGrid;
pub use region_count::RegionCounts;
pub use scale::{ColorRamp, SequentialScale};

use crate::{
    core::{config::DensityConfig, projection::MercatorProjection},
    data::{aggregates::RegionAggregates, boundary::BoundarySet, records::GeographicPoint},
    layers::style::{Color, BASELINE_COLOR},
};
use serde::{Deserialize, Serialize};

/// Which aggregation algorithm runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    #[default]
    PerRegionCount,
    KernelDensity,
}

/// Lookup key into a [`DensitySurface`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceKey<'a> {
    Region(&'a str),
    Cell { col: usize, row: usize },
}

/// Read-only result of one aggregation pass
#[derive(Debug, Clone, PartialEq)]
pub enum DensitySurface {
    Regions(RegionCounts),
    Grid(DensityGrid),
}

impl DensitySurface {
    pub fn mode(&self) -> AggregationMode {
        match self {
            DensitySurface::Regions(_) => AggregationMode::PerRegionCount,
            DensitySurface::Grid(_) => AggregationMode::KernelDensity,
        }
    }

    /// Scalar at `key`; keys of the other kind read as 0
    pub fn value_at(&self, key: SurfaceKey<'_>) -> f64 {
        match (self, key) {
            (DensitySurface::Regions(counts), SurfaceKey::Region(id)) => counts.get(id) as f64,
            (DensitySurface::Grid(grid), SurfaceKey::Cell { col, row }) => grid.value(col, row),
            _ => 0.0,
        }
    }

    pub fn max(&self) -> f64 {
        match self {
            DensitySurface::Regions(counts) => counts.max() as f64,
            DensitySurface::Grid(grid) => grid.max(),
        }
    }

    pub fn scale(&self) -> SequentialScale {
        match self {
            DensitySurface::Regions(counts) => counts.scale(),
            DensitySurface::Grid(grid) => SequentialScale::new(grid.max(), ColorRamp::YlOrRd),
        }
    }

    /// Choropleth fill of a region; baseline outside region mode
    pub fn region_fill(&self, region_id: &str) -> Color {
        match self {
            DensitySurface::Regions(counts) => counts.fill_for(region_id),
            DensitySurface::Grid(_) => BASELINE_COLOR,
        }
    }

    pub fn region_counts(&self) -> Option<&RegionCounts> {
        match self {
            DensitySurface::Regions(counts) => Some(counts),
            DensitySurface::Grid(_) => None,
        }
    }

    pub fn grid(&self) -> Option<&DensityGrid> {
        match self {
            DensitySurface::Grid(grid) => Some(grid),
            DensitySurface::Regions(_) => None,
        }
    }
}

/// Inputs available to one aggregation pass
pub struct AggregationInput<'a> {
    pub points: &'a [GeographicPoint],
    pub boundaries: Option<&'a BoundarySet>,
    /// Backend totals, preferred over raw points for region counts
    pub aggregates: Option<&'a RegionAggregates>,
    pub projection: &'a MercatorProjection,
}

/// Runs the configured aggregation algorithm.
#[derive(Debug, Clone)]
pub struct DensityAggregator {
    config: DensityConfig,
}

impl DensityAggregator {
    pub fn new(config: DensityConfig) -> Self {
        Self { config }
    }

    pub fn mode(&self) -> AggregationMode {
        self.config.mode
    }

    pub fn set_mode(&mut self, mode: AggregationMode) {
        self.config.mode = mode;
    }

    pub fn config(&self) -> &DensityConfig {
        &self.config
    }

    pub fn aggregate(&self, input: &AggregationInput<'_>) -> DensitySurface {
        match self.config.mode {
            AggregationMode::PerRegionCount => DensitySurface::Regions(self.count_regions(input)),
            AggregationMode::KernelDensity => DensitySurface::Grid(self.estimate_density(input)),
        }
    }

    fn count_regions(&self, input: &AggregationInput<'_>) -> RegionCounts {
        if let Some(aggregates) = input.aggregates {
            return RegionCounts::from_aggregates(aggregates, input.boundaries);
        }
        match input.boundaries {
            Some(boundaries) => RegionCounts::count(input.points, boundaries),
            None => RegionCounts::default(),
        }
    }

    fn estimate_density(&self, input: &AggregationInput<'_>) -> DensityGrid {
        let projected: Vec<_> = input
            .points
            .iter()
            .map(|p| input.projection.project(&p.position()))
            .collect();
        let (width, height) = input.projection.viewport();
        kernel::estimate(
            &projected,
            width,
            height,
            self.config.bandwidth,
            self.config.cell_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::records::Category;
    use chrono::NaiveDate;

    fn chicago_point() -> GeographicPoint {
        let ts = NaiveDate::from_ymd_opt(2023, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        GeographicPoint::new(-87.6298, 41.8781, ts, Category::Pass, "Cafe")
    }

    #[test]
    fn test_mode_selects_algorithm() {
        let projection = MercatorProjection::default();
        let points = vec![chicago_point()];
        let input = AggregationInput {
            points: &points,
            boundaries: None,
            aggregates: None,
            projection: &projection,
        };

        let mut aggregator = DensityAggregator::new(DensityConfig::default());
        assert_eq!(aggregator.aggregate(&input).mode(), AggregationMode::PerRegionCount);

        aggregator.set_mode(AggregationMode::KernelDensity);
        let surface = aggregator.aggregate(&input);
        let grid = surface.grid().unwrap();
        assert!(surface.max() > 0.0);
        // Center of Chicago projects to the middle of the viewport
        assert_eq!(grid.value_at(&crate::core::geo::Point::new(400.0, 300.0)), grid.max());
    }

    #[test]
    fn test_empty_surfaces_are_valid() {
        let projection = MercatorProjection::default();
        let input = AggregationInput {
            points: &[],
            boundaries: None,
            aggregates: None,
            projection: &projection,
        };
        let mut config = DensityConfig::default();
        for mode in [AggregationMode::PerRegionCount, AggregationMode::KernelDensity] {
            config.mode = mode;
            let surface = DensityAggregator::new(config.clone()).aggregate(&input);
            assert_eq!(surface.max(), 0.0);
            assert_eq!(surface.scale().domain(), (0.0, 1.0));
            assert_eq!(surface.region_fill("anything"), BASELINE_COLOR);
        }
    }

    #[test]
    fn test_value_at_mismatched_key() {
        let surface = DensitySurface::Regions(RegionCounts::default());
        assert_eq!(surface.value_at(SurfaceKey::Cell { col: 0, row: 0 }), 0.0);
    }

    #[test]
    fn test_mode_serde_names() {
        let mode: AggregationMode = serde_json::from_str("\"per_region_count\"").unwrap();
        assert_eq!(mode, AggregationMode::PerRegionCount);
    }
}
