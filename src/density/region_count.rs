//! Choropleth aggregation: inspections counted per boundary region.

use crate::{
    data::{
        aggregates::{RegionAggregates, RegionTotals},
        boundary::BoundarySet,
        records::{Category, GeographicPoint},
    },
    density::scale::{ColorRamp, SequentialScale},
    layers::style::{Color, BASELINE_COLOR},
};
use log::debug;
use std::collections::BTreeMap;

/// Per-region totals plus the points no region claimed.
///
/// Every loaded region has an entry, zero included, so the sum of region
/// totals plus `unassigned` equals the number of points aggregated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionCounts {
    regions: BTreeMap<String, RegionTotals>,
    unassigned: u64,
}

impl RegionCounts {
    /// Counts raw points against the boundary set.
    ///
    /// A backend region key is authoritative: a key the boundary set does not
    /// know leaves the point unassigned rather than falling back to a
    /// point-in-polygon test.
    pub fn count(points: &[GeographicPoint], boundaries: &BoundarySet) -> Self {
        let mut counts = Self::zeroed(boundaries);

        for point in points {
            let region_id = match &point.region_key {
                Some(key) => boundaries.contains_id(key).then(|| key.as_str()),
                None => boundaries
                    .locate(&point.position())
                    .map(|region| region.region_id.as_str()),
            };

            match region_id.and_then(|id| counts.regions.get_mut(id)) {
                Some(totals) => {
                    totals.total_inspections += 1;
                    match point.category {
                        Category::Pass => *totals.passed_inspections.get_or_insert(0) += 1,
                        Category::Fail => *totals.failed_inspections.get_or_insert(0) += 1,
                        _ => {}
                    }
                }
                None => counts.unassigned += 1,
            }
        }

        debug!(
            "counted {} points into {} regions ({} unassigned)",
            points.len(),
            counts.regions.len(),
            counts.unassigned
        );
        counts
    }

    /// Uses backend totals directly. With a boundary set, totals for unknown
    /// regions are reported as unassigned and missing regions read as zero.
    pub fn from_aggregates(aggregates: &RegionAggregates, boundaries: Option<&BoundarySet>) -> Self {
        let Some(boundaries) = boundaries else {
            return Self {
                regions: aggregates.regions.clone(),
                unassigned: 0,
            };
        };

        let mut counts = Self::zeroed(boundaries);
        for (region_id, totals) in &aggregates.regions {
            match counts.regions.get_mut(region_id) {
                Some(slot) => *slot = *totals,
                None => counts.unassigned += totals.total_inspections,
            }
        }
        counts
    }

    fn zeroed(boundaries: &BoundarySet) -> Self {
        let regions = boundaries
            .regions()
            .iter()
            .map(|region| {
                let totals = RegionTotals {
                    total_inspections: 0,
                    passed_inspections: Some(0),
                    failed_inspections: Some(0),
                };
                (region.region_id.clone(), totals)
            })
            .collect();
        Self {
            regions,
            unassigned: 0,
        }
    }

    pub fn get(&self, region_id: &str) -> u64 {
        self.regions
            .get(region_id)
            .map(|t| t.total_inspections)
            .unwrap_or(0)
    }

    pub fn totals(&self, region_id: &str) -> Option<&RegionTotals> {
        self.regions.get(region_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.regions
            .iter()
            .map(|(id, t)| (id.as_str(), t.total_inspections))
    }

    /// Points attributed to some region
    pub fn assigned(&self) -> u64 {
        self.regions.values().map(|t| t.total_inspections).sum()
    }

    pub fn unassigned(&self) -> u64 {
        self.unassigned
    }

    pub fn max(&self) -> u64 {
        self.regions
            .values()
            .map(|t| t.total_inspections)
            .max()
            .unwrap_or(0)
    }

    pub fn scale(&self) -> SequentialScale {
        SequentialScale::new(self.max() as f64, ColorRamp::Blues)
    }

    /// Fill colour for a region; regions without inspections stay neutral
    pub fn fill_for(&self, region_id: &str) -> Color {
        match self.get(region_id) {
            0 => BASELINE_COLOR,
            count => self.scale().color(count as f64),
        }
    }
}
