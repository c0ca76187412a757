//! Drawable shapes and the immutable scene they are assembled into.

use crate::{
    animation::reveal::RevealTransition,
    core::{bounds::Bounds, geo::Point},
    data::records::Category,
    density::contours::Isoline,
    layers::style::{Color, PointStyle, PolygonStyle},
    spatial::index::{SpatialIndex, SpatialItem},
};
use chrono::NaiveDateTime;
use fxhash::FxHashMap;
use geo::Contains;
use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use std::fmt;

/// Identity of a hit-testable shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapeId {
    Region(String),
    /// Marker by the index of its source point in the session's loaded
    /// sequence, which later batches never renumber
    Marker(usize),
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeId::Region(id) => write!(f, "region:{id}"),
            ShapeId::Marker(i) => write!(f, "marker:{i}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Boundary,
    Density,
    Marker,
}

/// Common surface of every shape a scene can hit-test
pub trait Drawable {
    fn shape_id(&self) -> ShapeId;

    fn layer(&self) -> LayerKind;

    /// Screen-space bounding box
    fn screen_bounds(&self) -> Option<Bounds>;

    fn hit_test(&self, position: &Point, tolerance: f64) -> bool;
}

/// A projected boundary region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionShape {
    pub region_id: String,
    /// Projected rings, exterior first per polygon
    pub rings: Vec<Vec<Point>>,
    pub style: PolygonStyle,
    outline: MultiPolygon<f64>,
}

impl RegionShape {
    /// `polygons` holds projected rings grouped per polygon, exterior first
    pub fn new(region_id: String, polygons: Vec<Vec<Vec<Point>>>, style: PolygonStyle) -> Self {
        let outline = MultiPolygon::new(
            polygons
                .iter()
                .filter_map(|rings| {
                    let (exterior, holes) = rings.split_first()?;
                    let to_line = |ring: &Vec<Point>| {
                        LineString::new(ring.iter().map(|&p| Coord::from(p)).collect())
                    };
                    Some(Polygon::new(
                        to_line(exterior),
                        holes.iter().map(to_line).collect(),
                    ))
                })
                .collect(),
        );
        Self {
            region_id,
            rings: polygons.into_iter().flatten().collect(),
            style,
            outline,
        }
    }

    pub fn fill(&self) -> Color {
        self.style.fill_color
    }
}

impl Drawable for RegionShape {
    fn shape_id(&self) -> ShapeId {
        ShapeId::Region(self.region_id.clone())
    }

    fn layer(&self) -> LayerKind {
        LayerKind::Boundary
    }

    fn screen_bounds(&self) -> Option<Bounds> {
        let points: Vec<Point> = self.rings.iter().flatten().copied().collect();
        Bounds::from_points(&points)
    }

    fn hit_test(&self, position: &Point, _tolerance: f64) -> bool {
        self.outline
            .contains(&geo_types::Point::from(Coord::from(*position)))
    }
}

/// A point marker with its reveal schedule
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerShape {
    /// Position in reveal order
    pub order: usize,
    /// Position of the source point in the loaded sequence
    pub source_index: usize,
    pub label: String,
    pub category: Category,
    pub timestamp: NaiveDateTime,
    pub position: Point,
    pub style: PointStyle,
    pub transition: RevealTransition,
}

impl Drawable for MarkerShape {
    fn shape_id(&self) -> ShapeId {
        ShapeId::Marker(self.source_index)
    }

    fn layer(&self) -> LayerKind {
        LayerKind::Marker
    }

    fn screen_bounds(&self) -> Option<Bounds> {
        let r = self.style.radius;
        Some(Bounds::from_coords(
            self.position.x - r,
            self.position.y - r,
            self.position.x + r,
            self.position.y + r,
        ))
    }

    fn hit_test(&self, position: &Point, tolerance: f64) -> bool {
        self.position.distance_to(position) <= self.style.radius + tolerance
    }
}

/// Banded density raster plus its isolines
#[derive(Debug, Clone, PartialEq)]
pub struct DensityLayer {
    pub cols: usize,
    pub rows: usize,
    pub cell_size: f64,
    /// Row-major cell colours; `None` is transparent
    pub cells: Vec<Option<Color>>,
    pub isolines: Vec<(Isoline, Color)>,
    pub opacity: f32,
}

impl DensityLayer {
    pub fn cell(&self, col: usize, row: usize) -> Option<Color> {
        if col < self.cols && row < self.rows {
            self.cells[row * self.cols + col]
        } else {
            None
        }
    }

    pub fn painted_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// One complete, immutable render result.
///
/// Every redraw builds a new scene from scratch and swaps it in whole, so a
/// reader never observes a half-applied batch.
#[derive(Debug, Default)]
pub struct Scene {
    regions: Vec<RegionShape>,
    markers: Vec<MarkerShape>,
    density: Option<DensityLayer>,
    marker_index: SpatialIndex<usize>,
    /// Source index to slot in `markers`
    marker_slots: FxHashMap<usize, usize>,
    region_index: SpatialIndex<usize>,
    max_marker_radius: f64,
}

impl Scene {
    pub fn new(
        regions: Vec<RegionShape>,
        markers: Vec<MarkerShape>,
        density: Option<DensityLayer>,
    ) -> Self {
        let marker_index = SpatialIndex::bulk_load(
            markers
                .iter()
                .enumerate()
                .map(|(i, m)| {
                    SpatialItem::from_point(m.source_index.to_string(), m.position, i)
                })
                .collect(),
        );
        let marker_slots = markers
            .iter()
            .enumerate()
            .map(|(i, m)| (m.source_index, i))
            .collect();
        let region_index = SpatialIndex::bulk_load(
            regions
                .iter()
                .enumerate()
                .filter_map(|(i, r)| {
                    r.screen_bounds()
                        .map(|b| SpatialItem::new(r.region_id.clone(), b, i))
                })
                .collect(),
        );
        let max_marker_radius = markers
            .iter()
            .map(|m| m.style.radius)
            .fold(0.0, f64::max);

        Self {
            regions,
            markers,
            density,
            marker_index,
            marker_slots,
            region_index,
            max_marker_radius,
        }
    }

    pub fn regions(&self) -> &[RegionShape] {
        &self.regions
    }

    pub fn markers(&self) -> &[MarkerShape] {
        &self.markers
    }

    pub fn density(&self) -> Option<&DensityLayer> {
        self.density.as_ref()
    }

    pub fn region(&self, region_id: &str) -> Option<&RegionShape> {
        self.regions.iter().find(|r| r.region_id == region_id)
    }

    /// Marker drawn for the source point at `source_index`
    pub fn marker(&self, source_index: usize) -> Option<&MarkerShape> {
        self.marker_slots
            .get(&source_index)
            .map(|&slot| &self.markers[slot])
    }

    pub fn contains(&self, shape: &ShapeId) -> bool {
        match shape {
            ShapeId::Region(id) => self.region(id).is_some(),
            ShapeId::Marker(source_index) => self.marker(*source_index).is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.markers.is_empty() && self.density.is_none()
    }

    /// Topmost shape under `position`.
    ///
    /// Markers sit above regions. Among markers the nearest wins, later
    /// reveal order breaking ties since it is drawn on top.
    pub fn hit_test(&self, position: &Point, tolerance: f64) -> Option<ShapeId> {
        if !position.is_finite() {
            return None;
        }

        let reach = self.max_marker_radius + tolerance;
        let window = Bounds::at(*position).pad(reach);
        let marker = self
            .marker_index
            .query(&window)
            .into_iter()
            .map(|item| &self.markers[item.data])
            .filter(|m| m.hit_test(position, tolerance))
            .min_by(|a, b| {
                let da = a.position.distance_to(position);
                let db = b.position.distance_to(position);
                da.total_cmp(&db).then(b.order.cmp(&a.order))
            });
        if let Some(marker) = marker {
            return Some(marker.shape_id());
        }

        let mut candidates: Vec<usize> = self
            .region_index
            .query(&Bounds::at(*position))
            .into_iter()
            .map(|item| item.data)
            .collect();
        candidates.sort_unstable();
        candidates
            .into_iter()
            .map(|i| &self.regions[i])
            .find(|r| r.hit_test(position, tolerance))
            .map(|r| r.shape_id())
    }
}
