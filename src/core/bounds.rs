use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Axis-aligned box. Screen pixels for shapes, `x = lng, y = lat` for
/// boundary regions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Zero-area box at `point`, for probing an index
    pub fn at(point: Point) -> Self {
        Self::new(point, point)
    }

    pub fn from_coords(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(Point::new(min_x, min_y), Point::new(max_x, max_y))
    }

    /// Smallest box covering every point, `None` for an empty slice
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self::at(*first), |mut bounds, point| {
            bounds.include(point);
            bounds
        }))
    }

    pub fn contains(&self, point: &Point) -> bool {
        (self.min.x..=self.max.x).contains(&point.x) && (self.min.y..=self.max.y).contains(&point.y)
    }

    pub fn include(&mut self, point: &Point) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        let mut merged = *self;
        merged.include(&other.min);
        merged.include(&other.max);
        merged
    }

    /// Grown by `padding` on every side
    pub fn pad(&self, padding: f64) -> Bounds {
        Bounds::from_coords(
            self.min.x - padding,
            self.min.y - padding,
            self.max.x + padding,
            self.max.y + padding,
        )
    }
}
