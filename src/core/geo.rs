//! Geographic and screen-space coordinates.

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_4;

/// Latitude past which Mercator ordinates blow up; inputs are clamped to it
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Degrees on the WGS84 ellipsoid. Wire formats are usually `[lng, lat]`,
/// so construct from those with [`LatLng::from_lng_lat`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn from_lng_lat(lng: f64, lat: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside `[-90, 90] x [-180, 180]`
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// `ln(tan(pi/4 + phi/2))` on the unit sphere
    pub fn mercator_y(&self) -> f64 {
        let phi = self.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        (FRAC_PI_4 + phi / 2.0).tan().ln()
    }
}

/// Pixel position; `y` grows downwards
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Position `t` of the way towards `other`, unclamped
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Point> for geo_types::Coord<f64> {
    fn from(point: Point) -> Self {
        geo_types::coord! { x: point.x, y: point.y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_validity() {
        assert!(LatLng::new(41.8781, -87.6298).is_valid());
        assert!(!LatLng::new(91.0, 0.0).is_valid());
        assert!(!LatLng::from_lng_lat(181.0, 0.0).is_valid());
        assert!(!LatLng::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_mercator_y() {
        assert!(LatLng::new(0.0, 10.0).mercator_y().abs() < 1e-12);
        assert!(LatLng::new(45.0, 0.0).mercator_y() > 0.0);
        // Poles clamp instead of diverging
        assert!(LatLng::new(90.0, 0.0).mercator_y().is_finite());
    }

    #[test]
    fn test_point_helpers() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(6.0, 8.0);
        assert_eq!(a.distance_to(&b), 10.0);
        assert_eq!(a.lerp(&b, 0.5), Point::new(3.0, 4.0));
        assert!(!Point::new(f64::INFINITY, 0.0).is_finite());
    }
}
