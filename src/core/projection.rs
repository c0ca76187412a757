use crate::core::{
    config::ProjectionConfig,
    geo::{LatLng, Point},
};

/// Spherical Mercator projection anchored at a fixed geographic center.
///
/// The center maps to the middle of the viewport; `scale` is the number of
/// pixels per radian of longitude. Points outside the viewport are returned
/// unclipped, culling is the caller's job.
///
/// One value of this type is shared by every renderer in a view so that
/// boundaries, markers and density surfaces always line up.
#[derive(Debug, Clone, PartialEq)]
pub struct MercatorProjection {
    center: LatLng,
    scale: f64,
    width: f64,
    height: f64,
    // Cached projection of the center before translation
    center_x: f64,
    center_y: f64,
}

impl MercatorProjection {
    pub fn new(center: LatLng, scale: f64, width: f64, height: f64) -> Self {
        let center_x = center.lng.to_radians();
        let center_y = center.mercator_y();
        Self {
            center,
            scale,
            width,
            height,
            center_x,
            center_y,
        }
    }

    pub fn from_config(config: &ProjectionConfig) -> Self {
        Self::new(
            LatLng::from_lng_lat(config.center.0, config.center.1),
            config.scale,
            config.viewport.0,
            config.viewport.1,
        )
    }

    /// Projects a geographic coordinate onto the drawing surface.
    pub fn project(&self, lat_lng: &LatLng) -> Point {
        let x = lat_lng.lng.to_radians();
        let y = lat_lng.mercator_y();
        Point::new(
            self.width / 2.0 + self.scale * (x - self.center_x),
            self.height / 2.0 - self.scale * (y - self.center_y),
        )
    }

    /// Projects a `(longitude, latitude)` pair, GeoJSON order.
    pub fn project_lng_lat(&self, lng: f64, lat: f64) -> Point {
        self.project(&LatLng::from_lng_lat(lng, lat))
    }

    /// Same projection re-anchored for a new surface size.
    pub fn resized(&self, width: f64, height: f64) -> Self {
        Self::new(self.center, self.scale, width, height)
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn viewport(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}

impl Default for MercatorProjection {
    fn default() -> Self {
        Self::from_config(&ProjectionConfig::default())
    }
}
