use crate::{
    core::{geo::Point, projection::MercatorProjection},
    data::boundary::BoundaryRegion,
    layers::{
        scene::RegionShape,
        style::{Color, PolygonStyle},
    },
};

/// Draws boundary regions with a per-region fill chosen at draw time.
#[derive(Debug, Clone, Default)]
pub struct BoundaryRenderer {
    style: PolygonStyle,
}

impl BoundaryRenderer {
    pub fn new(style: PolygonStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &PolygonStyle {
        &self.style
    }

    /// One shape per region, in input order. `fill_for` is asked once per
    /// region, so it can read live aggregation state.
    pub fn render<F>(
        &self,
        regions: &[BoundaryRegion],
        projection: &MercatorProjection,
        mut fill_for: F,
    ) -> Vec<RegionShape>
    where
        F: FnMut(&str) -> Color,
    {
        regions
            .iter()
            .map(|region| {
                let polygons: Vec<Vec<Vec<Point>>> = region
                    .geometry
                    .iter()
                    .map(|polygon| {
                        std::iter::once(polygon.exterior())
                            .chain(polygon.interiors())
                            .map(|ring| {
                                ring.coords()
                                    .map(|c| projection.project_lng_lat(c.x, c.y))
                                    .collect()
                            })
                            .collect()
                    })
                    .collect();

                let style = PolygonStyle {
                    fill_color: fill_for(&region.region_id),
                    ..self.style.clone()
                };
                RegionShape::new(region.region_id.clone(), polygons, style)
            })
            .collect()
    }
}
