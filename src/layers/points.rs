//! Marker rendering with chronological stagger reveal.
//!
//! Reveal order is a stable sort by timestamp, so equal timestamps keep their
//! load order and the same input always yields the same schedule.

use crate::{
    animation::{easing::EasingType, reveal::RevealTransition},
    core::{config::MarkerConfig, geo::Point, projection::MercatorProjection},
    data::records::{Category, GeographicPoint},
    layers::{
        scene::MarkerShape,
        style::{category_color, Color, PointStyle},
    },
};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct PointRenderOptions {
    pub sort_by_timestamp: bool,
    pub stagger: Duration,
    pub duration: Duration,
    pub radius: f64,
    pub opacity: f32,
    pub easing: EasingType,
    /// Fixed screen anchor every marker grows out of; each marker's own
    /// projected position when unset
    pub origin: Option<Point>,
}

impl Default for PointRenderOptions {
    fn default() -> Self {
        Self::from(&MarkerConfig::default())
    }
}

impl From<&MarkerConfig> for PointRenderOptions {
    fn from(config: &MarkerConfig) -> Self {
        Self {
            sort_by_timestamp: config.sort_by_timestamp,
            stagger: Duration::from_millis(config.stagger_ms),
            duration: Duration::from_millis(config.duration_ms),
            radius: config.radius,
            opacity: config.opacity,
            easing: EasingType::default(),
            origin: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PointRenderer {
    options: PointRenderOptions,
}

impl PointRenderer {
    pub fn new(options: PointRenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PointRenderOptions {
        &self.options
    }

    /// Source indices in reveal order
    pub fn reveal_order(&self, points: &[GeographicPoint]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..points.len()).collect();
        if self.options.sort_by_timestamp {
            order.sort_by_key(|&i| points[i].timestamp);
        }
        order
    }

    /// Renders with the standard category palette
    pub fn render(
        &self,
        points: &[GeographicPoint],
        projection: &MercatorProjection,
    ) -> Vec<MarkerShape> {
        self.render_with(points, projection, category_color)
    }

    pub fn render_with<F>(
        &self,
        points: &[GeographicPoint],
        projection: &MercatorProjection,
        color_of: F,
    ) -> Vec<MarkerShape>
    where
        F: Fn(Category) -> Color,
    {
        let options = &self.options;
        self.reveal_order(points)
            .into_iter()
            .enumerate()
            .map(|(order, source_index)| {
                let point = &points[source_index];
                let position = projection.project(&point.position());
                let style = PointStyle {
                    fill_color: color_of(point.category),
                    radius: options.radius,
                    opacity: options.opacity,
                    ..PointStyle::default()
                };
                MarkerShape {
                    order,
                    source_index,
                    label: point.label.clone(),
                    category: point.category,
                    timestamp: point.timestamp,
                    position,
                    style,
                    transition: RevealTransition {
                        delay: options
                            .stagger
                            .saturating_mul(u32::try_from(order).unwrap_or(u32::MAX)),
                        duration: options.duration,
                        from: options.origin.unwrap_or(position),
                        to: position,
                        target_radius: options.radius,
                        target_opacity: options.opacity,
                        easing: options.easing,
                    },
                }
            })
            .collect()
    }
}
