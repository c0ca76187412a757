use crate::layers::style::{Color, BASELINE_COLOR};
use serde::{Deserialize, Serialize};

const BLUES: [&str; 9] = [
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c",
    "#08306b",
];

const YL_OR_RD: [&str; 9] = [
    "#ffffcc", "#ffeda0", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#bd0026",
    "#800026",
];

/// Sequential colour ramps, light to dark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRamp {
    /// Choropleth counts
    #[default]
    Blues,
    /// Kernel density
    YlOrRd,
}

impl ColorRamp {
    fn stops(&self) -> Vec<Color> {
        let hex = match self {
            ColorRamp::Blues => &BLUES,
            ColorRamp::YlOrRd => &YL_OR_RD,
        };
        hex.iter().filter_map(|h| Color::from_hex(h)).collect()
    }

    /// Colour at `t` in `[0, 1]`, interpolated between stops
    pub fn interpolate(&self, t: f64) -> Color {
        let stops = self.stops();
        let Some(last) = stops.len().checked_sub(1) else {
            return BASELINE_COLOR;
        };
        if !t.is_finite() {
            return BASELINE_COLOR;
        }
        let scaled = t.clamp(0.0, 1.0) * last as f64;
        let lower = (scaled.floor() as usize).min(last);
        let upper = (lower + 1).min(last);
        stops[lower].lerp(&stops[upper], scaled - lower as f64)
    }
}

/// Linear sequential scale over `[0, max]`.
///
/// A non-positive or non-finite maximum falls back to `[0, 1]` so the scale
/// never divides by zero, and non-finite inputs map to the baseline colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequentialScale {
    domain: (f64, f64),
    ramp: ColorRamp,
}

impl SequentialScale {
    pub fn new(max: f64, ramp: ColorRamp) -> Self {
        let upper = if max.is_finite() && max > 0.0 { max } else { 1.0 };
        Self {
            domain: (0.0, upper),
            ramp,
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn ramp(&self) -> ColorRamp {
        self.ramp
    }

    /// Position of `value` within the domain, clamped to `[0, 1]`
    pub fn normalize(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        let (lo, hi) = self.domain;
        Some(((value - lo) / (hi - lo)).clamp(0.0, 1.0))
    }

    pub fn color(&self, value: f64) -> Color {
        match self.normalize(value) {
            Some(t) => self.ramp.interpolate(t),
            None => BASELINE_COLOR,
        }
    }
}
