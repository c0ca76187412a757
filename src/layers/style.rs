use crate::data::records::Category;
#[cfg(feature = "egui")]
use egui::Color32;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Straight-alpha RGBA colour, independent of any drawing backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#rrggbb` or `#rrggbbaa`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        match digits.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear blend towards `other`, `t` clamped to `[0, 1]`
    pub fn lerp(&self, other: &Color, t: f64) -> Color {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    pub fn with_opacity(&self, opacity: f32) -> Color {
        let alpha = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Color::new(self.r, self.g, self.b, alpha)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(feature = "egui")]
impl From<Color32> for Color {
    fn from(color: Color32) -> Self {
        let [r, g, b, a] = color.to_srgba_unmultiplied();
        Self { r, g, b, a }
    }
}

#[cfg(feature = "egui")]
impl From<Color> for Color32 {
    fn from(color: Color) -> Self {
        Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
    }
}

/// Neutral fill for regions without data
pub const BASELINE_COLOR: Color = Color::rgb(0xcc, 0xcc, 0xcc);

pub const PASS_COLOR: Color = Color::rgb(0x2c, 0xa0, 0x2c);
pub const FAIL_COLOR: Color = Color::rgb(0xd6, 0x27, 0x28);
pub const CONDITIONAL_COLOR: Color = Color::rgb(0xff, 0x7f, 0x0e);
pub const UNKNOWN_COLOR: Color = Color::rgb(0x99, 0x99, 0x99);

/// Fixed marker palette. Unrecognised results already decode to `Unknown`.
pub fn category_color(category: Category) -> Color {
    match category {
        Category::Pass => PASS_COLOR,
        Category::Fail => FAIL_COLOR,
        Category::ConditionalPass => CONDITIONAL_COLOR,
        Category::Unknown => UNKNOWN_COLOR,
    }
}

/// Style for point markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointStyle {
    pub fill_color: Color,
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub radius: f64,
    /// Opacity (0.0 to 1.0)
    pub opacity: f32,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            fill_color: UNKNOWN_COLOR,
            stroke_color: Color::rgb(255, 255, 255),
            stroke_width: 0.5,
            radius: 5.0,
            opacity: 0.7,
        }
    }
}

/// Style for region polygons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonStyle {
    pub fill_color: Color,
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub fill_opacity: f32,
    pub stroke_opacity: f32,
}

impl Default for PolygonStyle {
    fn default() -> Self {
        Self {
            fill_color: BASELINE_COLOR,
            stroke_color: Color::rgb(255, 255, 255),
            stroke_width: 1.0,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
        }
    }
}
