//! Renderers for the three map layers and the scene they produce.
//!
//! Boundaries, markers and the density surface are drawn independently and
//! share only the projection passed in by the caller.

pub mod boundary;
pub mod density;
pub mod points;
pub mod scene;
pub mod style;

pub use boundary::BoundaryRenderer;
pub use density::DensityRenderer;
pub use points::{PointRenderOptions, PointRenderer};
pub use scene::{Drawable, LayerKind, MarkerShape, RegionShape, Scene, ShapeId};
pub use style::{Color, PointStyle, PolygonStyle, BASELINE_COLOR};
