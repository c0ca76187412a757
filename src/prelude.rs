//! Prelude module for common inspectmap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use inspectmap::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    config::{
        BoundaryConfig, DensityConfig, DensityQuality, EngineConfig, MarkerConfig,
        ProjectionConfig, StreamConfig,
    },
    geo::{LatLng, Point},
    map::{ChangeKind, InspectionMap, MapChange, MapStatus, Recompute},
    projection::MercatorProjection,
};

pub use crate::data::{
    BoundaryRegion, BoundarySet, Category, GeographicPoint, InspectionRecord, RegionAggregates,
    RegionTotals,
};

pub use crate::density::{
    AggregationInput, AggregationMode, ColorRamp, DensityAggregator, DensityGrid, DensitySurface,
    RegionCounts, SequentialScale,
};

pub use crate::layers::{
    BoundaryRenderer, Color, DensityRenderer, Drawable, LayerKind, MarkerShape, PointRenderOptions,
    PointRenderer, PointStyle, PolygonStyle, RegionShape, Scene, ShapeId, BASELINE_COLOR,
};

pub use crate::animation::{stagger_delays, EasingType, RevealFrame, RevealTransition};

pub use crate::input::{InputCapabilities, InteractionLayer, InteractionMode, PointerEvent, Tooltip};

pub use crate::streaming::{
    fetch_aggregates, fetch_boundaries, CancellationFlag, HttpPageFetcher, LoadStatus, Page,
    PageFetcher, Progress, SessionId, StreamState, StreamSummary, StreamingLoader,
};

#[cfg(feature = "tokio-runtime")]
pub use crate::streaming::{BackgroundLoad, LoadMessage};

pub use crate::{Error, MapError, Result};
