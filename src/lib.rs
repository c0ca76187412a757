//! # inspectmap
//!
//! Streaming aggregation and incremental rendering of geolocated inspection
//! results.
//!
//! Points arrive page by page from a paginated API. After every batch the
//! map re-aggregates them, either as per-region counts for a choropleth or
//! as a kernel density surface, and redraws boundaries, markers and density
//! into a fresh [`Scene`]. Drawing is headless: a scene is a list of
//! projected, styled shapes that any canvas can paint.
//!
//! ```no_run
//! use inspectmap::prelude::*;
//!
//! # async fn run() -> inspectmap::Result<()> {
//! let config = EngineConfig::default();
//! let mut map = InspectionMap::new(config.clone())?;
//! let fetcher = HttpPageFetcher::new(&config.stream)?;
//! let state = map.load(fetcher).await;
//! println!("{} points, {:?}", state.points_loaded.len(), map.status());
//! # Ok(())
//! # }
//! ```

pub mod animation;
pub mod core;
pub mod data;
pub mod density;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod spatial;
pub mod streaming;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::Bounds,
    config::EngineConfig,
    geo::{LatLng, Point},
    map::{ChangeKind, InspectionMap, MapChange, MapStatus},
    projection::MercatorProjection,
};

pub use data::{BoundarySet, Category, GeographicPoint, RegionAggregates};

pub use density::{AggregationMode, DensityAggregator, DensitySurface};

pub use layers::{Scene, ShapeId};

pub use input::{InputCapabilities, InteractionMode, PointerEvent, Tooltip};

pub use streaming::{CancellationFlag, LoadStatus, PageFetcher, StreamState, StreamingLoader};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Boundary load failed: {0}")]
    BoundaryLoad(String),

    #[error("Page {page} failed: {reason}")]
    PageFetch { page: u32, reason: String },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Installs `env_logger` with an `info` default, overridable via `RUST_LOG`.
/// Calling it twice is harmless.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
