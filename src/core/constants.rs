//! Engine-wide defaults for the inspection map.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default projection center, `(longitude, latitude)` of downtown Chicago.
pub const DEFAULT_CENTER: (f64, f64) = (-87.6298, 41.8781);

/// Default projection scale (pixels per radian).
pub const DEFAULT_SCALE: f64 = 50_000.0;

/// Default drawing surface size in pixels.
pub const DEFAULT_VIEWPORT: (f64, f64) = (800.0, 600.0);

/// Kernel density smoothing radius in pixels. Fixed, never auto-tuned.
pub const DEFAULT_BANDWIDTH_PX: f64 = 30.0;

/// Side of one density raster cell in pixels.
pub const DEFAULT_CELL_SIZE_PX: f64 = 4.0;

/// Number of iso-value bands the density surface is quantised into.
pub const DEFAULT_DENSITY_THRESHOLDS: usize = 20;

/// Upper bound on density raster cells, kernel padding included.
pub const MAX_DENSITY_CELLS: usize = 4_000_000;

/// Kernel contributions are truncated beyond this many bandwidths.
pub const KERNEL_CUTOFF_SIGMAS: f64 = 3.0;

/// Marker radius in pixels.
pub const DEFAULT_MARKER_RADIUS: f64 = 5.0;

/// Delay between consecutive marker reveals.
pub const DEFAULT_STAGGER_MS: u64 = 10;

/// Duration of one marker reveal transition.
pub const DEFAULT_REVEAL_DURATION_MS: u64 = 500;

/// Offset of a tooltip from the pointer, in pixels.
pub const TOOLTIP_OFFSET: (f64, f64) = (10.0, 10.0);

/// Extra pick radius around markers for touch input.
pub const TOUCH_SLOP_PX: f64 = 6.0;

/// Boundary property holding the region identifier.
pub const DEFAULT_REGION_PROPERTY: &str = "ZIP";

/// TopoJSON object that holds the region geometries.
pub const DEFAULT_TOPOLOGY_OBJECT: &str = "zipcodes";
