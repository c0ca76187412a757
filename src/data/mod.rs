//! Wire formats: inspection records, boundary documents and backend aggregates.

pub mod aggregates;
pub mod boundary;
pub mod geojson;
pub mod records;
pub mod topojson;

pub use aggregates::{RegionAggregates, RegionTotals};
pub use boundary::{BoundaryRegion, BoundarySet};
pub use records::{Category, GeographicPoint, InspectionRecord};
