//! Geometry primitives, projection, configuration and the map engine.

pub mod bounds;
pub mod config;
pub mod constants;
pub mod geo;
pub mod map;
pub mod projection;
