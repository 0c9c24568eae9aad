//! World-side perception for the rover: frame conversions from classified
//! pixels to vehicle-centric, polar and world coordinates, and the
//! attitude-gated accumulation of detections into a persistent grid.

pub mod accumulator;
pub mod convert;
pub mod error;
pub mod grid;

pub use accumulator::{AttitudeGate, GateDecision, MapAccumulator, WorldObservations};
pub use convert::{image_coords, polar, rotate, to_cell, to_polar, to_world, translate, vehicle_coords, world_cell};
pub use error::{MapError, MapResult};
pub use grid::WorldGrid;
