//! gp-core: shared foundation for gaspower.
//!
//! Contains:
//! - numeric (Real, time slack, |x| derivative)
//! - ids (compact handles for graph objects)
//! - valuemap (time-interpolated boundary, control and initial values)

pub mod ids;
pub mod numeric;
pub mod valuemap;

// Re-exports: nice ergonomics for downstream crates
pub use ids::*;
pub use numeric::*;
pub use valuemap::{
    BoundaryValue, ControlValue, InitialValue, Sample, ValueMap, ValueMapError, ValueMapResult,
};
