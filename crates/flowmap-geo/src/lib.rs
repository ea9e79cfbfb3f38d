#![forbid(unsafe_code)]

//! Geometry primitives shared by the flow-map crates.
//!
//! Everything is computed once at [`REFERENCE_ZOOM`] and rescaled with
//! [`Projection::scale_factor`] when the live map zooms.

pub mod arc;
pub mod bound;
pub mod location;
pub mod path;
pub mod projection;

pub use arc::{arc, segment_count};
pub use bound::{Bound, Margin, View, fit_view};
pub use location::{Location, Point};
pub use path::PathData;
pub use projection::{PixelBatch, Projection, REFERENCE_ZOOM, TILE_SIZE, unwrap_longitude};
