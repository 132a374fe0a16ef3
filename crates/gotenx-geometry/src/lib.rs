//! Immutable radial mesh and metric tensors.

pub mod error;
pub mod geometry;
pub mod interp;

pub use error::GeometryError;
pub use geometry::{CircularGeometryParams, Geometry, MAX_CELLS, MIN_CELLS};
pub use interp::{FaceInterpolation, cell_to_face, central_difference_gradient};

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, GeometryError>;
