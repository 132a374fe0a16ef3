/// Errors raised while constructing or querying a [`crate::geometry::Geometry`].
#[derive(thiserror::Error, Debug)]
pub enum GeometryError {
    /// Cell count fell outside the supported range `[10, 500]`.
    #[error("cell count {0} outside supported range [10, 500]")]
    CellCountOutOfRange(usize),

    /// `rho` was not monotone non-decreasing, or left its allowed range `[0, 1.01]`.
    #[error("rho is not a valid monotone grid: {0}")]
    InvalidRho(String),

    /// A field that must be strictly positive (radii, volumes, areas, field strength) was not.
    #[error("{field} must be strictly positive, got {value}")]
    NonPositiveField {
        /// Name of the offending field.
        field: &'static str,
        /// The offending value.
        value: f64,
    },

    /// Two arrays that are required to have matching lengths did not.
    #[error("length mismatch: {lhs_name} has {lhs_len}, {rhs_name} has {rhs_len}")]
    LengthMismatch {
        /// Name of the left-hand array.
        lhs_name: &'static str,
        /// Length of the left-hand array.
        lhs_len: usize,
        /// Name of the right-hand array.
        rhs_name: &'static str,
        /// Length of the right-hand array.
        rhs_len: usize,
    },
}
