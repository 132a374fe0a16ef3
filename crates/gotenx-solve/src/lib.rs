//! Coefficient assembly and the fully-implicit Newton-Raphson time step.

pub mod boundary;
pub mod bootstrap;
pub mod coeffs;
pub mod error;
pub mod linalg;
pub mod newton;
pub mod operator;
pub mod scaling;
pub mod timestep;

pub use error::SolveError;

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, SolveError>;
