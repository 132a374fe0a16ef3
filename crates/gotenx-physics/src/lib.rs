//! Core plasma state, pluggable transport closures, and pluggable source models.

pub mod error;
pub mod profiles;
pub mod sources;
pub mod transport;

pub use error::PhysicsError;
pub use profiles::CoreProfiles;

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, PhysicsError>;
