//! Numeric primitives shared across the gotenx workspace: the lazy/evaluated array wrapper,
//! AD entry points, and unit-conversion constants.

pub mod ad;
pub mod array;
pub mod error;
pub mod units;

pub use array::{CpuBackend, EvaluatedArray, LazyArray};
pub use error::ArrayError;
