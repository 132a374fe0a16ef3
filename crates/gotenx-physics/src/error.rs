/// Errors raised by profile construction and physics models.
#[derive(thiserror::Error, Debug)]
pub enum PhysicsError {
    /// A profile field's length disagreed with the geometry's cell count.
    #[error("length mismatch: {field} has {actual}, expected {expected}")]
    LengthMismatch {
        /// Name of the offending field.
        field: &'static str,
        /// Length the field actually had.
        actual: usize,
        /// Length the field was expected to have.
        expected: usize,
    },

    /// A temperature field had a non-positive entry.
    #[error("{field} must be strictly positive everywhere, found {value} at cell {cell}")]
    NonPositiveTemperature {
        /// Name of the offending field.
        field: &'static str,
        /// The offending value.
        value: f64,
        /// Index of the offending cell.
        cell: usize,
    },

    /// The electron density dropped below the configured floor.
    #[error("electron_density {value} at cell {cell} is below the floor {floor}")]
    DensityBelowFloor {
        /// The offending value.
        value: f64,
        /// Index of the offending cell.
        cell: usize,
        /// The configured floor.
        floor: f64,
    },

    /// A profile contained a `NaN` or `Inf` value.
    #[error("{field} contains a non-finite value at cell {cell}")]
    NonFinite {
        /// Name of the offending field.
        field: &'static str,
        /// Index of the offending cell.
        cell: usize,
    },

    /// A transport or source model failed during its own evaluation (e.g. log of a negative
    /// argument). Caught and contained by [`crate::sources::CompositeSource`]; never fatal.
    #[error("model '{model}' failed to evaluate: {reason}")]
    ModelEvaluation {
        /// Name of the failing model.
        model: String,
        /// Human-readable reason.
        reason: String,
    },

    /// Debug-build-only magnitude guard: a `SourceTerms` carried an implausibly large heating
    /// density, almost always a MW/eV unit-conversion bug at the call site.
    #[error("peak heating {peak} MW/m^3 exceeds the debug guard {limit} MW/m^3 (likely a unit-conversion bug)")]
    ImplausibleHeatingMagnitude {
        /// The offending peak heating density, in MW/m^3.
        peak: f64,
        /// The configured debug-build guard.
        limit: f64,
    },

    /// Fusion fuel fractions did not sum to one within the configured tolerance.
    #[error("fuel fractions sum to {sum}, expected 1.0 within {tolerance}")]
    FuelFractionMismatch {
        /// The actual sum.
        sum: f64,
        /// The configured tolerance.
        tolerance: f64,
    },
}
