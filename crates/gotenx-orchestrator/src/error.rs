/// Errors raised while validating a configuration or running a simulation.
#[derive(thiserror::Error, Debug)]
pub enum OrchestratorError {
    /// A configuration field failed pre-simulation validation.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Human-readable description of what failed.
        reason: String,
    },

    /// Geometry construction failed.
    #[error("geometry construction failed: {0}")]
    Geometry(#[from] gotenx_geometry::GeometryError),

    /// Initial profile construction failed.
    #[error("initial profiles are invalid: {0}")]
    Profiles(#[from] gotenx_physics::PhysicsError),

    /// The Newton solver could not advance a time step.
    #[error("time step failed: {0}")]
    Solve(#[from] gotenx_solve::SolveError),

    /// An [`crate::output::OutputSink`] failed while writing a snapshot. Logged and the
    /// simulation continues, so this variant is
    /// surfaced in diagnostics rather than propagated as a fatal error.
    #[error("output sink '{sink}' failed: {reason}")]
    SinkFailure {
        /// Name of the failing sink.
        sink: String,
        /// Human-readable reason.
        reason: String,
    },
}
