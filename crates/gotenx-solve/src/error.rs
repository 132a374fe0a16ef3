/// Errors raised while assembling coefficients or advancing the Newton-Raphson time step.
#[derive(thiserror::Error, Debug)]
pub enum SolveError {
    /// A transport or source model propagated a [`gotenx_physics::PhysicsError`] that the
    /// coefficient builder could not recover from (distinct from the per-model containment
    /// [`gotenx_physics::sources::CompositeSource`] already performs).
    #[error("coefficient assembly failed: {0}")]
    Physics(#[from] gotenx_physics::PhysicsError),

    /// The Newton-Raphson iteration did not reach the configured tolerance within the
    /// configured maximum iteration count.
    #[error("Newton iteration failed to converge after {iterations} iterations (final residual norm {residual_norm})")]
    NotConverged {
        /// Number of iterations attempted.
        iterations: usize,
        /// The residual norm at the last iteration.
        residual_norm: f64,
    },

    /// The line search could not find a step that reduced the residual norm, even at the
    /// smallest configured step fraction.
    #[error("line search failed to find a descent step at iteration {iteration}")]
    LineSearchFailed {
        /// The Newton iteration at which the line search failed.
        iteration: usize,
    },

    /// The adaptive time-step controller reduced the step below its configured floor without
    /// achieving convergence.
    #[error("time step fell below the configured floor {floor_seconds}s while retrying")]
    TimeStepBelowFloor {
        /// The configured floor, in seconds.
        floor_seconds: f64,
    },

    /// A Jacobian column evaluation produced a non-finite value.
    #[error("Jacobian column {column} contains a non-finite entry")]
    NonFiniteJacobianColumn {
        /// Index of the offending column.
        column: usize,
    },
}
