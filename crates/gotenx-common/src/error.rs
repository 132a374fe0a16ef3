/// Errors raised by the numeric-primitives layer.
#[derive(thiserror::Error, Debug)]
pub enum ArrayError {
    /// Two arrays were combined elementwise but their shapes did not match.
    #[error("shape mismatch: lhs has {lhs:?}, rhs has {rhs:?}")]
    ShapeMismatch {
        /// Shape of the left-hand operand.
        lhs: Vec<usize>,
        /// Shape of the right-hand operand.
        rhs: Vec<usize>,
    },

    /// A construction was attempted for a device/precision combination the hardware does not
    /// support (double precision on a GPU backend).
    #[error("unsupported precision {0} for this device")]
    UnsupportedPrecision(&'static str),

    /// Automatic differentiation was attempted through control flow that branches on an array's
    /// runtime value. Callers must use [`crate::array::LazyArray::select`] instead of host-side
    /// `if`.
    #[error("automatic differentiation through value-dependent control flow is not supported")]
    ValueDependentControlFlow,
}
