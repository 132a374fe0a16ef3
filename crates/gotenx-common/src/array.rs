//! Dense single-precision array type with elementwise ops, reductions, and reverse-mode AD.
//!
//! Operations on [`LazyArray`] build a computation graph; nothing actually runs until
//! [`LazyArray::eval`] (or the [`EvaluatedArray`] constructor, which calls it internally) forces
//! materialisation. Long pending graphs accumulated across loop iterations blow up memory and
//! compile time on the underlying device, so any loop with independent per-iteration results must
//! `eval` each iteration's result before starting the next. [`eval_profile_fields`] is the
//! orchestrator's end-of-step fence; the column-by-column Jacobian build in `gotenx-solve` is the
//! other loop this discipline matters for.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use ndarray::Array1;

use crate::error::ArrayError;

/// Default CPU backend. Swapping in `burn-wgpu` behind the `gpu` feature gives the same API on
/// a GPU device; nothing above this module needs to change.
pub type CpuBackend = burn_ndarray::NdArray<f32>;

/// Result type for array operations.
pub type Result<T> = std::result::Result<T, ArrayError>;

/// A single-precision, 1-D array with a pending (unmaterialised) computation graph.
///
/// Elementwise arithmetic operators are implemented via `burn`'s `Tensor` operator overloads;
/// the methods here cover reductions, the Patankar/Sauter-adjacent primitives (`clip`, `select`),
/// and the reverse-mode AD entry points.
pub struct LazyArray<B: Backend> {
    tensor: Tensor<B, 1>,
}

/// Rejects a backend whose float element is not 4 bytes wide (i.e. not `f32`): the hardware
/// constraint spec.md §4.1 calls out as non-negotiable ("attempts to construct double-precision
/// GPU arrays fail"). Checked by size rather than by matching a concrete type, so it rejects any
/// double-precision backend — CPU or GPU — not just `burn-wgpu`'s.
fn ensure_single_precision<B: Backend>() -> Result<()> {
    if std::mem::size_of::<B::FloatElem>() == std::mem::size_of::<f32>() {
        Ok(())
    } else {
        Err(ArrayError::UnsupportedPrecision(std::any::type_name::<B::FloatElem>()))
    }
}

impl<B: Backend> LazyArray<B> {
    /// Builds a [`LazyArray`] from a host-side slice.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::UnsupportedPrecision`] if `B`'s float element is not single
    /// precision.
    pub fn from_slice(data: &[f32], device: &B::Device) -> Result<Self> {
        ensure_single_precision::<B>()?;
        Ok(Self {
            tensor: Tensor::from_floats(data, device),
        })
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tensor.dims()[0]
    }

    /// Returns `true` if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_same_shape(&self, other: &Self) -> Result<()> {
        if self.tensor.dims() != other.tensor.dims() {
            return Err(ArrayError::ShapeMismatch {
                lhs: self.tensor.dims().to_vec(),
                rhs: other.tensor.dims().to_vec(),
            });
        }
        Ok(())
    }

    /// Elementwise addition.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other)?;
        Ok(Self {
            tensor: self.tensor.clone() + other.tensor.clone(),
        })
    }

    /// Elementwise subtraction.
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other)?;
        Ok(Self {
            tensor: self.tensor.clone() - other.tensor.clone(),
        })
    }

    /// Elementwise multiplication.
    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other)?;
        Ok(Self {
            tensor: self.tensor.clone() * other.tensor.clone(),
        })
    }

    /// Elementwise division.
    pub fn div(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other)?;
        Ok(Self {
            tensor: self.tensor.clone() / other.tensor.clone(),
        })
    }

    /// Sum of all elements.
    #[must_use]
    pub fn sum(&self) -> Self {
        Self {
            tensor: self.tensor.clone().sum(),
        }
    }

    /// Arithmetic mean of all elements.
    #[must_use]
    pub fn mean(&self) -> Self {
        Self {
            tensor: self.tensor.clone().mean(),
        }
    }

    /// Maximum of all elements.
    #[must_use]
    pub fn max(&self) -> Self {
        Self {
            tensor: self.tensor.clone().max(),
        }
    }

    /// Minimum of all elements.
    #[must_use]
    pub fn min(&self) -> Self {
        Self {
            tensor: self.tensor.clone().min(),
        }
    }

    /// Elementwise square root.
    #[must_use]
    pub fn sqrt(&self) -> Self {
        Self {
            tensor: self.tensor.clone().sqrt(),
        }
    }

    /// Elementwise natural exponential.
    #[must_use]
    pub fn exp(&self) -> Self {
        Self {
            tensor: self.tensor.clone().exp(),
        }
    }

    /// Elementwise natural logarithm. Negative or zero inputs flow through as `NaN`/`-inf`; the
    /// mandatory `eval` fence at the end of a time step is where those numerical
    /// degeneracies get caught.
    #[must_use]
    pub fn log(&self) -> Self {
        Self {
            tensor: self.tensor.clone().log(),
        }
    }

    /// Elementwise power by a scalar exponent.
    #[must_use]
    pub fn pow_scalar(&self, exponent: f32) -> Self {
        Self {
            tensor: self.tensor.clone().powf_scalar(exponent),
        }
    }

    /// Elementwise clip to `[min, max]`. This is the sanctioned, differentiable way to enforce
    /// physical floors (temperature, density) without branching on array values.
    #[must_use]
    pub fn clip(&self, min: f32, max: f32) -> Self {
        Self {
            tensor: self.tensor.clone().clamp(min, max),
        }
    }

    /// Differentiable elementwise select: `where(cond, a, b)`.
    ///
    /// `cond` is itself an array (nonzero meaning true) rather than a host-side boolean, so this
    /// composes inside the gradient-preserving orchestrator in place of any
    /// `if x > threshold` on profile values.
    pub fn select(cond: &Self, on_true: &Self, on_false: &Self) -> Result<Self> {
        cond.check_same_shape(on_true)?;
        cond.check_same_shape(on_false)?;
        let mask = cond.tensor.clone().greater_elem(0.0_f32);
        Ok(Self {
            tensor: on_true.tensor.clone().mask_where(mask, on_false.tensor.clone()),
        })
    }

    /// Forces materialisation of the pending computation graph and returns a wrapper that is safe
    /// to share across a concurrency boundary or store in a long-lived structure.
    #[must_use]
    pub fn eval(self) -> EvaluatedArray<B> {
        EvaluatedArray::new(self)
    }

    /// Copies the array's data to the host as an [`ndarray::Array1`]. Implies an `eval`.
    #[must_use]
    pub fn to_host(&self) -> Array1<f32> {
        let data: Vec<f32> = self.tensor.clone().into_data().to_vec().unwrap_or_default();
        Array1::from_vec(data)
    }
}

impl<B: Backend> LazyArray<B> {
    /// Wraps a raw tensor. Crate-private: callers outside `gotenx-common` build arrays through
    /// [`LazyArray::from_slice`] or the arithmetic/reduction methods above.
    pub(crate) fn from_tensor(tensor: Tensor<B, 1>) -> Self {
        Self { tensor }
    }

    /// Borrows the underlying tensor, for the AD primitives in [`crate::ad`].
    pub(crate) fn tensor(&self) -> &Tensor<B, 1> {
        &self.tensor
    }
}

impl<B: Backend> Clone for LazyArray<B> {
    fn clone(&self) -> Self {
        Self {
            tensor: self.tensor.clone(),
        }
    }
}

/// A [`LazyArray`] whose computation graph has already been materialised.
///
/// Construction forces an `eval`, so an `EvaluatedArray` can cross a concurrency boundary (passed
/// to a progress callback, stored in [`crate`]-external long-lived containers) without risking
/// unbounded graph growth on the other side. Raw [`LazyArray`]s must never escape the function
/// that built them for this reason.
pub struct EvaluatedArray<B: Backend> {
    tensor: Tensor<B, 1>,
}

impl<B: Backend> EvaluatedArray<B> {
    fn new(lazy: LazyArray<B>) -> Self {
        // Force the graph to materialise now rather than at first use downstream.
        let _ = lazy.tensor.clone().into_data();
        Self { tensor: lazy.tensor }
    }

    /// Re-wraps the evaluated tensor as a [`LazyArray`] to continue building a new graph on top
    /// of already-materialised data.
    #[must_use]
    pub fn into_lazy(self) -> LazyArray<B> {
        LazyArray { tensor: self.tensor }
    }

    /// Copies the array's data to the host as an [`ndarray::Array1`].
    #[must_use]
    pub fn to_host(&self) -> Array1<f32> {
        let data: Vec<f32> = self.tensor.clone().into_data().to_vec().unwrap_or_default();
        Array1::from_vec(data)
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tensor.dims()[0]
    }

    /// Returns `true` if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<B: Backend> Clone for EvaluatedArray<B> {
    fn clone(&self) -> Self {
        Self {
            tensor: self.tensor.clone(),
        }
    }
}

/// Materialises a fixed batch of `f64` profile fields through the lazy-array eval fence and
/// back, the mandatory boundary before the new profiles at the end of a time step are stored in
/// a long-lived container.
///
/// Each field is downcast to the single-precision backend, built as a [`LazyArray`], evaluated,
/// and copied back to the host as `f64`; this is also where any single-precision rounding in the
/// stored profile would first show up, since the round trip through `f32` is not lossless.
#[must_use]
pub fn eval_profile_fields<const N: usize>(fields: [&[f64]; N]) -> [Vec<f64>; N] {
    let device = <CpuBackend as Backend>::Device::default();
    fields.map(|field| {
        let as_f32: Vec<f32> = field.iter().map(|&value| value as f32).collect();
        let evaluated = LazyArray::<CpuBackend>::from_slice(&as_f32, &device)
            .expect("CpuBackend is single precision by construction")
            .eval();
        evaluated.to_host().iter().map(|&value| f64::from(value)).collect()
    })
}
