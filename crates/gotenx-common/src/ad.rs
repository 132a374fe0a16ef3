//! Reverse-mode automatic differentiation primitives.
//!
//! `grad` and `vjp` are the two AD entry points this numeric-primitives layer provides. Both
//! require the `Autodiff<B>` backend wrapper; the gradient-preserving
//! orchestrator (`gotenx-orchestrator::gradient`) is the only caller that constructs one, since
//! ordinary forward simulation runs on the plain backend and never needs gradients.

use burn::tensor::Tensor;
use burn::tensor::backend::AutodiffBackend;

use crate::array::LazyArray;

/// Computes `d(output)/d(input)` for a scalar-valued `f`, evaluated at `input`.
///
/// `f` must be built from `select`-style, data-independent control flow only; any
/// host-side branch on an array's runtime value inside `f` will have already failed at graph
/// construction time before `grad` is ever called.
pub fn grad<B, F>(input: &LazyArray<B>, f: F) -> LazyArray<B::InnerBackend>
where
    B: AutodiffBackend,
    F: FnOnce(Tensor<B, 1>) -> Tensor<B, 1>,
{
    let requiring_grad = input.tensor().clone().require_grad();
    let output = f(requiring_grad.clone());
    let gradients = output.backward();
    let grad_tensor = requiring_grad
        .grad(&gradients)
        .unwrap_or_else(|| Tensor::zeros_like(&requiring_grad.inner()));
    LazyArray::from_tensor(grad_tensor)
}

/// Vector-Jacobian product: computes `seed^T @ d(output)/d(input)` for a vector-valued `f`.
///
/// `gotenx-solve::operator`'s Jacobian build does not use this: it perturbs each state column
/// with rayon-parallel central finite differences instead (see its own doc comment and DESIGN.md
/// for why AD was not chosen there). This function is the general-purpose vector-Jacobian-product
/// primitive for any future caller that does want a reverse-mode column, e.g. one seed per output
/// row rather than one perturbation per input column.
pub fn vjp<B, F>(input: &LazyArray<B>, seed: &LazyArray<B>, f: F) -> LazyArray<B::InnerBackend>
where
    B: AutodiffBackend,
    F: FnOnce(Tensor<B, 1>) -> Tensor<B, 1>,
{
    let requiring_grad = input.tensor().clone().require_grad();
    let output = f(requiring_grad.clone());
    let weighted = output * seed.tensor().clone();
    let gradients = weighted.sum().backward();
    let grad_tensor = requiring_grad
        .grad(&gradients)
        .unwrap_or_else(|| Tensor::zeros_like(&requiring_grad.inner()));
    LazyArray::from_tensor(grad_tensor)
}
