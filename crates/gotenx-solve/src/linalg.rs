//! A small dense linear solve used by the Newton step's preconditioned update.
//!
//! The Jacobian here is dense (every cell couples to every other cell through the flux
//! divergence's neighbour stencil, and the four equations couple through shared profiles), so a
//! sparse or banded solver would not help at the cell counts this workspace targets
//! (`N <= 500`); a hand-rolled partial-pivot Gaussian elimination avoids pulling in a LAPACK
//! binding for a `4N x 4N` dense solve this size.

use ndarray::{Array1, Array2};

/// Solves `a * x = b` by Gaussian elimination with partial pivoting, returning `None` if `a` is
/// numerically singular (no pivot above [`PIVOT_EPSILON`] is found in some column).
#[must_use]
pub fn solve_dense(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    const PIVOT_EPSILON: f64 = 1e-13;

    let n = b.len();
    let mut matrix = a.clone();
    let mut rhs = b.clone();

    for pivot_col in 0..n {
        let pivot_row = (pivot_col..n).max_by(|&lhs, &rhs_row| {
            matrix[[lhs, pivot_col]].abs().partial_cmp(&matrix[[rhs_row, pivot_col]].abs()).unwrap_or(std::cmp::Ordering::Equal)
        })?;

        if matrix[[pivot_row, pivot_col]].abs() < PIVOT_EPSILON {
            return None;
        }

        if pivot_row != pivot_col {
            for col in 0..n {
                matrix.swap([pivot_row, col], [pivot_col, col]);
            }
            rhs.swap(pivot_row, pivot_col);
        }

        for row in (pivot_col + 1)..n {
            let factor = matrix[[row, pivot_col]] / matrix[[pivot_col, pivot_col]];
            if factor == 0.0 {
                continue;
            }
            for col in pivot_col..n {
                let pivot_value = matrix[[pivot_col, col]];
                matrix[[row, col]] -= factor * pivot_value;
            }
            rhs[row] -= factor * rhs[pivot_col];
        }
    }

    let mut solution = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let mut sum = rhs[row];
        for col in (row + 1)..n {
            sum -= matrix[[row, col]] * solution[col];
        }
        solution[row] = sum / matrix[[row, row]];
    }

    Some(solution)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_solves_a_well_conditioned_system() {
        let a = array![[2.0, 1.0], [1.0, 3.0]];
        let b = array![3.0, 4.0];
        let x = solve_dense(&a, &b).unwrap();
        assert_relative_eq!(x[0], 1.0, max_relative = 1e-9);
        assert_relative_eq!(x[1], 1.0, max_relative = 1e-9);
    }

    #[test]
    fn test_returns_none_for_singular_matrix() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let b = array![1.0, 2.0];
        assert!(solve_dense(&a, &b).is_none());
    }
}
