//! Cell↔face interpolation and gradient utilities shared by every equation's coefficient build.

use ndarray::Array1;

/// Floor applied to cell spacing before it is used as a division denominator, so a
/// vanishingly-thin cell near the axis cannot blow up a gradient.
pub const CELL_SPACING_EPSILON: f64 = 1e-10;

/// How adjacent cell-centred values are combined to produce a face value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceInterpolation {
    /// Arithmetic mean of the two neighbouring cells.
    Arithmetic,
    /// Pick the upwind cell's value according to the sign of a supplied velocity.
    Upwind,
}

/// Interpolates a cell-centred array of length `N` to `N + 1` face values.
///
/// Boundary faces (index `0` and `N`) copy the adjacent cell's value, matching the coefficient
/// builder's boundary-face convention.
#[must_use]
pub fn cell_to_face(cells: &Array1<f64>, mode: FaceInterpolation, velocity: Option<&Array1<f64>>) -> Array1<f64> {
    let n = cells.len();
    let mut faces = Array1::<f64>::zeros(n + 1);
    faces[0] = cells[0];
    faces[n] = cells[n - 1];
    for i in 1..n {
        faces[i] = match mode {
            FaceInterpolation::Arithmetic => 0.5 * (cells[i - 1] + cells[i]),
            FaceInterpolation::Upwind => {
                let v = velocity.map_or(0.0, |vel| vel[i]);
                if v >= 0.0 { cells[i - 1] } else { cells[i] }
            }
        };
    }
    faces
}

/// Central-difference gradient of a cell-centred array at faces, regularised by
/// [`CELL_SPACING_EPSILON`] so a near-zero cell spacing cannot produce an unbounded gradient.
///
/// `cell_distances` has length `N - 1` (the spacing between consecutive cell centres); the
/// returned array has length `N + 1`, with the two boundary faces set to zero (the coefficient
/// builder overrides these from the equation's boundary-condition descriptor).
#[must_use]
pub fn central_difference_gradient(cells: &Array1<f64>, cell_distances: &Array1<f64>) -> Array1<f64> {
    let n = cells.len();
    let mut gradient = Array1::<f64>::zeros(n + 1);
    for i in 1..n {
        let spacing = cell_distances[i - 1].max(CELL_SPACING_EPSILON);
        gradient[i] = (cells[i] - cells[i - 1]) / spacing;
    }
    gradient
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_arithmetic_mean_interior_faces() {
        let cells = array![1.0, 3.0, 5.0];
        let faces = cell_to_face(&cells, FaceInterpolation::Arithmetic, None);
        assert_eq!(faces.len(), 4);
        assert_relative_eq!(faces[0], 1.0);
        assert_relative_eq!(faces[1], 2.0);
        assert_relative_eq!(faces[2], 4.0);
        assert_relative_eq!(faces[3], 5.0);
    }

    #[test]
    fn test_gradient_regularises_tiny_spacing() {
        let cells = array![1.0, 2.0, 3.0];
        let distances = array![1e-15, 1.0];
        let gradient = central_difference_gradient(&cells, &distances);
        assert!(gradient[1].is_finite());
        assert!(gradient[1] <= 1.0 / CELL_SPACING_EPSILON + 1.0);
    }
}
