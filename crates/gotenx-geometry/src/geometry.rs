//! The immutable radial mesh and its metric tensors.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Minimum supported cell count.
pub const MIN_CELLS: usize = 10;
/// Maximum supported cell count.
pub const MAX_CELLS: usize = 500;

/// A tiny positive floor applied to face area at the magnetic axis. A literal zero there would
/// violate the "all positive" geometry invariant while still being the physically
/// correct limit of a toroidal shell's area as `r -> 0`; we regularise rather than special-case
/// the axis face throughout the coefficient builder.
const AXIS_FACE_AREA_FLOOR: f64 = 1e-6;

/// Parameters for [`Geometry::circular`]: the common analytic fallback for a large-aspect-ratio,
/// circular cross-section tokamak, used whenever no reconstructed equilibrium is supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircularGeometryParams {
    /// Number of radial cells, `N ∈ [10, 500]`.
    pub num_cells: usize,
    /// Device major radius `R0`, in metres.
    pub major_radius: f64,
    /// Device minor radius `a`, in metres.
    pub minor_radius: f64,
    /// Vacuum toroidal field `B_t`, in tesla.
    pub toroidal_field: f64,
    /// A measured safety-factor profile, cell-centred, length `num_cells`. When present this is
    /// always preferred over the `q ≈ 1 + (r/a)²` approximation.
    pub q_profile: Option<Vec<f64>>,
}

/// Immutable radial mesh and metric tensors for the finite-volume discretisation.
///
/// Constructed once per simulation; never mutated afterwards. All lengths are
/// cell-centred (length `N`) except [`Geometry::face_areas`], which is face-valued
/// (length `N + 1`).
#[derive(Debug, Clone)]
pub struct Geometry {
    rho: Array1<f64>,
    radii: Array1<f64>,
    cell_distances: Array1<f64>,
    cell_volumes: Array1<f64>,
    face_areas: Array1<f64>,
    g0: Array1<f64>,
    g1: Array1<f64>,
    g2: Array1<f64>,
    major_radius: f64,
    minor_radius: f64,
    toroidal_field: f64,
}

impl Geometry {
    /// Constructs a [`Geometry`] directly from its fields, validating every invariant.
    ///
    /// Used by tests and by callers supplying a reconstructed-equilibrium geometry rather than the
    /// analytic circular fallback.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the cell count is out of range, `rho` is not a valid monotone
    /// grid, any array length disagrees with `N`, or any field that must be positive is not.
    #[expect(clippy::too_many_arguments, reason = "every field is an independent invariant to validate")]
    pub fn new(
        rho: Array1<f64>,
        radii: Array1<f64>,
        cell_distances: Array1<f64>,
        cell_volumes: Array1<f64>,
        face_areas: Array1<f64>,
        g0: Array1<f64>,
        g1: Array1<f64>,
        g2: Array1<f64>,
        major_radius: f64,
        minor_radius: f64,
        toroidal_field: f64,
    ) -> Result<Self, GeometryError> {
        let n = rho.len();
        if !(MIN_CELLS..=MAX_CELLS).contains(&n) {
            return Err(GeometryError::CellCountOutOfRange(n));
        }
        validate_rho(&rho)?;
        check_len("radii", radii.len(), n)?;
        check_len("cell_distances", cell_distances.len(), n - 1)?;
        check_len("cell_volumes", cell_volumes.len(), n)?;
        check_len("face_areas", face_areas.len(), n + 1)?;
        check_len("g0", g0.len(), n)?;
        check_len("g1", g1.len(), n)?;
        check_len("g2", g2.len(), n)?;

        check_all_positive("radii", &radii)?;
        check_all_positive("cell_volumes", &cell_volumes)?;
        check_all_positive("face_areas", &face_areas)?;
        check_all_positive("g0", &g0)?;
        check_all_positive("g1", &g1)?;
        check_all_positive("g2", &g2)?;
        check_positive_scalar("major_radius", major_radius)?;
        check_positive_scalar("minor_radius", minor_radius)?;
        check_positive_scalar("toroidal_field", toroidal_field)?;

        Ok(Self {
            rho,
            radii,
            cell_distances,
            cell_volumes,
            face_areas,
            g0,
            g1,
            g2,
            major_radius,
            minor_radius,
            toroidal_field,
        })
    }

    /// Builds the analytic large-aspect-ratio circular geometry.
    ///
    /// `g1 = g2 = 1` (flat-metric approximation); `g0` is taken proportional to the local minor
    /// radius weighted by the safety factor, which recovers the standard circular-tokamak
    /// flux-surface Jacobian scaling `√g ∝ q·r`. Face areas and cell volumes follow from
    /// integrating a thin toroidal shell, `dV/dr = 4π²·R0·r`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if `num_cells` is out of range or `q_profile` (when supplied)
    /// has the wrong length.
    pub fn circular(params: &CircularGeometryParams) -> Result<Self, GeometryError> {
        let n = params.num_cells;
        if !(MIN_CELLS..=MAX_CELLS).contains(&n) {
            return Err(GeometryError::CellCountOutOfRange(n));
        }
        if let Some(q) = &params.q_profile {
            check_len("q_profile", q.len(), n)?;
        }

        let dr = params.minor_radius / n as f64;
        let face_radii: Array1<f64> = Array1::from_shape_fn(n + 1, |i| i as f64 * dr);
        let radii: Array1<f64> = Array1::from_shape_fn(n, |i| (i as f64 + 0.5) * dr);
        let rho = &radii / params.minor_radius;

        let cell_distances: Array1<f64> = Array1::from_shape_fn(n.saturating_sub(1), |i| radii[i + 1] - radii[i]);

        let tau = std::f64::consts::TAU;
        let cell_volumes: Array1<f64> = Array1::from_shape_fn(n, |i| {
            0.5 * tau.powi(2) * params.major_radius * (face_radii[i + 1].powi(2) - face_radii[i].powi(2))
        });
        let face_areas: Array1<f64> = face_radii
            .mapv(|r| (tau.powi(2) * params.major_radius * r).max(AXIS_FACE_AREA_FLOOR));

        let q_of_rho: Array1<f64> = params.q_profile.as_ref().map_or_else(
            || rho.mapv(|r| 1.0 + r.powi(2)),
            |q| Array1::from(q.clone()),
        );
        let g0 = &radii * &q_of_rho;
        let g1 = Array1::<f64>::ones(n);
        let g2 = Array1::<f64>::ones(n);

        Self::new(
            rho,
            radii,
            cell_distances,
            cell_volumes,
            face_areas,
            g0,
            g1,
            g2,
            params.major_radius,
            params.minor_radius,
            params.toroidal_field,
        )
    }

    /// Number of radial cells.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.rho.len()
    }

    /// Normalised toroidal flux coordinate, cell-centred.
    #[must_use]
    pub fn rho(&self) -> &Array1<f64> {
        &self.rho
    }

    /// Minor-radius coordinate of each cell centre, in metres.
    #[must_use]
    pub fn radii(&self) -> &Array1<f64> {
        &self.radii
    }

    /// Spacing between consecutive cell centres, in metres. Length `N - 1`.
    #[must_use]
    pub fn cell_distances(&self) -> &Array1<f64> {
        &self.cell_distances
    }

    /// Cell volumes, in cubic metres.
    #[must_use]
    pub fn cell_volumes(&self) -> &Array1<f64> {
        &self.cell_volumes
    }

    /// Face areas, in square metres. Length `N + 1`.
    #[must_use]
    pub fn face_areas(&self) -> &Array1<f64> {
        &self.face_areas
    }

    /// Metric Jacobian `g0`, cell-centred; interpolated to faces by the coefficient builder
    /// before use in the flux-divergence metric form.
    #[must_use]
    pub fn g0(&self) -> &Array1<f64> {
        &self.g0
    }

    /// Metric coefficient `g1`, cell-centred.
    #[must_use]
    pub fn g1(&self) -> &Array1<f64> {
        &self.g1
    }

    /// Metric coefficient `g2`, cell-centred.
    #[must_use]
    pub fn g2(&self) -> &Array1<f64> {
        &self.g2
    }

    /// Device major radius, in metres.
    #[must_use]
    pub fn major_radius(&self) -> f64 {
        self.major_radius
    }

    /// Device minor radius, in metres.
    #[must_use]
    pub fn minor_radius(&self) -> f64 {
        self.minor_radius
    }

    /// Vacuum toroidal field, in tesla.
    #[must_use]
    pub fn toroidal_field(&self) -> f64 {
        self.toroidal_field
    }
}

fn validate_rho(rho: &Array1<f64>) -> Result<(), GeometryError> {
    if rho.iter().any(|&value| value < 0.0 || value > 1.01) {
        return Err(GeometryError::InvalidRho("value outside [0, 1.01]".to_owned()));
    }
    if rho.windows(2).into_iter().any(|pair| pair[1] < pair[0]) {
        return Err(GeometryError::InvalidRho("not monotone non-decreasing".to_owned()));
    }
    Ok(())
}

fn check_len(name: &'static str, actual: usize, expected: usize) -> Result<(), GeometryError> {
    if actual != expected {
        return Err(GeometryError::LengthMismatch {
            lhs_name: name,
            lhs_len: actual,
            rhs_name: "expected",
            rhs_len: expected,
        });
    }
    Ok(())
}

fn check_all_positive(name: &'static str, values: &Array1<f64>) -> Result<(), GeometryError> {
    if let Some(&value) = values.iter().find(|&&value| value <= 0.0) {
        return Err(GeometryError::NonPositiveField { field: name, value });
    }
    Ok(())
}

fn check_positive_scalar(name: &'static str, value: f64) -> Result<(), GeometryError> {
    if value <= 0.0 {
        return Err(GeometryError::NonPositiveField { field: name, value });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn iter_params() -> CircularGeometryParams {
        CircularGeometryParams {
            num_cells: 100,
            major_radius: 6.2,
            minor_radius: 2.0,
            toroidal_field: 5.3,
            q_profile: None,
        }
    }

    #[test]
    fn test_circular_geometry_invariants() {
        let geometry = Geometry::circular(&iter_params()).unwrap();
        assert_eq!(geometry.num_cells(), 100);
        assert!(geometry.rho().iter().all(|&r| (0.0..=1.01).contains(&r)));
        assert!(geometry.face_areas().iter().all(|&a| a > 0.0));
        assert!(geometry.cell_volumes().iter().all(|&v| v > 0.0));
    }

    #[test]
    fn test_rejects_cell_count_out_of_range() {
        let mut params = iter_params();
        params.num_cells = 5;
        assert!(Geometry::circular(&params).is_err());
    }

    #[test]
    fn test_prefers_supplied_q_profile() {
        let mut params = iter_params();
        let supplied = vec![1.5; params.num_cells];
        params.q_profile = Some(supplied.clone());
        let geometry = Geometry::circular(&params).unwrap();
        // g0 = radii * q, so with a flat q-profile, g0/radii must be constant.
        let ratio = geometry.g0()[50] / geometry.radii()[50];
        assert!((ratio - 1.5).abs() < 1e-9);
    }
}
