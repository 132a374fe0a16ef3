//! Residual assembly and its Jacobian for the fully-implicit backward-Euler time step.
//!
//! The residual is assembled once per Newton iteration from the four transported fields
//! flattened into a single vector `[T_i | T_e | n_e | psi]`, each block of length `N`. The
//! Jacobian is built column-by-column by finite-difference perturbation, parallelised across
//! columns with `rayon` since each column is an independent residual evaluation; see DESIGN.md
//! for why finite differences were chosen over automatic differentiation here.

use gotenx_geometry::Geometry;
use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::boundary::BoundaryCondition;
use crate::coeffs::{AllEquationCoefficients, EquationCoefficients};

/// The four transported fields, flattened to one vector of length `4N` in the fixed block order
/// `[ion_temperature | electron_temperature | electron_density | poloidal_flux]`.
#[derive(Clone, Debug)]
pub struct StateVector {
    /// Radial cell count `N`; each block has this length.
    pub num_cells: usize,
    /// The flattened `4N` state.
    pub values: Array1<f64>,
}

impl StateVector {
    /// Builds a [`StateVector`] from the four separate profile arrays.
    #[must_use]
    pub fn from_fields(ion_temperature: &[f64], electron_temperature: &[f64], electron_density: &[f64], poloidal_flux: &[f64]) -> Self {
        let num_cells = ion_temperature.len();
        let mut values = Array1::<f64>::zeros(4 * num_cells);
        values.slice_mut(ndarray::s![0..num_cells]).assign(&Array1::from_vec(ion_temperature.to_vec()));
        values.slice_mut(ndarray::s![num_cells..2 * num_cells]).assign(&Array1::from_vec(electron_temperature.to_vec()));
        values.slice_mut(ndarray::s![2 * num_cells..3 * num_cells]).assign(&Array1::from_vec(electron_density.to_vec()));
        values.slice_mut(ndarray::s![3 * num_cells..4 * num_cells]).assign(&Array1::from_vec(poloidal_flux.to_vec()));
        Self { num_cells, values }
    }

    /// View of the ion temperature block.
    #[must_use]
    pub fn ion_temperature(&self) -> ndarray::ArrayView1<'_, f64> {
        self.values.slice(ndarray::s![0..self.num_cells])
    }

    /// View of the electron temperature block.
    #[must_use]
    pub fn electron_temperature(&self) -> ndarray::ArrayView1<'_, f64> {
        self.values.slice(ndarray::s![self.num_cells..2 * self.num_cells])
    }

    /// View of the electron density block.
    #[must_use]
    pub fn electron_density(&self) -> ndarray::ArrayView1<'_, f64> {
        self.values.slice(ndarray::s![2 * self.num_cells..3 * self.num_cells])
    }

    /// View of the poloidal flux block.
    #[must_use]
    pub fn poloidal_flux(&self) -> ndarray::ArrayView1<'_, f64> {
        self.values.slice(ndarray::s![3 * self.num_cells..4 * self.num_cells])
    }
}

/// The flux crossing face `face` of one equation's stencil, including the boundary's fixed
/// value or fixed flux where `face` is `0` or `N`.
fn flux_at_face(face: usize, phi: ndarray::ArrayView1<'_, f64>, coeffs: &EquationCoefficients) -> f64 {
    let n = phi.len();
    let conductance = coeffs.face_conductance[face];
    let flow = coeffs.face_flow[face];

    if face == 0 {
        return match coeffs.boundary.axis {
            BoundaryCondition::Neumann(_) => flow,
            BoundaryCondition::Dirichlet(ghost) => {
                let right = phi[0];
                let diffusive = conductance * (ghost - right);
                let upwind = if flow >= 0.0 { ghost } else { right };
                diffusive + flow * upwind
            }
        };
    }
    if face == n {
        return match coeffs.boundary.edge {
            BoundaryCondition::Neumann(_) => flow,
            BoundaryCondition::Dirichlet(ghost) => {
                let left = phi[n - 1];
                let diffusive = conductance * (left - ghost);
                let upwind = if flow >= 0.0 { left } else { ghost };
                diffusive + flow * upwind
            }
        };
    }

    let left = phi[face - 1];
    let right = phi[face];
    let diffusive = conductance * (left - right);
    let upwind = if flow >= 0.0 { left } else { right };
    diffusive + flow * upwind
}

/// Assembles one equation's block of the residual: backward-Euler accumulation plus
/// flux-divergence minus source, per cell.
fn assemble_equation_residual(
    phi_new: ndarray::ArrayView1<'_, f64>,
    phi_previous: ndarray::ArrayView1<'_, f64>,
    dt: f64,
    coeffs: &EquationCoefficients,
    cell_volumes: &Array1<f64>,
) -> Array1<f64> {
    let n = phi_new.len();
    Array1::from_shape_fn(n, |cell| {
        let volume = cell_volumes[cell];
        let accumulation = volume * (phi_new[cell] - phi_previous[cell]) / dt;
        let flux_west = flux_at_face(cell, phi_new, coeffs);
        let flux_east = flux_at_face(cell + 1, phi_new, coeffs);
        let source = coeffs.source[cell] * volume;
        accumulation + (flux_east - flux_west) - source
    })
}

/// Assembles the full `4N` residual vector for the current Newton iterate.
///
/// # Panics
///
/// Panics if `state` and `previous` disagree on `num_cells`; this is a programming error within
/// the orchestrator's time-stepping loop, never a runtime condition on user input.
#[must_use]
pub fn assemble_residual(
    state: &StateVector,
    previous: &StateVector,
    dt: f64,
    coeffs: &AllEquationCoefficients,
    geometry: &Geometry,
) -> Array1<f64> {
    assert_eq!(state.num_cells, previous.num_cells, "state and previous must share a cell count");
    let n = state.num_cells;
    let cell_volumes = geometry.cell_volumes();

    let mut residual = Array1::<f64>::zeros(4 * n);
    residual
        .slice_mut(ndarray::s![0..n])
        .assign(&assemble_equation_residual(state.ion_temperature(), previous.ion_temperature(), dt, &coeffs.ion_temperature, cell_volumes));
    residual.slice_mut(ndarray::s![n..2 * n]).assign(&assemble_equation_residual(
        state.electron_temperature(),
        previous.electron_temperature(),
        dt,
        &coeffs.electron_temperature,
        cell_volumes,
    ));
    residual.slice_mut(ndarray::s![2 * n..3 * n]).assign(&assemble_equation_residual(
        state.electron_density(),
        previous.electron_density(),
        dt,
        &coeffs.electron_density,
        cell_volumes,
    ));
    residual.slice_mut(ndarray::s![3 * n..4 * n]).assign(&assemble_equation_residual(
        state.poloidal_flux(),
        previous.poloidal_flux(),
        dt,
        &coeffs.poloidal_flux,
        cell_volumes,
    ));
    residual
}

/// Builds the dense `4N x 4N` Jacobian of [`assemble_residual`] at `state` by central-difference
/// perturbation, one column per state component. Columns are independent residual evaluations
/// and are computed in parallel with `rayon`, the same pattern the physics-model error
/// containment uses for per-model independence.
///
/// The coefficients (`coeffs`) are held fixed across the perturbation, a frozen-coefficient
/// (Picard-style) Jacobian approximation: transport/source models are not re-evaluated per
/// perturbed state. This trades some Newton convergence rate for one coefficient build per
/// iteration instead of per Jacobian column, standard practice for fully-implicit tokamak
/// transport solvers at this coupling scale.
#[must_use]
pub fn assemble_jacobian(
    state: &StateVector,
    previous: &StateVector,
    dt: f64,
    coeffs: &AllEquationCoefficients,
    geometry: &Geometry,
    perturbation: f64,
) -> Array2<f64> {
    let size = state.values.len();
    let columns: Vec<Array1<f64>> = (0..size)
        .into_par_iter()
        .map(|column| {
            let step = perturbation.max(1e-10) * state.values[column].abs().max(1.0);

            let mut forward = state.clone();
            forward.values[column] += step;
            let residual_forward = assemble_residual(&forward, previous, dt, coeffs, geometry);

            let mut backward = state.clone();
            backward.values[column] -= step;
            let residual_backward = assemble_residual(&backward, previous, dt, coeffs, geometry);

            (residual_forward - residual_backward) / (2.0 * step)
        })
        .collect();

    let mut jacobian = Array2::<f64>::zeros((size, size));
    for (column, values) in columns.into_iter().enumerate() {
        jacobian.slice_mut(ndarray::s![.., column]).assign(&values);
    }
    jacobian
}

/// Index of the first column of `jacobian` containing a non-finite entry, if any: a residual
/// that overflows or divides by zero under perturbation poisons that whole column.
#[must_use]
pub fn first_non_finite_column(jacobian: &Array2<f64>) -> Option<usize> {
    (0..jacobian.ncols()).find(|&column| jacobian.column(column).iter().any(|value| !value.is_finite()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::boundary::{BoundaryConditions, EquationBoundary};
    use crate::coeffs::build_all_coefficients;
    use gotenx_geometry::CircularGeometryParams;
    use gotenx_physics::CoreProfiles;
    use gotenx_physics::sources::SourceTerms;
    use gotenx_physics::transport::TransportCoefficients;

    fn flat_setup(n: usize) -> (Geometry, AllEquationCoefficients, StateVector) {
        let geometry = Geometry::circular(&CircularGeometryParams {
            num_cells: n,
            major_radius: 6.2,
            minor_radius: 2.0,
            toroidal_field: 5.3,
            q_profile: None,
        })
        .unwrap();
        let profiles = CoreProfiles::new(vec![1000.0; n], vec![1000.0; n], vec![1e20; n], vec![0.0; n], 1e18).unwrap();
        let transport = TransportCoefficients {
            ion_heat_diffusivity: vec![1.0; n],
            electron_heat_diffusivity: vec![1.0; n],
            particle_diffusivity: vec![0.5; n],
            particle_pinch_velocity: vec![0.0; n],
        };
        let sources = SourceTerms::zeros(n);
        let boundaries = BoundaryConditions {
            ion_temperature: EquationBoundary::symmetric_axis_with_edge_value(1000.0),
            electron_temperature: EquationBoundary::symmetric_axis_with_edge_value(1000.0),
            electron_density: EquationBoundary::symmetric_axis_with_edge_value(1e20),
            poloidal_flux: EquationBoundary::symmetric_axis_with_edge_value(0.0),
        };
        let coeffs = build_all_coefficients(&transport, &sources, &geometry, boundaries);
        let state = StateVector::from_fields(
            profiles.ion_temperature(),
            profiles.electron_temperature(),
            profiles.electron_density(),
            profiles.poloidal_flux(),
        );
        (geometry, coeffs, state)
    }

    #[test]
    fn test_steady_state_with_zero_source_and_flat_profile_has_zero_residual() {
        let n = 10;
        let (geometry, coeffs, state) = flat_setup(n);
        let previous = state.clone();
        let residual = assemble_residual(&state, &previous, 1.0, &coeffs, &geometry);
        assert!(residual.iter().all(|&value| value.abs() < 1e-6));
    }

    #[test]
    fn test_jacobian_is_square_and_finite() {
        let n = 6;
        let (geometry, coeffs, state) = flat_setup(n);
        let previous = state.clone();
        let jacobian = assemble_jacobian(&state, &previous, 1.0, &coeffs, &geometry, 1e-6);
        assert_eq!(jacobian.shape(), &[4 * n, 4 * n]);
        assert!(jacobian.iter().all(|value| value.is_finite()));
        assert_eq!(first_non_finite_column(&jacobian), None);
    }

    #[test]
    fn test_first_non_finite_column_finds_a_nan_entry() {
        let mut jacobian = Array2::<f64>::zeros((4, 4));
        jacobian[[2, 3]] = f64::NAN;
        assert_eq!(first_non_finite_column(&jacobian), Some(3));
    }
}
