//! The fully-implicit Newton-Raphson time step.

use gotenx_common::units::MIN_TEMPERATURE_EV;
use gotenx_geometry::Geometry;
use ndarray::Array1;
use tracing::debug;

use crate::coeffs::AllEquationCoefficients;
use crate::error::SolveError;
use crate::linalg::solve_dense;
use crate::operator::{StateVector, assemble_jacobian, assemble_residual, first_non_finite_column};
use crate::scaling::EquationScales;

/// Per-equation convergence tolerances, each applied to that equation's scaled residual RMS
/// norm.
#[derive(Clone, Copy, Debug)]
pub struct ConvergenceTolerances {
    /// Tolerance for the ion temperature equation's scaled residual norm.
    pub ion_temperature: f64,
    /// Tolerance for the electron temperature equation's scaled residual norm.
    pub electron_temperature: f64,
    /// Tolerance for the electron density equation's scaled residual norm.
    pub electron_density: f64,
    /// Tolerance for the poloidal flux equation's scaled residual norm.
    pub poloidal_flux: f64,
}

impl ConvergenceTolerances {
    /// A tolerance of `1e-6` on every equation's scaled residual norm, tight enough that the
    /// scaled state has converged to single-precision-irrelevant accuracy.
    #[must_use]
    pub fn uniform(tolerance: f64) -> Self {
        Self { ion_temperature: tolerance, electron_temperature: tolerance, electron_density: tolerance, poloidal_flux: tolerance }
    }
}

/// Configuration for one Newton-Raphson solve of a single time step.
#[derive(Clone, Copy, Debug)]
pub struct NewtonConfig {
    /// Maximum Newton iterations before [`SolveError::NotConverged`] is returned.
    pub max_iterations: usize,
    /// Per-equation convergence tolerances on the scaled residual.
    pub tolerances: ConvergenceTolerances,
    /// Relative perturbation used to build the finite-difference Jacobian.
    pub jacobian_perturbation: f64,
    /// Smallest line-search step fraction tried before declaring
    /// [`SolveError::LineSearchFailed`].
    pub line_search_min_fraction: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            tolerances: ConvergenceTolerances::uniform(1e-6),
            jacobian_perturbation: 1e-6,
            line_search_min_fraction: 1.0 / 64.0,
        }
    }
}

/// Scaled residual RMS norm per equation block, used both for the convergence test and the
/// line search's descent criterion.
#[derive(Clone, Copy, Debug)]
struct BlockNorms {
    ion_temperature: f64,
    electron_temperature: f64,
    electron_density: f64,
    poloidal_flux: f64,
}

fn block_norms(scaled_residual: &Array1<f64>, num_cells: usize) -> BlockNorms {
    let rms = |start: usize| -> f64 {
        let block = scaled_residual.slice(ndarray::s![start..start + num_cells]);
        (block.iter().map(|value| value * value).sum::<f64>() / num_cells as f64).sqrt()
    };
    BlockNorms {
        ion_temperature: rms(0),
        electron_temperature: rms(num_cells),
        electron_density: rms(2 * num_cells),
        poloidal_flux: rms(3 * num_cells),
    }
}

fn has_converged(norms: BlockNorms, tolerances: ConvergenceTolerances) -> bool {
    norms.ion_temperature < tolerances.ion_temperature
        && norms.electron_temperature < tolerances.electron_temperature
        && norms.electron_density < tolerances.electron_density
        && norms.poloidal_flux < tolerances.poloidal_flux
}

fn total_norm(norms: BlockNorms) -> f64 {
    (norms.ion_temperature.powi(2) + norms.electron_temperature.powi(2) + norms.electron_density.powi(2) + norms.poloidal_flux.powi(2)).sqrt()
}

fn scale_residual(residual: &Array1<f64>, scales: &[f64]) -> Array1<f64> {
    Array1::from_shape_fn(residual.len(), |index| residual[index] / scales[index].max(1e-300))
}

/// Clips temperatures and density to their solver floors after every accepted Newton update,
/// leaving the poloidal flux unclipped.
fn enforce_floors(state: &mut StateVector, density_floor: f64) {
    let n = state.num_cells;
    for cell in 0..n {
        if state.values[cell] < MIN_TEMPERATURE_EV {
            state.values[cell] = MIN_TEMPERATURE_EV;
        }
        if state.values[n + cell] < MIN_TEMPERATURE_EV {
            state.values[n + cell] = MIN_TEMPERATURE_EV;
        }
        if state.values[2 * n + cell] < density_floor {
            state.values[2 * n + cell] = density_floor;
        }
    }
}

/// A converged Newton solve: the new state plus the bookkeeping the orchestrator's run
/// statistics need.
#[derive(Clone, Debug)]
pub struct NewtonSolution {
    /// The converged state at the end of the time step.
    pub state: StateVector,
    /// Number of Newton iterations taken to converge.
    pub iterations: usize,
    /// The scaled residual norm at convergence.
    pub residual_norm: f64,
}

/// Advances one fully-implicit backward-Euler time step from `previous` by Newton-Raphson
/// iteration, returning the converged state.
///
/// # Errors
///
/// Returns [`SolveError::NotConverged`] if `config.max_iterations` is exhausted,
/// [`SolveError::LineSearchFailed`] if no step fraction above `config.line_search_min_fraction`
/// reduces the scaled residual norm, [`SolveError::NonFiniteJacobianColumn`] if a perturbed
/// residual evaluation produced a non-finite entry, or propagates a singular-Jacobian condition
/// as [`SolveError::NotConverged`] (a singular Jacobian cannot usefully report a residual norm,
/// so it is folded into the same "did not converge" outcome rather than a distinct variant).
pub fn solve_step(
    initial_guess: &StateVector,
    previous: &StateVector,
    dt: f64,
    coeffs: &AllEquationCoefficients,
    geometry: &Geometry,
    scales: EquationScales,
    density_floor: f64,
    config: &NewtonConfig,
) -> Result<NewtonSolution, SolveError> {
    let num_cells = initial_guess.num_cells;
    let scale_vector = scales.to_flat(num_cells);

    let mut state = initial_guess.clone();
    let mut residual = assemble_residual(&state, previous, dt, coeffs, geometry);
    let mut norms = block_norms(&scale_residual(&residual, &scale_vector), num_cells);

    for iteration in 0..config.max_iterations {
        if has_converged(norms, config.tolerances) {
            debug!(iteration, "Newton iteration converged");
            return Ok(NewtonSolution { state, iterations: iteration, residual_norm: total_norm(norms) });
        }

        let jacobian = assemble_jacobian(&state, previous, dt, coeffs, geometry, config.jacobian_perturbation);
        if let Some(column) = first_non_finite_column(&jacobian) {
            return Err(SolveError::NonFiniteJacobianColumn { column });
        }

        // Diagonal preconditioning: solve in scaled variables y = x / scale, so
        // dR/dy_j = dR/dx_j * scale_j. The resulting step is then rescaled back to x-space.
        let mut scaled_jacobian = jacobian.clone();
        for (column, &scale) in scale_vector.iter().enumerate() {
            let mut column_view = scaled_jacobian.column_mut(column);
            column_view *= scale;
        }

        let neg_residual = residual.mapv(|value| -value);
        let Some(scaled_step) = solve_dense(&scaled_jacobian, &neg_residual) else {
            return Err(SolveError::NotConverged { iterations: iteration, residual_norm: total_norm(norms) });
        };
        let step: Array1<f64> = Array1::from_shape_fn(scaled_step.len(), |index| scaled_step[index] * scale_vector[index]);

        let mut step_fraction = 1.0;
        loop {
            let mut trial = state.clone();
            trial.values = &state.values + &(&step * step_fraction);
            let trial_residual = assemble_residual(&trial, previous, dt, coeffs, geometry);
            let trial_norms = block_norms(&scale_residual(&trial_residual, &scale_vector), num_cells);

            if total_norm(trial_norms) <= total_norm(norms) || step_fraction <= config.line_search_min_fraction {
                if total_norm(trial_norms) > total_norm(norms) {
                    return Err(SolveError::LineSearchFailed { iteration });
                }
                enforce_floors(&mut trial, density_floor);
                state = trial;
                residual = assemble_residual(&state, previous, dt, coeffs, geometry);
                norms = block_norms(&scale_residual(&residual, &scale_vector), num_cells);
                break;
            }
            step_fraction *= 0.5;
        }
    }

    Err(SolveError::NotConverged { iterations: config.max_iterations, residual_norm: total_norm(norms) })
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

    #[test]
    fn test_flat_state_with_matching_boundary_converges_immediately() {
        let n = 8;
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

        let result = solve_step(&state, &state, 1.0, &coeffs, &geometry, EquationScales::iter_baseline(), 1e18, &NewtonConfig::default());
        assert!(result.is_ok());
        assert_eq!(result.unwrap().iterations, 0);
    }
}
