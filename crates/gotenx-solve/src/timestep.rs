//! Adaptive time-step control: CFL estimate, growth cap, absolute cap, and floor.

use gotenx_geometry::Geometry;
use gotenx_physics::transport::TransportCoefficients;

/// Configuration for the adaptive time-step controller.
#[derive(Clone, Copy, Debug)]
pub struct TimeStepConfig {
    /// Safety factor applied to the raw CFL estimate, `dt_cfl = safety * dx^2 / (2 * chi_max)`.
    pub cfl_safety_factor: f64,
    /// Maximum allowed ratio of a new time step to the previous one, preventing the controller
    /// from jumping to an unstable step after a quiet period.
    pub max_growth_factor: f64,
    /// Absolute ceiling on the time step, in seconds, regardless of what the CFL estimate would
    /// otherwise allow.
    pub max_step_seconds: f64,
    /// Absolute floor on the time step, in seconds; falling below this without converging is a
    /// [`crate::error::SolveError::TimeStepBelowFloor`].
    pub min_step_seconds: f64,
    /// Factor the step is multiplied by after a Newton failure, before retrying.
    pub shrink_factor: f64,
}

impl Default for TimeStepConfig {
    fn default() -> Self {
        Self {
            cfl_safety_factor: 0.5,
            max_growth_factor: 1.5,
            max_step_seconds: 1.0,
            min_step_seconds: 1e-8,
            shrink_factor: 0.5,
        }
    }
}

/// Estimates the explicit-scheme CFL-stable time step for the given transport coefficients and
/// geometry, `dt_cfl = safety * min(dx)^2 / (2 * max(chi))` over all three diffusivities.
///
/// Although the solver is fully implicit and unconditionally stable in the linear sense, the
/// CFL estimate still bounds the step size that keeps the frozen-coefficient Newton
/// linearisation a good approximation of the true nonlinear operator from one step
/// to the next.
#[must_use]
pub fn cfl_time_step(transport: &TransportCoefficients, geometry: &Geometry, config: &TimeStepConfig) -> f64 {
    let min_spacing = geometry.cell_distances().iter().copied().fold(f64::INFINITY, f64::min).max(1e-12);

    let max_diffusivity = transport
        .ion_heat_diffusivity
        .iter()
        .chain(&transport.electron_heat_diffusivity)
        .chain(&transport.particle_diffusivity)
        .copied()
        .fold(0.0_f64, f64::max)
        .max(1e-12);

    config.cfl_safety_factor * min_spacing.powi(2) / (2.0 * max_diffusivity)
}

/// Picks the next time step: the CFL estimate, capped by the absolute ceiling and by
/// `max_growth_factor` times the previous step, then floored at `min_step_seconds`.
#[must_use]
pub fn next_time_step(previous_step: f64, transport: &TransportCoefficients, geometry: &Geometry, config: &TimeStepConfig) -> f64 {
    let cfl_estimate = cfl_time_step(transport, geometry, config);
    let growth_capped = cfl_estimate.min(previous_step * config.max_growth_factor);
    growth_capped.min(config.max_step_seconds).max(config.min_step_seconds)
}

/// Shrinks a time step after a failed Newton solve, for the orchestrator's retry loop.
#[must_use]
pub fn shrink_time_step(step: f64, config: &TimeStepConfig) -> f64 {
    (step * config.shrink_factor).max(config.min_step_seconds)
}

#[cfg(test)]
mod test {
    use super::*;
    use gotenx_geometry::CircularGeometryParams;

    fn geometry(n: usize) -> Geometry {
        Geometry::circular(&CircularGeometryParams {
            num_cells: n,
            major_radius: 6.2,
            minor_radius: 2.0,
            toroidal_field: 5.3,
            q_profile: None,
        })
        .unwrap()
    }

    #[test]
    fn test_higher_diffusivity_shrinks_the_cfl_step() {
        let n = 20;
        let geom = geometry(n);
        let config = TimeStepConfig::default();
        let low = TransportCoefficients {
            ion_heat_diffusivity: vec![0.1; n],
            electron_heat_diffusivity: vec![0.1; n],
            particle_diffusivity: vec![0.1; n],
            particle_pinch_velocity: vec![0.0; n],
        };
        let high = TransportCoefficients {
            ion_heat_diffusivity: vec![10.0; n],
            electron_heat_diffusivity: vec![10.0; n],
            particle_diffusivity: vec![10.0; n],
            particle_pinch_velocity: vec![0.0; n],
        };
        assert!(cfl_time_step(&high, &geom, &config) < cfl_time_step(&low, &geom, &config));
    }

    #[test]
    fn test_growth_is_capped_relative_to_previous_step() {
        let n = 20;
        let geom = geometry(n);
        let config = TimeStepConfig { max_growth_factor: 1.2, ..TimeStepConfig::default() };
        let transport = TransportCoefficients {
            ion_heat_diffusivity: vec![1e-6; n],
            electron_heat_diffusivity: vec![1e-6; n],
            particle_diffusivity: vec![1e-6; n],
            particle_pinch_velocity: vec![0.0; n],
        };
        let next = next_time_step(0.01, &transport, &geom, &config);
        assert!(next <= 0.01 * 1.2 + 1e-12);
    }

    #[test]
    fn test_shrink_never_drops_below_floor() {
        let config = TimeStepConfig { min_step_seconds: 1e-4, ..TimeStepConfig::default() };
        assert_eq!(shrink_time_step(1e-5, &config), 1e-4);
    }
}
