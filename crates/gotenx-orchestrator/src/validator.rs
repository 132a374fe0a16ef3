//! Pre-simulation validation: reject configurations that cannot succeed before the
//! first Newton step is ever attempted.

use gotenx_geometry::geometry::{MAX_CELLS, MIN_CELLS};

use crate::config::{SimulationConfig, SourceModelConfig};
use crate::error::OrchestratorError;

/// Runs every pre-simulation check against `config`, returning the first failure.
///
/// # Errors
///
/// Returns [`OrchestratorError::InvalidConfiguration`] naming the offending field and an
/// actionable hint, never a bare string.
pub fn validate(config: &SimulationConfig) -> Result<(), OrchestratorError> {
    validate_geometry_ranges(config)?;
    validate_initial_profile_ranges(config)?;
    validate_cfl_stability(config)?;
    validate_ecrh(config)?;
    validate_fuel_fractions(config)?;
    Ok(())
}

fn invalid(reason: impl Into<String>) -> OrchestratorError {
    OrchestratorError::InvalidConfiguration { reason: reason.into() }
}

fn validate_geometry_ranges(config: &SimulationConfig) -> Result<(), OrchestratorError> {
    let geometry = &config.geometry;
    if !(MIN_CELLS..=MAX_CELLS).contains(&geometry.num_cells) {
        return Err(invalid(format!(
            "geometry.num_cells = {} is outside [{MIN_CELLS}, {MAX_CELLS}]; pick a cell count in range",
            geometry.num_cells
        )));
    }
    if !(0.1..=20.0).contains(&geometry.major_radius) {
        return Err(invalid(format!("geometry.major_radius = {} m is outside the plausible [0.1, 20] m range", geometry.major_radius)));
    }
    if !(0.01..=10.0).contains(&geometry.minor_radius) {
        return Err(invalid(format!("geometry.minor_radius = {} m is outside the plausible [0.01, 10] m range", geometry.minor_radius)));
    }
    if geometry.minor_radius >= geometry.major_radius {
        return Err(invalid(format!(
            "geometry.minor_radius ({} m) must be smaller than major_radius ({} m)",
            geometry.minor_radius, geometry.major_radius
        )));
    }
    if !(0.1..=20.0).contains(&geometry.toroidal_field) {
        return Err(invalid(format!("geometry.toroidal_field = {} T is outside the plausible [0.1, 20] T range", geometry.toroidal_field)));
    }
    Ok(())
}

fn validate_initial_profile_ranges(config: &SimulationConfig) -> Result<(), OrchestratorError> {
    let profiles = &config.initial_profiles;
    let n = config.geometry.num_cells;
    for (field, values) in [
        ("initial_profiles.ion_temperature", &profiles.ion_temperature),
        ("initial_profiles.electron_temperature", &profiles.electron_temperature),
        ("initial_profiles.electron_density", &profiles.electron_density),
        ("initial_profiles.poloidal_flux", &profiles.poloidal_flux),
    ] {
        if values.len() != n {
            return Err(invalid(format!("{field} has {} entries, expected {n} (one per geometry cell)", values.len())));
        }
    }
    if profiles.ion_temperature.iter().any(|&value| !(0.0..=1.0e6).contains(&value)) {
        return Err(invalid("initial_profiles.ion_temperature has an entry outside the plausible [0, 1e6] eV range"));
    }
    if profiles.electron_temperature.iter().any(|&value| !(0.0..=1.0e6).contains(&value)) {
        return Err(invalid("initial_profiles.electron_temperature has an entry outside the plausible [0, 1e6] eV range"));
    }
    if profiles.electron_density.iter().any(|&value| !(1.0e15..=1.0e22).contains(&value)) {
        return Err(invalid("initial_profiles.electron_density has an entry outside the plausible [1e15, 1e22] m^-3 range"));
    }
    Ok(())
}

/// Estimates the CFL number from the initial temperature-gradient-free state: without a
/// transport evaluation yet available, this uses `max_step_seconds` as the caller-proposed `dt_0`
/// and a unit-order diffusivity guess scaled by the controller's own safety factor, matching the
/// spirit of a "reject if `dt_0 * chi_max / dx^2 > 1`" check without requiring a full model
/// evaluation before validation runs.
fn validate_cfl_stability(config: &SimulationConfig) -> Result<(), OrchestratorError> {
    let time_stepping = &config.time_stepping;
    let minor_radius = config.geometry.minor_radius;
    let num_cells = config.geometry.num_cells as f64;
    let dx = minor_radius / num_cells;

    let max_diffusivity = config
        .transport_models
        .iter()
        .map(|model| match *model {
            crate::config::TransportModelConfig::Constant { ion_heat_diffusivity, electron_heat_diffusivity, particle_diffusivity, .. } => {
                ion_heat_diffusivity.max(electron_heat_diffusivity).max(particle_diffusivity)
            }
            crate::config::TransportModelConfig::BohmGyroBohm { .. } => 10.0,
            crate::config::TransportModelConfig::CriticalGradient { background_diffusivity, .. } => background_diffusivity.max(10.0),
            crate::config::TransportModelConfig::Qlknn => 10.0,
            crate::config::TransportModelConfig::DensityTransition { itg_background_diffusivity, .. } => itg_background_diffusivity.max(10.0),
        })
        .fold(0.0_f64, f64::max)
        .max(1e-12);

    let cfl_number = time_stepping.initial_step_seconds * max_diffusivity / dx.powi(2);
    if cfl_number > 1.0 {
        return Err(invalid(format!(
            "time_stepping.initial_step_seconds = {}s gives an initial CFL number of {cfl_number:.3} (> 1) against the configured transport; lower \
             initial_step_seconds or rely on the adaptive controller's first CFL-bounded step",
            time_stepping.initial_step_seconds
        )));
    }
    Ok(())
}

fn validate_ecrh(config: &SimulationConfig) -> Result<(), OrchestratorError> {
    for model in &config.source_models {
        if let SourceModelConfig::Ecrh { deposition_rho, deposition_width, .. } = *model {
            if !(0.0..=1.0).contains(&deposition_rho) {
                return Err(invalid(format!("source_models: ecrh.deposition_rho = {deposition_rho} must lie in [0, 1]")));
            }
            if deposition_width <= 0.0 {
                return Err(invalid(format!("source_models: ecrh.deposition_width = {deposition_width} must be strictly positive")));
            }
        }
    }
    Ok(())
}

fn validate_fuel_fractions(config: &SimulationConfig) -> Result<(), OrchestratorError> {
    let tolerance = config.solver.physical_thresholds.fuel_fraction_tolerance;
    for model in &config.source_models {
        if let SourceModelConfig::Fusion { deuterium_fraction, tritium_fraction } = *model {
            let sum = deuterium_fraction + tritium_fraction;
            if (sum - 1.0).abs() > tolerance {
                return Err(invalid(format!(
                    "source_models: fusion fuel fractions sum to {sum}, expected 1.0 within {tolerance} \
                     (deuterium_fraction + tritium_fraction must equal 1)"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{
        BoundaryConditionConfig, BoundaryConfig, GeometryConfig, InitialProfilesConfig, OutputConfig, SolverConfig, TimeSteppingConfig,
        TransportModelConfig,
    };

    fn minimal_valid_config() -> SimulationConfig {
        let n = 50;
        SimulationConfig {
            geometry: GeometryConfig { num_cells: n, major_radius: 6.2, minor_radius: 2.0, toroidal_field: 5.3 },
            initial_profiles: InitialProfilesConfig {
                ion_temperature: vec![1000.0; n],
                electron_temperature: vec![1000.0; n],
                electron_density: vec![1.0e20; n],
                poloidal_flux: vec![0.0; n],
                density_floor: 1.0e18,
            },
            transport_models: vec![TransportModelConfig::Constant {
                ion_heat_diffusivity: 1.0,
                electron_heat_diffusivity: 1.0,
                particle_diffusivity: 0.5,
                particle_pinch_velocity: 0.0,
            }],
            source_models: vec![SourceModelConfig::Fusion { deuterium_fraction: 0.5, tritium_fraction: 0.5 }],
            boundaries: BoundaryConfig {
                ion_temperature_edge: BoundaryConditionConfig::Dirichlet { value: 1000.0 },
                electron_temperature_edge: BoundaryConditionConfig::Dirichlet { value: 1000.0 },
                electron_density_edge: BoundaryConditionConfig::Dirichlet { value: 1.0e20 },
                poloidal_flux_edge: BoundaryConditionConfig::Dirichlet { value: 0.0 },
            },
            time_stepping: TimeSteppingConfig {
                end_time_seconds: 1.0,
                initial_step_seconds: 1.0e-3,
                cfl_safety_factor: 0.5,
                max_growth_factor: 1.5,
                max_step_seconds: 1.0,
                min_step_seconds: None,
                min_step_fraction: 0.001,
                shrink_factor: 0.5,
                renormalize_every_steps: 1000,
            },
            solver: SolverConfig::default(),
            output: OutputConfig::default(),
        }
    }

    #[test]
    fn test_minimal_config_validates() {
        assert!(validate(&minimal_valid_config()).is_ok());
    }

    #[test]
    fn test_rejects_cell_count_out_of_range() {
        let mut config = minimal_valid_config();
        config.geometry.num_cells = 5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_minor_radius_not_smaller_than_major() {
        let mut config = minimal_valid_config();
        config.geometry.minor_radius = config.geometry.major_radius;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_ecrh_deposition_rho_out_of_range() {
        let mut config = minimal_valid_config();
        config.source_models.push(SourceModelConfig::Ecrh {
            total_power_mw: 20.0,
            deposition_rho: 1.5,
            deposition_width: 0.1,
            current_drive_efficiency: 0.0,
        });
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_fuel_fraction_mismatch() {
        let mut config = minimal_valid_config();
        config.source_models = vec![SourceModelConfig::Fusion { deuterium_fraction: 0.4, tritium_fraction: 0.4 }];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_unstable_initial_cfl_number() {
        let mut config = minimal_valid_config();
        config.transport_models =
            vec![TransportModelConfig::Constant { ion_heat_diffusivity: 1.0e6, electron_heat_diffusivity: 1.0e6, particle_diffusivity: 1.0e6, particle_pinch_velocity: 0.0 }];
        config.time_stepping.initial_step_seconds = 1.0;
        assert!(validate(&config).is_err());
    }
}
