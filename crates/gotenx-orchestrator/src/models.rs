//! Builds boxed [`TransportModel`]/[`SourceModel`] trait objects from their config
//! representations. This is the one place the config layer's closed enums are matched against
//! the physics crate's closed model set.

use gotenx_physics::sources::{EcrhSource, FusionFuelMix, FusionSource, GasPuffSource, ImpuritySpecies, IonElectronExchange, OhmicSource, PedestalSource, RadiationSource, SourceModel};
use gotenx_physics::transport::{BohmGyroBohmTransport, ConstantTransport, CriticalGradientTransport, DensityTransitionTransport, QlknnTransport, TransportModel};

use crate::config::{PhysicalThresholdsConfig, RadiatingSpeciesConfig, SourceModelConfig, TransportModelConfig};
use crate::error::OrchestratorError;

/// Builds one boxed transport model from its config entry.
#[must_use]
pub fn build_transport_model(config: &TransportModelConfig) -> Box<dyn TransportModel> {
    match *config {
        TransportModelConfig::Constant { ion_heat_diffusivity, electron_heat_diffusivity, particle_diffusivity, particle_pinch_velocity } => {
            Box::new(ConstantTransport { ion_heat_diffusivity, electron_heat_diffusivity, particle_diffusivity, particle_pinch_velocity })
        }
        TransportModelConfig::BohmGyroBohm { bohm_coefficient, gyrobohm_coefficient, normalisation } => {
            Box::new(BohmGyroBohmTransport { bohm_coefficient, gyrobohm_coefficient, normalisation })
        }
        TransportModelConfig::CriticalGradient { background_diffusivity, critical_gradient, stiffness } => {
            Box::new(CriticalGradientTransport { background_diffusivity, critical_gradient, stiffness })
        }
        TransportModelConfig::Qlknn => Box::new(QlknnTransport::default()),
        TransportModelConfig::DensityTransition {
            itg_background_diffusivity,
            itg_critical_gradient,
            itg_stiffness,
            ri_coefficient,
            ri_rate_hz,
            transition_density,
            transition_width,
            ion_mass_amu,
            peak_pinch_velocity,
        } => Box::new(DensityTransitionTransport {
            itg_background_diffusivity,
            itg_critical_gradient,
            itg_stiffness,
            ri_coefficient,
            ri_rate_hz,
            transition_density,
            transition_width,
            ion_mass_amu,
            peak_pinch_velocity,
        }),
    }
}

fn species_from_config(species: RadiatingSpeciesConfig) -> ImpuritySpecies {
    match species {
        RadiatingSpeciesConfig::Carbon => ImpuritySpecies::Carbon,
        RadiatingSpeciesConfig::Neon => ImpuritySpecies::Neon,
        RadiatingSpeciesConfig::Argon => ImpuritySpecies::Argon,
        RadiatingSpeciesConfig::Tungsten => ImpuritySpecies::Tungsten,
    }
}

/// Builds one boxed source model from its config entry. `physical_thresholds` supplies the
/// diagnostic-only thresholds that a handful of models need at construction time (currently only
/// [`OhmicSource`]'s flux-variation skip).
///
/// # Errors
///
/// Returns [`OrchestratorError::InvalidConfiguration`] if the model's own constructor rejects the
/// config (e.g. a fusion fuel mix that does not sum to one).
pub fn build_source_model(config: &SourceModelConfig, physical_thresholds: &PhysicalThresholdsConfig) -> Result<Box<dyn SourceModel>, OrchestratorError> {
    match *config {
        SourceModelConfig::Fusion { deuterium_fraction, tritium_fraction } => {
            let fuel_mix = FusionFuelMix { deuterium: deuterium_fraction, tritium: tritium_fraction };
            let source = FusionSource::new(fuel_mix).map_err(|error| OrchestratorError::InvalidConfiguration { reason: error.to_string() })?;
            Ok(Box::new(source))
        }
        SourceModelConfig::Ohmic => Ok(Box::new(OhmicSource::new(physical_thresholds.flux_variation_threshold_for_ohmic_skip))),
        SourceModelConfig::IonElectronExchange => Ok(Box::new(IonElectronExchange)),
        SourceModelConfig::Radiation { species, concentration } => Ok(Box::new(RadiationSource::new(species_from_config(species), concentration))),
        SourceModelConfig::Ecrh { total_power_mw, deposition_rho, deposition_width, current_drive_efficiency } => {
            Ok(Box::new(EcrhSource { total_power_mw, deposition_rho, deposition_width, current_drive_efficiency }))
        }
        SourceModelConfig::GasPuff { particle_rate, penetration_depth } => Ok(Box::new(GasPuffSource { particle_rate, penetration_depth })),
        SourceModelConfig::Pedestal { width_cells, target_temperature_ev, target_density, relaxation_rate, gain_adaptation_rate, max_particle_source } => {
            Ok(Box::new(PedestalSource { width_cells, target_temperature_ev, target_density, relaxation_rate, gain_adaptation_rate, max_particle_source }))
        }
    }
}
