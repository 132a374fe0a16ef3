//! Pluggable heating, particle, and current-drive source models.

mod ecrh;
mod exchange;
mod fusion;
mod gas_puff;
mod ohmic;
mod pedestal;
mod radiation;

pub use ecrh::EcrhSource;
pub use exchange::IonElectronExchange;
pub use fusion::{FusionFuelMix, FusionSource};
pub use gas_puff::GasPuffSource;
pub use ohmic::OhmicSource;
pub use pedestal::PedestalSource;
pub use radiation::{ImpuritySpecies, RadiationSource};

use derive_is_enum_variant::is_enum_variant as IsEnumVariant;
use gotenx_geometry::Geometry;
use tracing::warn;

use crate::error::PhysicsError;
use crate::profiles::CoreProfiles;

#[cfg(debug_assertions)]
use gotenx_common::units::DEBUG_MAX_HEATING_MW_PER_M3;

/// Per-cell source densities contributed by one model, in the physics layer's native units
/// (MW/m³ for heating, m⁻³·s⁻¹ for particles, A·m⁻² for current drive). Every [`SourceModel`]
/// speaks these units; the MW/m³ → eV·m⁻³·s⁻¹ conversion for the temperature equations happens
/// exactly once, downstream, in [`gotenx_common::units`] via `gotenx-solve::coeffs`.
/// `metadata` is always present, even when empty: a zero-source simulation carries an
/// empty `Vec`, never a missing or null field.
#[derive(Clone, Debug, Default)]
pub struct SourceTerms {
    /// Ion heating density, MW/m³.
    pub ion_heating: Vec<f64>,
    /// Electron heating density, MW/m³.
    pub electron_heating: Vec<f64>,
    /// Particle source density, m⁻³·s⁻¹.
    pub particle_source: Vec<f64>,
    /// Non-inductive current drive density, A·m⁻².
    pub current_drive: Vec<f64>,
    /// One entry per contributing model, in evaluation order.
    pub metadata: Vec<SourceMetadataEntry>,
}

impl SourceTerms {
    /// Builds a zero-filled [`SourceTerms`] for `num_cells` radial cells, with empty metadata.
    #[must_use]
    pub fn zeros(num_cells: usize) -> Self {
        Self {
            ion_heating: vec![0.0; num_cells],
            electron_heating: vec![0.0; num_cells],
            particle_source: vec![0.0; num_cells],
            current_drive: vec![0.0; num_cells],
            metadata: Vec::new(),
        }
    }

    /// Sum of `ion_power + electron_power` over every metadata entry in the given category.
    /// `alpha_power` is reported separately and not folded into this total, keeping thermal
    /// ion/electron power distinct from alpha power.
    #[must_use]
    pub fn integrated_power(&self, category: SourceCategory) -> f64 {
        self.metadata.iter().filter(|entry| entry.category == category).map(|entry| entry.ion_power + entry.electron_power).sum()
    }

    /// Adds `other` into `self` element-wise, in place.
    ///
    /// # Panics
    ///
    /// Panics if the two terms were built for different cell counts; this is a programming
    /// error within the workspace, not a runtime condition, so it is not a recoverable
    /// [`PhysicsError`].
    pub fn accumulate(&mut self, other: &SourceTerms) {
        assert_eq!(self.ion_heating.len(), other.ion_heating.len(), "source term cell count mismatch");
        for (sum, value) in self.ion_heating.iter_mut().zip(&other.ion_heating) {
            *sum += value;
        }
        for (sum, value) in self.electron_heating.iter_mut().zip(&other.electron_heating) {
            *sum += value;
        }
        for (sum, value) in self.particle_source.iter_mut().zip(&other.particle_source) {
            *sum += value;
        }
        for (sum, value) in self.current_drive.iter_mut().zip(&other.current_drive) {
            *sum += value;
        }
        self.metadata.extend(other.metadata.iter().cloned());
    }

    /// Peak ion+electron heating magnitude across all cells, in MW/m³; used by the debug-build
    /// implausibility guard.
    #[must_use]
    fn peak_heating_mw_per_m3(&self) -> f64 {
        self.ion_heating.iter().chain(&self.electron_heating).map(|value| value.abs()).fold(0.0, f64::max)
    }
}

/// Integrates a heating density (MW/m³) against cell volumes, returning watts. Used to derive
/// each model's metadata power totals generically from the densities it already returns, rather
/// than requiring every model to separately track its own integrated power.
fn integrated_power_watts(heating_mw_per_m3: &[f64], volumes: &ndarray::Array1<f64>) -> f64 {
    heating_mw_per_m3.iter().zip(volumes.iter()).map(|(&density, &volume)| density * 1.0e6 * volume).sum()
}

/// The closed set of physical mechanisms a source model can represent: `fusion`, `auxiliary`,
/// `ohmic`, `radiation`, or `other`. Closed rather than open so the orchestrator can report
/// per-category totals (and, in particular, `Q_fusion = fusion / auxiliary`) without a catch-all
/// bucket growing ad hoc. Individual models keep their own identity in
/// [`SourceMetadataEntry::name`]; the category is only the coarse bucket the spec's derived
/// diagnostics group by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, IsEnumVariant)]
pub enum SourceCategory {
    /// Fusion alpha heating.
    Fusion,
    /// External heating and current-drive actuators (ECRH today; NBI/ICRH would land here too).
    Auxiliary,
    /// Ohmic (resistive) heating.
    Ohmic,
    /// Line and bremsstrahlung radiation losses (a negative contribution to heating).
    Radiation,
    /// Everything else: internal energy exchange, particle-only sources, and boundary-relaxation
    /// actuators that are not external heating systems in the auxiliary-power sense.
    Other,
}

/// One model's self-reported identity plus the scalar powers it integrated this step, attached
/// to the aggregate [`SourceTerms`] so the orchestrator can build per-category diagnostics
/// (fusion power, auxiliary power, ohmic power, ...) without re-deriving which model produced
/// what.
#[derive(Clone, Debug)]
pub struct SourceMetadataEntry {
    /// The category this model belongs to.
    pub category: SourceCategory,
    /// A short human-readable name, used in logs and error messages.
    pub name: &'static str,
    /// This model's contribution to total ion heating power, W.
    pub ion_power: f64,
    /// This model's contribution to total electron heating power, W.
    pub electron_power: f64,
    /// Alpha-particle power, W, populated only for [`SourceCategory::Fusion`] entries.
    pub alpha_power: Option<f64>,
}

/// A pluggable heating/particle/current-drive source.
///
/// Implementations must be pure functions of `profiles` and `geometry`: no internal mutable
/// state that would make two calls with identical inputs diverge.
pub trait SourceModel: Send + Sync {
    /// Evaluates this model's per-cell contribution for the given profiles and geometry, in
    /// solver units. The returned [`SourceTerms::metadata`] is always empty; [`CompositeSource`]
    /// fills in the one entry for this model by integrating the returned densities, so a model
    /// implementation only ever has to report densities.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError`] if the model cannot produce a physical result (e.g. a negative
    /// argument to a logarithm). Contained by [`CompositeSource`]; never propagated as a fatal
    /// simulation error.
    fn evaluate(&self, profiles: &CoreProfiles, geometry: &Geometry) -> Result<SourceTerms, PhysicsError>;

    /// This model's category, used to group metadata entries and to decide whether
    /// [`SourceMetadataEntry::alpha_power`] applies.
    fn category(&self) -> SourceCategory;

    /// A short human-readable name, used in logs and error messages.
    fn name(&self) -> &'static str;
}

/// Aggregates an arbitrary set of [`SourceModel`]s into one [`SourceTerms`], containing any
/// individual model failure rather than aborting the whole evaluation: a model
/// that fails contributes zero and is recorded, not propagated.
pub struct CompositeSource {
    models: Vec<Box<dyn SourceModel>>,
}

impl CompositeSource {
    /// Builds a composite from an ordered list of models. Order only affects the order models
    /// are logged in, not the summed result.
    #[must_use]
    pub fn new(models: Vec<Box<dyn SourceModel>>) -> Self {
        Self { models }
    }

    /// Evaluates every model and sums the successful contributions.
    ///
    /// A model that errors logs a warning naming itself and the reason, and contributes zero;
    /// in a debug build the peak heating magnitude of the aggregate is checked against
    /// [`DEBUG_MAX_HEATING_MW_PER_M3`] and returned as an error if exceeded.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::ImplausibleHeatingMagnitude`] in debug builds only, when the
    /// aggregate peak heating exceeds the debug guard.
    pub fn evaluate(&self, profiles: &CoreProfiles, geometry: &Geometry) -> Result<SourceTerms, PhysicsError> {
        let mut total = SourceTerms::zeros(profiles.num_cells());
        let volumes = geometry.cell_volumes();
        for model in &self.models {
            let category = model.category();
            let name = model.name();
            match model.evaluate(profiles, geometry) {
                Ok(mut contribution) => {
                    let ion_power = integrated_power_watts(&contribution.ion_heating, volumes);
                    let electron_power = integrated_power_watts(&contribution.electron_heating, volumes);
                    let alpha_power = category.is_fusion().then_some(ion_power + electron_power);
                    contribution.metadata = vec![SourceMetadataEntry { category, name, ion_power, electron_power, alpha_power }];
                    total.accumulate(&contribution);
                }
                Err(reason) => {
                    warn!(model = name, category = ?category, %reason, "source model failed, contributing zero");
                    total.metadata.push(SourceMetadataEntry { category, name, ion_power: 0.0, electron_power: 0.0, alpha_power: None });
                }
            }
        }

        #[cfg(debug_assertions)]
        {
            let peak = total.peak_heating_mw_per_m3();
            if peak > DEBUG_MAX_HEATING_MW_PER_M3 {
                return Err(PhysicsError::ImplausibleHeatingMagnitude { peak, limit: DEBUG_MAX_HEATING_MW_PER_M3 });
            }
        }

        Ok(total)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct AlwaysFails;

    impl SourceModel for AlwaysFails {
        fn evaluate(&self, profiles: &CoreProfiles, _geometry: &Geometry) -> Result<SourceTerms, PhysicsError> {
            let _ = profiles;
            Err(PhysicsError::ModelEvaluation { model: "always_fails".into(), reason: "intentional".into() })
        }

        fn category(&self) -> SourceCategory {
            SourceCategory::Ohmic
        }

        fn name(&self) -> &'static str {
            "always_fails"
        }
    }

    struct AddsOne;

    impl SourceModel for AddsOne {
        fn evaluate(&self, profiles: &CoreProfiles, _geometry: &Geometry) -> Result<SourceTerms, PhysicsError> {
            let mut terms = SourceTerms::zeros(profiles.num_cells());
            terms.ion_heating.fill(1.0);
            Ok(terms)
        }

        fn category(&self) -> SourceCategory {
            SourceCategory::Fusion
        }

        fn name(&self) -> &'static str {
            "adds_one"
        }
    }

    fn flat_profiles(n: usize) -> CoreProfiles {
        CoreProfiles::new(vec![1000.0; n], vec![1000.0; n], vec![1e20; n], vec![0.0; n], 1e18).unwrap()
    }

    #[test]
    fn test_failing_model_contributes_zero_and_does_not_abort() {
        let composite = CompositeSource::new(vec![Box::new(AlwaysFails), Box::new(AddsOne)]);
        let geometry = gotenx_geometry::Geometry::circular(&gotenx_geometry::CircularGeometryParams {
            num_cells: 10,
            major_radius: 6.2,
            minor_radius: 2.0,
            toroidal_field: 5.3,
            q_profile: None,
        })
        .unwrap();
        let result = composite.evaluate(&flat_profiles(10), &geometry).unwrap();
        assert_eq!(result.ion_heating, vec![1.0; 10]);
    }
}
