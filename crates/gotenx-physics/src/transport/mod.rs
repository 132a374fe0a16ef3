//! Pluggable turbulent transport models.

mod bohm_gyrobohm;
mod constant;
mod critical_gradient;
mod density_transition;
mod qlknn;

pub use bohm_gyrobohm::BohmGyroBohmTransport;
pub use constant::ConstantTransport;
pub use critical_gradient::CriticalGradientTransport;
pub use density_transition::DensityTransitionTransport;
pub use qlknn::QlknnTransport;

use gotenx_geometry::Geometry;

use crate::error::PhysicsError;
use crate::profiles::CoreProfiles;

/// Per-cell turbulent transport coefficients for the three transported quantities.
///
/// All diffusivities are in m²/s; the particle pinch velocity is in m/s.
#[derive(Clone, Debug)]
pub struct TransportCoefficients {
    /// Ion heat diffusivity, `chi_i`.
    pub ion_heat_diffusivity: Vec<f64>,
    /// Electron heat diffusivity, `chi_e`.
    pub electron_heat_diffusivity: Vec<f64>,
    /// Particle diffusivity, `D_n`.
    pub particle_diffusivity: Vec<f64>,
    /// Particle pinch velocity, `v_n`; negative is inward.
    pub particle_pinch_velocity: Vec<f64>,
}

impl TransportCoefficients {
    /// Builds a zero-filled [`TransportCoefficients`] for `num_cells` radial cells.
    #[must_use]
    pub fn zeros(num_cells: usize) -> Self {
        Self {
            ion_heat_diffusivity: vec![0.0; num_cells],
            electron_heat_diffusivity: vec![0.0; num_cells],
            particle_diffusivity: vec![0.0; num_cells],
            particle_pinch_velocity: vec![0.0; num_cells],
        }
    }

    /// Adds `other` into `self` element-wise, the same summing convention
    /// [`crate::sources::SourceTerms::accumulate`] uses for multiple source models: the
    /// orchestrator runs every configured transport model and sums their contributions rather
    /// than picking just one.
    ///
    /// # Panics
    ///
    /// Panics if `self` and `other` disagree on cell count.
    pub fn accumulate(&mut self, other: &TransportCoefficients) {
        assert_eq!(self.ion_heat_diffusivity.len(), other.ion_heat_diffusivity.len(), "transport coefficient cell count mismatch");
        for (sum, value) in self.ion_heat_diffusivity.iter_mut().zip(&other.ion_heat_diffusivity) {
            *sum += value;
        }
        for (sum, value) in self.electron_heat_diffusivity.iter_mut().zip(&other.electron_heat_diffusivity) {
            *sum += value;
        }
        for (sum, value) in self.particle_diffusivity.iter_mut().zip(&other.particle_diffusivity) {
            *sum += value;
        }
        for (sum, value) in self.particle_pinch_velocity.iter_mut().zip(&other.particle_pinch_velocity) {
            *sum += value;
        }
    }

    /// Floors every diffusivity at [`MIN_DIFFUSIVITY`] so a momentary zero crossing from one
    /// model (or a cancelling sum of several) never reaches the coefficient builder.
    pub fn apply_diffusivity_floor(&mut self) {
        for value in &mut self.ion_heat_diffusivity {
            *value = value.max(MIN_DIFFUSIVITY);
        }
        for value in &mut self.electron_heat_diffusivity {
            *value = value.max(MIN_DIFFUSIVITY);
        }
        for value in &mut self.particle_diffusivity {
            *value = value.max(MIN_DIFFUSIVITY);
        }
    }
}

/// A pluggable turbulent transport closure.
///
/// Implementations must be pure functions of `profiles` and `geometry`, exactly like
/// [`crate::sources::SourceModel`].
pub trait TransportModel: Send + Sync {
    /// Evaluates this model's diffusivities and pinch velocity for the given profiles and
    /// geometry.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError`] if the model cannot produce a physical result.
    fn evaluate(
        &self,
        profiles: &CoreProfiles,
        geometry: &Geometry,
    ) -> Result<TransportCoefficients, PhysicsError>;

    /// A short human-readable name, used in logs and error messages.
    fn name(&self) -> &'static str;
}

/// Floor applied to every diffusivity before it reaches the coefficient builder, so a
/// transport model with a momentary zero crossing never produces a singular or unstable
/// discretization matrix.
pub const MIN_DIFFUSIVITY: f64 = 1e-3;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zeros_has_matching_lengths() {
        let coeffs = TransportCoefficients::zeros(7);
        assert_eq!(coeffs.ion_heat_diffusivity.len(), 7);
        assert_eq!(coeffs.electron_heat_diffusivity.len(), 7);
        assert_eq!(coeffs.particle_diffusivity.len(), 7);
        assert_eq!(coeffs.particle_pinch_velocity.len(), 7);
    }

    #[test]
    fn test_accumulate_sums_every_field() {
        let mut total = TransportCoefficients::zeros(3);
        let a = TransportCoefficients {
            ion_heat_diffusivity: vec![1.0; 3],
            electron_heat_diffusivity: vec![2.0; 3],
            particle_diffusivity: vec![0.5; 3],
            particle_pinch_velocity: vec![-0.1; 3],
        };
        total.accumulate(&a);
        total.accumulate(&a);
        assert_eq!(total.ion_heat_diffusivity, vec![2.0; 3]);
        assert_eq!(total.particle_pinch_velocity, vec![-0.2; 3]);
    }

    #[test]
    fn test_diffusivity_floor_clamps_low_values() {
        let mut coeffs = TransportCoefficients::zeros(3);
        coeffs.apply_diffusivity_floor();
        assert!(coeffs.ion_heat_diffusivity.iter().all(|&value| value == MIN_DIFFUSIVITY));
    }
}
