//! Critical-gradient (stiff) transport closure.
//!
//! Below a critical normalised logarithmic temperature gradient the diffusivity sits at a low
//! background value; above it, diffusivity rises steeply, approximating the "transport
//! stiffness" seen in gyrokinetic turbulence simulations once the drive crosses a threshold.

use gotenx_geometry::{Geometry, central_difference_gradient};
use ndarray::Array1;

use crate::error::PhysicsError;
use crate::profiles::CoreProfiles;

use super::{MIN_DIFFUSIVITY, TransportCoefficients, TransportModel};

/// Per-cell ion-temperature gradients `dT_i/dr`, reconstructed from face-centred central
/// differences. Shared by [`CriticalGradientTransport`] and the ITG sub-model in
/// `density_transition.rs`, so both read the same stiffness proxy off the same profile.
pub(super) fn ion_temperature_gradients(profiles: &CoreProfiles, geometry: &Geometry) -> Vec<f64> {
    let n = profiles.num_cells();
    let ti_profile = Array1::from_vec(profiles.ion_temperature().to_vec());
    let face_gradient = central_difference_gradient(&ti_profile, geometry.cell_distances());
    (0..n).map(|cell| 0.5 * (face_gradient[cell] + face_gradient[cell + 1])).collect()
}

/// The critical-gradient (ITG) stiffness formula for a single cell: a flat background
/// diffusivity below `critical_gradient`, rising linearly with the excess normalised gradient
/// `R/L_Ti` above it.
pub(super) fn itg_diffusivity(
    ti_ev: f64,
    ti_gradient: f64,
    major_radius: f64,
    background_diffusivity: f64,
    critical_gradient: f64,
    stiffness: f64,
) -> f64 {
    let ti_ev = ti_ev.max(1.0);
    let normalised_gradient = -major_radius * ti_gradient / ti_ev;
    let excess = (normalised_gradient - critical_gradient).max(0.0);
    background_diffusivity + stiffness * excess
}

/// A stiff transport closure driven by the normalised ion-temperature gradient
/// `R/L_Ti = -R * (dT_i/dr) / T_i`, the standard ITG-turbulence stiffness proxy.
#[derive(Clone, Copy, Debug)]
pub struct CriticalGradientTransport {
    /// Background (sub-critical) diffusivity, m²/s.
    pub background_diffusivity: f64,
    /// Critical value of `R/L_Ti` above which stiff transport switches on.
    pub critical_gradient: f64,
    /// Stiffness: diffusivity increase per unit of gradient above critical, m²/s.
    pub stiffness: f64,
}

impl TransportModel for CriticalGradientTransport {
    fn evaluate(
        &self,
        profiles: &CoreProfiles,
        geometry: &Geometry,
    ) -> Result<TransportCoefficients, PhysicsError> {
        let n = profiles.num_cells();
        let ion_temperature = profiles.ion_temperature();
        let major_radius = geometry.major_radius();
        let ti_gradient = ion_temperature_gradients(profiles, geometry);

        let mut ion_heat_diffusivity = vec![0.0; n];
        for cell in 0..n {
            let chi = itg_diffusivity(
                ion_temperature[cell],
                ti_gradient[cell],
                major_radius,
                self.background_diffusivity,
                self.critical_gradient,
                self.stiffness,
            );
            ion_heat_diffusivity[cell] = chi.max(MIN_DIFFUSIVITY);
        }

        Ok(TransportCoefficients {
            electron_heat_diffusivity: ion_heat_diffusivity.clone(),
            ion_heat_diffusivity,
            particle_diffusivity: vec![MIN_DIFFUSIVITY; n],
            particle_pinch_velocity: vec![0.0; n],
        })
    }

    fn name(&self) -> &'static str {
        "critical_gradient"
    }
}
