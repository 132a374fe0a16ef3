//! Bohm/gyro-Bohm mixed transport closure.
//!
//! `chi = chi_B * coefficient_bohm + chi_gB * coefficient_gyrobohm`, the standard empirical mix
//! used when a first-principles turbulent-transport model is unavailable.

use gotenx_geometry::{Geometry, central_difference_gradient};
use ndarray::Array1;

use crate::error::PhysicsError;
use crate::profiles::CoreProfiles;

use super::{MIN_DIFFUSIVITY, TransportCoefficients, TransportModel};

/// Bohm/gyro-Bohm mixing weights and an overall normalisation, tuned per device rather than
/// derived; the exact weighting is left to the implementation.
#[derive(Clone, Copy, Debug)]
pub struct BohmGyroBohmTransport {
    /// Weight on the Bohm term.
    pub bohm_coefficient: f64,
    /// Weight on the gyro-Bohm term.
    pub gyrobohm_coefficient: f64,
    /// Overall normalisation applied to both terms.
    pub normalisation: f64,
}

impl TransportModel for BohmGyroBohmTransport {
    fn evaluate(
        &self,
        profiles: &CoreProfiles,
        geometry: &Geometry,
    ) -> Result<TransportCoefficients, PhysicsError> {
        let n = profiles.num_cells();
        let electron_temperature = profiles.electron_temperature();
        let minor_radius = geometry.minor_radius();
        let toroidal_field = geometry.toroidal_field();

        let te_profile = Array1::from_vec(electron_temperature.to_vec());
        let face_gradient = central_difference_gradient(&te_profile, geometry.cell_distances());
        // face_gradient is face-valued (length N + 1); average the two bounding faces back to a
        // cell-centred gradient.
        let te_gradient: Vec<f64> = (0..n).map(|cell| 0.5 * (face_gradient[cell] + face_gradient[cell + 1])).collect();

        let mut ion_heat_diffusivity = vec![0.0; n];
        let mut electron_heat_diffusivity = vec![0.0; n];

        for cell in 0..n {
            let te_ev = electron_temperature[cell].max(1.0);
            let te_joule = te_ev * gotenx_common::units::ELEMENTARY_CHARGE;
            let gradient_scale_length = (te_ev / te_gradient[cell].abs().max(1e-6)).min(minor_radius);

            let chi_bohm = te_joule / (ELECTRON_CHARGE_OVER_MASS_DENOMINATOR * toroidal_field);
            let rho_star = ion_sound_gyroradius(te_joule, toroidal_field) / minor_radius;
            let chi_gyrobohm = chi_bohm * rho_star * (minor_radius / gradient_scale_length.max(1e-6));

            let chi = self.normalisation
                * (self.bohm_coefficient * chi_bohm + self.gyrobohm_coefficient * chi_gyrobohm);
            let chi = chi.max(MIN_DIFFUSIVITY);
            ion_heat_diffusivity[cell] = chi;
            electron_heat_diffusivity[cell] = chi;
        }

        Ok(TransportCoefficients {
            ion_heat_diffusivity,
            electron_heat_diffusivity,
            particle_diffusivity: vec![MIN_DIFFUSIVITY; n],
            particle_pinch_velocity: vec![0.0; n],
        })
    }

    fn name(&self) -> &'static str {
        "bohm_gyrobohm"
    }
}

/// Placeholder for the `e * B / m_e` factor folded into a single constant for the simplified
/// Bohm estimate `chi_B = T_e / (16 * e * B)`.
const ELECTRON_CHARGE_OVER_MASS_DENOMINATOR: f64 = 16.0;

/// Deuterium mass, in kg, used for the ion sound gyroradius estimate.
const DEUTERIUM_MASS_KG: f64 = 3.343_583_72e-27;

fn ion_sound_gyroradius(te_joule: f64, toroidal_field: f64) -> f64 {
    let ion_sound_speed = (te_joule / DEUTERIUM_MASS_KG).sqrt();
    let cyclotron_frequency = gotenx_common::units::ELEMENTARY_CHARGE * toroidal_field / DEUTERIUM_MASS_KG;
    ion_sound_speed / cyclotron_frequency.max(1e-6)
}

#[cfg(test)]
mod test {
    use super::*;
    use gotenx_geometry::CircularGeometryParams;

    #[test]
    fn test_bohm_gyrobohm_produces_bounded_positive_diffusivities() {
        let n = 20;
        let geometry = Geometry::circular(&CircularGeometryParams {
            num_cells: n,
            major_radius: 6.2,
            minor_radius: 2.0,
            toroidal_field: 5.3,
            q_profile: None,
        })
        .unwrap();
        let temperature: Vec<f64> = (0..n).map(|i| 5000.0 - 40.0 * i as f64).collect();
        let profiles = crate::profiles::CoreProfiles::new(temperature.clone(), temperature, vec![1e20; n], vec![0.0; n], 1e18).unwrap();

        let model = BohmGyroBohmTransport { bohm_coefficient: 0.1, gyrobohm_coefficient: 0.05, normalisation: 1.0 };
        let coeffs = model.evaluate(&profiles, &geometry).unwrap();
        assert!(coeffs.ion_heat_diffusivity.iter().all(|&value| value >= super::MIN_DIFFUSIVITY));
        assert!(coeffs.ion_heat_diffusivity.iter().all(|&value| value.is_finite()));
    }
}
