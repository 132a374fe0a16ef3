//! Density-regime transport closure blending ITG and resistive-interchange transport.
//!
//! Below a configured transition density the plasma is taken to sit in a resistive-interchange
//! (RI) dominated regime (low collisionality, edge/SOL-adjacent); above it, ITG-turbulence
//! stiffness dominates, the same closure [`super::CriticalGradientTransport`] implements. A
//! sigmoid in local electron density blends the two rather than switching on a hard threshold,
//! so the coefficient builder never sees a discontinuous diffusivity across cells.

use gotenx_geometry::Geometry;

use crate::error::PhysicsError;
use crate::profiles::CoreProfiles;

use super::critical_gradient::{ion_temperature_gradients, itg_diffusivity};
use super::{MIN_DIFFUSIVITY, TransportCoefficients, TransportModel};

/// Proton mass, in kilograms: the isotope-mass multiplier for the ion sound Larmor radius.
const PROTON_MASS_KG: f64 = 1.672_621_923_69e-27;

/// Lower clip on this model's blended diffusivity, m²/s.
const CHI_MIN: f64 = 1e-6;
/// Upper clip on this model's blended diffusivity, m²/s.
const CHI_MAX: f64 = 100.0;

/// Blends an ITG-regime heat diffusivity with a resistive-interchange heat diffusivity via a
/// sigmoid in local electron density, centred on `transition_density`.
///
/// Isotope mass enters **only** through the ion sound Larmor radius `rho_s` used by the RI
/// branch; the ITG branch and the blending sigmoid carry no mass dependence of their own, so the
/// isotope effect is never scaled twice.
#[derive(Clone, Copy, Debug)]
pub struct DensityTransitionTransport {
    /// Background (sub-critical) ITG diffusivity, m²/s.
    pub itg_background_diffusivity: f64,
    /// Critical `R/L_Ti` above which the ITG branch turns on.
    pub itg_critical_gradient: f64,
    /// ITG stiffness: diffusivity increase per unit of gradient above critical, m²/s.
    pub itg_stiffness: f64,
    /// Dimensionless mixing-length coefficient multiplying `rho_s^2 * ri_rate_hz` in the RI
    /// branch.
    pub ri_coefficient: f64,
    /// Characteristic resistive-interchange relaxation rate, in Hz. Mass-independent by
    /// construction: the isotope effect must enter only through `rho_s`, never through this rate.
    pub ri_rate_hz: f64,
    /// Electron density at which the sigmoid is centred, m⁻³.
    pub transition_density: f64,
    /// Sigmoid width, m⁻³.
    pub transition_width: f64,
    /// Main ion mass, in atomic mass units (2.0 for pure deuterium, 2.5 for an equal D-T mix).
    pub ion_mass_amu: f64,
    /// Peak inward pinch velocity at the edge, m/s (negative is inward).
    pub peak_pinch_velocity: f64,
}

impl DensityTransitionTransport {
    /// Ion sound Larmor radius `rho_s = sqrt(m_i * T_e) / (e * B)`, evaluated at the electron
    /// temperature with the configured main-ion mass. The sole point in this model where isotope
    /// mass enters.
    fn ion_sound_larmor_radius(&self, te_ev: f64, toroidal_field: f64) -> f64 {
        let te_joules = te_ev.max(1.0) * gotenx_common::units::ELEMENTARY_CHARGE;
        let ion_mass_kg = self.ion_mass_amu * PROTON_MASS_KG;
        (ion_mass_kg * te_joules).sqrt() / (gotenx_common::units::ELEMENTARY_CHARGE * toroidal_field)
    }

    /// Resistive-interchange mixing-length diffusivity at one cell: `rho_s^2 * ri_rate_hz`,
    /// scaled by the configured dimensionless coefficient.
    fn ri_diffusivity(&self, te_ev: f64, toroidal_field: f64) -> f64 {
        let rho_s = self.ion_sound_larmor_radius(te_ev, toroidal_field);
        self.ri_coefficient * rho_s * rho_s * self.ri_rate_hz
    }
}

impl TransportModel for DensityTransitionTransport {
    fn evaluate(
        &self,
        profiles: &CoreProfiles,
        geometry: &Geometry,
    ) -> Result<TransportCoefficients, PhysicsError> {
        let n = profiles.num_cells();
        let electron_density = profiles.electron_density();
        let electron_temperature = profiles.electron_temperature();
        let ion_temperature = profiles.ion_temperature();
        let major_radius = geometry.major_radius();
        let toroidal_field = geometry.toroidal_field();
        let width = self.transition_width.max(1.0);
        let ti_gradient = ion_temperature_gradients(profiles, geometry);

        let mut ion_heat_diffusivity = vec![0.0; n];
        let mut electron_heat_diffusivity = vec![0.0; n];
        let mut particle_pinch_velocity = vec![0.0; n];

        for cell in 0..n {
            let sigmoid = 1.0 / (1.0 + (-(electron_density[cell] - self.transition_density) / width).exp());

            let chi_itg = itg_diffusivity(
                ion_temperature[cell],
                ti_gradient[cell],
                major_radius,
                self.itg_background_diffusivity,
                self.itg_critical_gradient,
                self.itg_stiffness,
            );
            let chi_ri = self.ri_diffusivity(electron_temperature[cell], toroidal_field);

            let chi = sigmoid * chi_itg + (1.0 - sigmoid) * chi_ri;
            let clipped = chi.clamp(CHI_MIN, CHI_MAX);
            ion_heat_diffusivity[cell] = clipped;
            electron_heat_diffusivity[cell] = clipped;
            // The RI branch dominates toward the low-density edge, where the pinch strengthens.
            particle_pinch_velocity[cell] = -self.peak_pinch_velocity.abs() * (1.0 - sigmoid);
        }

        Ok(TransportCoefficients {
            ion_heat_diffusivity,
            electron_heat_diffusivity,
            particle_diffusivity: vec![MIN_DIFFUSIVITY; n],
            particle_pinch_velocity,
        })
    }

    fn name(&self) -> &'static str {
        "density_transition"
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gotenx_geometry::CircularGeometryParams;

    fn model() -> DensityTransitionTransport {
        DensityTransitionTransport {
            itg_background_diffusivity: 0.1,
            itg_critical_gradient: 4.0,
            itg_stiffness: 2.0,
            ri_coefficient: 1.0,
            ri_rate_hz: 1.0e5,
            transition_density: 5.0e19,
            transition_width: 5.0e18,
            ion_mass_amu: 2.5,
            peak_pinch_velocity: 0.5,
        }
    }

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
    fn test_output_is_clipped_to_spec_bounds() {
        let n = 40;
        // A pathologically steep temperature crash drives a huge ITG excess gradient; the
        // output must still respect the model's own [1e-6, 100] clip.
        let ti: Vec<f64> = (0..n).map(|i| 50000.0 - 1200.0 * i as f64).collect();
        let profiles = CoreProfiles::new(ti, vec![5000.0; n], vec![8.0e19; n], vec![0.0; n], 1e18).unwrap();
        let coeffs = model().evaluate(&profiles, &geometry(n)).unwrap();
        for &value in &coeffs.ion_heat_diffusivity {
            assert!((CHI_MIN..=CHI_MAX).contains(&value));
        }
    }

    #[test]
    fn test_blend_favours_itg_above_transition_density() {
        let n = 20;
        let profiles_core = CoreProfiles::new(vec![8000.0; n], vec![8000.0; n], vec![1.0e20; n], vec![0.0; n], 1e18).unwrap();
        let profiles_edge = CoreProfiles::new(vec![8000.0; n], vec![8000.0; n], vec![1.0e19; n], vec![0.0; n], 1e18).unwrap();
        let geometry = geometry(n);
        let core = model().evaluate(&profiles_core, &geometry).unwrap();
        let edge = model().evaluate(&profiles_edge, &geometry).unwrap();
        // Flat, sub-critical ion temperature means the ITG branch sits at background
        // diffusivity; the RI branch at high T_e/low density should differ from it.
        assert_ne!(core.ion_heat_diffusivity[0], edge.ion_heat_diffusivity[0]);
    }

    #[test]
    fn test_isotope_mass_changes_only_the_low_density_branch() {
        let n = 10;
        let geometry = geometry(n);
        let mut light = model();
        let mut heavy = model();
        heavy.ion_mass_amu = light.ion_mass_amu * 4.0;

        // Deep in the RI-dominated branch (density far below transition) the isotope mass must
        // change the output.
        let low_density = CoreProfiles::new(vec![500.0; n], vec![500.0; n], vec![1.0e17; n], vec![0.0; n], 1e16).unwrap();
        let light_ri = light.evaluate(&low_density, &geometry).unwrap();
        let heavy_ri = heavy.evaluate(&low_density, &geometry).unwrap();
        assert_ne!(light_ri.ion_heat_diffusivity[0], heavy_ri.ion_heat_diffusivity[0]);

        // Deep in the ITG-dominated branch (density far above transition, flat sub-critical
        // gradient) the output must be identical regardless of isotope mass: no double scaling.
        light.transition_density = 1.0e18;
        heavy.transition_density = 1.0e18;
        light.transition_width = 1.0e17;
        heavy.transition_width = 1.0e17;
        let high_density = CoreProfiles::new(vec![500.0; n], vec![500.0; n], vec![5.0e20; n], vec![0.0; n], 1e16).unwrap();
        let light_itg = light.evaluate(&high_density, &geometry).unwrap();
        let heavy_itg = heavy.evaluate(&high_density, &geometry).unwrap();
        assert_relative_eq(light_itg.ion_heat_diffusivity[0], heavy_itg.ion_heat_diffusivity[0]);
    }

    fn assert_relative_eq(lhs: f64, rhs: f64) {
        assert!((lhs - rhs).abs() <= 1e-9 * lhs.abs().max(rhs.abs()).max(1e-12));
    }
}
