//! Edge pedestal boundary source.
//!
//! The pedestal is modelled as an ordinary [`SourceModel`] rather than a distinct
//! boundary-condition mechanism: it is a narrow, strong heating/particle deposit at the edge
//! that nudges edge profiles toward a target, not a change to the solver's boundary operator.
//! See DESIGN.md for the open-question resolution.

use gotenx_common::units::ELEMENTARY_CHARGE;
use gotenx_geometry::Geometry;

use crate::error::PhysicsError;
use crate::profiles::CoreProfiles;

use super::{SourceCategory, SourceModel, SourceTerms};

/// Relaxes the outermost cells of the temperature and density profiles toward fixed pedestal
/// targets, rather than imposing a hard Dirichlet condition at the last closed flux surface.
///
/// The relaxation gain is adaptive: it grows with the relative size of the density deficit, so a
/// profile that has collapsed far below the pedestal target is pulled back harder than one sitting
/// close to it. The resulting particle source is clipped to `max_particle_source` so a large,
/// freshly-collapsed deficit cannot inject an unbounded density in a single step.
#[derive(Clone, Copy, Debug)]
pub struct PedestalSource {
    /// Number of outermost cells the pedestal acts on.
    pub width_cells: usize,
    /// Target ion and electron temperature at the pedestal top, in eV.
    pub target_temperature_ev: f64,
    /// Target electron density at the pedestal top, in m^-3.
    pub target_density: f64,
    /// Base relaxation rate toward the targets, in s^-1.
    pub relaxation_rate: f64,
    /// How strongly the relaxation gain grows with the relative density deficit, dimensionless.
    /// `0.0` recovers a constant gain equal to `relaxation_rate`.
    pub gain_adaptation_rate: f64,
    /// Maximum magnitude of the particle source this model may emit, in m^-3 s^-1.
    pub max_particle_source: f64,
}

impl SourceModel for PedestalSource {
    fn evaluate(&self, profiles: &CoreProfiles, _geometry: &Geometry) -> Result<SourceTerms, PhysicsError> {
        let n = profiles.num_cells();
        let mut terms = SourceTerms::zeros(n);
        let width = self.width_cells.min(n);

        let ion_temperature = profiles.ion_temperature();
        let electron_temperature = profiles.electron_temperature();
        let electron_density = profiles.electron_density();

        for cell in (n - width)..n {
            let ion_gap_ev = self.target_temperature_ev - ion_temperature[cell];
            let electron_gap_ev = self.target_temperature_ev - electron_temperature[cell];
            let density_gap = self.target_density - electron_density[cell];

            let relative_density_gap = density_gap / self.target_density.max(1.0);
            let adaptive_gain = self.relaxation_rate * self.gain_adaptation_rate.mul_add(relative_density_gap.abs(), 1.0);

            let ion_heating_ev_per_m3_per_s = adaptive_gain * ion_gap_ev * electron_density[cell].max(1.0);
            let electron_heating_ev_per_m3_per_s = adaptive_gain * electron_gap_ev * electron_density[cell].max(1.0);
            // Relaxation is naturally eV*m^-3*s^-1 (rate * eV gap * density); convert to this
            // model's MW/m^3 output unit same as every other source.
            terms.ion_heating[cell] = ion_heating_ev_per_m3_per_s * ELEMENTARY_CHARGE / 1.0e6;
            terms.electron_heating[cell] = electron_heating_ev_per_m3_per_s * ELEMENTARY_CHARGE / 1.0e6;
            terms.particle_source[cell] = (adaptive_gain * density_gap).clamp(-self.max_particle_source, self.max_particle_source);
        }

        Ok(terms)
    }

    fn category(&self) -> SourceCategory {
        SourceCategory::Other
    }

    fn name(&self) -> &'static str {
        "pedestal"
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pedestal_only_acts_on_outer_cells() {
        let n = 20;
        let geometry = Geometry::circular(&gotenx_geometry::CircularGeometryParams {
            num_cells: n,
            major_radius: 6.2,
            minor_radius: 2.0,
            toroidal_field: 5.3,
            q_profile: None,
        })
        .unwrap();
        let profiles = CoreProfiles::new(vec![500.0; n], vec![500.0; n], vec![1e19; n], vec![0.0; n], 1e18).unwrap();
        let source = PedestalSource {
            width_cells: 3,
            target_temperature_ev: 1500.0,
            target_density: 3e19,
            relaxation_rate: 10.0,
            gain_adaptation_rate: 0.0,
            max_particle_source: f64::MAX,
        };
        let terms = source.evaluate(&profiles, &geometry).unwrap();

        for cell in 0..(n - 3) {
            assert_eq!(terms.ion_heating[cell], 0.0);
        }
        for cell in (n - 3)..n {
            assert!(terms.ion_heating[cell] > 0.0, "pedestal should heat toward a higher target");
        }
    }

    #[test]
    fn test_adaptive_gain_grows_with_relative_deficit() {
        let n = 10;
        let geometry = Geometry::circular(&gotenx_geometry::CircularGeometryParams {
            num_cells: n,
            major_radius: 6.2,
            minor_radius: 2.0,
            toroidal_field: 5.3,
            q_profile: None,
        })
        .unwrap();
        let flat_source = PedestalSource {
            width_cells: 1,
            target_temperature_ev: 1500.0,
            target_density: 3e19,
            relaxation_rate: 10.0,
            gain_adaptation_rate: 0.0,
            max_particle_source: f64::MAX,
        };
        let adaptive_source = PedestalSource { gain_adaptation_rate: 5.0, ..flat_source };

        let shallow_deficit = CoreProfiles::new(vec![500.0; n], vec![500.0; n], vec![2.9e19; n], vec![0.0; n], 1e18).unwrap();
        let deep_deficit = CoreProfiles::new(vec![500.0; n], vec![500.0; n], vec![1e19; n], vec![0.0; n], 1e18).unwrap();

        let flat_shallow = flat_source.evaluate(&shallow_deficit, &geometry).unwrap();
        let adaptive_shallow = adaptive_source.evaluate(&shallow_deficit, &geometry).unwrap();
        let adaptive_deep = adaptive_source.evaluate(&deep_deficit, &geometry).unwrap();

        let implied_flat_gain = flat_shallow.particle_source[n - 1] / (3e19 - 2.9e19);
        let implied_shallow_gain = adaptive_shallow.particle_source[n - 1] / (3e19 - 2.9e19);
        let implied_deep_gain = adaptive_deep.particle_source[n - 1] / (3e19 - 1e19);

        // A shallow, 3%-of-target deficit already pulls the adaptive gain above the flat gain...
        assert!(implied_shallow_gain > implied_flat_gain, "adaptive gain should exceed the flat gain once there is any deficit");
        // ...and a much deeper, 67%-of-target deficit pulls it further still.
        assert!(implied_deep_gain > implied_shallow_gain, "gain should adapt upward for a larger relative deficit");
    }

    #[test]
    fn test_particle_source_is_clipped_to_configured_maximum() {
        let n = 10;
        let geometry = Geometry::circular(&gotenx_geometry::CircularGeometryParams {
            num_cells: n,
            major_radius: 6.2,
            minor_radius: 2.0,
            toroidal_field: 5.3,
            q_profile: None,
        })
        .unwrap();
        let profiles = CoreProfiles::new(vec![500.0; n], vec![500.0; n], vec![1e18; n], vec![0.0; n], 1e18).unwrap();
        let source = PedestalSource {
            width_cells: 1,
            target_temperature_ev: 1500.0,
            target_density: 1e22,
            relaxation_rate: 10.0,
            gain_adaptation_rate: 1.0,
            max_particle_source: 5e19,
        };
        let terms = source.evaluate(&profiles, &geometry).unwrap();

        assert_eq!(terms.particle_source[n - 1], 5e19, "an unbounded deficit should saturate at the configured maximum");
    }
}
