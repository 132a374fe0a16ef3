//! Ohmic (resistive) electron heating from the Spitzer resistivity.

use gotenx_geometry::{Geometry, central_difference_gradient};
use ndarray::Array1;

use crate::error::PhysicsError;
use crate::profiles::CoreProfiles;

use super::{SourceCategory, SourceModel, SourceTerms};

/// Coulomb logarithm, held fixed rather than computed from density/temperature; adequate for
/// the core region this model targets.
const COULOMB_LOGARITHM: f64 = 17.0;

/// Spitzer resistivity prefactor, in ohm-metres, for `Z_eff = 1` and the fixed Coulomb
/// logarithm above. Temperature dependence is `eta = prefactor * lnΛ / T_e[eV]^1.5`.
const SPITZER_PREFACTOR: f64 = 5.2e-5;

/// Ohmic heating computed from the poloidal flux gradient (toroidal current density) and the
/// local Spitzer resistivity: `P_ohmic = eta * j^2`.
///
/// Below `flux_variation_threshold`, the profile's relative spread `(max(psi) - min(psi)) /
/// max(|psi|)` is treated as numerical noise around a current-free state rather than a real
/// gradient, and the whole contribution is skipped (spec §4.4's "skip below a configurable
/// flux-variation threshold"): differencing a near-flat `psi` profile amplifies floating-point
/// noise into a spurious `j^2` heating term.
#[derive(Clone, Copy, Debug)]
pub struct OhmicSource {
    /// Relative poloidal-flux spread below which this model contributes zero heating.
    pub flux_variation_threshold: f64,
}

impl OhmicSource {
    /// Builds an [`OhmicSource`] with the given flux-variation skip threshold.
    #[must_use]
    pub fn new(flux_variation_threshold: f64) -> Self {
        Self { flux_variation_threshold }
    }

    fn flux_variation_below_threshold(&self, flux: &[f64]) -> bool {
        let max = flux.iter().copied().fold(f64::MIN, f64::max);
        let min = flux.iter().copied().fold(f64::MAX, f64::min);
        let scale = flux.iter().map(|value| value.abs()).fold(0.0_f64, f64::max).max(1e-300);
        (max - min) / scale < self.flux_variation_threshold
    }
}

impl SourceModel for OhmicSource {
    fn evaluate(&self, profiles: &CoreProfiles, geometry: &Geometry) -> Result<SourceTerms, PhysicsError> {
        let n = profiles.num_cells();
        let mut terms = SourceTerms::zeros(n);

        if self.flux_variation_below_threshold(profiles.poloidal_flux()) {
            return Ok(terms);
        }

        let flux = Array1::from_vec(profiles.poloidal_flux().to_vec());
        let face_gradient = central_difference_gradient(&flux, geometry.cell_distances());
        // face_gradient is face-valued (length N + 1); average the two bounding faces back to a
        // cell-centred current density.
        let current_density: Vec<f64> = (0..n).map(|cell| 0.5 * (face_gradient[cell] + face_gradient[cell + 1])).collect();

        let electron_temperature = profiles.electron_temperature();
        for cell in 0..n {
            let te_ev = electron_temperature[cell].max(1.0);
            let resistivity = SPITZER_PREFACTOR * COULOMB_LOGARITHM / te_ev.powf(1.5);
            let heating_w_per_m3 = resistivity * current_density[cell].powi(2);
            let heating_mw_per_m3 = heating_w_per_m3 / 1e6;
            terms.electron_heating[cell] = heating_mw_per_m3;
        }

        Ok(terms)
    }

    fn category(&self) -> SourceCategory {
        SourceCategory::Ohmic
    }

    fn name(&self) -> &'static str {
        "ohmic"
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_flat_flux_yields_no_ohmic_heating() {
        let n = 10;
        let geometry = Geometry::circular(&gotenx_geometry::CircularGeometryParams {
            num_cells: n,
            major_radius: 6.2,
            minor_radius: 2.0,
            toroidal_field: 5.3,
            q_profile: None,
        })
        .unwrap();
        let profiles = CoreProfiles::new(vec![1000.0; n], vec![1000.0; n], vec![1e20; n], vec![1.0; n], 1e18).unwrap();
        let terms = OhmicSource::new(1e-6).evaluate(&profiles, &geometry).unwrap();
        assert!(terms.electron_heating.iter().all(|&value| value.abs() < 1e-6));
    }

    #[test]
    fn test_flux_gradient_produces_positive_heating() {
        let n = 10;
        let geometry = Geometry::circular(&gotenx_geometry::CircularGeometryParams {
            num_cells: n,
            major_radius: 6.2,
            minor_radius: 2.0,
            toroidal_field: 5.3,
            q_profile: None,
        })
        .unwrap();
        let flux: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
        let profiles = CoreProfiles::new(vec![1000.0; n], vec![1000.0; n], vec![1e20; n], flux, 1e18).unwrap();
        let terms = OhmicSource::new(1e-6).evaluate(&profiles, &geometry).unwrap();
        assert!(terms.electron_heating.iter().any(|&value| value > 0.0));
    }

    #[test]
    fn test_small_flux_variation_is_skipped_below_threshold() {
        let n = 10;
        let geometry = Geometry::circular(&gotenx_geometry::CircularGeometryParams {
            num_cells: n,
            major_radius: 6.2,
            minor_radius: 2.0,
            toroidal_field: 5.3,
            q_profile: None,
        })
        .unwrap();
        // A tiny spatial wiggle relative to the mean flux level: below a 1% threshold this
        // should be treated as noise around a current-free state, not a real gradient.
        let flux: Vec<f64> = (0..n).map(|i| 10.0 + (i as f64) * 1e-4).collect();
        let profiles = CoreProfiles::new(vec![1000.0; n], vec![1000.0; n], vec![1e20; n], flux, 1e18).unwrap();
        let terms = OhmicSource::new(0.01).evaluate(&profiles, &geometry).unwrap();
        assert!(terms.electron_heating.iter().all(|&value| value == 0.0));
    }
}
