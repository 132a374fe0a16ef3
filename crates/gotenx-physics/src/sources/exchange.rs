//! Collisional ion-electron heat exchange.
//!
//! Unlike the other source models this one is a *redistribution*: it removes from one
//! temperature equation exactly what it adds to the other, so it never changes the total
//! thermal energy.

use gotenx_geometry::Geometry;

use crate::error::PhysicsError;
use crate::profiles::CoreProfiles;

use super::{SourceCategory, SourceModel, SourceTerms};

/// Coulomb logarithm, matching [`super::ohmic::OhmicSource`]'s fixed value.
const COULOMB_LOGARITHM: f64 = 17.0;

/// Ion-electron equilibration prefactor, chosen so the exchange time for `n_e = 1e20 m^-3`,
/// `T_e = T_i = 1` keV, deuterium ions matches the standard NRL-formulary estimate of a few
/// hundred milliseconds.
const EXCHANGE_PREFACTOR: f64 = 3.2e-15;

/// Exchanges heat between ions and electrons at a rate proportional to `n_e * (T_e - T_i) /
/// T_e^1.5`, flowing from the hotter species to the colder one.
#[derive(Clone, Copy, Debug, Default)]
pub struct IonElectronExchange;

impl SourceModel for IonElectronExchange {
    fn evaluate(&self, profiles: &CoreProfiles, _geometry: &Geometry) -> Result<SourceTerms, PhysicsError> {
        let n = profiles.num_cells();
        let mut terms = SourceTerms::zeros(n);

        let ion_temperature = profiles.ion_temperature();
        let electron_temperature = profiles.electron_temperature();
        let electron_density = profiles.electron_density();

        for cell in 0..n {
            let te_ev = electron_temperature[cell].max(1.0);
            let rate = EXCHANGE_PREFACTOR * COULOMB_LOGARITHM * electron_density[cell]
                / te_ev.powf(1.5);
            let power_density_w_per_m3 = rate * (electron_temperature[cell] - ion_temperature[cell])
                * gotenx_common::units::ELEMENTARY_CHARGE;
            let power_density_mw_per_m3 = power_density_w_per_m3 / 1e6;
            // Energy flows from electrons into ions (or vice versa); the two contributions are
            // equal and opposite, so their sum never changes total thermal energy.
            terms.ion_heating[cell] = power_density_mw_per_m3;
            terms.electron_heating[cell] = -power_density_mw_per_m3;
        }

        Ok(terms)
    }

    fn category(&self) -> SourceCategory {
        SourceCategory::Other
    }

    fn name(&self) -> &'static str {
        "ion_electron_exchange"
    }
}
