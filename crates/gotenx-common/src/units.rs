//! Conversion constants used at the one sanctioned unit barrier.
//!
//! Physics models (transport, sources) speak **MW/m³**; the Newton solver speaks
//! **eV·m⁻³·s⁻¹** for the temperature equations and **A·m⁻²** for the flux equation. Only
//! `gotenx-solve::coeffs` is allowed to cross between the two; everywhere else, a value's unit is
//! implied by which of these constants (if any) touched it last.

/// Elementary charge, in coulombs. `1 / ELEMENTARY_CHARGE` is the MW/m³ → eV·m⁻³·s⁻¹ multiplier.
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// `1 / e`, the MW/m³ → eV·m⁻³·s⁻¹ conversion factor applied to heating densities at the unit
/// barrier, accurate to `6.2415090744e24`.
pub const MW_TO_EV_PER_M3_PER_S: f64 = 1.0 / ELEMENTARY_CHARGE;

/// Converts a volumetric heating density from MW/m³ to eV·m⁻³·s⁻¹ (the solver's temperature-
/// equation source unit). `1 MW/m³ = 10⁶ W/m³`; one watt delivered into a cubic metre for a
/// second is `1/e` eV of energy, so the full multiplier is `1e6 / e`.
#[must_use]
pub fn mw_per_m3_to_solver_heating(mw_per_m3: f64) -> f64 {
    mw_per_m3 * 1.0e6 * MW_TO_EV_PER_M3_PER_S
}

/// Minimum electron density floor, in m⁻³, below which the density equation is clipped.
/// Configurable per simulation but never below this absolute floor.
pub const MIN_DENSITY_FLOOR: f64 = 1.0e16;

/// Minimum temperature floor, in eV, enforced by clipping after every Newton update.
pub const MIN_TEMPERATURE_EV: f64 = 1.0;

/// Debug-build magnitude guard on heating densities, in MW/m³. A `SourceTerms`
/// with a peak heating density above this is almost certainly a MW↔eV unit-conversion mistake at
/// the call site, not a real plasma.
pub const DEBUG_MAX_HEATING_MW_PER_M3: f64 = 1000.0;
