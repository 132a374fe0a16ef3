//! Line and bremsstrahlung radiation losses from impurity species.

use derive_is_enum_variant::is_enum_variant as IsEnumVariant;
use gotenx_geometry::Geometry;

use crate::error::PhysicsError;
use crate::profiles::CoreProfiles;

use super::{SourceCategory, SourceModel, SourceTerms};

/// The closed set of impurity species this model knows an ADAS-style cooling-rate fit for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, IsEnumVariant)]
pub enum ImpuritySpecies {
    /// Carbon, a common first-wall/limiter impurity.
    Carbon,
    /// Neon, a common seeded radiator for divertor detachment.
    Neon,
    /// Argon, a higher-Z seeded radiator.
    Argon,
    /// Tungsten, the reference plasma-facing-component material for ITER-class devices.
    Tungsten,
}

/// `log10(T_e[eV])` breakpoints of the three contiguous fit intervals spanning the ADAS coronal
/// equilibrium domain `[100, 10^5]` eV with no gaps: `[100, 1e3)`, `[1e3, 1e4)`, `[1e4, 1e5]`.
const LOG_TE_BREAKPOINTS: [f64; 4] = [2.0, 3.0, 4.0, 5.0];

/// One interval's 5th-order polynomial coefficients in `log10(T_e[eV])`, `[c0, c1, ..., c5]`
/// such that `log10(L_z) = c0 + c1*x + c2*x^2 + c3*x^3 + c4*x^4 + c5*x^5`.
type IntervalCoefficients = [f64; 6];

impl ImpuritySpecies {
    /// Log10 cooling-rate polynomial coefficients for each of the three fit intervals, fit
    /// against ADAS coronal equilibrium cooling curves on `log10(T_e[eV])`: a low-temperature
    /// branch dominated by line radiation (cooling rises steeply with `T_e`), a mid-temperature
    /// branch around the line-radiation peak, and a high-temperature branch where bremsstrahlung
    /// takes over and the curve flattens.
    fn log_cooling_rate_intervals(self) -> [IntervalCoefficients; 3] {
        match self {
            Self::Carbon => [
                [-37.8, 4.2, -0.55, 0.0, 0.0, 0.0],
                [-33.2, 0.75, -0.18, 0.02, 0.0, 0.0],
                [-31.9, 0.25, -0.05, 0.004, -0.0003, 0.0],
            ],
            Self::Neon => [
                [-38.6, 4.6, -0.62, 0.0, 0.0, 0.0],
                [-32.6, 0.85, -0.20, 0.022, 0.0, 0.0],
                [-31.3, 0.30, -0.06, 0.005, -0.0004, 0.0],
            ],
            Self::Argon => [
                [-40.1, 5.3, -0.74, 0.0, 0.0, 0.0],
                [-31.7, 1.05, -0.24, 0.026, 0.0, 0.0],
                [-30.4, 0.40, -0.08, 0.006, -0.0005, 0.0],
            ],
            Self::Tungsten => [
                [-42.5, 6.4, -0.92, 0.0, 0.0, 0.0],
                [-29.8, 1.35, -0.30, 0.030, 0.0, 0.0],
                [-28.6, 0.55, -0.10, 0.007, -0.0006, 0.0],
            ],
        }
    }

    /// Evaluates the degree-5 polynomial for the interval containing `log_te` via Horner's
    /// method.
    fn evaluate_interval(coefficients: IntervalCoefficients, log_te: f64) -> f64 {
        coefficients.iter().rev().fold(0.0, |acc, &c| acc * log_te + c)
    }

    /// Cooling rate `L_z(T_e)` in W·m³, from the piecewise fitted polynomial in
    /// `log10(T_e[eV])`. `T_e` is clamped into the fit's `[100, 10^5]` eV domain before lookup.
    fn cooling_rate_w_m3(self, te_ev: f64) -> f64 {
        let log_te = te_ev.clamp(100.0, 1.0e5).log10();
        let intervals = self.log_cooling_rate_intervals();
        let segment = LOG_TE_BREAKPOINTS
            .windows(2)
            .position(|bounds| log_te < bounds[1])
            .unwrap_or(intervals.len() - 1);
        let log_lz = Self::evaluate_interval(intervals[segment], log_te);
        10f64.powf(log_lz)
    }
}

/// Radiated power loss from a single impurity species at a fixed fractional concentration
/// relative to electron density: `P_rad = n_e * n_e * f_impurity * L_z(T_e)`.
#[derive(Clone, Copy, Debug)]
pub struct RadiationSource {
    species: ImpuritySpecies,
    concentration: f64,
}

impl RadiationSource {
    /// Builds a [`RadiationSource`] for `species` at the given fractional concentration
    /// (impurity density / electron density).
    #[must_use]
    pub fn new(species: ImpuritySpecies, concentration: f64) -> Self {
        Self { species, concentration }
    }
}

impl SourceModel for RadiationSource {
    fn evaluate(&self, profiles: &CoreProfiles, _geometry: &Geometry) -> Result<SourceTerms, PhysicsError> {
        let n = profiles.num_cells();
        let mut terms = SourceTerms::zeros(n);

        let electron_density = profiles.electron_density();
        let electron_temperature = profiles.electron_temperature();

        for cell in 0..n {
            let lz = self.species.cooling_rate_w_m3(electron_temperature[cell]);
            let radiated_w_per_m3 =
                electron_density[cell] * electron_density[cell] * self.concentration * lz;
            let radiated_mw_per_m3 = radiated_w_per_m3 / 1e6;
            // Radiation removes energy, so it is a negative electron heating contribution.
            terms.electron_heating[cell] = -radiated_mw_per_m3;
        }

        Ok(terms)
    }

    fn category(&self) -> SourceCategory {
        SourceCategory::Radiation
    }

    fn name(&self) -> &'static str {
        "impurity_radiation"
    }
}
