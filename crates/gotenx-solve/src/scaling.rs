//! Per-equation scaling so the Newton solver's convergence test and diagonal preconditioner are
//! not dominated by the four equations' wildly different native magnitudes (eV vs. m⁻³ vs. Wb).

/// Typical magnitude of each transported field, used to non-dimensionalise both the state and
/// the residual before the Newton update.
#[derive(Clone, Copy, Debug)]
pub struct EquationScales {
    /// Typical ion temperature magnitude, eV.
    pub ion_temperature: f64,
    /// Typical electron temperature magnitude, eV.
    pub electron_temperature: f64,
    /// Typical electron density magnitude, m⁻³.
    pub electron_density: f64,
    /// Typical poloidal flux magnitude, Wb.
    pub poloidal_flux: f64,
}

impl EquationScales {
    /// Scales typical of an ITER-class H-mode plasma: keV-scale temperatures, `10^20 m^-3`
    /// densities, and order-one poloidal flux.
    #[must_use]
    pub fn iter_baseline() -> Self {
        Self { ion_temperature: 1.0e4, electron_temperature: 1.0e4, electron_density: 1.0e20, poloidal_flux: 1.0 }
    }

    /// Builds the `4N`-length per-component scale vector matching
    /// [`crate::operator::StateVector`]'s block layout.
    #[must_use]
    pub fn to_flat(self, num_cells: usize) -> Vec<f64> {
        let mut scales = Vec::with_capacity(4 * num_cells);
        scales.extend(std::iter::repeat_n(self.ion_temperature, num_cells));
        scales.extend(std::iter::repeat_n(self.electron_temperature, num_cells));
        scales.extend(std::iter::repeat_n(self.electron_density, num_cells));
        scales.extend(std::iter::repeat_n(self.poloidal_flux, num_cells));
        scales
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_flat_scales_repeat_per_block() {
        let scales = EquationScales::iter_baseline().to_flat(3);
        assert_eq!(scales.len(), 12);
        assert_eq!(scales[0], 1.0e4);
        assert_eq!(scales[6], 1.0e20);
        assert_eq!(scales[9], 1.0);
    }
}
