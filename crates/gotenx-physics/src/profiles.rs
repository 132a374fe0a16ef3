//! The four state fields the solver evolves, plus the invariants they must always satisfy.

use std::sync::Arc;

use gotenx_common::units::MIN_DENSITY_FLOOR;

use crate::error::PhysicsError;

/// The four radial profiles the Newton solver evolves each step.
///
/// Fields are stored behind [`Arc<[f64]>`] rather than `Vec<f64>` so that handing a clone to a
/// transport or source model is an atomic refcount
/// bump, not a full buffer copy; a model that needs to build a new array (no model mutates
/// profiles in place, by convention) does so by constructing a fresh
/// `CoreProfiles` through [`CoreProfiles::new`], never by mutating this one.
#[derive(Clone, Debug)]
pub struct CoreProfiles {
    ion_temperature: Arc<[f64]>,
    electron_temperature: Arc<[f64]>,
    electron_density: Arc<[f64]>,
    poloidal_flux: Arc<[f64]>,
    density_floor: f64,
}

impl CoreProfiles {
    /// Builds a [`CoreProfiles`], validating every invariant: equal lengths,
    /// strictly positive temperatures, density above `density_floor`, and all values finite.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError`] naming the offending field, value, and cell index.
    pub fn new(
        ion_temperature: Vec<f64>,
        electron_temperature: Vec<f64>,
        electron_density: Vec<f64>,
        poloidal_flux: Vec<f64>,
        density_floor: f64,
    ) -> Result<Self, PhysicsError> {
        let density_floor = density_floor.max(MIN_DENSITY_FLOOR);
        let n = ion_temperature.len();
        check_len("electron_temperature", electron_temperature.len(), n)?;
        check_len("electron_density", electron_density.len(), n)?;
        check_len("poloidal_flux", poloidal_flux.len(), n)?;

        check_finite("ion_temperature", &ion_temperature)?;
        check_finite("electron_temperature", &electron_temperature)?;
        check_finite("electron_density", &electron_density)?;
        check_finite("poloidal_flux", &poloidal_flux)?;

        check_positive_temperature("ion_temperature", &ion_temperature)?;
        check_positive_temperature("electron_temperature", &electron_temperature)?;
        check_density_floor(&electron_density, density_floor)?;

        Ok(Self {
            ion_temperature: ion_temperature.into(),
            electron_temperature: electron_temperature.into(),
            electron_density: electron_density.into(),
            poloidal_flux: poloidal_flux.into(),
            density_floor,
        })
    }

    /// Number of radial cells.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.ion_temperature.len()
    }

    /// Ion temperature, in eV.
    #[must_use]
    pub fn ion_temperature(&self) -> &[f64] {
        &self.ion_temperature
    }

    /// Electron temperature, in eV.
    #[must_use]
    pub fn electron_temperature(&self) -> &[f64] {
        &self.electron_temperature
    }

    /// Electron density, in m⁻³.
    #[must_use]
    pub fn electron_density(&self) -> &[f64] {
        &self.electron_density
    }

    /// Poloidal magnetic flux, in Wb.
    #[must_use]
    pub fn poloidal_flux(&self) -> &[f64] {
        &self.poloidal_flux
    }

    /// The configured density floor, in m⁻³.
    #[must_use]
    pub fn density_floor(&self) -> f64 {
        self.density_floor
    }

    /// Returns a copy of `self` with `ion_temperature` replaced, re-validating all invariants.
    ///
    /// # Errors
    ///
    /// See [`CoreProfiles::new`].
    pub fn with_ion_temperature(&self, ion_temperature: Vec<f64>) -> Result<Self, PhysicsError> {
        Self::new(
            ion_temperature,
            self.electron_temperature.to_vec(),
            self.electron_density.to_vec(),
            self.poloidal_flux.to_vec(),
            self.density_floor,
        )
    }

    /// Returns a copy of `self` with `electron_temperature` replaced, re-validating all
    /// invariants.
    ///
    /// # Errors
    ///
    /// See [`CoreProfiles::new`].
    pub fn with_electron_temperature(&self, electron_temperature: Vec<f64>) -> Result<Self, PhysicsError> {
        Self::new(
            self.ion_temperature.to_vec(),
            electron_temperature,
            self.electron_density.to_vec(),
            self.poloidal_flux.to_vec(),
            self.density_floor,
        )
    }

    /// Returns a copy of `self` with `electron_density` replaced, re-validating all invariants.
    ///
    /// # Errors
    ///
    /// See [`CoreProfiles::new`].
    pub fn with_electron_density(&self, electron_density: Vec<f64>) -> Result<Self, PhysicsError> {
        Self::new(
            self.ion_temperature.to_vec(),
            self.electron_temperature.to_vec(),
            electron_density,
            self.poloidal_flux.to_vec(),
            self.density_floor,
        )
    }

    /// Returns a copy of `self` with `poloidal_flux` replaced, re-validating all invariants.
    ///
    /// # Errors
    ///
    /// See [`CoreProfiles::new`].
    pub fn with_poloidal_flux(&self, poloidal_flux: Vec<f64>) -> Result<Self, PhysicsError> {
        Self::new(
            self.ion_temperature.to_vec(),
            self.electron_temperature.to_vec(),
            self.electron_density.to_vec(),
            poloidal_flux,
            self.density_floor,
        )
    }
}

fn check_len(field: &'static str, actual: usize, expected: usize) -> Result<(), PhysicsError> {
    if actual != expected {
        return Err(PhysicsError::LengthMismatch { field, actual, expected });
    }
    Ok(())
}

fn check_finite(field: &'static str, values: &[f64]) -> Result<(), PhysicsError> {
    if let Some(cell) = values.iter().position(|value| !value.is_finite()) {
        return Err(PhysicsError::NonFinite { field, cell });
    }
    Ok(())
}

fn check_positive_temperature(field: &'static str, values: &[f64]) -> Result<(), PhysicsError> {
    if let Some((cell, &value)) = values.iter().enumerate().find(|&(_, &value)| value <= 0.0) {
        return Err(PhysicsError::NonPositiveTemperature { field, value, cell });
    }
    Ok(())
}

fn check_density_floor(values: &[f64], floor: f64) -> Result<(), PhysicsError> {
    if let Some((cell, &value)) = values.iter().enumerate().find(|&(_, &value)| value <= floor) {
        return Err(PhysicsError::DensityBelowFloor { value, cell, floor });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn flat_profiles(n: usize) -> CoreProfiles {
        CoreProfiles::new(
            vec![1000.0; n],
            vec![1000.0; n],
            vec![1e20; n],
            vec![0.0; n],
            1e18,
        )
        .unwrap()
    }

    #[test]
    fn test_clone_is_cheap_refcount_bump() {
        let profiles = flat_profiles(50);
        let clone = profiles.clone();
        assert_eq!(
            Arc::strong_count(&profiles.ion_temperature),
            Arc::strong_count(&clone.ion_temperature),
        );
    }

    #[test]
    fn test_rejects_non_positive_temperature() {
        let result = CoreProfiles::new(vec![-1.0, 1.0], vec![1.0, 1.0], vec![1e20, 1e20], vec![0.0, 0.0], 1e18);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_density_below_floor() {
        let result = CoreProfiles::new(vec![1.0, 1.0], vec![1.0, 1.0], vec![1e17, 1e20], vec![0.0, 0.0], 1e18);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let result = CoreProfiles::new(vec![f64::NAN, 1.0], vec![1.0, 1.0], vec![1e20, 1e20], vec![0.0, 0.0], 1e18);
        assert!(result.is_err());
    }

    #[test]
    fn test_with_methods_revalidate() {
        let profiles = flat_profiles(10);
        assert!(profiles.with_ion_temperature(vec![-1.0; 10]).is_err());
        let updated = profiles.with_ion_temperature(vec![2000.0; 10]).unwrap();
        assert_eq!(updated.ion_temperature()[0], 2000.0);
    }
}
