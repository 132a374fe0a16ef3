//! Neoclassical bootstrap current via the Sauter formula.
//!
//! `J_BS = -C_BS(nu*, f_t) * (grad p) / B_phi`, with the trapped fraction `f_t = 1 -
//! sqrt(1 - epsilon)` and `C_BS = L31*f_t + L32*f_t*alpha + L34*f_t*alpha^2` built from the
//! Sauter et al. (Phys. Plasmas 6, 2834 (1999)) L31/alpha fits. The full table-I fit is out of
//! scope here: `L32 ~= 0.05` and `L34 ~= 0.01` are held as fixed constants
//! rather than their own collisionality-dependent fits, and `Z_eff = 1` throughout. Only the
//! magnitude is clipped (10 MA/m^2); the sign from the pressure gradient is always preserved, so
//! the edge bootstrap current can be negative.

use gotenx_common::units::ELEMENTARY_CHARGE;
use gotenx_geometry::{Geometry, central_difference_gradient};
use gotenx_physics::CoreProfiles;
use ndarray::Array1;

/// Fixed simplified value of the Sauter `L32` coefficient.
const L32: f64 = 0.05;
/// Fixed simplified value of the Sauter `L34` coefficient.
const L34: f64 = 0.01;
/// Coulomb logarithm used for the electron collisionality estimate, matching
/// [`crate::coeffs`]'s sibling ohmic-heating model's choice for the core region.
const COULOMB_LOGARITHM: f64 = 17.0;
/// Magnitude clip on the bootstrap current density, 10 MA/m^2.
const MAX_BOOTSTRAP_CURRENT_DENSITY: f64 = 1.0e7;

/// Normalized electron collisionality `nu*_e` (ITER Physics Basis definition), using the local
/// safety factor recovered from the geometry's Jacobian (`q = g0 / r`); a supplied
/// q-profile is preferred automatically since it already set `g0` at construction time.
fn electron_collisionality(electron_density: f64, electron_temperature_ev: f64, major_radius: f64, q: f64, epsilon: f64) -> f64 {
    let te_kev = (electron_temperature_ev / 1000.0).max(1e-3);
    let epsilon_safe = epsilon.max(1e-6);
    6.921e-18 * q.abs() * major_radius * electron_density * COULOMB_LOGARITHM / (te_kev.powi(2) * epsilon_safe.powf(1.5))
}

/// Sauter's collisionality-corrected passing-particle fraction and `L31` fit, at `Z_eff = 1`.
fn l31(trapped_fraction: f64, nu_star_e: f64) -> f64 {
    let ft_passing = trapped_fraction
        / (1.0 + (1.0 - 0.1 * trapped_fraction) * nu_star_e.sqrt() + 0.5 * (1.0 - trapped_fraction) * nu_star_e);
    1.7 * ft_passing - 0.27 * ft_passing.powi(2) - 0.1 * ft_passing.powi(3)
}

/// Sauter's `alpha0` ion-pressure-gradient coefficient at zero ion collisionality; the
/// ion-collisionality correction to `alpha` is part of the out-of-scope full table-I fit.
fn alpha(trapped_fraction: f64) -> f64 {
    -1.17 * (1.0 - trapped_fraction) / (1.0 - 0.22 * trapped_fraction - 0.19 * trapped_fraction.powi(2))
}

/// Computes the bootstrap current density, in A/m², at every cell.
#[must_use]
pub fn bootstrap_current_density(profiles: &CoreProfiles, geometry: &Geometry) -> Vec<f64> {
    let n = profiles.num_cells();
    let radii = geometry.radii();
    let major_radius = geometry.major_radius();
    let toroidal_field = geometry.toroidal_field();
    let g0 = geometry.g0();

    let electron_density = profiles.electron_density();
    let ion_temperature = profiles.ion_temperature();
    let electron_temperature = profiles.electron_temperature();

    let pressure: Array1<f64> = Array1::from_shape_fn(n, |cell| {
        electron_density[cell] * (ion_temperature[cell] + electron_temperature[cell]) * ELEMENTARY_CHARGE
    });
    let face_pressure_gradient = central_difference_gradient(&pressure, geometry.cell_distances());
    let pressure_gradient: Vec<f64> =
        (0..n).map(|cell| 0.5 * (face_pressure_gradient[cell] + face_pressure_gradient[cell + 1])).collect();

    (0..n)
        .map(|cell| {
            let epsilon = (radii[cell] / major_radius).clamp(0.0, 0.999);
            let trapped_fraction = 1.0 - (1.0 - epsilon).sqrt();
            let q = g0[cell] / radii[cell].max(1e-6);
            let nu_star_e = electron_collisionality(electron_density[cell], electron_temperature[cell], major_radius, q, epsilon);

            let l31_value = l31(trapped_fraction, nu_star_e);
            let alpha_value = alpha(trapped_fraction);
            let c_bs = l31_value * trapped_fraction + L32 * trapped_fraction * alpha_value + L34 * trapped_fraction * alpha_value.powi(2);

            let raw = -c_bs * pressure_gradient[cell] / toroidal_field;
            raw.clamp(-MAX_BOOTSTRAP_CURRENT_DENSITY, MAX_BOOTSTRAP_CURRENT_DENSITY)
        })
        .collect()
}
