//! Coefficient assembly: the one place physics-model output (MW/m³, turbulent diffusivities)
//! is converted into the finite-volume operator's matrix coefficients.
//!
//! This module is the sanctioned unit barrier: [`gotenx_common::units`] is
//! imported nowhere else in this crate. Everything downstream of [`build_equation_coefficients`]
//! speaks the solver's native units (eV·m⁻³·s⁻¹, A·m⁻²) and never converts back.

use gotenx_common::units::mw_per_m3_to_solver_heating;
use gotenx_geometry::{FaceInterpolation, Geometry, cell_to_face};
use gotenx_physics::sources::SourceTerms;
use gotenx_physics::transport::TransportCoefficients;
use ndarray::Array1;

use crate::boundary::{BoundaryCondition, EquationBoundary};

/// Patankar power-law scheme's dimensionless function `A(|Pe|)`, approximating the exact
/// exponential scheme to within 1% while staying cheap to differentiate (Patankar, *Numerical
/// Heat Transfer and Fluid Flow*, 1980, §5.2-4).
#[must_use]
pub fn patankar_power_law(peclet: f64) -> f64 {
    (1.0 - 0.1 * peclet.abs()).max(0.0).powi(5)
}

/// One face's convection-diffusion coefficients in the discretised flux
/// `flux = conductance_east * (phi_P - phi_E) + flow * phi_upwind`, in the Patankar convention
/// where `conductance_east` already folds in the power-law correction.
#[derive(Clone, Copy, Debug)]
pub struct FaceCoefficients {
    /// Diffusive conductance at the face, `D * A(|Pe|)`, in the flux's native units per unit
    /// value difference.
    pub conductance: f64,
    /// Convective flow through the face, `velocity * area`.
    pub flow: f64,
}

/// Builds Patankar face coefficients from a face diffusivity, convective velocity, face area,
/// and cell spacing.
#[must_use]
pub fn face_coefficients(diffusivity: f64, velocity: f64, area: f64, distance: f64) -> FaceCoefficients {
    let distance = distance.max(gotenx_geometry::interp::CELL_SPACING_EPSILON);
    let conductance_bare = diffusivity * area / distance;
    let flow = velocity * area;
    let peclet = if conductance_bare > 0.0 { flow / conductance_bare } else { 0.0 };
    FaceCoefficients { conductance: conductance_bare * patankar_power_law(peclet), flow }
}

/// Assembled per-cell coefficients for one transported equation's finite-volume residual.
#[derive(Clone, Debug)]
pub struct EquationCoefficients {
    /// Face conductances, length `N + 1`.
    pub face_conductance: Array1<f64>,
    /// Face convective flows, length `N + 1`.
    pub face_flow: Array1<f64>,
    /// Per-cell volumetric source, solver units, length `N`.
    pub source: Array1<f64>,
    /// Boundary conditions for this equation.
    pub boundary: EquationBoundary,
}

/// Builds the finite-volume coefficients for a single scalar transport equation, applying the
/// metric-form flux divergence: the bare diffusivity and convective velocity are scaled by the
/// local `g1 * g2 / g0` metric factor before the Patankar face coefficients are built, so the
/// resulting residual is already in flux-surface-averaged (metric) form rather than a bare
/// Cartesian finite-volume form.
#[must_use]
pub fn build_equation_coefficients(
    diffusivity: &[f64],
    pinch_velocity: &[f64],
    volumetric_source: &[f64],
    geometry: &Geometry,
    boundary: EquationBoundary,
) -> EquationCoefficients {
    let n = diffusivity.len();
    let metric_factor: Array1<f64> = geometry.g1() * geometry.g2() / geometry.g0();

    let diffusivity_cells = Array1::from_vec(diffusivity.to_vec()) * &metric_factor;
    let velocity_cells = Array1::from_vec(pinch_velocity.to_vec()) * &metric_factor;

    let diffusivity_faces = cell_to_face(&diffusivity_cells, FaceInterpolation::Arithmetic, None);
    let velocity_faces = cell_to_face(&velocity_cells, FaceInterpolation::Upwind, Some(&velocity_cells_to_faces_hint(&velocity_cells)));

    let face_areas = geometry.face_areas();
    let cell_distances = geometry.cell_distances();
    let radii = geometry.radii();

    let mut face_conductance = Array1::<f64>::zeros(n + 1);
    let mut face_flow = Array1::<f64>::zeros(n + 1);

    for face in 1..n {
        let distance = cell_distances[face - 1];
        let coeffs = face_coefficients(diffusivity_faces[face], velocity_faces[face], face_areas[face], distance);
        face_conductance[face] = coeffs.conductance;
        face_flow[face] = coeffs.flow;
    }

    // Axis boundary (face 0): half the distance from the axis to the first cell centre.
    let axis_distance = radii[0];
    apply_boundary_flux(&mut face_conductance, &mut face_flow, boundary.axis, 0, face_areas[0], diffusivity_faces[0], velocity_faces[0], axis_distance);

    // Edge boundary (face n): half the distance from the last cell centre to the edge.
    let edge_distance = geometry.minor_radius() - radii[n - 1];
    apply_boundary_flux(&mut face_conductance, &mut face_flow, boundary.edge, n, face_areas[n], diffusivity_faces[n], velocity_faces[n], edge_distance);

    EquationCoefficients {
        face_conductance,
        face_flow,
        source: Array1::from_vec(volumetric_source.to_vec()),
        boundary,
    }
}

/// `cell_to_face`'s `Upwind` mode reads the velocity from the supplied hint array at the same
/// face index it is writing; passing the cell-centred velocity array directly approximates the
/// face velocity by its nearest cell, adequate for picking an upwind direction.
fn velocity_cells_to_faces_hint(velocity_cells: &Array1<f64>) -> Array1<f64> {
    cell_to_face(velocity_cells, FaceInterpolation::Arithmetic, None)
}

/// Fills in a boundary face's conductance and flow.
///
/// For a Neumann condition the flux is prescribed directly, so the conductance stays zero (the
/// residual reads `face_flow` alone). For a Dirichlet condition the face retains a real
/// conductance computed from the local diffusivity and the distance to the boundary, so the
/// operator can difference the boundary's fixed value against the adjacent cell exactly like an
/// interior face; `face_flow` then carries only the convective term, with the boundary value
/// itself read from [`EquationCoefficients::boundary`] at residual-assembly time.
#[expect(clippy::too_many_arguments, reason = "every argument is an independent physical quantity needed to build one face")]
fn apply_boundary_flux(
    face_conductance: &mut Array1<f64>,
    face_flow: &mut Array1<f64>,
    condition: BoundaryCondition,
    face: usize,
    area: f64,
    diffusivity: f64,
    velocity: f64,
    distance: f64,
) {
    match condition {
        BoundaryCondition::Neumann(flux) => {
            face_conductance[face] = 0.0;
            face_flow[face] = flux * area;
        }
        BoundaryCondition::Dirichlet(_) => {
            let coeffs = face_coefficients(diffusivity, velocity, area, distance);
            face_conductance[face] = coeffs.conductance;
            face_flow[face] = coeffs.flow;
        }
    }
}

/// Converts a heating density array from [`SourceTerms`]'s native MW/m³ into the solver's
/// eV·m⁻³·s⁻¹ temperature-equation source unit. [`SourceModel`] implementations never perform
/// this conversion themselves; [`build_all_coefficients`] is the one production call site, so this
/// is the real MW/m³ → eV·m⁻³·s⁻¹ crossing, not a test-only convenience.
///
/// [`SourceModel`]: gotenx_physics::sources::SourceModel
#[must_use]
pub fn heating_from_mw_per_m3(mw_per_m3: &[f64]) -> Vec<f64> {
    mw_per_m3.iter().map(|&value| mw_per_m3_to_solver_heating(value)).collect()
}

/// Builds coefficients for all four transported equations from one evaluation of transport and
/// source models.
#[derive(Clone, Debug)]
pub struct AllEquationCoefficients {
    /// Ion temperature equation coefficients.
    pub ion_temperature: EquationCoefficients,
    /// Electron temperature equation coefficients.
    pub electron_temperature: EquationCoefficients,
    /// Electron density equation coefficients.
    pub electron_density: EquationCoefficients,
    /// Poloidal flux equation coefficients.
    pub poloidal_flux: EquationCoefficients,
}

/// Boundary conditions for all four equations, bundled for [`build_all_coefficients`].
pub use crate::boundary::BoundaryConditions;

/// Builds coefficients for all four transported equations given one transport evaluation, one
/// source evaluation, and the fixed geometry.
#[must_use]
pub fn build_all_coefficients(
    transport: &TransportCoefficients,
    sources: &SourceTerms,
    geometry: &Geometry,
    boundaries: BoundaryConditions,
) -> AllEquationCoefficients {
    let ion_heating_solver = heating_from_mw_per_m3(&sources.ion_heating);
    let electron_heating_solver = heating_from_mw_per_m3(&sources.electron_heating);

    AllEquationCoefficients {
        ion_temperature: build_equation_coefficients(
            &transport.ion_heat_diffusivity,
            &vec![0.0; transport.ion_heat_diffusivity.len()],
            &ion_heating_solver,
            geometry,
            boundaries.ion_temperature,
        ),
        electron_temperature: build_equation_coefficients(
            &transport.electron_heat_diffusivity,
            &vec![0.0; transport.electron_heat_diffusivity.len()],
            &electron_heating_solver,
            geometry,
            boundaries.electron_temperature,
        ),
        electron_density: build_equation_coefficients(
            &transport.particle_diffusivity,
            &transport.particle_pinch_velocity,
            &sources.particle_source,
            geometry,
            boundaries.electron_density,
        ),
        poloidal_flux: build_equation_coefficients(
            &vec![1.0; transport.ion_heat_diffusivity.len()],
            &vec![0.0; transport.ion_heat_diffusivity.len()],
            &sources.current_drive,
            geometry,
            boundaries.poloidal_flux,
        ),
    }
}
