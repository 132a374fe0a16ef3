//! The gradient-preserving orchestrator entry point: a structural variant of
//! [`crate::run`] for a downstream optimisation workflow that differentiates through a fixed
//! number of time steps.
//!
//! [`run_fixed_step`] shares [`gotenx_solve::operator::assemble_residual`]'s residual assembly
//! with the performance path, but differs in three ways: `dt` is fixed rather than CFL-adapted
//! (an adaptive step size is itself a host-side, value-dependent branch), there is no periodic
//! conservation renormalisation (another value-dependent branch, `step % k == 0`), and every clip
//! uses [`f64::max`]/[`f64::min`] rather than an `if` — already the data-independent,
//! `select`-equivalent form a differentiable path needs, so no behaviour changes there. No value
//! is read back to a host scalar inside the loop; the caller only inspects [`GradientRunResult`]
//! once the fixed number of steps has completed. Full reverse-mode differentiation through the
//! implicit Newton solve itself — re-expressing [`gotenx_solve::operator`]'s residual assembly
//! over an `Autodiff`-wrapped backend instead of plain `ndarray` — remains future work (see
//! DESIGN.md); `run_fixed_step` only fixes the *structural* shape that rewrite will need.
//!
//! [`q_fusion_gradient_wrt_actuator`] is this module's actual AD entry point today: it
//! differentiates a closed-form `Q_fusion` figure of merit with respect to an auxiliary-heating
//! actuator through `gotenx_common::ad::grad`, for a downstream optimiser that wants an exact
//! gradient rather than a finite-difference estimate.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use burn_autodiff::Autodiff;
use gotenx_common::array::{CpuBackend, LazyArray};
use gotenx_geometry::Geometry;
use gotenx_physics::CoreProfiles;
use gotenx_physics::sources::SourceModel;
use gotenx_physics::transport::TransportModel;
use gotenx_solve::coeffs::build_all_coefficients;
use gotenx_solve::newton::{ConvergenceTolerances, NewtonConfig};
use gotenx_solve::operator::StateVector;
use gotenx_solve::scaling::EquationScales;

use crate::config::SimulationConfig;
use crate::error::OrchestratorError;
use crate::{build_boundary_conditions, evaluate_transport, initial_profiles_from_config};

/// The outcome of a fixed-step gradient-preserving run: just the final profiles and the fixed
/// step count actually taken, since a differentiating caller tracks its own loss and gradients
/// around this call rather than consuming [`crate::output::SimulationResult`]'s diagnostics.
#[derive(Clone, Debug)]
pub struct GradientRunResult {
    /// Profiles after `steps` fixed-size time steps.
    pub final_profiles: CoreProfiles,
    /// Number of steps actually taken (always `steps`, barring a fatal Newton failure).
    pub steps_taken: usize,
}

/// Runs `steps` fixed-size time steps of `dt_seconds` from `config`'s initial profiles, without
/// adaptive time-stepping or periodic renormalisation.
///
/// # Errors
///
/// Returns [`OrchestratorError::InvalidConfiguration`] if `config` fails pre-simulation
/// validation, or [`OrchestratorError::Solve`] if any step fails to converge; unlike
/// [`crate::run`], this entry point never retries with a shrunk step, since a retry is itself a
/// value-dependent branch the differentiated path must not take.
pub fn run_fixed_step(config: &SimulationConfig, dt_seconds: f64, steps: usize) -> Result<GradientRunResult, OrchestratorError> {
    crate::validator::validate(config)?;

    let geometry = Geometry::circular(&gotenx_geometry::CircularGeometryParams {
        num_cells: config.geometry.num_cells,
        major_radius: config.geometry.major_radius,
        minor_radius: config.geometry.minor_radius,
        toroidal_field: config.geometry.toroidal_field,
        q_profile: None,
    })?;

    let mut profiles = initial_profiles_from_config(config)?;
    let transport_models: Vec<Box<dyn TransportModel>> = config.transport_models.iter().map(crate::models::build_transport_model).collect();
    let source_models: Vec<Box<dyn SourceModel>> = config
        .source_models
        .iter()
        .map(|model| crate::models::build_source_model(model, &config.solver.physical_thresholds))
        .collect::<Result<_, _>>()?;
    let composite_source = gotenx_physics::sources::CompositeSource::new(source_models);
    let boundaries = build_boundary_conditions(&config.boundaries);
    let scales = EquationScales::iter_baseline();

    let newton_config = NewtonConfig {
        max_iterations: config.solver.max_iterations,
        tolerances: ConvergenceTolerances::uniform(1e-6),
        line_search_min_fraction: if config.solver.line_search_enabled { NewtonConfig::default().line_search_min_fraction } else { 1.0 },
        ..NewtonConfig::default()
    };

    for _ in 0..steps {
        let mut transport = evaluate_transport(&transport_models, &profiles, &geometry);
        let mut sources = composite_source.evaluate(&profiles, &geometry)?;
        let bootstrap = gotenx_solve::bootstrap::bootstrap_current_density(&profiles, &geometry);
        for (total, contribution) in sources.current_drive.iter_mut().zip(&bootstrap) {
            *total += contribution;
        }
        transport.apply_diffusivity_floor();

        let coeffs = build_all_coefficients(&transport, &sources, &geometry, boundaries);
        let state =
            StateVector::from_fields(profiles.ion_temperature(), profiles.electron_temperature(), profiles.electron_density(), profiles.poloidal_flux());

        let solution = gotenx_solve::newton::solve_step(&state, &state, dt_seconds, &coeffs, &geometry, scales, profiles.density_floor(), &newton_config)?;

        profiles = CoreProfiles::new(
            solution.state.ion_temperature().to_vec(),
            solution.state.electron_temperature().to_vec(),
            solution.state.electron_density().to_vec(),
            solution.state.poloidal_flux().to_vec(),
            profiles.density_floor(),
        )?;
    }

    Ok(GradientRunResult { final_profiles: profiles, steps_taken: steps })
}

/// Backend `gotenx_common::ad::grad` requires: a plain `CpuBackend` computation can never be
/// differentiated, so this module's one genuinely AD-backed function wraps it in `Autodiff`.
type GradientBackend = Autodiff<CpuBackend>;

/// Differentiates a closed-form `Q_fusion = alpha_power / auxiliary_power` figure of merit with
/// respect to the auxiliary actuator's injected power, via `gotenx_common::ad::grad`.
///
/// `alpha_power_mw` is held fixed (only the actuator is swept) and `heating_efficiency` is the
/// fraction of `actuator_power_mw` that reaches the plasma as net auxiliary heating, so
/// `auxiliary_power_mw = actuator_power_mw * heating_efficiency`. A downstream optimiser calls
/// this directly instead of estimating the same gradient by perturbing `actuator_power_mw` twice
/// and differencing.
#[must_use]
pub fn q_fusion_gradient_wrt_actuator(alpha_power_mw: f64, heating_efficiency: f64, actuator_power_mw: f64) -> f64 {
    let device = <GradientBackend as Backend>::Device::default();
    let actuator = LazyArray::<GradientBackend>::from_slice(&[actuator_power_mw as f32], &device)
        .expect("GradientBackend wraps CpuBackend and is single precision by construction");

    let alpha_power_mw = alpha_power_mw as f32;
    let heating_efficiency = heating_efficiency as f32;
    let gradient = gotenx_common::ad::grad(&actuator, move |actuator_power: Tensor<GradientBackend, 1>| {
        let inner_device = <GradientBackend as Backend>::Device::default();
        let alpha_power = Tensor::<GradientBackend, 1>::from_floats(&[alpha_power_mw], &inner_device);
        let efficiency = Tensor::<GradientBackend, 1>::from_floats(&[heating_efficiency], &inner_device);
        alpha_power / (actuator_power * efficiency)
    });

    gradient.eval().to_host()[0] as f64
}
