//! The simulation orchestrator: turns a [`config::SimulationConfig`] into a running
//! finite-volume transport simulation, driving the Newton solver one time step at a time and
//! sampling its output.

pub mod config;
pub mod error;
pub mod gradient;
pub mod models;
pub mod output;
pub mod validator;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use gotenx_geometry::Geometry;
use gotenx_physics::CoreProfiles;
use gotenx_physics::sources::{CompositeSource, SourceModel};
use gotenx_physics::transport::{TransportCoefficients, TransportModel};
use gotenx_solve::boundary::{BoundaryCondition, BoundaryConditions, EquationBoundary};
use gotenx_solve::coeffs::build_all_coefficients;
use gotenx_solve::newton::{ConvergenceTolerances, NewtonConfig};
use gotenx_solve::operator::StateVector;
use gotenx_solve::scaling::EquationScales;
use gotenx_solve::timestep::{self, TimeStepConfig};
use tracing::{info, warn};

use crate::config::{BoundaryConditionConfig, EquationToleranceConfig, SimulationConfig, SolverToleranceConfig};
use crate::error::OrchestratorError;
use crate::output::{OutputSink, ProgressObserver, RunStatistics, Snapshot, SimulationResult};

/// Maximum number of times a single step's dt is halved and retried before the step aborts
/// fatally.
const MAX_STEP_RETRIES: usize = 3;

/// Cooperative cancellation signal, checked between steps. Cloning shares the same
/// underlying flag, so a handle can be kept by the caller while the orchestrator holds its own
/// clone.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Builds a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; observed at the orchestrator's next step boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

fn boundary_condition_from_config(config: BoundaryConditionConfig) -> BoundaryCondition {
    match config {
        BoundaryConditionConfig::Dirichlet { value } => BoundaryCondition::Dirichlet(value),
        BoundaryConditionConfig::Neumann { flux } => BoundaryCondition::Neumann(flux),
    }
}

fn build_boundary_conditions(config: &crate::config::BoundaryConfig) -> BoundaryConditions {
    BoundaryConditions {
        ion_temperature: EquationBoundary {
            axis: BoundaryCondition::axis_symmetry(),
            edge: boundary_condition_from_config(config.ion_temperature_edge),
        },
        electron_temperature: EquationBoundary {
            axis: BoundaryCondition::axis_symmetry(),
            edge: boundary_condition_from_config(config.electron_temperature_edge),
        },
        electron_density: EquationBoundary {
            axis: BoundaryCondition::axis_symmetry(),
            edge: boundary_condition_from_config(config.electron_density_edge),
        },
        poloidal_flux: EquationBoundary {
            axis: BoundaryCondition::axis_symmetry(),
            edge: boundary_condition_from_config(config.poloidal_flux_edge),
        },
    }
}

fn initial_profiles_from_config(config: &SimulationConfig) -> Result<CoreProfiles, OrchestratorError> {
    let initial = &config.initial_profiles;
    CoreProfiles::new(
        initial.ion_temperature.clone(),
        initial.electron_temperature.clone(),
        initial.electron_density.clone(),
        initial.poloidal_flux.clone(),
        initial.density_floor,
    )
    .map_err(OrchestratorError::from)
}

/// Builds the convergence tolerances for one Newton solve from the per-equation physical
/// tolerance configuration and `reference`, the state at the start of the step: the physical
/// tolerance is resolved against each equation's reference magnitude, then divided by the same
/// scale used to non-dimensionalise the residual so the two stay consistent.
fn tolerances_at_reference(config: &SolverToleranceConfig, reference: &CoreProfiles, scales: EquationScales) -> ConvergenceTolerances {
    fn scaled(tolerance: &EquationToleranceConfig, reference_value: f64, scale: f64) -> f64 {
        tolerance.physical_tolerance(reference_value) / (scale + f64::EPSILON)
    }

    let representative = |values: &[f64]| -> f64 { values.iter().fold(0.0_f64, |acc, &value| acc.max(value.abs())) };

    ConvergenceTolerances {
        ion_temperature: scaled(&config.ion_temperature, representative(reference.ion_temperature()), scales.ion_temperature),
        electron_temperature: scaled(&config.electron_temperature, representative(reference.electron_temperature()), scales.electron_temperature),
        electron_density: scaled(&config.electron_density, representative(reference.electron_density()), scales.electron_density),
        poloidal_flux: scaled(&config.poloidal_flux, representative(reference.poloidal_flux()), scales.poloidal_flux),
    }
}

fn evaluate_transport(models: &[Box<dyn TransportModel>], profiles: &CoreProfiles, geometry: &Geometry) -> TransportCoefficients {
    let mut total = TransportCoefficients::zeros(profiles.num_cells());
    for model in models {
        match model.evaluate(profiles, geometry) {
            Ok(contribution) => total.accumulate(&contribution),
            Err(reason) => warn!(model = model.name(), %reason, "transport model failed, contributing zero"),
        }
    }
    total.apply_diffusivity_floor();
    total
}

/// Total particle number `Sum n_e * V_cell`, used both as the conservation-renormalisation
/// baseline and to measure drift.
fn total_particle_number(profiles: &CoreProfiles, geometry: &Geometry) -> f64 {
    profiles.electron_density().iter().zip(geometry.cell_volumes().iter()).map(|(density, volume)| density * volume).sum()
}

/// Rescales `profiles`'s electron density so its total particle number matches `target`,
/// logging the drift fraction corrected.
fn renormalize_particle_number(profiles: &CoreProfiles, geometry: &Geometry, target: f64) -> Result<CoreProfiles, OrchestratorError> {
    let current = total_particle_number(profiles, geometry);
    if current <= 0.0 || target <= 0.0 {
        return Ok(profiles.clone());
    }
    let drift = (current - target).abs() / target;
    if drift > 0.005 {
        warn!(drift = drift * 100.0, "particle number drifted beyond 0.5%% between renormalisations");
    }
    let ratio = target / current;
    let rescaled: Vec<f64> = profiles.electron_density().iter().map(|value| value * ratio).collect();
    profiles.with_electron_density(rescaled).map_err(OrchestratorError::from)
}

/// Runs a simulation from `config` to completion (or until cancelled), writing every sampled
/// snapshot to `sink` and returning the final [`SimulationResult`].
///
/// # Errors
///
/// Returns [`OrchestratorError::InvalidConfiguration`] if `config` fails pre-simulation
/// validation, or [`OrchestratorError::Solve`] if a time step fails to converge even after
/// retrying down to the configured time-step floor.
pub fn run(
    config: &SimulationConfig,
    sink: &mut dyn OutputSink,
    cancellation: &CancellationToken,
    mut progress: Option<&mut dyn ProgressObserver>,
) -> Result<SimulationResult, OrchestratorError> {
    validator::validate(config)?;

    let started_at = Instant::now();
    let geometry = Geometry::circular(&gotenx_geometry::CircularGeometryParams {
        num_cells: config.geometry.num_cells,
        major_radius: config.geometry.major_radius,
        minor_radius: config.geometry.minor_radius,
        toroidal_field: config.geometry.toroidal_field,
        q_profile: None,
    })?;

    let mut profiles = initial_profiles_from_config(config)?;
    let transport_models: Vec<Box<dyn TransportModel>> = config.transport_models.iter().map(models::build_transport_model).collect();
    let source_models: Vec<Box<dyn SourceModel>> =
        config.source_models.iter().map(|model| models::build_source_model(model, &config.solver.physical_thresholds)).collect::<Result<_, _>>()?;
    let composite_source = CompositeSource::new(source_models);
    let boundaries = build_boundary_conditions(&config.boundaries);
    let scales = EquationScales::iter_baseline();

    let time_step_config = TimeStepConfig {
        cfl_safety_factor: config.time_stepping.cfl_safety_factor,
        max_growth_factor: config.time_stepping.max_growth_factor,
        max_step_seconds: config.time_stepping.max_step_seconds,
        min_step_seconds: config.time_stepping.effective_min_step_seconds(),
        shrink_factor: config.time_stepping.shrink_factor,
    };

    let initial_particle_number = total_particle_number(&profiles, &geometry);

    let mut time_seconds = 0.0;
    let mut dt = config.time_stepping.initial_step_seconds;
    let mut statistics = RunStatistics::default();
    let mut cancelled = false;

    while time_seconds < config.time_stepping.end_time_seconds {
        if cancellation.is_cancelled() {
            cancelled = true;
            break;
        }

        let mut transport = evaluate_transport(&transport_models, &profiles, &geometry);
        let mut sources = composite_source.evaluate(&profiles, &geometry)?;
        let bootstrap = gotenx_solve::bootstrap::bootstrap_current_density(&profiles, &geometry);
        for (total, contribution) in sources.current_drive.iter_mut().zip(&bootstrap) {
            *total += contribution;
        }
        transport.apply_diffusivity_floor();

        let coeffs = build_all_coefficients(&transport, &sources, &geometry, boundaries);
        let tolerances = tolerances_at_reference(&config.solver.tolerances, &profiles, scales);
        let newton_config = NewtonConfig {
            max_iterations: config.solver.max_iterations,
            tolerances,
            line_search_min_fraction: if config.solver.line_search_enabled { NewtonConfig::default().line_search_min_fraction } else { 1.0 },
            ..NewtonConfig::default()
        };

        let previous_state =
            StateVector::from_fields(profiles.ion_temperature(), profiles.electron_temperature(), profiles.electron_density(), profiles.poloidal_flux());

        let mut attempt_dt = dt.min(config.time_stepping.end_time_seconds - time_seconds).max(time_step_config.min_step_seconds);
        let mut outcome = None;
        for retry in 0..=MAX_STEP_RETRIES {
            match gotenx_solve::newton::solve_step(&previous_state, &previous_state, attempt_dt, &coeffs, &geometry, scales, profiles.density_floor(), &newton_config)
            {
                Ok(solution) => {
                    outcome = Some((solution, attempt_dt));
                    break;
                }
                Err(reason) if retry < MAX_STEP_RETRIES => {
                    warn!(retry, dt = attempt_dt, %reason, "Newton solve failed, shrinking time step and retrying");
                    attempt_dt = timestep::shrink_time_step(attempt_dt, &time_step_config);
                    if attempt_dt <= time_step_config.min_step_seconds {
                        attempt_dt = time_step_config.min_step_seconds;
                    }
                }
                Err(reason) => return Err(OrchestratorError::from(reason)),
            }
        }

        let Some((solution, accepted_dt)) = outcome else {
            return Err(OrchestratorError::Solve(gotenx_solve::SolveError::TimeStepBelowFloor { floor_seconds: time_step_config.min_step_seconds }));
        };

        statistics.total_newton_iterations += solution.iterations;
        statistics.max_residual_norm = statistics.max_residual_norm.max(solution.residual_norm);

        let ion_temperature_new = solution.state.ion_temperature().to_vec();
        let electron_temperature_new = solution.state.electron_temperature().to_vec();
        let electron_density_new = solution.state.electron_density().to_vec();
        let poloidal_flux_new = solution.state.poloidal_flux().to_vec();
        let [ion_temperature_new, electron_temperature_new, electron_density_new, poloidal_flux_new] = gotenx_common::array::eval_profile_fields([
            &ion_temperature_new,
            &electron_temperature_new,
            &electron_density_new,
            &poloidal_flux_new,
        ]);

        profiles = CoreProfiles::new(ion_temperature_new, electron_temperature_new, electron_density_new, poloidal_flux_new, profiles.density_floor())?;

        time_seconds += accepted_dt;
        statistics.total_steps += 1;

        if let Some(observer) = progress.as_deref_mut() {
            observer.on_step(statistics.total_steps, time_seconds);
        }

        if config.time_stepping.renormalize_every_steps > 0 && statistics.total_steps % config.time_stepping.renormalize_every_steps == 0 {
            profiles = renormalize_particle_number(&profiles, &geometry, initial_particle_number)?;
        }

        if statistics.total_steps % config.output.snapshot_every_steps == 0 || time_seconds >= config.time_stepping.end_time_seconds {
            let scalars = output::compute_scalars(&profiles, &geometry, &sources, &config.solver.physical_thresholds);
            let snapshot = Snapshot { time_seconds, profiles: profiles.clone(), scalars };
            if let Err(reason) = sink.record(&snapshot) {
                warn!(%reason, "output sink failed to record a snapshot");
            }
        }

        dt = timestep::next_time_step(accepted_dt, &transport, &geometry, &time_step_config);
    }

    statistics.converged = !cancelled;
    statistics.wall_time_seconds = started_at.elapsed().as_secs_f64();

    if let Some(observer) = progress.as_deref_mut() {
        observer.on_finish();
    }

    if cancelled {
        info!(time_seconds, "simulation cancelled");
    }

    Ok(SimulationResult { final_profiles: profiles, statistics })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{
        BoundaryConditionConfig, BoundaryConfig, GeometryConfig, InitialProfilesConfig, OutputConfig, SolverConfig, SourceModelConfig, TimeSteppingConfig,
        TransportModelConfig,
    };
    use crate::output::InMemorySink;

    fn flat_config(n: usize) -> SimulationConfig {
        SimulationConfig {
            geometry: GeometryConfig { num_cells: n, major_radius: 6.2, minor_radius: 2.0, toroidal_field: 5.3 },
            initial_profiles: InitialProfilesConfig {
                ion_temperature: vec![1000.0; n],
                electron_temperature: vec![1000.0; n],
                electron_density: vec![1.0e20; n],
                poloidal_flux: vec![0.0; n],
                density_floor: 1.0e18,
            },
            transport_models: vec![TransportModelConfig::Constant {
                ion_heat_diffusivity: 1.0,
                electron_heat_diffusivity: 1.0,
                particle_diffusivity: 0.5,
                particle_pinch_velocity: 0.0,
            }],
            source_models: vec![],
            boundaries: BoundaryConfig {
                ion_temperature_edge: BoundaryConditionConfig::Dirichlet { value: 1000.0 },
                electron_temperature_edge: BoundaryConditionConfig::Dirichlet { value: 1000.0 },
                electron_density_edge: BoundaryConditionConfig::Dirichlet { value: 1.0e20 },
                poloidal_flux_edge: BoundaryConditionConfig::Dirichlet { value: 0.0 },
            },
            time_stepping: TimeSteppingConfig {
                end_time_seconds: 0.02,
                initial_step_seconds: 0.01,
                cfl_safety_factor: 0.5,
                max_growth_factor: 1.5,
                max_step_seconds: 0.01,
                min_step_seconds: None,
                min_step_fraction: 0.001,
                shrink_factor: 0.5,
                renormalize_every_steps: 1000,
            },
            solver: SolverConfig::default(),
            output: OutputConfig::default(),
        }
    }

    #[test]
    fn test_flat_profile_runs_to_completion_without_sources() {
        let config = flat_config(10);
        let mut sink = InMemorySink::default();
        let cancellation = CancellationToken::new();
        let result = run(&config, &mut sink, &cancellation, None).unwrap();
        assert!(result.statistics.converged);
        assert!(result.statistics.total_steps >= 2);
        assert!(!sink.snapshots.is_empty());
    }

    #[test]
    fn test_empty_sources_run_reports_zero_power_snapshots() {
        let config = flat_config(10);
        let mut sink = InMemorySink::default();
        let cancellation = CancellationToken::new();
        run(&config, &mut sink, &cancellation, None).unwrap();
        assert!(sink.snapshots.iter().all(|snapshot| snapshot.scalars.fusion_power_watts == 0.0));
    }

    #[test]
    fn test_cancellation_before_first_step_yields_zero_steps() {
        let config = flat_config(10);
        let mut sink = InMemorySink::default();
        let cancellation = CancellationToken::new();
        cancellation.cancel();
        let result = run(&config, &mut sink, &cancellation, None).unwrap();
        assert!(!result.statistics.converged);
        assert_eq!(result.statistics.total_steps, 0);
    }

    #[test]
    fn test_rejects_invalid_configuration_before_running() {
        let mut config = flat_config(10);
        config.geometry.num_cells = 3;
        let mut sink = InMemorySink::default();
        let cancellation = CancellationToken::new();
        assert!(run(&config, &mut sink, &cancellation, None).is_err());
    }

    #[test]
    fn test_fusion_source_run_reports_positive_fusion_power() {
        let mut config = flat_config(20);
        config.initial_profiles.ion_temperature = vec![10_000.0; 20];
        config.initial_profiles.electron_temperature = vec![10_000.0; 20];
        config.boundaries.ion_temperature_edge = BoundaryConditionConfig::Dirichlet { value: 10_000.0 };
        config.boundaries.electron_temperature_edge = BoundaryConditionConfig::Dirichlet { value: 10_000.0 };
        config.source_models = vec![SourceModelConfig::Fusion { deuterium_fraction: 0.5, tritium_fraction: 0.5 }];

        let mut sink = InMemorySink::default();
        let cancellation = CancellationToken::new();
        run(&config, &mut sink, &cancellation, None).unwrap();
        assert!(sink.snapshots.iter().any(|snapshot| snapshot.scalars.fusion_power_watts > 0.0));
    }

    struct CountingObserver {
        steps_seen: usize,
        finished: bool,
    }

    impl crate::output::ProgressObserver for CountingObserver {
        fn on_step(&mut self, _step: usize, _time_seconds: f64) {
            self.steps_seen += 1;
        }

        fn on_finish(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn test_progress_observer_sees_every_accepted_step_and_finish() {
        let config = flat_config(10);
        let mut sink = InMemorySink::default();
        let cancellation = CancellationToken::new();
        let mut observer = CountingObserver { steps_seen: 0, finished: false };
        let result = run(&config, &mut sink, &cancellation, Some(&mut observer)).unwrap();
        assert_eq!(observer.steps_seen, result.statistics.total_steps);
        assert!(observer.finished);
    }
}
