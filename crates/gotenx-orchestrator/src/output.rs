//! Simulation outputs: per-step derived scalars, time-indexed snapshots, the final run result,
//! and the sink abstraction the orchestrator samples into.

use gotenx_common::units::ELEMENTARY_CHARGE;
use gotenx_geometry::{Geometry, central_difference_gradient};
use gotenx_physics::CoreProfiles;
use gotenx_physics::sources::{SourceCategory, SourceTerms};
use ndarray::Array1;

use crate::config::PhysicalThresholdsConfig;
use crate::error::OrchestratorError;

/// Ratio of total D-T fusion energy release (17.6 MeV, including the 14.1 MeV neutron that
/// escapes the plasma) to the alpha-particle share retained as plasma heating (3.5 MeV), used to
/// recover total fusion power from the metadata's deposited alpha power for `Q_fusion`.
const TOTAL_FUSION_TO_ALPHA_RATIO: f64 = 17.6 / 3.5;

/// Vacuum permeability, in H/m, used for the volume-averaged beta estimate.
const MU_0: f64 = 4.0 * std::f64::consts::PI * 1.0e-7;

/// Derived scalar diagnostics for one snapshot: per-category integrated powers, fusion
/// gain, stored energy, confinement time, normalised beta, and plasma current.
#[derive(Clone, Copy, Debug)]
pub struct DerivedScalars {
    /// Total fusion power (alpha share scaled back up to the full D-T release), W.
    pub fusion_power_watts: f64,
    /// Alpha-particle heating power actually deposited in the plasma, W.
    pub alpha_power_watts: f64,
    /// Auxiliary (externally launched) heating power, W — ECRH today.
    pub auxiliary_power_watts: f64,
    /// Ohmic heating power, W.
    pub ohmic_power_watts: f64,
    /// Radiated power loss, W (reported as a positive magnitude).
    pub radiation_power_watts: f64,
    /// Total ion heating power summed over every contributing model, W.
    pub total_ion_heating_watts: f64,
    /// Total electron heating power summed over every contributing model, W.
    pub total_electron_heating_watts: f64,
    /// Fusion gain `Q = fusion_power / auxiliary_power`, `None` when fusion power is below
    /// [`PhysicalThresholdsConfig::min_fusion_power_for_q_watts`] or no auxiliary power is
    /// present to divide by.
    pub q_fusion: Option<f64>,
    /// Volume-integrated thermal energy `W_thermal = Sum (3/2) n_e (T_i + T_e) e V_cell`, J.
    pub stored_thermal_energy_joules: f64,
    /// Energy confinement time `tau_E = W_thermal / P_heating`, `None` below
    /// [`PhysicalThresholdsConfig::min_heating_power_for_tau_e_watts`].
    pub confinement_time_seconds: Option<f64>,
    /// Normalised beta, `beta_N = beta[%] * a * B_t / Ip[MA]`.
    pub beta_n: f64,
    /// Plasma current, A, recovered from the poloidal flux gradient (the same current-density
    /// proxy [`gotenx_physics::sources::OhmicSource`] uses for `j^2` heating), integrated over
    /// the poloidal cross-section.
    pub plasma_current_amperes: f64,
    /// Whether `stored_thermal_energy_joules` is at or above
    /// [`PhysicalThresholdsConfig::min_stored_energy_for_plasma_present_joules`]: a coarse
    /// diagnostic flag for telling a genuinely burning plasma apart from one that has collapsed
    /// to its floor temperatures and densities.
    pub plasma_present: bool,
}

fn cross_section_areas(geometry: &Geometry) -> Array1<f64> {
    geometry.cell_volumes() / (2.0 * std::f64::consts::PI * geometry.major_radius())
}

fn plasma_current_amperes(profiles: &CoreProfiles, geometry: &Geometry) -> f64 {
    let flux = Array1::from_vec(profiles.poloidal_flux().to_vec());
    let face_gradient = central_difference_gradient(&flux, geometry.cell_distances());
    let n = profiles.num_cells();
    let current_density: Vec<f64> = (0..n).map(|cell| 0.5 * (face_gradient[cell] + face_gradient[cell + 1])).collect();
    let areas = cross_section_areas(geometry);
    current_density.iter().zip(areas.iter()).map(|(j, area)| j * area).sum()
}

fn stored_thermal_energy_joules(profiles: &CoreProfiles, geometry: &Geometry) -> f64 {
    let volumes = geometry.cell_volumes();
    let ion_temperature = profiles.ion_temperature();
    let electron_temperature = profiles.electron_temperature();
    let electron_density = profiles.electron_density();
    (0..profiles.num_cells())
        .map(|cell| 1.5 * electron_density[cell] * (ion_temperature[cell] + electron_temperature[cell]) * ELEMENTARY_CHARGE * volumes[cell])
        .sum()
}

fn volume_averaged_beta(profiles: &CoreProfiles, geometry: &Geometry) -> f64 {
    let volumes = geometry.cell_volumes();
    let total_volume: f64 = volumes.sum();
    if total_volume <= 0.0 {
        return 0.0;
    }
    let ion_temperature = profiles.ion_temperature();
    let electron_temperature = profiles.electron_temperature();
    let electron_density = profiles.electron_density();
    let mean_pressure: f64 = (0..profiles.num_cells())
        .map(|cell| electron_density[cell] * (ion_temperature[cell] + electron_temperature[cell]) * ELEMENTARY_CHARGE * volumes[cell])
        .sum::<f64>()
        / total_volume;
    2.0 * MU_0 * mean_pressure / geometry.toroidal_field().powi(2)
}

/// Computes every derived scalar for one instant, from the profiles, geometry, and the source
/// evaluation that stepped the plasma to this point.
#[must_use]
pub fn compute_scalars(profiles: &CoreProfiles, geometry: &Geometry, sources: &SourceTerms, thresholds: &PhysicalThresholdsConfig) -> DerivedScalars {
    let alpha_power_watts: f64 = sources.metadata.iter().filter_map(|entry| entry.alpha_power).sum();
    let fusion_power_watts = alpha_power_watts * TOTAL_FUSION_TO_ALPHA_RATIO;
    let auxiliary_power_watts = sources.integrated_power(SourceCategory::Auxiliary);
    let ohmic_power_watts = sources.integrated_power(SourceCategory::Ohmic);
    let radiation_power_watts = sources.integrated_power(SourceCategory::Radiation).abs();
    let total_ion_heating_watts: f64 = sources.metadata.iter().map(|entry| entry.ion_power).sum();
    let total_electron_heating_watts: f64 = sources.metadata.iter().map(|entry| entry.electron_power).sum();

    let q_fusion = (fusion_power_watts >= thresholds.min_fusion_power_for_q_watts && auxiliary_power_watts > 0.0)
        .then_some(fusion_power_watts / auxiliary_power_watts);

    let stored_thermal_energy_joules = stored_thermal_energy_joules(profiles, geometry);
    let total_heating_power_watts = total_ion_heating_watts + total_electron_heating_watts;
    let confinement_time_seconds = (total_heating_power_watts >= thresholds.min_heating_power_for_tau_e_watts)
        .then_some(stored_thermal_energy_joules / total_heating_power_watts);

    let plasma_current_amperes = plasma_current_amperes(profiles, geometry);
    let beta = volume_averaged_beta(profiles, geometry);
    let beta_n = if plasma_current_amperes.abs() > 1.0 {
        beta * 100.0 * geometry.minor_radius() * geometry.toroidal_field() / (plasma_current_amperes.abs() / 1.0e6)
    } else {
        0.0
    };

    let plasma_present = stored_thermal_energy_joules >= thresholds.min_stored_energy_for_plasma_present_joules;

    DerivedScalars {
        fusion_power_watts,
        alpha_power_watts,
        auxiliary_power_watts,
        ohmic_power_watts,
        radiation_power_watts,
        total_ion_heating_watts,
        total_electron_heating_watts,
        q_fusion,
        stored_thermal_energy_joules,
        confinement_time_seconds,
        beta_n,
        plasma_current_amperes,
        plasma_present,
    }
}

/// One time-sampled snapshot of the simulation.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Simulation time at this snapshot, s.
    pub time_seconds: f64,
    /// The four transported profiles at this instant.
    pub profiles: CoreProfiles,
    /// Derived scalar diagnostics at this instant.
    pub scalars: DerivedScalars,
}

/// Run-level statistics accumulated over the whole simulation.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunStatistics {
    /// Total accepted time steps.
    pub total_steps: usize,
    /// Total Newton iterations summed across every accepted and retried step.
    pub total_newton_iterations: usize,
    /// Whether the run reached `end_time_seconds` without a fatal non-convergence.
    pub converged: bool,
    /// Largest scaled residual norm observed across every Newton solve in the run.
    pub max_residual_norm: f64,
    /// Wall-clock duration of the run, s.
    pub wall_time_seconds: f64,
}

/// The full result of a simulation run.
///
/// Sampled snapshots are not duplicated here: the caller's [`OutputSink`] already received
/// every one at its configured cadence (an [`InMemorySink`] in particular accumulates them for
/// callers who want the whole time series back in memory).
#[derive(Clone, Debug)]
pub struct SimulationResult {
    /// The profiles at the end of the run (or at cancellation/failure).
    pub final_profiles: CoreProfiles,
    /// Aggregate run statistics.
    pub statistics: RunStatistics,
}

/// A destination for sampled snapshots, invoked by the orchestrator at its configured cadence.
///
/// An implementation reports a failed write as an [`crate::error::OrchestratorError::SinkFailure`];
/// the orchestrator's step loop only logs it and carries on, so a flaky sink never aborts a run
/// that is otherwise converging.
pub trait OutputSink {
    /// Records one snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error describing why the snapshot could not be recorded; the caller contains
    /// it rather than aborting the simulation.
    fn record(&mut self, snapshot: &Snapshot) -> Result<(), OrchestratorError>;
}

/// An [`OutputSink`] that simply accumulates every snapshot handed to it in memory, the default
/// sink used when the embedding application does not supply its own.
#[derive(Default)]
pub struct InMemorySink {
    /// Every snapshot recorded so far.
    pub snapshots: Vec<Snapshot>,
}

impl OutputSink for InMemorySink {
    fn record(&mut self, snapshot: &Snapshot) -> Result<(), OrchestratorError> {
        self.snapshots.push(snapshot.clone());
        Ok(())
    }
}

/// An [`OutputSink`] that appends a tab-separated line per snapshot to a file, the simplest
/// persistent trace an embedding application can hand the orchestrator instead of
/// [`InMemorySink`] when it wants output to survive the process.
pub struct FileSink {
    /// Buffered writer over the destination file.
    writer: std::io::BufWriter<std::fs::File>,
    /// Path recorded only for error messages.
    path: std::path::PathBuf,
}

impl FileSink {
    /// Creates (truncating if it already exists) the file at `path` for this run's output trace.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::SinkFailure`] if `path` cannot be created.
    pub fn create(path: &std::path::Path) -> Result<Self, OrchestratorError> {
        let file = std::fs::File::create(path)
            .map_err(|reason| OrchestratorError::SinkFailure { sink: path.display().to_string(), reason: reason.to_string() })?;
        Ok(Self { writer: std::io::BufWriter::new(file), path: path.to_path_buf() })
    }
}

impl OutputSink for FileSink {
    fn record(&mut self, snapshot: &Snapshot) -> Result<(), OrchestratorError> {
        use std::io::Write;
        writeln!(
            self.writer,
            "{:.6}\t{:.6e}\t{:.6e}",
            snapshot.time_seconds, snapshot.scalars.fusion_power_watts, snapshot.scalars.stored_thermal_energy_joules
        )
        .map_err(|reason| OrchestratorError::SinkFailure { sink: self.path.display().to_string(), reason: reason.to_string() })
    }
}

/// An optional observer notified at every accepted step boundary, independent of the sampling
/// cadence an [`OutputSink`] is invoked at. A CLI binds this to a progress bar; the core ships
/// only a no-op default and the `indicatif`-backed implementation below.
pub trait ProgressObserver {
    /// Called once per accepted step, after the profiles have advanced.
    fn on_step(&mut self, step: usize, time_seconds: f64);

    /// Called once the run loop exits, successfully or not.
    fn on_finish(&mut self) {}
}

/// A [`ProgressObserver`] that does nothing; the default when the caller does not want progress
/// reporting.
#[derive(Default)]
pub struct NullProgressObserver;

impl ProgressObserver for NullProgressObserver {
    fn on_step(&mut self, _step: usize, _time_seconds: f64) {}
}

/// A [`ProgressObserver`] backed by an `indicatif` bar on stderr, ticking once per accepted step
/// up to `total_steps_estimate`, the same `enable_steady_tick` + templated-message convention the
/// teacher's `heap::progress_bars::PoincarePbar` uses around its particle-mapping loop.
pub struct IndicatifProgressObserver {
    /// The wrapped progress bar.
    bar: indicatif::ProgressBar,
}

impl IndicatifProgressObserver {
    /// Builds a progress bar styled for the orchestrator's step loop, ticking toward
    /// `total_steps_estimate` (a best-effort estimate of `end_time / initial_dt`, since the
    /// adaptive controller may finish in fewer or more steps).
    #[must_use]
    pub fn new(total_steps_estimate: u64) -> Self {
        let style = indicatif::ProgressStyle::with_template("{elapsed_precise} [{wide_bar:.cyan/blue}] step {pos} t={msg}s ({eta})")
            .unwrap_or_else(|_error| indicatif::ProgressStyle::default_bar())
            .progress_chars("#>-");
        let bar = indicatif::ProgressBar::new(total_steps_estimate).with_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { bar }
    }
}

impl ProgressObserver for IndicatifProgressObserver {
    fn on_step(&mut self, step: usize, time_seconds: f64) {
        self.bar.set_position(step as u64);
        self.bar.set_message(format!("{time_seconds:.4}"));
    }

    fn on_finish(&mut self) {
        self.bar.finish();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gotenx_geometry::CircularGeometryParams;

    fn geometry(n: usize) -> Geometry {
        Geometry::circular(&CircularGeometryParams { num_cells: n, major_radius: 6.2, minor_radius: 2.0, toroidal_field: 5.3, q_profile: None }).unwrap()
    }

    #[test]
    fn test_empty_sources_yield_zero_powers_and_no_q() {
        let n = 20;
        let profiles = CoreProfiles::new(vec![1000.0; n], vec![1000.0; n], vec![1e20; n], vec![0.0; n], 1e18).unwrap();
        let sources = SourceTerms::zeros(n);
        let scalars = compute_scalars(&profiles, &geometry(n), &sources, &PhysicalThresholdsConfig::default());
        assert_eq!(scalars.fusion_power_watts, 0.0);
        assert!(scalars.q_fusion.is_none());
        assert!(scalars.stored_thermal_energy_joules > 0.0);
    }

    #[test]
    fn test_plasma_present_false_below_stored_energy_threshold() {
        let n = 20;
        let profiles = CoreProfiles::new(vec![1.0; n], vec![1.0; n], vec![1e18 + 1.0; n], vec![0.0; n], 1e18).unwrap();
        let sources = SourceTerms::zeros(n);
        let mut thresholds = PhysicalThresholdsConfig::default();
        thresholds.min_stored_energy_for_plasma_present_joules = 1.0e30;
        let scalars = compute_scalars(&profiles, &geometry(n), &sources, &thresholds);
        assert!(!scalars.plasma_present);
    }

    #[test]
    fn test_plasma_present_true_above_stored_energy_threshold() {
        let n = 20;
        let profiles = CoreProfiles::new(vec![10_000.0; n], vec![10_000.0; n], vec![1e20; n], vec![0.0; n], 1e18).unwrap();
        let sources = SourceTerms::zeros(n);
        let scalars = compute_scalars(&profiles, &geometry(n), &sources, &PhysicalThresholdsConfig::default());
        assert!(scalars.plasma_present);
    }

    #[test]
    fn test_in_memory_sink_accumulates_snapshots() {
        let n = 10;
        let profiles = CoreProfiles::new(vec![1000.0; n], vec![1000.0; n], vec![1e20; n], vec![0.0; n], 1e18).unwrap();
        let sources = SourceTerms::zeros(n);
        let scalars = compute_scalars(&profiles, &geometry(n), &sources, &PhysicalThresholdsConfig::default());
        let mut sink = InMemorySink::default();
        sink.record(&Snapshot { time_seconds: 0.0, profiles: profiles.clone(), scalars }).unwrap();
        sink.record(&Snapshot { time_seconds: 1.0, profiles, scalars }).unwrap();
        assert_eq!(sink.snapshots.len(), 2);
    }

    #[test]
    fn test_file_sink_writes_one_line_per_snapshot() {
        let n = 10;
        let profiles = CoreProfiles::new(vec![1000.0; n], vec![1000.0; n], vec![1e20; n], vec![0.0; n], 1e18).unwrap();
        let sources = SourceTerms::zeros(n);
        let scalars = compute_scalars(&profiles, &geometry(n), &sources, &PhysicalThresholdsConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.tsv");

        let mut sink = FileSink::create(&path).unwrap();
        sink.record(&Snapshot { time_seconds: 0.0, profiles: profiles.clone(), scalars }).unwrap();
        sink.record(&Snapshot { time_seconds: 1.0, profiles, scalars }).unwrap();
        drop(sink);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_file_sink_create_reports_sink_failure_for_an_unwritable_path() {
        let unwritable = std::path::Path::new("/nonexistent-directory-for-gotenx-tests/trace.tsv");
        let result = FileSink::create(unwritable);
        assert!(matches!(result, Err(OrchestratorError::SinkFailure { .. })));
    }
}
