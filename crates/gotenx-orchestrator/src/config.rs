//! Serializable configuration for a simulation run: geometry, initial profiles, model selection,
//! boundary conditions, time-stepping, convergence tolerances, and output cadence.
//!
//! Every field here is meant to come from a user-authored config file (TOML/JSON/YAML via
//! `serde`); [`crate::validator::validate`] is the single place that turns a freshly deserialized
//! [`SimulationConfig`] into something the solver can be trusted to run.

use serde::{Deserialize, Serialize};

/// Which transport model to run. Mirrors [`gotenx_physics::transport`]'s closed set of model
/// structs one-for-one, since the config layer has to name a model before any code can construct
/// it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TransportModelConfig {
    /// [`gotenx_physics::transport::ConstantTransport`].
    Constant {
        /// Ion heat diffusivity, m^2/s.
        ion_heat_diffusivity: f64,
        /// Electron heat diffusivity, m^2/s.
        electron_heat_diffusivity: f64,
        /// Particle diffusivity, m^2/s.
        particle_diffusivity: f64,
        /// Particle pinch velocity, m/s (negative is inward).
        particle_pinch_velocity: f64,
    },
    /// [`gotenx_physics::transport::BohmGyroBohmTransport`].
    BohmGyroBohm {
        /// Bohm-term coefficient.
        bohm_coefficient: f64,
        /// Gyro-Bohm-term coefficient.
        gyrobohm_coefficient: f64,
        /// Overall normalisation applied to both terms.
        normalisation: f64,
    },
    /// [`gotenx_physics::transport::CriticalGradientTransport`].
    CriticalGradient {
        /// Diffusivity below the critical gradient, m^2/s.
        background_diffusivity: f64,
        /// Critical normalized ion-temperature gradient `R/L_Ti` threshold.
        critical_gradient: f64,
        /// Stiffness multiplier applied above the threshold.
        stiffness: f64,
    },
    /// [`gotenx_physics::transport::QlknnTransport`].
    Qlknn,
    /// [`gotenx_physics::transport::DensityTransitionTransport`].
    DensityTransition {
        /// ITG background (sub-critical) diffusivity, m^2/s.
        itg_background_diffusivity: f64,
        /// Critical normalized ion-temperature gradient `R/L_Ti` threshold for the ITG branch.
        itg_critical_gradient: f64,
        /// ITG stiffness multiplier applied above the threshold.
        itg_stiffness: f64,
        /// Dimensionless mixing-length coefficient for the resistive-interchange branch.
        ri_coefficient: f64,
        /// Characteristic resistive-interchange relaxation rate, Hz.
        ri_rate_hz: f64,
        /// Electron density, m^-3, at which the ITG/RI sigmoid is centred.
        transition_density: f64,
        /// Width of the logistic blend in electron density, m^-3.
        transition_width: f64,
        /// Main ion mass, in atomic mass units.
        ion_mass_amu: f64,
        /// Peak inward pinch velocity at the edge, m/s.
        peak_pinch_velocity: f64,
    },
}

/// Which source model to include. One entry per element of the composite source list.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SourceModelConfig {
    /// [`gotenx_physics::sources::FusionSource`].
    Fusion {
        /// Deuterium ion fraction, `0..=1`.
        deuterium_fraction: f64,
        /// Tritium ion fraction, `0..=1`.
        tritium_fraction: f64,
    },
    /// [`gotenx_physics::sources::OhmicSource`].
    Ohmic,
    /// [`gotenx_physics::sources::IonElectronExchange`].
    IonElectronExchange,
    /// [`gotenx_physics::sources::RadiationSource`].
    Radiation {
        /// Radiating impurity species.
        species: RadiatingSpeciesConfig,
        /// Impurity concentration relative to electron density, `0..=1`.
        concentration: f64,
    },
    /// [`gotenx_physics::sources::EcrhSource`].
    Ecrh {
        /// Total launched power, MW.
        total_power_mw: f64,
        /// Normalized deposition radius, `rho`.
        deposition_rho: f64,
        /// Gaussian deposition width in `rho`.
        deposition_width: f64,
        /// Current-drive efficiency, A/W.
        current_drive_efficiency: f64,
    },
    /// [`gotenx_physics::sources::GasPuffSource`].
    GasPuff {
        /// Particle injection rate, particles/s.
        particle_rate: f64,
        /// Exponential penetration depth in `rho` from the edge.
        penetration_depth: f64,
    },
    /// [`gotenx_physics::sources::PedestalSource`].
    Pedestal {
        /// Number of outermost cells the pedestal relaxation acts on.
        width_cells: usize,
        /// Target edge ion/electron temperature, eV.
        target_temperature_ev: f64,
        /// Target edge electron density, m^-3.
        target_density: f64,
        /// Relaxation rate, 1/s.
        relaxation_rate: f64,
        /// How strongly the relaxation gain grows with the relative density deficit,
        /// dimensionless. `0.0` recovers a constant gain equal to `relaxation_rate`.
        gain_adaptation_rate: f64,
        /// Maximum magnitude of the particle source this model may emit, in m^-3 s^-1.
        max_particle_source: f64,
    },
}

/// Mirrors [`gotenx_physics::sources::ImpuritySpecies`] for config deserialization.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiatingSpeciesConfig {
    /// Carbon.
    Carbon,
    /// Neon.
    Neon,
    /// Argon.
    Argon,
    /// Tungsten.
    Tungsten,
}

/// Mirrors [`gotenx_solve::boundary::BoundaryCondition`] for config deserialization.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BoundaryConditionConfig {
    /// A fixed boundary value.
    Dirichlet {
        /// The fixed value.
        value: f64,
    },
    /// A fixed boundary flux.
    Neumann {
        /// The fixed flux.
        flux: f64,
    },
}

/// Mirrors [`gotenx_solve::boundary::BoundaryConditions`] for config deserialization; the axis
/// side is always symmetric, so only the edge condition is user-supplied per equation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BoundaryConfig {
    /// Ion temperature edge boundary.
    pub ion_temperature_edge: BoundaryConditionConfig,
    /// Electron temperature edge boundary.
    pub electron_temperature_edge: BoundaryConditionConfig,
    /// Electron density edge boundary.
    pub electron_density_edge: BoundaryConditionConfig,
    /// Poloidal flux edge boundary.
    pub poloidal_flux_edge: BoundaryConditionConfig,
}

/// Geometry parameters, mirroring [`gotenx_geometry::CircularGeometryParams`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Radial cell count.
    pub num_cells: usize,
    /// Major radius, m.
    pub major_radius: f64,
    /// Minor radius, m.
    pub minor_radius: f64,
    /// Vacuum toroidal field at the major radius, T.
    pub toroidal_field: f64,
}

/// Initial profile values, flat-filled or read from a data file upstream of this struct; this
/// layer only carries the already-resolved per-cell arrays.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InitialProfilesConfig {
    /// Initial ion temperature, eV, one entry per cell.
    pub ion_temperature: Vec<f64>,
    /// Initial electron temperature, eV, one entry per cell.
    pub electron_temperature: Vec<f64>,
    /// Initial electron density, m^-3, one entry per cell.
    pub electron_density: Vec<f64>,
    /// Initial poloidal flux, Wb, one entry per cell.
    pub poloidal_flux: Vec<f64>,
    /// Density floor, m^-3, below which the solver clips.
    pub density_floor: f64,
}

/// Time-stepping and convergence configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TimeSteppingConfig {
    /// Simulation end time, seconds.
    pub end_time_seconds: f64,
    /// Initial time step, seconds.
    pub initial_step_seconds: f64,
    /// CFL safety factor, `0..1`.
    pub cfl_safety_factor: f64,
    /// Maximum growth factor applied to the step between successive accepted steps.
    pub max_growth_factor: f64,
    /// Absolute ceiling on the time step, seconds.
    pub max_step_seconds: f64,
    /// Explicit absolute floor on the time step, seconds, overriding `min_step_fraction` when
    /// present. Older configuration files only ever set this field, so it takes precedence
    /// whenever it is `Some`.
    #[serde(default, alias = "min_dt")]
    pub min_step_seconds: Option<f64>,
    /// Fraction of `max_step_seconds` used as the time-step floor when `min_step_seconds` is not
    /// set: a fixed absolute floor fails for shorter simulations, while a fraction of the
    /// ceiling stays scenario-independent.
    #[serde(default = "default_min_step_fraction")]
    pub min_step_fraction: f64,
    /// Factor the step is multiplied by after a failed (non-converging) step.
    pub shrink_factor: f64,
    /// Re-normalize particle/energy conservation every this many accepted steps; `0` disables
    /// renormalization.
    pub renormalize_every_steps: usize,
}

/// Default `min_step_fraction`: `0.1%` of `max_step_seconds`.
#[must_use]
fn default_min_step_fraction() -> f64 {
    0.001
}

impl TimeSteppingConfig {
    /// Resolves the time-step floor: the explicit `min_step_seconds` override when present,
    /// else `max_step_seconds * min_step_fraction`.
    #[must_use]
    pub fn effective_min_step_seconds(&self) -> f64 {
        self.min_step_seconds.unwrap_or(self.max_step_seconds * self.min_step_fraction)
    }
}

/// Per-equation convergence tolerance with reference-state scaling: the effective
/// physical tolerance at a reference value `v` is `max(absolute, relative * |v|)` once `|v|`
/// clears `min_value_threshold`, else just `absolute`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EquationToleranceConfig {
    /// Absolute tolerance floor, in the equation's native physical units.
    pub absolute: f64,
    /// Relative tolerance applied to the reference value's magnitude.
    pub relative: f64,
    /// Below this reference magnitude, only `absolute` applies (avoids a near-zero reference
    /// collapsing the relative term to an unreasonably tight tolerance).
    pub min_value_threshold: f64,
}

impl EquationToleranceConfig {
    /// Resolves the physical tolerance at the given reference value.
    #[must_use]
    pub fn physical_tolerance(&self, reference_value: f64) -> f64 {
        if reference_value.abs() >= self.min_value_threshold { self.absolute.max(self.relative * reference_value.abs()) } else { self.absolute }
    }
}

/// Per-equation tolerances for the four transported fields, with defaults
/// calibrated to ITER-scale reference values.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SolverToleranceConfig {
    /// Ion temperature tolerance, eV.
    pub ion_temperature: EquationToleranceConfig,
    /// Electron temperature tolerance, eV.
    pub electron_temperature: EquationToleranceConfig,
    /// Electron density tolerance, m^-3.
    pub electron_density: EquationToleranceConfig,
    /// Poloidal flux tolerance, Wb.
    pub poloidal_flux: EquationToleranceConfig,
}

impl Default for SolverToleranceConfig {
    /// ITER-scale defaults: T (abs 10 eV, rel 1e-4, floor 100 eV); n_e
    /// (abs 1e17, rel 1e-4, floor 1e18); psi (abs 1e-3, rel 1e-5, floor 0.1).
    fn default() -> Self {
        let temperature = EquationToleranceConfig { absolute: 10.0, relative: 1e-4, min_value_threshold: 100.0 };
        Self {
            ion_temperature: temperature,
            electron_temperature: temperature,
            electron_density: EquationToleranceConfig { absolute: 1e17, relative: 1e-4, min_value_threshold: 1e18 },
            poloidal_flux: EquationToleranceConfig { absolute: 1e-3, relative: 1e-5, min_value_threshold: 0.1 },
        }
    }
}

/// Companion physical thresholds used only by diagnostics, never by the Newton convergence test.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PhysicalThresholdsConfig {
    /// Minimum total heating power, W, below which `tau_E` is not reported (division by a
    /// near-zero heating power would be meaningless).
    pub min_heating_power_for_tau_e_watts: f64,
    /// Minimum fusion power, W, below which `Q_fusion` is not reported.
    pub min_fusion_power_for_q_watts: f64,
    /// Tolerance on the fusion fuel fractions summing to one.
    pub fuel_fraction_tolerance: f64,
    /// Below this poloidal-flux relative variation between steps, ohmic heating is skipped
    /// rather than computed from a noisy near-zero gradient.
    pub flux_variation_threshold_for_ohmic_skip: f64,
    /// Minimum stored thermal energy, J, below which the plasma is considered not present for
    /// diagnostic purposes.
    pub min_stored_energy_for_plasma_present_joules: f64,
}

impl Default for PhysicalThresholdsConfig {
    fn default() -> Self {
        Self {
            min_heating_power_for_tau_e_watts: 1.0e5,
            min_fusion_power_for_q_watts: 1.0e3,
            fuel_fraction_tolerance: 1e-6,
            flux_variation_threshold_for_ohmic_skip: 1e-6,
            min_stored_energy_for_plasma_present_joules: 1.0e3,
        }
    }
}

/// Solver configuration: per-equation tolerances, companion diagnostic thresholds, and Newton
/// loop controls.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Per-equation convergence tolerances.
    #[serde(default)]
    pub tolerances: SolverToleranceConfig,
    /// Companion diagnostic-only thresholds.
    #[serde(default)]
    pub physical_thresholds: PhysicalThresholdsConfig,
    /// Maximum Newton iterations per time step before the step is considered failed.
    pub max_iterations: usize,
    /// Whether the Newton loop's backtracking line search is enabled; when
    /// `false`, every iteration takes a full unit step.
    pub line_search_enabled: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerances: SolverToleranceConfig::default(),
            physical_thresholds: PhysicalThresholdsConfig::default(),
            max_iterations: 30,
            line_search_enabled: true,
        }
    }
}

/// How often and in what form the orchestrator emits [`crate::output::Snapshot`]s.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Emit a snapshot every this many accepted steps; `1` emits every step.
    pub snapshot_every_steps: usize,
    /// Show an indicatif progress bar on stderr while the simulation runs.
    pub show_progress_bar: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { snapshot_every_steps: 1, show_progress_bar: false }
    }
}

/// The full, user-authored configuration for one simulation run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Mesh and machine geometry.
    pub geometry: GeometryConfig,
    /// Initial core profiles.
    pub initial_profiles: InitialProfilesConfig,
    /// Transport models run and summed every step.
    pub transport_models: Vec<TransportModelConfig>,
    /// Source models run and summed every step.
    pub source_models: Vec<SourceModelConfig>,
    /// Edge boundary conditions (the axis side is always symmetric).
    pub boundaries: BoundaryConfig,
    /// Time-stepping and convergence configuration.
    pub time_stepping: TimeSteppingConfig,
    /// Per-equation tolerances, diagnostic thresholds, and Newton loop controls.
    pub solver: SolverConfig,
    /// Output cadence and progress reporting.
    #[serde(default)]
    pub output: OutputConfig,
}
