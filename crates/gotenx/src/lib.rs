//! Public entry point for running a gotenx tokamak transport simulation: re-exports the
//! workspace's crates under one name so a downstream binary only depends on `gotenx`.

pub use gotenx_common as common;
pub use gotenx_geometry as geometry;
pub use gotenx_orchestrator as orchestrator;
pub use gotenx_physics as physics;
pub use gotenx_solve as solve;

pub use gotenx_orchestrator::config::SimulationConfig;
pub use gotenx_orchestrator::error::OrchestratorError;
pub use gotenx_orchestrator::output::{
    FileSink, IndicatifProgressObserver, NullProgressObserver, OutputSink, ProgressObserver, RunStatistics, Snapshot, SimulationResult,
};
pub use gotenx_orchestrator::{CancellationToken, run};
