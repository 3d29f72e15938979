//! Step monitors.
//!
//! A monitor observes each finished step without influencing it. The engine
//! calls it with a read-only view of the whole simulation plus the step
//! report, after rewards are settled.

use tracing::info;

use crate::sim::{Simulation, StepReport};

/// Read-only observer of simulation progress.
///
/// `sim` exposes the full public state of the engine (entities, connections,
/// rate tables, ledger, accounting), so a monitor can record per-device
/// detail beyond the headline metrics in the report.
pub trait Monitor {
    /// Called once per finished step.
    fn on_step(&mut self, sim: &Simulation, report: &StepReport);

    /// Called at episode reset.
    fn on_reset(&mut self) {}
}

/// Monitor that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMonitor;

impl Monitor for NullMonitor {
    fn on_step(&mut self, _sim: &Simulation, _report: &StepReport) {}
}

/// Monitor that logs a one-line summary per step via `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMonitor;

impl Monitor for LogMonitor {
    fn on_step(&mut self, sim: &Simulation, report: &StepReport) {
        info!(
            time = report.time,
            reward = report.reward,
            accomplished = report.accomplished_jobs,
            ue_links = sim.ue_connections().link_count(),
            sensor_links = sim.sensor_connections().link_count(),
            aori = report.total_aori,
            aosi = report.total_aosi,
            terminated = report.terminated,
            "step"
        );
    }
}

/// Monitor that keeps the per-step reports of the running episode.
#[derive(Debug, Clone, Default)]
pub struct RecordingMonitor {
    /// Reports of the current episode, in step order
    pub reports: Vec<StepReport>,
}

impl RecordingMonitor {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Monitor for RecordingMonitor {
    fn on_step(&mut self, _sim: &Simulation, report: &StepReport) {
        self.reports.push(report.clone());
    }

    fn on_reset(&mut self) {
        self.reports.clear();
    }
}
