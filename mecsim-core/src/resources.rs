//! Resource splitting between the UE pool and the sensor pool.

use serde::{Deserialize, Serialize};

use mecsim_common::{Error, Result};

use crate::entities::BaseStation;

/// A station's resources divided between the two pools for one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceSplit {
    /// Bandwidth for the UE pool in Hz
    pub ue_bandwidth: f64,
    /// Bandwidth for the sensor pool in Hz
    pub sensor_bandwidth: f64,
    /// Compute capacity for the UE pool in units per step
    pub ue_compute: f64,
    /// Compute capacity for the sensor pool in units per step
    pub sensor_compute: f64,
}

/// The externally supplied split-ratio action, applied identically to every
/// base station each step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitAction {
    /// Fraction of bandwidth assigned to the UE pool
    pub bandwidth_ratio: f64,
    /// Fraction of compute capacity assigned to the UE pool
    pub compute_ratio: f64,
}

impl SplitAction {
    /// Validates that both ratios lie in `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.bandwidth_ratio)
            || !(0.0..=1.0).contains(&self.compute_ratio)
        {
            return Err(Error::InvalidAction(format!(
                "split ratios must lie in [0, 1], got bandwidth={}, compute={}",
                self.bandwidth_ratio, self.compute_ratio
            )));
        }
        Ok(())
    }
}

/// Divides a station's bandwidth and compute capacity into the UE and sensor
/// pools according to the split action. Pure function.
pub fn apply_action(bs: &BaseStation, action: SplitAction) -> Result<ResourceSplit> {
    action.validate()?;
    Ok(ResourceSplit {
        ue_bandwidth: bs.bandwidth * action.bandwidth_ratio,
        sensor_bandwidth: bs.bandwidth * (1.0 - action.bandwidth_ratio),
        ue_compute: bs.computational_power * action.compute_ratio,
        sensor_compute: bs.computational_power * (1.0 - action.compute_ratio),
    })
}

/// Per-step record of the applied split ratios, kept for the telemetry
/// collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationLog {
    /// Bandwidth ratio granted to UEs, one entry per step
    pub bandwidth_ue: Vec<f64>,
    /// Bandwidth ratio granted to sensors
    pub bandwidth_sensor: Vec<f64>,
    /// Compute ratio granted to UEs
    pub compute_ue: Vec<f64>,
    /// Compute ratio granted to sensors
    pub compute_sensor: Vec<f64>,
}

impl AllocationLog {
    /// Records the ratios applied this step.
    pub fn record(&mut self, action: SplitAction) {
        self.bandwidth_ue.push(action.bandwidth_ratio);
        self.bandwidth_sensor.push(1.0 - action.bandwidth_ratio);
        self.compute_ue.push(action.compute_ratio);
        self.compute_sensor.push(1.0 - action.compute_ratio);
    }

    /// Clears the log at episode reset.
    pub fn clear(&mut self) {
        self.bandwidth_ue.clear();
        self.bandwidth_sensor.clear();
        self.compute_ue.clear();
        self.compute_sensor.clear();
    }
}
