//! Configuration structures for the simulator
//!
//! All parameters default to the reference smart-city scenario values and can
//! be partially overridden from a YAML file; unspecified fields keep their
//! defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Base station parameters applied to every station in a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationParams {
    /// Total bandwidth in Hz
    pub bandwidth: f64,
    /// Carrier frequency in MHz
    pub frequency: f64,
    /// Transmit power in dBm
    pub tx_power: f64,
    /// Antenna height in m
    pub height: f64,
    /// Total compute capacity in units per step
    pub computational_power: f64,
}

impl Default for StationParams {
    fn default() -> Self {
        Self {
            bandwidth: 100e6,
            frequency: 3500.0,
            tx_power: 40.0,
            height: 40.0,
            computational_power: 100.0,
        }
    }
}

/// User equipment parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UeParams {
    /// Movement speed in m per step
    pub velocity: f64,
    /// Minimum SNR for a connection to survive
    pub snr_threshold: f64,
    /// Thermal noise floor in W
    pub noise: f64,
    /// Device height in m
    pub height: f64,
}

impl Default for UeParams {
    fn default() -> Self {
        Self {
            velocity: 1.5,
            snr_threshold: 2e-8,
            noise: 1e-9,
            height: 1.5,
        }
    }
}

/// Sensor parameters. Sensors are fixed and always active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorParams {
    /// Device height in m
    pub height: f64,
    /// Minimum SNR for a connection to survive
    pub snr_threshold: f64,
    /// Thermal noise floor in W
    pub noise: f64,
}

impl Default for SensorParams {
    fn default() -> Self {
        Self {
            height: 1.5,
            snr_threshold: 2e-8,
            noise: 1e-9,
        }
    }
}

/// UE job generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UeJobParams {
    /// Per-step Bernoulli probability of generating a job
    pub generation_probability: f64,
    /// Mean communication demand (exponential), in Mb
    pub communication_demand_mean: f64,
    /// Mean computation demand (exponential), in units
    pub computation_demand_mean: f64,
}

impl Default for UeJobParams {
    fn default() -> Self {
        Self {
            generation_probability: 0.7,
            communication_demand_mean: 100.0,
            computation_demand_mean: 10.0,
        }
    }
}

/// Sensor job generation parameters. Sensors generate one job every step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorJobParams {
    /// Mean communication demand (exponential), in Mb
    pub communication_demand_mean: f64,
    /// Mean computation demand (exponential), in units
    pub computation_demand_mean: f64,
}

impl Default for SensorJobParams {
    fn default() -> Self {
        Self {
            communication_demand_mean: 40.0,
            computation_demand_mean: 4.0,
        }
    }
}

/// Bounded log-utility parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilityParams {
    /// Lower utility bound
    pub lower: f64,
    /// Upper utility bound
    pub upper: f64,
    /// Shape coefficients (w1, w2, w3)
    pub coeffs: (f64, f64, f64),
}

impl Default for UtilityParams {
    fn default() -> Self {
        Self {
            lower: -20.0,
            upper: 20.0,
            coeffs: (10.0, 0.0, 10.0),
        }
    }
}

/// Reward shaping parameters consumed by the default reward handler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardParams {
    /// Penalty per delayed UE packet
    pub ue_penalty: f64,
    /// Penalty per delayed sensor packet
    pub sensor_penalty: f64,
    /// Reward per on-time packet
    pub base_reward: f64,
    /// Base reward for synchronized sensor information
    pub synch_base_reward: f64,
    /// Discount applied per unit of end-to-end delay
    pub discount_factor: f64,
    /// Discount applied per unit of positive synchronization delay
    pub positive_discount_factor: f64,
    /// Discount applied per unit of negative synchronization delay
    pub negative_discount_factor: f64,
}

impl Default for RewardParams {
    fn default() -> Self {
        Self {
            ue_penalty: -5.0,
            sensor_penalty: -2.0,
            base_reward: 10.0,
            synch_base_reward: 10.0,
            discount_factor: 0.95,
            positive_discount_factor: 0.9,
            negative_discount_factor: 0.8,
        }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Playground width in m
    pub width: f64,
    /// Playground height in m
    pub height: f64,
    /// Maximum episode length in steps
    pub ep_max_time: u64,
    /// Master RNG seed; collaborator seeds are rotated from it
    pub seed: u64,
    /// Reseed RNGs at every episode reset
    pub reset_rng_episode: bool,
    /// Base station parameters
    pub bs: StationParams,
    /// UE parameters
    pub ue: UeParams,
    /// Sensor parameters
    pub sensor: SensorParams,
    /// UE job generation parameters
    pub ue_job: UeJobParams,
    /// Sensor job generation parameters
    pub sensor_job: SensorJobParams,
    /// End-to-end delay threshold in steps, applied to every job
    pub e2e_delay_threshold: f64,
    /// Utility shape parameters
    pub utility: UtilityParams,
    /// Reward shaping parameters
    pub reward: RewardParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 200.0,
            ep_max_time: 100,
            seed: 666,
            reset_rng_episode: false,
            bs: StationParams::default(),
            ue: UeParams::default(),
            sensor: SensorParams::default(),
            ue_job: UeJobParams::default(),
            sensor_job: SensorJobParams::default(),
            e2e_delay_threshold: 2.0,
            utility: UtilityParams::default(),
            reward: RewardParams::default(),
        }
    }
}

impl SimConfig {
    /// Loads a configuration from a YAML file, filling unspecified fields
    /// with defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration from a YAML string.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: SimConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(Error::Config("playground dimensions must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.ue_job.generation_probability) {
            return Err(Error::Config(
                "ue_job.generation_probability must lie in [0, 1]".into(),
            ));
        }
        if self.ue_job.communication_demand_mean <= 0.0
            || self.ue_job.computation_demand_mean <= 0.0
            || self.sensor_job.communication_demand_mean <= 0.0
            || self.sensor_job.computation_demand_mean <= 0.0
        {
            return Err(Error::Config("job demand means must be positive".into()));
        }
        if self.bs.bandwidth < 0.0 || self.bs.computational_power < 0.0 {
            return Err(Error::Config(
                "station bandwidth and compute capacity must be non-negative".into(),
            ));
        }
        if self.utility.lower >= self.utility.upper {
            return Err(Error::Config(
                "utility.lower must be strictly below utility.upper".into(),
            ));
        }
        Ok(())
    }

    /// Derives the seed for a collaborator RNG from the master seed.
    ///
    /// Fixed offsets keep runs reproducible while decorrelating the arrival,
    /// channel, scheduler, movement and generation streams.
    pub fn rotated_seed(&self, offset: u64) -> u64 {
        self.seed.wrapping_add(offset + 1)
    }
}
