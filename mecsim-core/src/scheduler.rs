//! Bandwidth scheduling policies.
//!
//! Per station and pool, a scheduler distributes the pool's bandwidth among
//! the currently connected devices. Policies are a closed set of variants
//! sharing one entry point, [`Scheduler::share`]; policy-internal history
//! (round-robin pointers, proportional-fair averages) persists across steps
//! in [`SchedulerState`] and is reset at episode start.
//!
//! Every policy conserves the pool: allocations sum to the pool capacity
//! whenever at least one device is connected, and the allocation is empty
//! when none are.

use std::collections::BTreeMap;

use tracing::debug;

use mecsim_common::{BsId, Error, Pool, Result};

/// Floor for spectral efficiencies when inverting rate formulas.
const MIN_EFFICIENCY: f64 = 1e-12;

/// One connected device as seen by the scheduler: raw id (unique within the
/// pool) and its current SNR towards the scheduling station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSample {
    /// Raw device id; devices are passed in ascending id order
    pub id: u32,
    /// Linear SNR towards the station
    pub snr: f64,
}

impl DeviceSample {
    /// Spectral efficiency in bit/s/Hz at this SNR.
    fn efficiency(&self) -> f64 {
        (1.0 + self.snr).log2()
    }
}

/// Closed set of scheduling policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchedulingPolicy {
    /// Rotates a persistent last-served pointer. With `equal_share` the pool
    /// is divided evenly instead, ignoring channel quality.
    RoundRobin {
        /// Divide the pool evenly instead of serving one device per step
        equal_share: bool,
    },
    /// Divides the bandwidth pool evenly by count of connected devices.
    ResourceFair,
    /// Equalizes achieved data rate across devices by inverting the rate
    /// formula per device SNR.
    RateFair,
    /// Weights each device by the ratio of its instantaneous achievable rate
    /// to its historical average rate.
    ProportionalFair {
        /// Exponential-averaging factor for the historical rate
        ewma_alpha: f64,
    },
    /// Weights inversely proportional to each device's achievable rate,
    /// favoring weaker links.
    InverseWeightedRate,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        SchedulingPolicy::ResourceFair
    }
}

/// Policy-internal state keyed by station and pool; owned exclusively by the
/// scheduler and persistent across steps within an episode.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    /// Raw id of the device served last, per station and pool
    last_served: BTreeMap<(BsId, Pool), u32>,
    /// Historical average rate per device, per station and pool
    avg_rate: BTreeMap<(BsId, Pool, u32), f64>,
}

impl SchedulerState {
    /// Clears all history; called at episode reset.
    pub fn reset(&mut self) {
        self.last_served.clear();
        self.avg_rate.clear();
    }
}

/// A scheduling policy together with its persistent state.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    policy: SchedulingPolicy,
    state: SchedulerState,
}

impl Scheduler {
    /// Creates a scheduler for the given policy.
    pub fn new(policy: SchedulingPolicy) -> Self {
        Self {
            policy,
            state: SchedulerState::default(),
        }
    }

    /// The configured policy.
    pub fn policy(&self) -> SchedulingPolicy {
        self.policy
    }

    /// Resets policy-internal history at episode start.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Distributes `capacity` among `devices`, returning one allocation per
    /// device in input order. Devices must be given in ascending id order.
    ///
    /// Called once per station per pool per step.
    pub fn share(
        &mut self,
        bs: BsId,
        pool: Pool,
        devices: &[DeviceSample],
        capacity: f64,
    ) -> Result<Vec<f64>> {
        if capacity < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "pool capacity must be non-negative, got {capacity}"
            )));
        }
        debug_assert!(devices.windows(2).all(|w| w[0].id < w[1].id));

        if devices.is_empty() {
            return Ok(Vec::new());
        }

        let shares = match self.policy {
            SchedulingPolicy::RoundRobin { equal_share: true } => {
                equal_shares(devices.len(), capacity)
            }
            SchedulingPolicy::RoundRobin { equal_share: false } => {
                self.round_robin(bs, pool, devices, capacity)
            }
            SchedulingPolicy::ResourceFair => equal_shares(devices.len(), capacity),
            SchedulingPolicy::RateFair => {
                // equalized rate: allocation inversely proportional to the
                // per-Hz rate achievable at the device's SNR
                weighted_shares(devices, capacity, |d| {
                    1.0 / d.efficiency().max(MIN_EFFICIENCY)
                })
            }
            SchedulingPolicy::ProportionalFair { ewma_alpha } => {
                self.proportional_fair(bs, pool, devices, capacity, ewma_alpha)
            }
            SchedulingPolicy::InverseWeightedRate => {
                weighted_shares(devices, capacity, |d| {
                    1.0 / d.efficiency().max(MIN_EFFICIENCY)
                })
            }
        };

        debug!(%bs, %pool, devices = devices.len(), capacity, "scheduled pool");
        Ok(shares)
    }

    /// Grants the full pool to one device per call, rotating through the
    /// connected set by ascending id.
    fn round_robin(
        &mut self,
        bs: BsId,
        pool: Pool,
        devices: &[DeviceSample],
        capacity: f64,
    ) -> Vec<f64> {
        let next_index = match self.state.last_served.get(&(bs, pool)) {
            // first device with a larger id than the one served last;
            // wraps to the front when none exists
            Some(last) => devices
                .iter()
                .position(|d| d.id > *last)
                .unwrap_or(0),
            None => 0,
        };
        self.state
            .last_served
            .insert((bs, pool), devices[next_index].id);

        let mut shares = vec![0.0; devices.len()];
        shares[next_index] = capacity;
        shares
    }

    /// Proportional fair: weight by instantaneous rate over historical
    /// average, then update the averages.
    fn proportional_fair(
        &mut self,
        bs: BsId,
        pool: Pool,
        devices: &[DeviceSample],
        capacity: f64,
        ewma_alpha: f64,
    ) -> Vec<f64> {
        let mut weights = Vec::with_capacity(devices.len());
        for device in devices {
            let rate = device.efficiency();
            let avg = *self
                .state
                .avg_rate
                .entry((bs, pool, device.id))
                .or_insert(rate.max(MIN_EFFICIENCY));
            weights.push(rate / avg.max(MIN_EFFICIENCY));
        }

        for device in devices {
            let rate = device.efficiency();
            if let Some(avg) = self.state.avg_rate.get_mut(&(bs, pool, device.id)) {
                *avg = (1.0 - ewma_alpha) * *avg + ewma_alpha * rate;
            }
        }

        normalize(weights, devices.len(), capacity)
    }
}

fn equal_shares(count: usize, capacity: f64) -> Vec<f64> {
    vec![capacity / count as f64; count]
}

fn weighted_shares(
    devices: &[DeviceSample],
    capacity: f64,
    weight: impl Fn(&DeviceSample) -> f64,
) -> Vec<f64> {
    let weights: Vec<f64> = devices.iter().map(weight).collect();
    normalize(weights, devices.len(), capacity)
}

fn normalize(weights: Vec<f64>, count: usize, capacity: f64) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return equal_shares(count, capacity);
    }
    weights.into_iter().map(|w| capacity * w / total).collect()
}
