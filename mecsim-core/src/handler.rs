//! Reward handlers.
//!
//! A handler turns the ledger state after a step into a scalar reward. The
//! engine stays agnostic about the shaping; it only accumulates whatever the
//! handler returns. The smart-city handler is the default shaping used by
//! the bundled scenarios.

use tracing::trace;

use mecsim_common::{JobId, RewardParams};

use crate::delay::DelayAccounting;
use crate::ledger::JobLedger;

/// Computes the per-step reward once delay accounting has run.
pub trait RewardHandler {
    /// Reward for the step that just finished at `now`. The handler may
    /// stamp synchronization rewards into the ledger.
    fn reward(&mut self, now: u64, ledger: &mut JobLedger, accounting: &DelayAccounting) -> f64;

    /// Clears per-episode state at reset.
    fn reset(&mut self) {}
}

/// Handler that always returns zero; useful when only the raw metrics are of
/// interest.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRewardHandler;

impl RewardHandler for NullRewardHandler {
    fn reward(&mut self, _now: u64, _ledger: &mut JobLedger, _accounting: &DelayAccounting) -> f64 {
        0.0
    }
}

/// Default smart-city shaping.
///
/// On-time packets earn a base reward discounted by their e2e delay, delayed
/// packets a flat penalty. Completed UE packets additionally earn a
/// synchronization reward discounted by how far their completion sits from
/// the freshest sensor data; granting the reward marks the ledger row as
/// resynchronized.
#[derive(Debug, Clone)]
pub struct SmartCityHandler {
    params: RewardParams,
}

impl SmartCityHandler {
    /// Builds the handler from its shaping parameters.
    pub fn new(params: RewardParams) -> Self {
        Self { params }
    }

    fn packet_reward(&self, delayed: bool, e2e_delay: f64, penalty: f64) -> f64 {
        if delayed {
            penalty
        } else {
            self.params.base_reward * self.params.discount_factor.powf(e2e_delay.max(0.0))
        }
    }

    fn synch_reward(&self, synch_delay: f64) -> f64 {
        let discount = if synch_delay >= 0.0 {
            self.params.positive_discount_factor.powf(synch_delay)
        } else {
            self.params.negative_discount_factor.powf(-synch_delay)
        };
        self.params.synch_base_reward * discount
    }
}

impl RewardHandler for SmartCityHandler {
    fn reward(&mut self, now: u64, ledger: &mut JobLedger, _accounting: &DelayAccounting) -> f64 {
        let mut reward = 0.0;

        for record in ledger.ue_completed_at(now) {
            reward += self.packet_reward(record.delayed, record.e2e_delay, self.params.ue_penalty);
        }
        for record in ledger.sensor_completed_at(now) {
            reward +=
                self.packet_reward(record.delayed, record.e2e_delay, self.params.sensor_penalty);
        }

        // resynchronize every pending UE packet and collect its reward
        let grants: Vec<(JobId, f64)> = ledger
            .pending_resynchronization()
            .filter_map(|record| {
                record
                    .synch_delay
                    .map(|delay| (record.job_id, self.synch_reward(delay)))
            })
            .collect();
        for (job_id, granted) in grants {
            trace!(now, job = %job_id, granted, "synchronization reward");
            reward += granted;
            ledger.set_synch_reward(job_id, granted);
        }

        reward
    }
}
