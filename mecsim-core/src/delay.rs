//! Delay and freshness accounting.
//!
//! Computes per-job end-to-end delay and threshold violations, the monotonic
//! per-episode delayed-packet counters, and the per-device Age-of-Requested-
//! Information (AoRI) and Age-of-Sensed-Information (AoSI) aggregates. The
//! AoRI/AoSI maps are recomputed fresh every step; the counters only grow.

use std::collections::BTreeMap;

use tracing::debug;

use mecsim_common::{DeviceId, JobId, UeId};

use crate::ledger::JobLedger;

/// Per-episode delay and freshness aggregates.
#[derive(Debug, Clone, Default)]
pub struct DelayAccounting {
    /// UE packets that violated their delay threshold; never reset
    /// mid-episode
    pub delayed_ue_packets: u64,
    /// Sensor packets that violated their delay threshold
    pub delayed_sensor_packets: u64,
    /// AoRI per UE: summed e2e delay of packets completed this step, `None`
    /// when none completed
    pub aori: BTreeMap<UeId, Option<f64>>,
    /// AoSI per UE: summed synchronization delay over packets still pending
    /// resynchronization, `None` when none are pending
    pub aosi: BTreeMap<UeId, Option<f64>>,
}

impl DelayAccounting {
    /// Creates empty accounting state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears counters and aggregates at episode reset.
    pub fn reset(&mut self) {
        self.delayed_ue_packets = 0;
        self.delayed_sensor_packets = 0;
        self.aori.clear();
        self.aosi.clear();
    }

    /// Runs the accounting for one step, after processing has finished.
    ///
    /// Stamps synchronization delays on this step's completed UE packets,
    /// advances the delayed-packet counters, and recomputes AoRI and AoSI
    /// for every known UE.
    pub fn account_step(&mut self, now: u64, ledger: &mut JobLedger, users: &[UeId]) {
        self.stamp_synch_delays(now, ledger);

        let delayed_ue = ledger.ue_completed_at(now).filter(|r| r.delayed).count() as u64;
        let delayed_sensor = ledger
            .sensor_completed_at(now)
            .filter(|r| r.delayed)
            .count() as u64;
        self.delayed_ue_packets += delayed_ue;
        self.delayed_sensor_packets += delayed_sensor;

        self.aori = users.iter().map(|id| (*id, None)).collect();
        for record in ledger.ue_completed_at(now) {
            if let DeviceId::Ue(ue) = record.device {
                let entry = self.aori.entry(ue).or_insert(None);
                *entry = Some(entry.unwrap_or(0.0) + record.e2e_delay);
            }
        }

        self.aosi = users.iter().map(|id| (*id, None)).collect();
        for record in ledger.pending_resynchronization() {
            let (DeviceId::Ue(ue), Some(delay)) = (record.device, record.synch_delay) else {
                continue;
            };
            let entry = self.aosi.entry(ue).or_insert(None);
            *entry = Some(entry.unwrap_or(0.0) + delay);
        }

        debug!(
            now,
            delayed_ue,
            delayed_sensor,
            total_delayed_ue = self.delayed_ue_packets,
            "delay accounting complete"
        );
    }

    /// Total AoRI over all devices with a value this step.
    pub fn total_aori(&self) -> f64 {
        self.aori.values().filter_map(|v| *v).sum()
    }

    /// Total AoSI over all devices with a value this step.
    pub fn total_aosi(&self) -> f64 {
        self.aosi.values().filter_map(|v| *v).sum()
    }

    /// Sets the signed synchronization delay of UE packets completed this
    /// step: the distance between the packet's accomplishment and the
    /// freshest sensor accomplishment, falling back to the packet's own e2e
    /// delay before any sensor job has completed.
    fn stamp_synch_delays(&mut self, now: u64, ledger: &mut JobLedger) {
        let latest_sensor = ledger.latest_sensor_accomplishment();
        let stamps: Vec<(JobId, f64)> = ledger
            .ue_completed_at(now)
            .map(|record| {
                let delay = match latest_sensor {
                    Some(sensor_time) => record.accomplished_at as f64 - sensor_time as f64,
                    None => record.e2e_delay,
                };
                (record.job_id, delay)
            })
            .collect();
        for (job_id, delay) in stamps {
            ledger.set_synch_delay(job_id, delay);
        }
    }
}
