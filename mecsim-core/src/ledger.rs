//! Episode ledger of completed jobs.
//!
//! Every job that finishes MEC processing becomes a permanently retained,
//! read-only packet record used by the delay/freshness accounting and by the
//! reward collaborator. The ledger is cleared at episode reset.

use serde::{Deserialize, Serialize};

use mecsim_common::{BsId, DeviceId, DeviceKind, JobId};

use crate::job::Job;

/// Accounting record of one completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRecord {
    /// The completed job's id
    pub job_id: JobId,
    /// Owning device
    pub device: DeviceId,
    /// Station that processed the job
    pub station: BsId,
    /// Generation step
    pub created_at: u64,
    /// Uplink transfer completion step
    pub transferred_at: u64,
    /// Processing completion step
    pub accomplished_at: u64,
    /// End-to-end delay in steps
    pub e2e_delay: f64,
    /// Applicable delay threshold
    pub e2e_delay_threshold: f64,
    /// True when `e2e_delay > e2e_delay_threshold`
    pub delayed: bool,
    /// Signed synchronization delay, set once by the freshness accounting
    pub synch_delay: Option<f64>,
    /// Synchronization reward granted by the reward collaborator; a record
    /// with no reward yet counts as pending for AoSI
    pub synch_reward: Option<f64>,
}

impl PacketRecord {
    /// Builds a record from a fully accomplished job.
    ///
    /// Panics in debug builds if the job has not been stamped; the processing
    /// stage only records jobs it just completed.
    pub fn from_job(job: &Job, station: BsId) -> Self {
        debug_assert!(job.transferred_at.is_some() && job.accomplished_at.is_some());
        let transferred_at = job.transferred_at.unwrap_or(job.created_at);
        let accomplished_at = job.accomplished_at.unwrap_or(transferred_at);
        let e2e_delay = (accomplished_at - job.created_at) as f64;
        Self {
            job_id: job.id,
            device: job.owner,
            station,
            created_at: job.created_at,
            transferred_at,
            accomplished_at,
            e2e_delay,
            e2e_delay_threshold: job.e2e_delay_threshold,
            delayed: e2e_delay > job.e2e_delay_threshold,
            synch_delay: None,
            synch_reward: None,
        }
    }
}

/// Append-only store of packet records for one episode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobLedger {
    ue: Vec<PacketRecord>,
    sensor: Vec<PacketRecord>,
}

impl JobLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all records at episode reset.
    pub fn clear(&mut self) {
        self.ue.clear();
        self.sensor.clear();
    }

    /// Appends a record, routed by the owning device's kind.
    pub fn record(&mut self, record: PacketRecord) {
        match record.device.kind() {
            DeviceKind::Ue => self.ue.push(record),
            DeviceKind::Sensor => self.sensor.push(record),
        }
    }

    /// All UE packet records.
    pub fn ue_packets(&self) -> &[PacketRecord] {
        &self.ue
    }

    /// All sensor packet records.
    pub fn sensor_packets(&self) -> &[PacketRecord] {
        &self.sensor
    }

    /// UE packets accomplished at exactly the given step.
    pub fn ue_completed_at(&self, time: u64) -> impl Iterator<Item = &PacketRecord> {
        self.ue.iter().filter(move |r| r.accomplished_at == time)
    }

    /// Sensor packets accomplished at exactly the given step.
    pub fn sensor_completed_at(&self, time: u64) -> impl Iterator<Item = &PacketRecord> {
        self.sensor.iter().filter(move |r| r.accomplished_at == time)
    }

    /// The most recent sensor accomplishment step, if any sensor job has
    /// completed this episode.
    pub fn latest_sensor_accomplishment(&self) -> Option<u64> {
        self.sensor.iter().map(|r| r.accomplished_at).max()
    }

    /// UE packets whose synchronization reward is still unset.
    pub fn pending_resynchronization(&self) -> impl Iterator<Item = &PacketRecord> {
        self.ue.iter().filter(|r| r.synch_reward.is_none())
    }

    /// Stamps the synchronization delay of a UE record; set exactly once.
    pub fn set_synch_delay(&mut self, job_id: JobId, delay: f64) {
        if let Some(record) = self.ue.iter_mut().find(|r| r.job_id == job_id) {
            if record.synch_delay.is_none() {
                record.synch_delay = Some(delay);
            }
        }
    }

    /// Grants a synchronization reward, removing the record from the AoSI
    /// pending pool.
    pub fn set_synch_reward(&mut self, job_id: JobId, reward: f64) {
        if let Some(record) = self.ue.iter_mut().find(|r| r.job_id == job_id) {
            record.synch_reward = Some(reward);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mecsim_common::{SensorId, UeId};

    fn record(job_id: u64, device: DeviceId, accomplished_at: u64) -> PacketRecord {
        PacketRecord {
            job_id: JobId(job_id),
            device,
            station: BsId(0),
            created_at: 0,
            transferred_at: accomplished_at.saturating_sub(1),
            accomplished_at,
            e2e_delay: accomplished_at as f64,
            e2e_delay_threshold: 2.0,
            delayed: accomplished_at as f64 > 2.0,
            synch_delay: None,
            synch_reward: None,
        }
    }

    #[test]
    fn test_records_routed_by_kind() {
        let mut ledger = JobLedger::new();
        ledger.record(record(0, DeviceId::Ue(UeId(0)), 1));
        ledger.record(record(1, DeviceId::Sensor(SensorId(0)), 2));

        assert_eq!(ledger.ue_packets().len(), 1);
        assert_eq!(ledger.sensor_packets().len(), 1);
        assert_eq!(ledger.latest_sensor_accomplishment(), Some(2));
    }

    #[test]
    fn test_completed_at_filters_by_step() {
        let mut ledger = JobLedger::new();
        ledger.record(record(0, DeviceId::Ue(UeId(0)), 3));
        ledger.record(record(1, DeviceId::Ue(UeId(1)), 4));

        assert_eq!(ledger.ue_completed_at(3).count(), 1);
        assert_eq!(ledger.ue_completed_at(4).count(), 1);
        assert_eq!(ledger.ue_completed_at(5).count(), 0);
    }

    #[test]
    fn test_synch_reward_clears_pending() {
        let mut ledger = JobLedger::new();
        ledger.record(record(7, DeviceId::Ue(UeId(0)), 1));
        assert_eq!(ledger.pending_resynchronization().count(), 1);

        ledger.set_synch_reward(JobId(7), 5.0);
        assert_eq!(ledger.pending_resynchronization().count(), 0);
    }

    #[test]
    fn test_synch_delay_set_once() {
        let mut ledger = JobLedger::new();
        ledger.record(record(7, DeviceId::Ue(UeId(0)), 1));

        ledger.set_synch_delay(JobId(7), 2.0);
        ledger.set_synch_delay(JobId(7), 9.0);
        assert_eq!(ledger.ue_packets()[0].synch_delay, Some(2.0));
    }
}
