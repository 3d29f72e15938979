//! MEC processing stage.
//!
//! Drains each station's transfer queues at the pool's allocated compute
//! capacity. Completed jobs are stamped, moved into the accomplished queues
//! and recorded in the episode ledger.

use std::collections::BTreeMap;

use tracing::debug;

use mecsim_common::{BsId, Result};

use crate::entities::BaseStation;
use crate::job::DemandKind;
use crate::ledger::{JobLedger, PacketRecord};
use crate::resources::ResourceSplit;

/// Processes transferred jobs at every station for one step.
///
/// The UE transfer queue is drained at the UE pool's compute capacity and the
/// sensor transfer queue at the sensor pool's; leftover capacity within a
/// queue flows to the next job, never across queues or stations.
pub fn process_mec(
    now: u64,
    stations: &mut BTreeMap<BsId, BaseStation>,
    splits: &BTreeMap<BsId, ResourceSplit>,
    ledger: &mut JobLedger,
) -> Result<usize> {
    let mut accomplished = 0;

    for (bs_id, bs) in stations.iter_mut() {
        let Some(split) = splits.get(bs_id) else {
            continue;
        };
        let mut completed = Vec::new();
        bs.transferred_ue
            .drain(split.ue_compute, DemandKind::Computation, now, |job| {
                completed.push(job);
            })?;
        for job in completed.drain(..) {
            ledger.record(PacketRecord::from_job(&job, *bs_id));
            bs.accomplished_ue.push(job);
            accomplished += 1;
        }

        bs.transferred_sensor
            .drain(split.sensor_compute, DemandKind::Computation, now, |job| {
                completed.push(job);
            })?;
        for job in completed {
            ledger.record(PacketRecord::from_job(&job, *bs_id));
            bs.accomplished_sensor.push(job);
            accomplished += 1;
        }
    }

    debug!(now, accomplished, "MEC processing complete");
    Ok(accomplished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mecsim_common::{DeviceId, JobId, Position, SensorId, StationParams, UeId};

    use crate::job::Job;

    fn station() -> BaseStation {
        BaseStation::new(BsId(0), Position::new(0.0, 0.0), &StationParams::default())
    }

    fn transferred_job(id: u64, owner: DeviceId, comp: f64) -> Job {
        let mut job = Job::new(JobId(id), owner, 0, 1.0, comp, 2.0).unwrap();
        job.remaining_comm_demand = 0.0;
        job.transferred_at = Some(1);
        job
    }

    fn split(ue_compute: f64, sensor_compute: f64) -> BTreeMap<BsId, ResourceSplit> {
        let mut splits = BTreeMap::new();
        splits.insert(
            BsId(0),
            ResourceSplit {
                ue_bandwidth: 0.0,
                sensor_bandwidth: 0.0,
                ue_compute,
                sensor_compute,
            },
        );
        splits
    }

    #[test]
    fn test_processing_completes_and_records() {
        let mut stations = BTreeMap::new();
        let mut bs = station();
        bs.transferred_ue
            .push(transferred_job(1, DeviceId::Ue(UeId(0)), 5.0));
        bs.transferred_sensor
            .push(transferred_job(2, DeviceId::Sensor(SensorId(0)), 3.0));
        stations.insert(BsId(0), bs);

        let mut ledger = JobLedger::new();
        let done = process_mec(3, &mut stations, &split(10.0, 10.0), &mut ledger).unwrap();

        assert_eq!(done, 2);
        let bs = &stations[&BsId(0)];
        assert_eq!(bs.accomplished_ue.len(), 1);
        assert_eq!(bs.accomplished_sensor.len(), 1);
        assert_eq!(ledger.ue_packets().len(), 1);
        assert_eq!(ledger.sensor_packets().len(), 1);
        assert_eq!(ledger.ue_packets()[0].accomplished_at, 3);
        assert_eq!(ledger.ue_packets()[0].e2e_delay, 3.0);
        assert!(ledger.ue_packets()[0].delayed);
    }

    #[test]
    fn test_pool_budgets_are_independent() {
        let mut stations = BTreeMap::new();
        let mut bs = station();
        bs.transferred_ue
            .push(transferred_job(1, DeviceId::Ue(UeId(0)), 5.0));
        bs.transferred_sensor
            .push(transferred_job(2, DeviceId::Sensor(SensorId(0)), 5.0));
        stations.insert(BsId(0), bs);

        // ample UE compute must not help the starved sensor pool
        let mut ledger = JobLedger::new();
        process_mec(0, &mut stations, &split(100.0, 1.0), &mut ledger).unwrap();

        let bs = &stations[&BsId(0)];
        assert_eq!(bs.accomplished_ue.len(), 1);
        assert!(bs.accomplished_sensor.is_empty());
        assert_eq!(
            bs.transferred_sensor.iter().next().unwrap().remaining_comp_demand,
            4.0
        );
    }

    #[test]
    fn test_multiple_small_jobs_complete_in_one_step() {
        let mut stations = BTreeMap::new();
        let mut bs = station();
        for id in 0..3 {
            bs.transferred_ue
                .push(transferred_job(id, DeviceId::Ue(UeId(0)), 2.0));
        }
        stations.insert(BsId(0), bs);

        let mut ledger = JobLedger::new();
        let done = process_mec(0, &mut stations, &split(6.0, 0.0), &mut ledger).unwrap();
        assert_eq!(done, 3);
        // FIFO: records appear in queue order
        let ids: Vec<u64> = ledger.ue_packets().iter().map(|r| r.job_id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
