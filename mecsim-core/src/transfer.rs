//! Uplink transfer stage.
//!
//! Drains device uplink buffers into the stations' per-pool transfer queues
//! at each device's scheduled data rate. Draining is rate-limited and
//! partial: an unfinished head job carries its remainder into the next step.

use std::collections::BTreeMap;

use tracing::debug;

use mecsim_common::{BsId, Result, SensorId, UeId};

use crate::connectivity::{PoolConnections, RateTable};
use crate::entities::{BaseStation, Sensor, UserEquipment};
use crate::job::{DemandKind, JobQueue};

/// Runs the uplink transfer and tracks per-device transferred volume.
#[derive(Debug, Clone, Default)]
pub struct TransferStage {
    /// Volume fully drained from each UE's buffer this step
    pub throughput_ue: BTreeMap<UeId, f64>,
    /// Volume fully drained from each sensor's buffer this step
    pub throughput_sensor: BTreeMap<SensorId, f64>,
}

impl TransferStage {
    /// Creates the stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears per-step throughput at episode reset.
    pub fn reset(&mut self) {
        self.throughput_ue.clear();
        self.throughput_sensor.clear();
    }

    /// Transfers uplink data for both pools.
    ///
    /// For each station and each connected device, the device's uplink buffer
    /// is drained at this step's scheduled data rate; fully transferred jobs
    /// move into the station's per-pool transfer queue.
    #[allow(clippy::too_many_arguments)]
    pub fn transfer_uplink(
        &mut self,
        now: u64,
        ue_connections: &PoolConnections<UeId>,
        sensor_connections: &PoolConnections<SensorId>,
        ue_rates: &RateTable<UeId>,
        sensor_rates: &RateTable<SensorId>,
        stations: &mut BTreeMap<BsId, BaseStation>,
        ues: &mut BTreeMap<UeId, UserEquipment>,
        sensors: &mut BTreeMap<SensorId, Sensor>,
    ) -> Result<()> {
        // throughput is a per-step quantity
        self.throughput_ue = ues.keys().map(|id| (*id, 0.0)).collect();
        self.throughput_sensor = sensors.keys().map(|id| (*id, 0.0)).collect();

        drain_pool(
            now,
            ue_connections,
            ue_rates,
            stations,
            ues,
            |ue| &mut ue.uplink_buffer,
            |bs| &mut bs.transferred_ue,
            &mut self.throughput_ue,
        )?;
        drain_pool(
            now,
            sensor_connections,
            sensor_rates,
            stations,
            sensors,
            |sensor| &mut sensor.uplink_buffer,
            |bs| &mut bs.transferred_sensor,
            &mut self.throughput_sensor,
        )?;

        debug!(
            now,
            ue_volume = self.throughput_ue.values().sum::<f64>(),
            sensor_volume = self.throughput_sensor.values().sum::<f64>(),
            "uplink transfer complete"
        );
        Ok(())
    }
}

/// Drains one pool's uplink buffers into the matching station queues.
#[allow(clippy::too_many_arguments)]
fn drain_pool<I, D>(
    now: u64,
    connections: &PoolConnections<I>,
    rates: &RateTable<I>,
    stations: &mut BTreeMap<BsId, BaseStation>,
    devices: &mut BTreeMap<I, D>,
    mut buffer_of: impl FnMut(&mut D) -> &mut JobQueue,
    mut station_queue_of: impl FnMut(&mut BaseStation) -> &mut JobQueue,
    throughput: &mut BTreeMap<I, f64>,
) -> Result<()>
where
    I: Copy + Ord,
{
    for (bs_id, connected) in connections.iter() {
        for device_id in connected.iter().copied() {
            let Some(device) = devices.get_mut(&device_id) else {
                continue;
            };
            let rate = rates.get(bs_id, device_id);

            let mut completed = Vec::new();
            let outcome = buffer_of(device).drain(rate, DemandKind::Communication, now, |job| {
                completed.push(job);
            })?;
            *throughput.entry(device_id).or_insert(0.0) += outcome.consumed;

            if !completed.is_empty() {
                if let Some(station) = stations.get_mut(&bs_id) {
                    let queue = station_queue_of(station);
                    for job in completed {
                        queue.push(job);
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mecsim_common::{DeviceId, JobId, Position, StationParams, UeParams};

    use crate::job::Job;

    fn setup_one_ue() -> (
        BTreeMap<BsId, BaseStation>,
        BTreeMap<UeId, UserEquipment>,
        BTreeMap<SensorId, Sensor>,
        PoolConnections<UeId>,
        PoolConnections<SensorId>,
    ) {
        let mut stations = BTreeMap::new();
        stations.insert(
            BsId(0),
            BaseStation::new(BsId(0), Position::new(0.0, 0.0), &StationParams::default()),
        );
        let mut ues = BTreeMap::new();
        ues.insert(UeId(0), UserEquipment::new(UeId(0), &UeParams::default()));

        let mut ue_connections = PoolConnections::new();
        ue_connections.attach(BsId(0), UeId(0));

        (
            stations,
            ues,
            BTreeMap::new(),
            ue_connections,
            PoolConnections::new(),
        )
    }

    fn push_job(ue: &mut UserEquipment, id: u64, comm: f64) {
        ue.uplink_buffer
            .push(Job::new(JobId(id), DeviceId::Ue(ue.id), 0, comm, 1.0, 2.0).unwrap());
    }

    #[test]
    fn test_transfer_moves_completed_jobs_to_station() {
        let (mut stations, mut ues, mut sensors, ue_conns, sensor_conns) = setup_one_ue();
        push_job(ues.get_mut(&UeId(0)).unwrap(), 1, 4.0);

        let mut ue_rates = RateTable::new();
        ue_rates.set(BsId(0), UeId(0), 10.0);
        let sensor_rates = RateTable::new();

        let mut stage = TransferStage::new();
        stage
            .transfer_uplink(
                3,
                &ue_conns,
                &sensor_conns,
                &ue_rates,
                &sensor_rates,
                &mut stations,
                &mut ues,
                &mut sensors,
            )
            .unwrap();

        let bs = &stations[&BsId(0)];
        assert_eq!(bs.transferred_ue.len(), 1);
        assert_eq!(bs.transferred_ue.iter().next().unwrap().transferred_at, Some(3));
        assert!(ues[&UeId(0)].uplink_buffer.is_empty());
        assert_eq!(stage.throughput_ue[&UeId(0)], 4.0);
    }

    #[test]
    fn test_partial_transfer_blocks_in_buffer() {
        let (mut stations, mut ues, mut sensors, ue_conns, sensor_conns) = setup_one_ue();
        push_job(ues.get_mut(&UeId(0)).unwrap(), 1, 10.0);

        let mut ue_rates = RateTable::new();
        ue_rates.set(BsId(0), UeId(0), 4.0);
        let sensor_rates = RateTable::new();

        let mut stage = TransferStage::new();
        for now in 0..2 {
            stage
                .transfer_uplink(
                    now,
                    &ue_conns,
                    &sensor_conns,
                    &ue_rates,
                    &sensor_rates,
                    &mut stations,
                    &mut ues,
                    &mut sensors,
                )
                .unwrap();
        }

        // 10 -> 6 -> 2, still queued on the device
        let head_remaining = ues[&UeId(0)]
            .uplink_buffer
            .iter()
            .next()
            .unwrap()
            .remaining_comm_demand;
        assert_eq!(head_remaining, 2.0);
        assert!(stations[&BsId(0)].transferred_ue.is_empty());
    }

    #[test]
    fn test_unconnected_device_gets_zero_rate() {
        let (mut stations, mut ues, mut sensors, _, sensor_conns) = setup_one_ue();
        push_job(ues.get_mut(&UeId(0)).unwrap(), 1, 4.0);

        // no connection entry at all
        let ue_conns = PoolConnections::new();
        let ue_rates = RateTable::new();
        let sensor_rates = RateTable::new();

        let mut stage = TransferStage::new();
        stage
            .transfer_uplink(
                0,
                &ue_conns,
                &sensor_conns,
                &ue_rates,
                &sensor_rates,
                &mut stations,
                &mut ues,
                &mut sensors,
            )
            .unwrap();

        assert_eq!(ues[&UeId(0)].uplink_buffer.len(), 1);
        assert_eq!(stage.throughput_ue[&UeId(0)], 0.0);
    }
}
