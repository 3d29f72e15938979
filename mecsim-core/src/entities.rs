//! Entity records: base stations, user equipments and sensors.
//!
//! Entities are owned exclusively by the simulation; positions of UEs are
//! mutated once per step by the movement model. All cross-entity relations
//! (connections, rates, scheduler state) live in tables keyed by the stable
//! integer ids, not here.

use serde::{Deserialize, Serialize};

use mecsim_common::{
    BsId, DeviceId, Position, SensorId, SensorParams, StationParams, UeId, UeParams,
};

use crate::job::JobQueue;

/// A base station acting as a MEC server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseStation {
    /// Unique, immutable identity
    pub id: BsId,
    /// Fixed planar position
    pub position: Position,
    /// Antenna height in m
    pub height: f64,
    /// Total bandwidth in Hz
    pub bandwidth: f64,
    /// Carrier frequency in MHz
    pub frequency: f64,
    /// Transmit power in dBm
    pub tx_power: f64,
    /// Total compute capacity in units per step
    pub computational_power: f64,
    /// Fully transferred UE jobs awaiting processing
    pub transferred_ue: JobQueue,
    /// Fully transferred sensor jobs awaiting processing
    pub transferred_sensor: JobQueue,
    /// Fully processed UE jobs, retained for accounting
    pub accomplished_ue: JobQueue,
    /// Fully processed sensor jobs, retained for accounting
    pub accomplished_sensor: JobQueue,
}

impl BaseStation {
    /// Creates a station at `position` with the given shared parameters.
    pub fn new(id: BsId, position: Position, params: &StationParams) -> Self {
        Self {
            id,
            position,
            height: params.height,
            bandwidth: params.bandwidth,
            frequency: params.frequency,
            tx_power: params.tx_power,
            computational_power: params.computational_power,
            transferred_ue: JobQueue::new(),
            transferred_sensor: JobQueue::new(),
            accomplished_ue: JobQueue::new(),
            accomplished_sensor: JobQueue::new(),
        }
    }

    /// Clears all station-side queues at episode reset.
    pub fn clear_queues(&mut self) {
        self.transferred_ue.clear();
        self.transferred_sensor.clear();
        self.accomplished_ue.clear();
        self.accomplished_sensor.clear();
    }
}

/// A mobile user equipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEquipment {
    /// Unique, immutable identity
    pub id: UeId,
    /// Current planar position, mutated by the movement model
    pub position: Position,
    /// Movement speed in m per step
    pub velocity: f64,
    /// Minimum SNR for a connection to survive
    pub snr_threshold: f64,
    /// Thermal noise floor in W
    pub noise: f64,
    /// Device height in m
    pub height: f64,
    /// First step the UE requests service, derived at episode reset
    pub arrival_time: i64,
    /// Step the UE departs, derived at episode reset
    pub departure_time: i64,
    /// Jobs awaiting uplink transfer
    pub uplink_buffer: JobQueue,
}

impl UserEquipment {
    /// Creates a UE with the given shared parameters. Position and
    /// arrival/departure times are assigned at episode reset.
    pub fn new(id: UeId, params: &UeParams) -> Self {
        Self {
            id,
            position: Position::default(),
            velocity: params.velocity,
            snr_threshold: params.snr_threshold,
            noise: params.noise,
            height: params.height,
            arrival_time: 0,
            departure_time: 0,
            uplink_buffer: JobQueue::new(),
        }
    }

    /// A UE is active while `arrival <= t < departure`.
    pub fn is_active(&self, time: u64) -> bool {
        let t = time as i64;
        self.arrival_time <= t && self.departure_time > t
    }
}

/// A fixed sensor. Sensors are always active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    /// Unique, immutable identity
    pub id: SensorId,
    /// Fixed planar position
    pub position: Position,
    /// Device height in m
    pub height: f64,
    /// Minimum SNR for a connection to survive
    pub snr_threshold: f64,
    /// Thermal noise floor in W
    pub noise: f64,
    /// Jobs awaiting uplink transfer
    pub uplink_buffer: JobQueue,
}

impl Sensor {
    /// Creates a sensor at a fixed position.
    pub fn new(id: SensorId, position: Position, params: &SensorParams) -> Self {
        Self {
            id,
            position,
            height: params.height,
            snr_threshold: params.snr_threshold,
            noise: params.noise,
            uplink_buffer: JobQueue::new(),
        }
    }
}

/// Radio-relevant view of a device, shared by UEs and sensors.
///
/// The channel model and connectivity manager are written against this
/// capability interface so both device kinds flow through the same code.
pub trait RadioDevice {
    /// Stable identity of the device.
    fn device_id(&self) -> DeviceId;
    /// Current planar position.
    fn position(&self) -> Position;
    /// Antenna height in m.
    fn height(&self) -> f64;
    /// Thermal noise floor in W.
    fn noise(&self) -> f64;
    /// Minimum SNR for a connection to survive.
    fn snr_threshold(&self) -> f64;
}

impl RadioDevice for UserEquipment {
    fn device_id(&self) -> DeviceId {
        DeviceId::Ue(self.id)
    }
    fn position(&self) -> Position {
        self.position
    }
    fn height(&self) -> f64 {
        self.height
    }
    fn noise(&self) -> f64 {
        self.noise
    }
    fn snr_threshold(&self) -> f64 {
        self.snr_threshold
    }
}

impl RadioDevice for Sensor {
    fn device_id(&self) -> DeviceId {
        DeviceId::Sensor(self.id)
    }
    fn position(&self) -> Position {
        self.position
    }
    fn height(&self) -> f64 {
        self.height
    }
    fn noise(&self) -> f64 {
        self.noise
    }
    fn snr_threshold(&self) -> f64 {
        self.snr_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ue_activity_window() {
        let mut ue = UserEquipment::new(UeId(0), &UeParams::default());
        ue.arrival_time = 5;
        ue.departure_time = 10;

        assert!(!ue.is_active(4));
        assert!(ue.is_active(5));
        assert!(ue.is_active(9));
        assert!(!ue.is_active(10));
    }

    #[test]
    fn test_station_queue_reset() {
        use crate::job::Job;
        use mecsim_common::JobId;

        let mut bs = BaseStation::new(BsId(0), Position::new(0.0, 0.0), &StationParams::default());
        bs.transferred_ue
            .push(Job::new(JobId(0), DeviceId::Ue(UeId(0)), 0, 1.0, 1.0, 2.0).unwrap());
        bs.clear_queues();
        assert!(bs.transferred_ue.is_empty());
    }
}
