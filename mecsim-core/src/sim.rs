//! Top-level simulation engine.
//!
//! [`Simulation`] owns every entity and relation table and advances the
//! episode one timestep at a time. A step runs the fixed pipeline:
//! connectivity update, job generation, resource split, scheduling, uplink
//! transfer, MEC processing, delay accounting, utilities, reward, movement
//! and active-set maintenance. Actions are validated before any state is
//! mutated; a rejected action leaves the engine untouched.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use mecsim_common::{
    BsId, EpisodeClock, Error, Pool, Result, SensorId, SimConfig, UeId,
};

use crate::arrival::ArrivalModel;
use crate::channel::ChannelModel;
use crate::connectivity::{update_pool, PoolConnections, RateTable};
use crate::delay::DelayAccounting;
use crate::entities::{BaseStation, Sensor, UserEquipment};
use crate::generation::JobGenerator;
use crate::handler::{RewardHandler, SmartCityHandler};
use crate::job::DemandKind;
use crate::ledger::JobLedger;
use crate::monitor::{Monitor, NullMonitor};
use crate::movement::MovementModel;
use crate::processing::process_mec;
use crate::resources::{apply_action, AllocationLog, ResourceSplit, SplitAction};
use crate::scenario::Scenario;
use crate::scheduler::{DeviceSample, Scheduler, SchedulingPolicy};
use crate::transfer::TransferStage;
use crate::utility::UtilityModel;

/// Seed rotation offsets decorrelating the collaborator random streams.
const SEED_GENERATION: u64 = 0;
const SEED_MOVEMENT: u64 = 1;

/// Summary of one finished timestep, handed to the monitor and returned to
/// the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Time index of the step that just ran
    pub time: u64,
    /// Reward of this step
    pub reward: f64,
    /// Cumulative reward of the episode so far
    pub episode_reward: f64,
    /// Jobs generated during this step
    pub jobs_generated: u64,
    /// Jobs that finished MEC processing during this step
    pub accomplished_jobs: usize,
    /// Summed AoRI over all UEs with a reading
    pub total_aori: f64,
    /// Summed AoSI over all UEs with a reading
    pub total_aosi: f64,
    /// Episode total of delayed UE packets
    pub delayed_ue_packets: u64,
    /// Episode total of delayed sensor packets
    pub delayed_sensor_packets: u64,
    /// Mean scaled utility over active UEs, if any are active
    pub mean_utility: Option<f64>,
    /// Mean scaled utility over active sensors, if any exist
    pub mean_sensor_utility: Option<f64>,
    /// True once the episode has reached its horizon
    pub terminated: bool,
}

/// The simulation engine for one scenario.
pub struct Simulation {
    config: SimConfig,
    channel: ChannelModel,
    scheduler: Scheduler,
    movement: MovementModel,
    arrival: ArrivalModel,
    generator: JobGenerator,
    utility: UtilityModel,
    handler: Box<dyn RewardHandler>,
    monitor: Box<dyn Monitor>,

    stations: BTreeMap<BsId, BaseStation>,
    ues: BTreeMap<UeId, UserEquipment>,
    sensors: BTreeMap<SensorId, Sensor>,
    active_ues: Vec<UeId>,
    active_sensors: Vec<SensorId>,

    ue_connections: PoolConnections<UeId>,
    sensor_connections: PoolConnections<SensorId>,
    ue_rates: RateTable<UeId>,
    sensor_rates: RateTable<SensorId>,

    transfer: TransferStage,
    ledger: JobLedger,
    accounting: DelayAccounting,
    allocation_log: AllocationLog,

    traffic_request_ue: BTreeMap<UeId, f64>,
    traffic_request_sensor: BTreeMap<SensorId, f64>,
    computation_request_ue: BTreeMap<UeId, f64>,
    computation_request_sensor: BTreeMap<SensorId, f64>,
    utilities: BTreeMap<UeId, f64>,
    utilities_sensor: BTreeMap<SensorId, f64>,

    clock: EpisodeClock,
    rng: StdRng,
    terminated: bool,
    timestep_reward: f64,
    episode_reward: f64,
}

impl Simulation {
    /// Builds a simulation for the given scenario, scheduling policy and
    /// configuration, with the smart-city reward handler and no monitor.
    ///
    /// The engine starts unreset; call [`Simulation::reset`] before stepping.
    pub fn new(config: SimConfig, scenario: Scenario, policy: SchedulingPolicy) -> Result<Self> {
        config.validate()?;
        let layout = scenario.layout();
        let (stations, ues, sensors) = scenario.populate(&config);
        let generator = JobGenerator::new(
            &config.ue_job,
            &config.sensor_job,
            config.e2e_delay_threshold,
        )?;

        info!(
            scenario = scenario.name(),
            stations = stations.len(),
            ues = ues.len(),
            sensors = sensors.len(),
            "building simulation"
        );

        Ok(Self {
            channel: ChannelModel::default(),
            scheduler: Scheduler::new(policy),
            movement: MovementModel::random_waypoint(
                layout.width,
                layout.height,
                config.rotated_seed(SEED_MOVEMENT),
            ),
            arrival: ArrivalModel::NoDeparture {
                ep_max_time: config.ep_max_time,
            },
            generator,
            utility: UtilityModel::from_params(&config.utility),
            handler: Box::new(SmartCityHandler::new(config.reward)),
            monitor: Box::new(NullMonitor),

            stations: stations.into_iter().map(|bs| (bs.id, bs)).collect(),
            ues: ues.into_iter().map(|ue| (ue.id, ue)).collect(),
            sensors: sensors.into_iter().map(|s| (s.id, s)).collect(),
            active_ues: Vec::new(),
            active_sensors: Vec::new(),

            ue_connections: PoolConnections::new(),
            sensor_connections: PoolConnections::new(),
            ue_rates: RateTable::new(),
            sensor_rates: RateTable::new(),

            transfer: TransferStage::new(),
            ledger: JobLedger::new(),
            accounting: DelayAccounting::new(),
            allocation_log: AllocationLog::default(),

            traffic_request_ue: BTreeMap::new(),
            traffic_request_sensor: BTreeMap::new(),
            computation_request_ue: BTreeMap::new(),
            computation_request_sensor: BTreeMap::new(),
            utilities: BTreeMap::new(),
            utilities_sensor: BTreeMap::new(),

            clock: EpisodeClock::new(config.ep_max_time),
            rng: StdRng::seed_from_u64(config.rotated_seed(SEED_GENERATION)),
            terminated: false,
            timestep_reward: 0.0,
            episode_reward: 0.0,
            config,
        })
    }

    /// Replaces the reward handler.
    pub fn with_handler(mut self, handler: Box<dyn RewardHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// Replaces the monitor.
    pub fn with_monitor(mut self, monitor: Box<dyn Monitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Replaces the movement model.
    pub fn with_movement(mut self, movement: MovementModel) -> Self {
        self.movement = movement;
        self
    }

    /// Resets the engine to the start of a fresh episode.
    ///
    /// Entity populations persist; their per-episode state (positions,
    /// buffers, arrival windows) is reinitialized. Random streams are
    /// reseeded when `reset_rng_episode` is set, making repeated resets
    /// yield identical episodes; otherwise the streams continue.
    pub fn reset(&mut self) {
        if self.config.reset_rng_episode {
            self.rng = StdRng::seed_from_u64(self.config.rotated_seed(SEED_GENERATION));
            self.movement.reset();
        } else {
            self.movement.clear_waypoints();
        }

        self.clock.reset();
        for bs in self.stations.values_mut() {
            bs.clear_queues();
        }
        for ue in self.ues.values_mut() {
            ue.uplink_buffer.clear();
            ue.arrival_time = self.arrival.arrival(ue.id);
            ue.departure_time = self.arrival.departure(ue.id);
            ue.position = self.movement.initial_position(ue);
        }
        for sensor in self.sensors.values_mut() {
            sensor.uplink_buffer.clear();
        }

        let all_ues: Vec<UeId> = self.ues.keys().copied().collect();
        self.clock
            .set_last_departure(self.arrival.max_departure(&all_ues));
        self.active_ues = all_ues
            .iter()
            .copied()
            .filter(|id| self.ues[id].is_active(0))
            .collect();
        self.active_sensors = self.sensors.keys().copied().collect();

        self.ue_connections.clear();
        self.sensor_connections.clear();
        self.ue_rates.clear();
        self.sensor_rates.clear();
        self.transfer.reset();
        self.ledger.clear();
        self.accounting.reset();
        self.allocation_log.clear();
        self.scheduler.reset();
        self.generator.reset();
        self.arrival.reset();
        self.handler.reset();
        self.monitor.on_reset();

        self.traffic_request_ue.clear();
        self.traffic_request_sensor.clear();
        self.computation_request_ue.clear();
        self.computation_request_sensor.clear();
        self.utilities.clear();
        self.utilities_sensor.clear();

        self.terminated = false;
        self.timestep_reward = 0.0;
        self.episode_reward = 0.0;

        info!(horizon = self.clock.horizon(), "episode reset");
    }

    /// Advances the episode by one timestep under the given split action.
    ///
    /// When no UE is active after a step, the pipeline repeats under the same
    /// action until one becomes active or the episode ends; the report of the
    /// last repetition is returned. Stepping a terminated episode is an
    /// error, as is an out-of-range action; neither mutates any state.
    pub fn step(&mut self, action: SplitAction) -> Result<StepReport> {
        if self.terminated {
            return Err(Error::PreconditionViolation(
                "step() called on a terminated episode".into(),
            ));
        }
        action.validate()?;

        let mut report = self.run_pipeline(action)?;
        while self.active_ues.is_empty() && !self.terminated {
            report = self.run_pipeline(action)?;
        }
        Ok(report)
    }

    /// One full pass of the per-timestep pipeline.
    fn run_pipeline(&mut self, action: SplitAction) -> Result<StepReport> {
        let now = self.clock.now();
        let generated_before = self.generator.generated();

        // connectivity: attach to the nearest station, then prune by SNR
        update_pool(
            &mut self.ue_connections,
            &self.channel,
            &self.stations,
            &self.ues,
            self.active_ues.iter().copied(),
        );
        update_pool(
            &mut self.sensor_connections,
            &self.channel,
            &self.stations,
            &self.sensors,
            self.active_sensors.iter().copied(),
        );

        // job generation
        for id in &self.active_ues {
            if let Some(ue) = self.ues.get_mut(id) {
                self.generator.generate_ue_job(&mut self.rng, ue, now)?;
            }
        }
        for sensor in self.sensors.values_mut() {
            self.generator.generate_sensor_job(&mut self.rng, sensor, now)?;
        }

        self.snapshot_requests();

        // resource split, identical ratios at every station
        self.allocation_log.record(action);
        let mut splits: BTreeMap<BsId, ResourceSplit> = BTreeMap::new();
        for (id, bs) in &self.stations {
            splits.insert(*id, apply_action(bs, action)?);
        }

        self.schedule_pools(&splits)?;

        // uplink transfer and MEC processing
        self.transfer.transfer_uplink(
            now,
            &self.ue_connections,
            &self.sensor_connections,
            &self.ue_rates,
            &self.sensor_rates,
            &mut self.stations,
            &mut self.ues,
            &mut self.sensors,
        )?;
        let accomplished = process_mec(now, &mut self.stations, &splits, &mut self.ledger)?;

        // delay accounting and utilities
        self.accounting
            .account_step(now, &mut self.ledger, &self.active_ues);
        self.compute_utilities();

        // reward
        let reward = self
            .handler
            .reward(now, &mut self.ledger, &self.accounting);
        self.timestep_reward = reward;
        self.episode_reward += reward;

        // movement, departures and active sets
        for id in &self.active_ues {
            if let Some(ue) = self.ues.get_mut(id) {
                ue.position = self.movement.step_position(ue);
            }
        }
        for (id, ue) in &self.ues {
            if ue.departure_time <= now as i64 {
                self.ue_connections.detach_device(*id);
            }
        }
        self.active_ues = self
            .ues
            .values()
            .filter(|ue| ue.is_active(now))
            .map(|ue| ue.id)
            .collect();
        self.active_sensors = self.sensors.keys().copied().collect();

        self.clock.tick();
        self.terminated = self.clock.time_is_up();

        let report = StepReport {
            time: now,
            reward,
            episode_reward: self.episode_reward,
            jobs_generated: self.generator.generated() - generated_before,
            accomplished_jobs: accomplished,
            total_aori: self.accounting.total_aori(),
            total_aosi: self.accounting.total_aosi(),
            delayed_ue_packets: self.accounting.delayed_ue_packets,
            delayed_sensor_packets: self.accounting.delayed_sensor_packets,
            mean_utility: mean(self.utilities.values()),
            mean_sensor_utility: mean(self.utilities_sensor.values()),
            terminated: self.terminated,
        };
        // The monitor borrows the whole simulation, so it is taken out of
        // its slot for the duration of the callback.
        let mut monitor = std::mem::replace(&mut self.monitor, Box::new(NullMonitor));
        monitor.on_step(self, &report);
        self.monitor = monitor;
        debug!(
            time = now,
            reward,
            accomplished,
            terminated = self.terminated,
            "step complete"
        );
        Ok(report)
    }

    /// Schedules both bandwidth pools at every station and fills the rate
    /// tables for this step.
    fn schedule_pools(&mut self, splits: &BTreeMap<BsId, ResourceSplit>) -> Result<()> {
        self.ue_rates.clear();
        self.sensor_rates.clear();

        for (bs_id, bs) in &self.stations {
            let Some(split) = splits.get(bs_id) else {
                continue;
            };

            let connected: Vec<(UeId, f64)> = self
                .ue_connections
                .devices_of(*bs_id)
                .into_iter()
                .filter_map(|id| self.ues.get(&id).map(|ue| (id, self.channel.snr(bs, ue))))
                .collect();
            let samples: Vec<DeviceSample> = connected
                .iter()
                .map(|(id, snr)| DeviceSample { id: id.0, snr: *snr })
                .collect();
            let shares = self
                .scheduler
                .share(*bs_id, Pool::Ue, &samples, split.ue_bandwidth)?;
            for ((id, snr), share) in connected.iter().zip(&shares) {
                let rate = self.channel.data_rate(*share, *snr)?;
                self.ue_rates.set(*bs_id, *id, rate);
            }

            let connected: Vec<(SensorId, f64)> = self
                .sensor_connections
                .devices_of(*bs_id)
                .into_iter()
                .filter_map(|id| {
                    self.sensors
                        .get(&id)
                        .map(|sensor| (id, self.channel.snr(bs, sensor)))
                })
                .collect();
            let samples: Vec<DeviceSample> = connected
                .iter()
                .map(|(id, snr)| DeviceSample { id: id.0, snr: *snr })
                .collect();
            let shares =
                self.scheduler
                    .share(*bs_id, Pool::Sensor, &samples, split.sensor_bandwidth)?;
            for ((id, snr), share) in connected.iter().zip(&shares) {
                let rate = self.channel.data_rate(*share, *snr)?;
                self.sensor_rates.set(*bs_id, *id, rate);
            }
        }
        Ok(())
    }

    /// Snapshots the outstanding uplink traffic and computation demand per
    /// device, taken right after job generation.
    fn snapshot_requests(&mut self) {
        self.traffic_request_ue = self
            .ues
            .iter()
            .map(|(id, ue)| (*id, ue.uplink_buffer.outstanding(DemandKind::Communication)))
            .collect();
        self.computation_request_ue = self
            .ues
            .iter()
            .map(|(id, ue)| (*id, ue.uplink_buffer.outstanding(DemandKind::Computation)))
            .collect();
        self.traffic_request_sensor = self
            .sensors
            .iter()
            .map(|(id, s)| (*id, s.uplink_buffer.outstanding(DemandKind::Communication)))
            .collect();
        self.computation_request_sensor = self
            .sensors
            .iter()
            .map(|(id, s)| (*id, s.uplink_buffer.outstanding(DemandKind::Computation)))
            .collect();
    }

    /// Computes scaled utilities from the aggregated data rates of this
    /// step's connections, for active devices only.
    fn compute_utilities(&mut self) {
        let macro_ue = self.ue_rates.macro_rates();
        self.utilities = self
            .active_ues
            .iter()
            .map(|id| {
                let rate = macro_ue.get(id).copied().unwrap_or(0.0);
                (*id, self.utility.scale(self.utility.utility(rate)))
            })
            .collect();

        let macro_sensor = self.sensor_rates.macro_rates();
        self.utilities_sensor = self
            .active_sensors
            .iter()
            .map(|id| {
                let rate = macro_sensor.get(id).copied().unwrap_or(0.0);
                (*id, self.utility.scale(self.utility.utility(rate)))
            })
            .collect();
    }

    /// The engine's configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Current simulation time.
    pub fn time(&self) -> u64 {
        self.clock.now()
    }

    /// True once the episode has reached its horizon.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Reward of the most recent step.
    pub fn timestep_reward(&self) -> f64 {
        self.timestep_reward
    }

    /// Cumulative reward of the running episode.
    pub fn episode_reward(&self) -> f64 {
        self.episode_reward
    }

    /// All base stations.
    pub fn stations(&self) -> &BTreeMap<BsId, BaseStation> {
        &self.stations
    }

    /// All user equipments.
    pub fn ues(&self) -> &BTreeMap<UeId, UserEquipment> {
        &self.ues
    }

    /// All sensors.
    pub fn sensors(&self) -> &BTreeMap<SensorId, Sensor> {
        &self.sensors
    }

    /// Ids of currently active UEs, ascending.
    pub fn active_ues(&self) -> &[UeId] {
        &self.active_ues
    }

    /// The UE connection table.
    pub fn ue_connections(&self) -> &PoolConnections<UeId> {
        &self.ue_connections
    }

    /// The sensor connection table.
    pub fn sensor_connections(&self) -> &PoolConnections<SensorId> {
        &self.sensor_connections
    }

    /// This step's UE data rates.
    pub fn ue_rates(&self) -> &RateTable<UeId> {
        &self.ue_rates
    }

    /// This step's sensor data rates.
    pub fn sensor_rates(&self) -> &RateTable<SensorId> {
        &self.sensor_rates
    }

    /// The episode's packet ledger.
    pub fn ledger(&self) -> &JobLedger {
        &self.ledger
    }

    /// The episode's delay and freshness aggregates.
    pub fn accounting(&self) -> &DelayAccounting {
        &self.accounting
    }

    /// Ratios applied so far this episode.
    pub fn allocation_log(&self) -> &AllocationLog {
        &self.allocation_log
    }

    /// Scaled utilities of active UEs for the most recent step.
    pub fn utilities(&self) -> &BTreeMap<UeId, f64> {
        &self.utilities
    }

    /// Scaled utilities of active sensors for the most recent step.
    pub fn sensor_utilities(&self) -> &BTreeMap<SensorId, f64> {
        &self.utilities_sensor
    }

    /// Volume each UE transferred uplink during the most recent step.
    pub fn throughput_ue(&self) -> &BTreeMap<UeId, f64> {
        &self.transfer.throughput_ue
    }

    /// Volume each sensor transferred uplink during the most recent step.
    pub fn throughput_sensor(&self) -> &BTreeMap<SensorId, f64> {
        &self.transfer.throughput_sensor
    }

    /// Outstanding uplink traffic per UE after this step's generation.
    pub fn traffic_request_ue(&self) -> &BTreeMap<UeId, f64> {
        &self.traffic_request_ue
    }

    /// Outstanding uplink traffic per sensor after this step's generation.
    pub fn traffic_request_sensor(&self) -> &BTreeMap<SensorId, f64> {
        &self.traffic_request_sensor
    }

    /// Outstanding computation demand per UE.
    pub fn computation_request_ue(&self) -> &BTreeMap<UeId, f64> {
        &self.computation_request_ue
    }

    /// Outstanding computation demand per sensor.
    pub fn computation_request_sensor(&self) -> &BTreeMap<SensorId, f64> {
        &self.computation_request_sensor
    }
}

fn mean<'a>(values: impl Iterator<Item = &'a f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}
