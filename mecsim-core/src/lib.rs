//! Core engine of the MEC simulator.
//!
//! This crate contains the entities, the radio channel and connectivity
//! layer, bandwidth scheduling, the job lifecycle (generation, uplink
//! transfer, MEC processing), delay/freshness accounting, utilities and the
//! top-level [`sim::Simulation`] that wires them into a per-timestep engine.

pub mod arrival;
pub mod channel;
pub mod connectivity;
pub mod delay;
pub mod entities;
pub mod generation;
pub mod handler;
pub mod job;
pub mod ledger;
pub mod monitor;
pub mod movement;
pub mod processing;
pub mod resources;
pub mod scenario;
pub mod scheduler;
pub mod sim;
pub mod transfer;
pub mod utility;

pub use arrival::ArrivalModel;
pub use channel::ChannelModel;
pub use connectivity::{nearest_station, update_pool, PoolConnections, RateTable};
pub use delay::DelayAccounting;
pub use entities::{BaseStation, RadioDevice, Sensor, UserEquipment};
pub use generation::JobGenerator;
pub use handler::{NullRewardHandler, RewardHandler, SmartCityHandler};
pub use job::{DemandKind, DrainOutcome, Job, JobQueue};
pub use ledger::{JobLedger, PacketRecord};
pub use monitor::{LogMonitor, Monitor, NullMonitor, RecordingMonitor};
pub use movement::MovementModel;
pub use processing::process_mec;
pub use resources::{apply_action, AllocationLog, ResourceSplit, SplitAction};
pub use scenario::{Scenario, ScenarioLayout};
pub use scheduler::{DeviceSample, Scheduler, SchedulerState, SchedulingPolicy};
pub use sim::{Simulation, StepReport};
pub use transfer::TransferStage;
pub use utility::UtilityModel;
