//! Common types and utilities for mecsim
//!
//! This crate provides shared types, configuration structures, and utilities
//! used across all mecsim crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod sim_tick;
pub mod types;

pub use config::{
    RewardParams, SimConfig, StationParams, SensorJobParams, SensorParams, UeJobParams, UeParams,
    UtilityParams,
};
pub use error::{Error, Result};
pub use logging::{init_logging, init_logging_with_filter, LogLevel};
pub use sim_tick::{EpisodeClock, SimulationTick};
pub use types::{BsId, DeviceId, DeviceKind, JobId, Pool, Position, SensorId, UeId};
