//! Simulation tick/timestep types
//!
//! Time advances in fixed unit steps. The [`EpisodeClock`] tracks the current
//! tick together with the episode horizon, which is the minimum of the
//! configured maximum episode time and the last device's departure time.

use serde::{Deserialize, Serialize};

/// Simulation tick counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimulationTick(u64);

impl SimulationTick {
    /// Creates a new simulation tick
    pub fn new(tick: u64) -> Self {
        Self(tick)
    }

    /// Creates the initial tick (tick 0)
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the tick value
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Advances to the next tick
    pub fn next(&mut self) {
        self.0 += 1;
    }

    /// Returns true if this is the initial tick
    pub fn is_initial(&self) -> bool {
        self.0 == 0
    }

    /// Calculates the absolute difference between two ticks
    pub fn diff(&self, other: &SimulationTick) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl std::fmt::Display for SimulationTick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tick({})", self.0)
    }
}

impl From<u64> for SimulationTick {
    fn from(tick: u64) -> Self {
        Self::new(tick)
    }
}

impl From<SimulationTick> for u64 {
    fn from(tick: SimulationTick) -> u64 {
        tick.0
    }
}

/// Episode clock coordinating timesteps within one episode.
///
/// The episode is over once the elapsed time reaches
/// `min(max_episode_time, last_departure)`.
#[derive(Debug, Clone)]
pub struct EpisodeClock {
    current: SimulationTick,
    max_episode_time: u64,
    last_departure: u64,
}

impl EpisodeClock {
    /// Creates a clock for an episode of at most `max_episode_time` ticks.
    pub fn new(max_episode_time: u64) -> Self {
        Self {
            current: SimulationTick::initial(),
            max_episode_time,
            last_departure: u64::MAX,
        }
    }

    /// Returns the current tick.
    pub fn current(&self) -> SimulationTick {
        self.current
    }

    /// Returns the current tick value.
    pub fn now(&self) -> u64 {
        self.current.value()
    }

    /// Sets the departure time of the last device to leave, derived at
    /// episode reset from the arrival model.
    pub fn set_last_departure(&mut self, departure: u64) {
        self.last_departure = departure;
    }

    /// Returns the effective episode horizon.
    pub fn horizon(&self) -> u64 {
        self.max_episode_time.min(self.last_departure)
    }

    /// Advances the clock by one tick.
    pub fn tick(&mut self) {
        self.current.next();
    }

    /// Returns true once the episode's terminal condition has been reached.
    pub fn time_is_up(&self) -> bool {
        self.current.value() >= self.horizon()
    }

    /// Resets the clock to the initial tick, keeping the configured horizon.
    pub fn reset(&mut self) {
        self.current = SimulationTick::initial();
        self.last_departure = u64::MAX;
    }
}
