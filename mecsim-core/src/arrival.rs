//! Arrival models for user equipments.
//!
//! An arrival model assigns each UE its arrival and departure step at episode
//! reset; the engine treats a UE as active while `arrival <= t < departure`.

use mecsim_common::UeId;

/// Closed set of arrival models.
#[derive(Debug, Clone, Copy)]
pub enum ArrivalModel {
    /// Every UE is present from step 0 until past the episode horizon.
    NoDeparture {
        /// Episode step limit; departures land one past it
        ep_max_time: u64,
    },
}

impl ArrivalModel {
    /// Arrival step of the given UE.
    pub fn arrival(&self, _ue: UeId) -> i64 {
        match self {
            ArrivalModel::NoDeparture { .. } => 0,
        }
    }

    /// Departure step of the given UE (exclusive).
    pub fn departure(&self, _ue: UeId) -> i64 {
        match self {
            ArrivalModel::NoDeparture { ep_max_time } => *ep_max_time as i64 + 1,
        }
    }

    /// Latest departure over all UEs, used for the episode horizon.
    pub fn max_departure(&self, ues: &[UeId]) -> u64 {
        ues.iter()
            .map(|id| self.departure(*id).max(0) as u64)
            .max()
            .unwrap_or(0)
    }

    /// Resets per-episode state; `NoDeparture` keeps none.
    pub fn reset(&mut self) {}
}
