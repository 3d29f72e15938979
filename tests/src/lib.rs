//! Integration test framework for mecsim
//!
//! Exercises full episodes end to end through the public API of
//! `mecsim-core`, across scenarios and scheduling policies.
//!
//! # Test Categories
//!
//! 1. **Episode tests** - full episodes: termination, rewards, bookkeeping
//! 2. **Pipeline tests** - causal ordering and conservation in the ledger
//! 3. **Determinism tests** - seeded reproducibility across runs and resets

pub mod test_fixtures;

pub use test_fixtures::{
    episode_config, half_split, init_test_logging, run_full_episode, small_simulation,
};

#[cfg(test)]
mod determinism;
#[cfg(test)]
mod episode;
#[cfg(test)]
mod pipeline;
