//! Test fixtures and helpers shared by the integration tests.

use mecsim_common::SimConfig;
use mecsim_core::{Scenario, SchedulingPolicy, Simulation, SplitAction, StepReport};

/// Initializes logging for tests; safe to call more than once.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// A short-episode configuration with deterministic resets.
pub fn episode_config(seed: u64) -> SimConfig {
    SimConfig {
        ep_max_time: 20,
        seed,
        reset_rng_episode: true,
        ..SimConfig::default()
    }
}

/// A reset small-scenario simulation ready to step.
pub fn small_simulation(seed: u64, policy: SchedulingPolicy) -> Simulation {
    let mut sim = Simulation::new(episode_config(seed), Scenario::Small, policy)
        .expect("failed to build simulation");
    sim.reset();
    sim
}

/// Steps the simulation under a constant action until the episode ends,
/// returning the per-step reports.
pub fn run_full_episode(sim: &mut Simulation, action: SplitAction) -> Vec<StepReport> {
    let mut reports = Vec::new();
    while !sim.is_terminated() {
        reports.push(sim.step(action).expect("step failed"));
    }
    reports
}

/// An even split between the UE and sensor pools.
pub fn half_split() -> SplitAction {
    SplitAction {
        bandwidth_ratio: 0.5,
        compute_ratio: 0.5,
    }
}
