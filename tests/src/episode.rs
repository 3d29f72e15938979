//! Full-episode behavior: termination, rewards and per-step bookkeeping.

use mecsim_common::{Error, SimConfig};
use mecsim_core::{Scenario, SchedulingPolicy, Simulation, SplitAction};

use crate::test_fixtures::{half_split, init_test_logging, run_full_episode, small_simulation};

#[test]
fn test_episode_runs_to_horizon() {
    init_test_logging();
    let mut sim = small_simulation(1, SchedulingPolicy::ResourceFair);

    let reports = run_full_episode(&mut sim, half_split());

    assert_eq!(reports.len(), 20);
    assert_eq!(sim.time(), 20);
    assert!(reports.last().unwrap().terminated);
    assert!(reports[..19].iter().all(|r| !r.terminated));
    // step indices are consecutive from zero
    let times: Vec<u64> = reports.iter().map(|r| r.time).collect();
    assert_eq!(times, (0..20).collect::<Vec<u64>>());
}

#[test]
fn test_terminated_episode_rejects_further_steps() {
    init_test_logging();
    let mut sim = small_simulation(1, SchedulingPolicy::ResourceFair);
    run_full_episode(&mut sim, half_split());

    let res = sim.step(half_split());
    assert!(matches!(res, Err(Error::PreconditionViolation(_))));

    // a reset makes the engine usable again
    sim.reset();
    assert!(sim.step(half_split()).is_ok());
}

#[test]
fn test_episode_reward_is_sum_of_step_rewards() {
    init_test_logging();
    let mut sim = small_simulation(2, SchedulingPolicy::ResourceFair);

    let reports = run_full_episode(&mut sim, half_split());
    let total: f64 = reports.iter().map(|r| r.reward).sum();

    assert!((sim.episode_reward() - total).abs() < 1e-6);
    assert!((reports.last().unwrap().episode_reward - total).abs() < 1e-6);
}

#[test]
fn test_sensors_produce_jobs_every_step() {
    init_test_logging();
    let mut sim = small_simulation(3, SchedulingPolicy::ResourceFair);
    let sensors = sim.sensors().len() as u64;

    let reports = run_full_episode(&mut sim, half_split());
    for report in &reports {
        assert!(report.jobs_generated >= sensors);
    }
}

#[test]
fn test_allocation_log_covers_every_step() {
    init_test_logging();
    let mut sim = small_simulation(4, SchedulingPolicy::ResourceFair);
    let action = SplitAction {
        bandwidth_ratio: 0.3,
        compute_ratio: 0.7,
    };

    let reports = run_full_episode(&mut sim, action);

    let log = sim.allocation_log();
    assert_eq!(log.bandwidth_ue.len(), reports.len());
    assert!(log.bandwidth_ue.iter().all(|r| *r == 0.3));
    assert!(log.compute_sensor.iter().all(|r| (*r - 0.3).abs() < 1e-12));
}

#[test]
fn test_extreme_splits_starve_one_pool() {
    init_test_logging();

    // everything to the UE pool: no sensor job can ever be processed
    let mut sim = small_simulation(5, SchedulingPolicy::ResourceFair);
    run_full_episode(
        &mut sim,
        SplitAction {
            bandwidth_ratio: 1.0,
            compute_ratio: 1.0,
        },
    );
    assert!(sim.ledger().sensor_packets().is_empty());

    // and the mirror image starves the UEs
    let mut sim = small_simulation(5, SchedulingPolicy::ResourceFair);
    run_full_episode(
        &mut sim,
        SplitAction {
            bandwidth_ratio: 0.0,
            compute_ratio: 0.0,
        },
    );
    assert!(sim.ledger().ue_packets().is_empty());
    assert!(!sim.ledger().sensor_packets().is_empty());
}

#[test]
fn test_all_scenarios_build_and_step() {
    init_test_logging();
    for scenario in Scenario::ALL {
        let config = SimConfig {
            ep_max_time: 3,
            ..SimConfig::default()
        };
        let mut sim = Simulation::new(config, scenario, SchedulingPolicy::ResourceFair)
            .expect("failed to build");
        sim.reset();
        let reports = run_full_episode(&mut sim, half_split());
        assert_eq!(reports.len(), 3, "{scenario:?}");
    }
}

#[test]
fn test_utilities_stay_scaled() {
    init_test_logging();
    let mut sim = small_simulation(6, SchedulingPolicy::ResourceFair);

    for report in run_full_episode(&mut sim, half_split()) {
        if let Some(u) = report.mean_utility {
            assert!((-1.0..=1.0).contains(&u));
        }
        if let Some(u) = report.mean_sensor_utility {
            assert!((-1.0..=1.0).contains(&u));
        }
    }
}
