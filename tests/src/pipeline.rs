//! Causal ordering and conservation of the job lifecycle, observed through
//! the episode ledger.

use mecsim_core::SchedulingPolicy;

use crate::test_fixtures::{half_split, init_test_logging, run_full_episode, small_simulation};

fn all_policies() -> Vec<SchedulingPolicy> {
    vec![
        SchedulingPolicy::RoundRobin { equal_share: false },
        SchedulingPolicy::RoundRobin { equal_share: true },
        SchedulingPolicy::ResourceFair,
        SchedulingPolicy::RateFair,
        SchedulingPolicy::ProportionalFair { ewma_alpha: 0.1 },
        SchedulingPolicy::InverseWeightedRate,
    ]
}

#[test]
fn test_ledger_respects_causal_ordering() {
    init_test_logging();
    let mut sim = small_simulation(10, SchedulingPolicy::ResourceFair);
    run_full_episode(&mut sim, half_split());

    let records = sim
        .ledger()
        .ue_packets()
        .iter()
        .chain(sim.ledger().sensor_packets());
    let mut seen = 0;
    for record in records {
        assert!(record.created_at <= record.transferred_at);
        assert!(record.transferred_at <= record.accomplished_at);
        assert!(record.accomplished_at < sim.time());
        assert_eq!(
            record.e2e_delay,
            (record.accomplished_at - record.created_at) as f64
        );
        assert_eq!(record.delayed, record.e2e_delay > record.e2e_delay_threshold);
        seen += 1;
    }
    assert!(seen > 0, "no packet completed in a full episode");
}

#[test]
fn test_delayed_counters_are_monotone() {
    init_test_logging();
    let mut sim = small_simulation(11, SchedulingPolicy::ResourceFair);

    let reports = run_full_episode(&mut sim, half_split());
    for pair in reports.windows(2) {
        assert!(pair[1].delayed_ue_packets >= pair[0].delayed_ue_packets);
        assert!(pair[1].delayed_sensor_packets >= pair[0].delayed_sensor_packets);
    }

    // counters match the ledger at episode end
    let delayed_ue = sim
        .ledger()
        .ue_packets()
        .iter()
        .filter(|r| r.delayed)
        .count() as u64;
    assert_eq!(
        reports.last().unwrap().delayed_ue_packets,
        delayed_ue
    );
}

#[test]
fn test_every_policy_completes_an_episode() {
    init_test_logging();
    for policy in all_policies() {
        let mut sim = small_simulation(12, policy);
        let reports = run_full_episode(&mut sim, half_split());
        assert_eq!(reports.len(), 20, "{policy:?}");
        assert!(
            !sim.ledger().sensor_packets().is_empty(),
            "{policy:?} processed no sensor packet"
        );
    }
}

#[test]
fn test_completed_ue_packets_get_resynchronized() {
    init_test_logging();
    let mut sim = small_simulation(13, SchedulingPolicy::ResourceFair);
    run_full_episode(&mut sim, half_split());

    // the smart-city handler grants a synchronization reward the same step a
    // UE packet completes
    for record in sim.ledger().ue_packets() {
        assert!(record.synch_delay.is_some());
        assert!(record.synch_reward.is_some());
    }
}

#[test]
fn test_connections_exist_for_covered_devices() {
    init_test_logging();
    let mut sim = small_simulation(14, SchedulingPolicy::ResourceFair);
    sim.step(half_split()).unwrap();

    // the small scenario keeps every device in coverage of its station
    assert_eq!(sim.ue_connections().link_count(), sim.active_ues().len());
    assert_eq!(sim.sensor_connections().link_count(), sim.sensors().len());
}

#[test]
fn test_no_packet_completes_without_generation() {
    init_test_logging();
    let mut sim = small_simulation(15, SchedulingPolicy::ResourceFair);
    let reports = run_full_episode(&mut sim, half_split());

    let generated: u64 = reports.iter().map(|r| r.jobs_generated).sum();
    let completed =
        (sim.ledger().ue_packets().len() + sim.ledger().sensor_packets().len()) as u64;

    assert!(completed > 0);
    assert!(completed <= generated);

    // jobs still in flight account for the difference as outstanding demand
    let accomplished: usize = reports.iter().map(|r| r.accomplished_jobs).sum();
    assert_eq!(accomplished as u64, completed);
}
