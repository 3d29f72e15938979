//! mecsim command-line runner
//!
//! Runs one or more episodes of a scenario under a fixed resource split and
//! prints a per-episode summary of rewards and delay metrics.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use mecsim_common::{init_logging, LogLevel, SimConfig};
use mecsim_core::{Scenario, SchedulingPolicy, Simulation, SplitAction, StepReport};

#[derive(Parser, Debug)]
#[command(name = "mecsim")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// YAML configuration file; defaults apply when omitted
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Scenario preset: small, medium, large, smart_city
    #[arg(short = 's', long = "scenario", default_value = "small")]
    pub scenario: String,

    /// Scheduling policy: round-robin, round-robin-equal, resource-fair,
    /// rate-fair, proportional-fair, inverse-rate
    #[arg(short = 'p', long = "policy", default_value = "resource-fair")]
    pub policy: String,

    /// Number of episodes to run
    #[arg(short = 'e', long = "episodes", default_value_t = 1)]
    pub episodes: u32,

    /// Fraction of bandwidth granted to the UE pool
    #[arg(long = "bandwidth-ratio", default_value_t = 0.5)]
    pub bandwidth_ratio: f64,

    /// Fraction of compute capacity granted to the UE pool
    #[arg(long = "compute-ratio", default_value_t = 0.5)]
    pub compute_ratio: f64,

    /// Draw a fresh random split every step instead of the fixed ratios
    #[arg(long = "random-split")]
    pub random_split: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'l', long = "log-level", default_value = "info")]
    pub log_level: String,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let level: LogLevel = args
        .log_level
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    init_logging(level);

    let config = match &args.config {
        Some(path) => SimConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SimConfig::default(),
    };

    let scenario: Scenario = args
        .scenario
        .parse()
        .with_context(|| format!("unknown scenario '{}'", args.scenario))?;
    let policy = parse_policy(&args.policy)?;
    let action = SplitAction {
        bandwidth_ratio: args.bandwidth_ratio,
        compute_ratio: args.compute_ratio,
    };
    action.validate().context("invalid split ratios")?;

    info!(
        scenario = scenario.name(),
        policy = args.policy,
        episodes = args.episodes,
        "starting run"
    );

    let seed = config.seed;
    let mut sim = Simulation::new(config, scenario, policy).context("failed to build simulation")?;
    let mut action_rng = args.random_split.then(|| StdRng::seed_from_u64(seed));
    for episode in 0..args.episodes {
        let summary = run_episode(&mut sim, action, action_rng.as_mut())?;
        print_summary(episode, &summary, &sim);
    }

    Ok(())
}

fn run_episode(
    sim: &mut Simulation,
    action: SplitAction,
    mut action_rng: Option<&mut StdRng>,
) -> Result<StepReport> {
    sim.reset();
    let mut last = None;
    while !sim.is_terminated() {
        let action = match action_rng.as_deref_mut() {
            Some(rng) => SplitAction {
                bandwidth_ratio: rng.gen_range(0.0..=1.0),
                compute_ratio: rng.gen_range(0.0..=1.0),
            },
            None => action,
        };
        last = Some(sim.step(action).context("simulation step failed")?);
    }
    last.context("episode finished without running a single step")
}

fn print_summary(episode: u32, last: &StepReport, sim: &Simulation) {
    println!("episode {episode}:");
    println!("  steps             {}", last.time + 1);
    println!("  episode reward    {:.3}", last.episode_reward);
    println!("  ue packets        {}", sim.ledger().ue_packets().len());
    println!(
        "  sensor packets    {}",
        sim.ledger().sensor_packets().len()
    );
    println!("  delayed ue        {}", last.delayed_ue_packets);
    println!("  delayed sensor    {}", last.delayed_sensor_packets);
    println!("  final aori        {:.3}", last.total_aori);
    println!("  final aosi        {:.3}", last.total_aosi);
    if let Some(u) = last.mean_utility {
        println!("  mean utility      {u:.3}");
    }
}

fn parse_policy(name: &str) -> Result<SchedulingPolicy> {
    let policy = match name.to_ascii_lowercase().as_str() {
        "round-robin" => SchedulingPolicy::RoundRobin { equal_share: false },
        "round-robin-equal" => SchedulingPolicy::RoundRobin { equal_share: true },
        "resource-fair" => SchedulingPolicy::ResourceFair,
        "rate-fair" => SchedulingPolicy::RateFair,
        "proportional-fair" => SchedulingPolicy::ProportionalFair { ewma_alpha: 0.1 },
        "inverse-rate" => SchedulingPolicy::InverseWeightedRate,
        other => bail!("unknown scheduling policy '{other}'"),
    };
    Ok(policy)
}
