//! Headless Simulation Runner
//!
//! Spawns seeded bodies, drives them with random influences and prints
//! a summary of the final world state.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use situated_env::core::EnvironmentConfig;
use situated_env::environment::{
    Environment, IndexedWorld, MotionInfluence, PairwiseWorld, StateSnapshot, WorldModel,
};
use situated_env::geometry::Vector2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WorldKind {
    /// Pairwise conflicts, nearest-neighbour perception
    Pairwise,
    /// Spatial index, hull conflicts, frustum perception
    Indexed,
}

/// Headless runner for the situated environment
#[derive(Parser, Debug)]
#[command(name = "sim_runner")]
#[command(about = "Run a seeded situated-environment simulation and print a summary")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of bodies to spawn
    #[arg(long, default_value_t = 10)]
    bodies: usize,

    /// Number of ticks to run
    #[arg(long, default_value_t = 100)]
    ticks: u64,

    /// Random seed (overrides the config seed)
    #[arg(long)]
    seed: Option<u64>,

    /// World model
    #[arg(long, value_enum, default_value_t = WorldKind::Indexed)]
    world: WorldKind,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Wait the configured simulation delay between ticks
    #[arg(long)]
    realtime: bool,
}

/// Summary printed at the end of the run
#[derive(Serialize)]
struct RunSummary {
    world: String,
    seed: u64,
    ticks: u64,
    cancelled_motions: u64,
    elapsed_ms: f64,
    state: StateSnapshot,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match EnvironmentConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => EnvironmentConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let result = match args.world {
        WorldKind::Pairwise => Environment::from_config(&config, PairwiseWorld::new())
            .and_then(|env| run(env, &args, &config)),
        WorldKind::Indexed => Environment::from_config(&config, IndexedWorld::from_config(&config))
            .and_then(|env| run(env, &args, &config)),
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Simulation failed: {}", e);
            std::process::exit(1);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize summary: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print_summary(&summary);
    }
}

fn run<M: WorldModel>(
    mut env: Environment<M>,
    args: &Args,
    config: &EnvironmentConfig,
) -> situated_env::core::Result<RunSummary> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    for _ in 0..args.bodies {
        env.create_body(&mut rng)?;
    }
    tracing::info!(bodies = env.body_count(), ticks = args.ticks, "starting run");

    let start = Instant::now();
    for _ in 0..args.ticks {
        drive_bodies(&mut env, config, &mut rng)?;
        env.run_behaviour();
        if args.realtime {
            std::thread::sleep(env.time_manager().simulation_delay());
        }
    }
    let elapsed = start.elapsed();

    Ok(RunSummary {
        world: format!("{:?}", args.world).to_lowercase(),
        seed: config.seed,
        ticks: args.ticks,
        cancelled_motions: env.cancelled_motions(),
        elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        state: env.snapshot(),
    })
}

/// Give every body a random kinematic or steering influence
fn drive_bodies<M: WorldModel>(
    env: &mut Environment<M>,
    config: &EnvironmentConfig,
    rng: &mut ChaCha8Rng,
) -> situated_env::core::Result<()> {
    let body = &config.body;
    for id in env.body_ids() {
        let heading = rng.gen_range(0.0..std::f32::consts::TAU);
        let direction = Vector2::new(heading.cos(), heading.sin());
        let influence = if rng.gen_bool(0.5) {
            MotionInfluence::kinematic(
                direction * rng.gen_range(0.0..=body.max_linear_speed),
                rng.gen_range(-body.max_angular_speed..=body.max_angular_speed),
            )
        } else {
            MotionInfluence::steering(
                direction * rng.gen_range(0.0..=body.max_linear_acceleration),
                rng.gen_range(-body.max_angular_acceleration..=body.max_angular_acceleration),
            )
        };
        env.influence(id, influence.into())?;
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("Situated Environment Run");
    println!("========================");
    println!("World: {} ({}x{})", summary.world, summary.state.width, summary.state.height);
    println!("Seed: {}", summary.seed);
    println!("Ticks: {} ({:.1}s simulated)", summary.ticks, summary.state.time);
    println!("Cancelled motions: {}", summary.cancelled_motions);
    println!("Elapsed: {:.2}ms", summary.elapsed_ms);
    println!();
    println!("--- Bodies ---");
    for body in &summary.state.bodies {
        println!(
            "{:<12} ({:>7.2}, {:>7.2}) angle {:>6.3} speed {:>5.2}",
            body.name.as_deref().unwrap_or("?"),
            body.position.x,
            body.position.y,
            body.angle,
            body.linear_motion.length(),
        );
    }
}
