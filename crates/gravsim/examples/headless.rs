//! Headless frame loop
//!
//! Seeds a uniform population, optionally spawns a moving cluster, and runs a
//! fixed number of frames while printing per-phase timings.
//!
//! Run with: cargo run --release --package gravsim --example headless -- -n 20000 --frames 120
//!
//! A YAML file with any subset of `SimulationConfig` fields can be passed with
//! `--config`; omitted fields keep their defaults. Set `RUST_LOG=debug` for a
//! log line per frame.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use gravsim::{Simulation, SimulationConfig};
use nalgebra::{Point2, Vector2};

#[derive(Parser, Debug)]
struct Args {
    /// YAML simulation config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Particles seeded uniformly before the first frame
    #[arg(short = 'n', long, default_value_t = 10_000)]
    particles: usize,

    /// Particles in a cluster spawned at the centre, moving right
    #[arg(long, default_value_t = 0)]
    cluster: usize,

    #[arg(long, default_value_t = 60)]
    frames: u64,

    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Overrides `worker_threads` from the config
    #[arg(short, long)]
    threads: Option<usize>,
}

fn load_config(path: Option<&PathBuf>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let config = serde_yaml::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = load_config(args.config.as_ref())?;
    if args.threads.is_some() {
        config.worker_threads = args.threads;
    }

    let mut sim = Simulation::with_seed(config, args.seed)?;
    sim.seed_uniform(args.particles);
    if args.cluster > 0 {
        let c = sim.config();
        let center = Point2::new(c.width * 0.5, c.height * 0.5);
        let spread = c.particle_radius * (args.cluster as f64).sqrt() * 2.0;
        sim.spawn_cluster(center, args.cluster, spread, Vector2::new(5.0, 0.0));
    }

    println!("gravsim headless: {} particles, {} frames", sim.store().len(), args.frames);
    println!("{}", "=".repeat(72));
    println!(
        "{:>6} {:>8} {:>8} {:>8} {:>9} {:>9} {:>9} {:>9}",
        "frame", "live", "nodes", "contacts", "build", "forces", "collide", "total"
    );

    let mut elapsed = Duration::ZERO;
    for _ in 0..args.frames {
        let stats = sim.step(args.dt)?;
        let t = stats.timings;
        elapsed += t.total();

        if stats.frame % 10 == 0 {
            println!(
                "{:>6} {:>8} {:>8} {:>8} {:>9.2?} {:>9.2?} {:>9.2?} {:>9.2?}",
                stats.frame,
                stats.particles_after,
                stats.tree_nodes,
                stats.contacts_resolved,
                t.force_build,
                t.force_evaluate,
                t.collision_rebuild + t.collision_resolve,
                t.total(),
            );
        }
    }

    println!("{}", "=".repeat(72));
    println!(
        "{} frames in {:.2?} ({:.1} frames/s), {} particles left",
        args.frames,
        elapsed,
        args.frames as f64 / elapsed.as_secs_f64().max(1e-9),
        sim.store().len()
    );
    Ok(())
}
