//! Barnes-Hut accuracy against the brute-force oracle
//!
//! Builds one tree over a random population and compares its forces with the
//! exact O(n²) sum for a range of opening thresholds.
//!
//! Run with: cargo run --release --package gravsim --example oracle -- -n 5000

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use gravsim::forces::{GravityParams, brute_force_gravity};
use gravsim::seeding;
use gravsim::tree::QuadTree;
use gravsim::{Particle, SimulationConfig};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long, default_value_t = 2_000)]
    particles: usize,

    #[arg(long, default_value_t = 7)]
    seed: u64,

    #[arg(short, long, default_value_t = 4)]
    threads: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = SimulationConfig::default();
    let mut rng = ChaChaRng::seed_from_u64(args.seed);
    let particles = seeding::uniform(&mut rng, args.particles, &config);

    let base = GravityParams::from(&config);
    let mut exact = particles.clone();
    let start = Instant::now();
    brute_force_gravity(&mut exact, &base, args.threads);
    let brute_time = start.elapsed();

    let mut tree = QuadTree::new(config.root_size(), config.max_tree_depth);
    let start = Instant::now();
    let report = tree.build(&particles, args.threads)?;
    println!(
        "{} particles, {} nodes, built in {:.2?} (brute force: {:.2?})",
        report.inserted,
        tree.node_count(),
        start.elapsed(),
        brute_time
    );
    println!("{}", "=".repeat(60));
    println!("{:>6} {:>12} {:>12} {:>10} {:>12}", "θ", "mean err", "max err", "visits", "time");

    for theta in [0.0, 0.25, 0.5, 0.75, 1.0, 1.5] {
        let params = GravityParams { theta, ..base };
        let mut approx: Vec<Particle> = particles.clone();

        let start = Instant::now();
        tree.accumulate_forces(&mut approx, &params, args.threads);
        let time = start.elapsed();

        let visits: usize = particles
            .iter()
            .enumerate()
            .map(|(i, p)| tree.probe(i, p, &params).visits)
            .sum();

        let (mut sum, mut max) = (0.0_f64, 0.0_f64);
        for (a, e) in approx.iter().zip(&exact) {
            let err = (a.force - e.force).magnitude() / e.force.magnitude().max(1e-12);
            sum += err;
            max = max.max(err);
        }

        println!(
            "{:>6.2} {:>12.3e} {:>12.3e} {:>10} {:>12.2?}",
            theta,
            sum / particles.len().max(1) as f64,
            max,
            visits / particles.len().max(1),
            time
        );
    }
    Ok(())
}
