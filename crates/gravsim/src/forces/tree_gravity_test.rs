use approx::assert_relative_eq;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

use crate::forces::{ForceModel, GravityParams, TreeGravity, brute_force_gravity};
use crate::particle::Particle;

fn random_particles(count: usize, extent: f64, seed: u64) -> Vec<Particle> {
    let mut rng = ChaChaRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            Particle::at_rest(
                rng.random_range(0.0..extent),
                rng.random_range(0.0..extent),
                rng.random_range(1.0..3.0),
            )
        })
        .collect()
}

fn relative_error(approx: &[Particle], exact: &[Particle]) -> f64 {
    approx
        .iter()
        .zip(exact)
        .map(|(a, e)| {
            let scale = e.force.magnitude().max(1e-12);
            (a.force - e.force).magnitude() / scale
        })
        .fold(0.0, f64::max)
}

#[test]
fn test_tree_matches_brute_force_at_zero_theta() {
    let params = GravityParams {
        theta: 0.0,
        ..GravityParams::default()
    };
    let mut tree_forces = random_particles(300, 1000.0, 7);
    let mut exact = tree_forces.clone();

    let mut gravity = TreeGravity::new(1000.0, 32);
    gravity.accumulate(&mut tree_forces, &params, 4).unwrap();
    brute_force_gravity(&mut exact, &params, 4);

    assert!(relative_error(&tree_forces, &exact) < 1e-9);
}

#[test]
fn test_tree_matches_brute_force_at_zero_theta_when_dense() {
    // Many branch centers land within the minimum separation of a particle
    let params = GravityParams {
        theta: 0.0,
        ..GravityParams::default()
    };
    let mut tree_forces = random_particles(2000, 500.0, 13);
    let mut exact = tree_forces.clone();

    let mut gravity = TreeGravity::new(1000.0, 32);
    gravity.accumulate(&mut tree_forces, &params, 4).unwrap();
    brute_force_gravity(&mut exact, &params, 4);

    let scale = exact.iter().map(|p| p.force.magnitude()).sum::<f64>() / exact.len() as f64;
    let worst = tree_forces
        .iter()
        .zip(&exact)
        .map(|(t, e)| (t.force - e.force).magnitude())
        .fold(0.0, f64::max);
    assert!(worst < 1e-9 * scale, "worst deviation {worst}, mean force {scale}");
}

#[test]
fn test_tree_close_to_brute_force_at_default_theta() {
    let params = GravityParams::default();
    let mut tree_forces = random_particles(500, 1000.0, 11);
    let mut exact = tree_forces.clone();

    let mut gravity = TreeGravity::new(1000.0, 32);
    gravity.accumulate(&mut tree_forces, &params, 4).unwrap();
    brute_force_gravity(&mut exact, &params, 4);

    let total_exact: f64 = exact.iter().map(|p| p.force.magnitude()).sum();
    let total_error: f64 = tree_forces
        .iter()
        .zip(&exact)
        .map(|(a, e)| (a.force - e.force).magnitude())
        .sum();
    assert!(total_error / total_exact < 0.05);
}

#[test]
fn test_tree_reused_across_frames() {
    let params = GravityParams::default();
    let mut gravity = TreeGravity::new(1000.0, 32);

    let mut first = random_particles(200, 1000.0, 3);
    gravity.accumulate(&mut first, &params, 2).unwrap();

    let mut second = random_particles(50, 1000.0, 4);
    let report = gravity.accumulate(&mut second, &params, 2).unwrap();

    let expected: f64 = second.iter().map(|p| p.mass).sum();
    assert_relative_eq!(gravity.tree().total_mass(), expected, epsilon = 1e-9);
    assert_eq!(report.tree_nodes, gravity.tree().node_count());
}

#[test]
fn test_tree_rejects_out_of_root_particles() {
    let mut particles = vec![
        Particle::at_rest(10.0, 10.0, 1.0),
        Particle::at_rest(1500.0, 10.0, 1.0),
    ];
    let mut gravity = TreeGravity::new(1000.0, 32);
    let result = gravity.accumulate(&mut particles, &GravityParams::default(), 1);

    assert!(result.is_err());
    assert_eq!(particles[0].force.magnitude(), 0.0);
}
