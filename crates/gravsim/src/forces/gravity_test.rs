use approx::assert_relative_eq;
use nalgebra::{Point2, Vector2};

use crate::forces::{
    DirectGravity, ForceModel, GravityParams, brute_force_gravity, pairwise_force,
    potential_energy, softened_force,
};
use crate::particle::Particle;

#[test]
fn test_softened_force_magnitude() {
    let params = GravityParams::default();
    let f = softened_force(&params, 2.0, 3.0, Vector2::new(10.0, 0.0), 10.0);

    let expected = 0.8 * 2.0 * 3.0 / (100.0 + 0.5);
    assert_relative_eq!(f.x, expected, epsilon = 1e-12);
    assert_eq!(f.y, 0.0);
}

#[test]
fn test_softened_force_zero_distance() {
    let params = GravityParams::default();
    let f = softened_force(&params, 1.0, 1.0, Vector2::zeros(), 0.0);
    assert_eq!(f, Vector2::zeros());
}

#[test]
fn test_pairwise_force_below_min_separation_is_skipped() {
    let params = GravityParams {
        min_separation: 10.0,
        ..GravityParams::default()
    };
    let a = Particle::at_rest(0.0, 0.0, 1.0);
    let near = Particle::at_rest(9.9, 0.0, 1.0);
    let far = Particle::at_rest(10.0, 0.0, 1.0);

    assert_eq!(pairwise_force(&params, &a, &near), Vector2::zeros());
    assert!(pairwise_force(&params, &a, &far).x > 0.0);
}

#[test]
fn test_brute_force_third_law() {
    let mut particles = vec![
        Particle::at_rest(10.0, 10.0, 2.0),
        Particle::at_rest(60.0, 30.0, 3.0),
        Particle::at_rest(200.0, 90.0, 1.0),
        Particle::at_rest(120.0, 400.0, 2.5),
    ];
    brute_force_gravity(&mut particles, &GravityParams::default(), 2);

    let net: Vector2<f64> = particles.iter().map(|p| p.force).sum();
    let scale = particles[0].force.magnitude();
    assert!(net.magnitude() < 1e-10 * scale);
}

#[test]
fn test_brute_force_threads_agree() {
    let mut one: Vec<Particle> = (0..37)
        .map(|i| Particle::at_rest(13.0 * i as f64 % 500.0, 7.0 * i as f64 + 5.0, 2.0))
        .collect();
    let mut many = one.clone();

    let params = GravityParams::default();
    brute_force_gravity(&mut one, &params, 1);
    brute_force_gravity(&mut many, &params, 5);

    for (a, b) in one.iter().zip(&many) {
        assert_relative_eq!(a.force.x, b.force.x, epsilon = 1e-12);
        assert_relative_eq!(a.force.y, b.force.y, epsilon = 1e-12);
    }
}

#[test]
fn test_brute_force_adds_to_existing_force() {
    let mut particles = vec![
        Particle::at_rest(0.0, 0.0, 1.0),
        Particle::at_rest(100.0, 0.0, 1.0),
    ];
    particles[0].force = Vector2::new(0.0, 5.0);
    brute_force_gravity(&mut particles, &GravityParams::default(), 1);

    assert_eq!(particles[0].force.y, 5.0);
    assert!(particles[0].force.x > 0.0);
}

#[test]
fn test_single_particle_feels_nothing() {
    let mut particles = vec![Particle::at_rest(50.0, 50.0, 2.0)];
    let report = DirectGravity
        .accumulate(&mut particles, &GravityParams::default(), 4)
        .unwrap();

    assert_eq!(particles[0].force, Vector2::zeros());
    assert_eq!(report.tree_nodes, 0);
}

#[test]
fn test_potential_energy_negative_and_symmetric() {
    let params = GravityParams::default();
    let a = Particle::new(Point2::new(0.0, 0.0), 2.0, Vector2::zeros());
    let b = Particle::new(Point2::new(30.0, 40.0), 1.0, Vector2::zeros());

    let forward = potential_energy(&[a, b], &params);
    let backward = potential_energy(&[b, a], &params);

    assert!(forward < 0.0);
    assert_relative_eq!(forward, backward);
    assert_relative_eq!(
        forward,
        -0.8 * a.mass * b.mass / (2500.0_f64 + 0.5).sqrt(),
        epsilon = 1e-12
    );
}
