use approx::assert_relative_eq;
use nalgebra::Vector2;

use crate::forces::{ForceModel, GravityParams, GridGravity, pairwise_force};
use crate::particle::Particle;

#[test]
fn test_neighbours_attract() {
    let mut particles = vec![
        Particle::at_rest(50.0, 50.0, 2.0),
        Particle::at_rest(150.0, 50.0, 2.0),
    ];
    let expected = pairwise_force(&GravityParams::default(), &particles[0], &particles[1]);

    let mut gravity = GridGravity::new(1000.0, 1000.0, 100.0);
    gravity
        .accumulate(&mut particles, &GravityParams::default(), 2)
        .unwrap();

    assert_relative_eq!(particles[0].force.x, expected.x, epsilon = 1e-12);
    assert_relative_eq!(particles[1].force.x, -expected.x, epsilon = 1e-12);
}

#[test]
fn test_distant_cells_ignored() {
    // Two cells apart: outside each other's 3x3 neighbourhood
    let mut particles = vec![
        Particle::at_rest(50.0, 50.0, 2.0),
        Particle::at_rest(250.0, 50.0, 2.0),
    ];
    let mut gravity = GridGravity::new(1000.0, 1000.0, 100.0);
    gravity
        .accumulate(&mut particles, &GravityParams::default(), 1)
        .unwrap();

    assert_eq!(particles[0].force, Vector2::zeros());
    assert_eq!(particles[1].force, Vector2::zeros());
}

#[test]
fn test_outside_grid_feels_nothing() {
    let mut particles = vec![
        Particle::at_rest(50.0, 50.0, 2.0),
        Particle::at_rest(-20.0, 50.0, 2.0),
    ];
    let mut gravity = GridGravity::new(1000.0, 1000.0, 100.0);
    gravity
        .accumulate(&mut particles, &GravityParams::default(), 1)
        .unwrap();

    assert_eq!(particles[1].force, Vector2::zeros());
    assert_eq!(particles[0].force, Vector2::zeros());
}
