use approx::assert_relative_eq;
use nalgebra::{Point2, Vector2};

use crate::config::{IntegratorKind, SimulationConfig};
use crate::integrator::{ConstantAcceleration, Integrator, SemiImplicitEuler, integrate};
use crate::particle::Particle;
use crate::store::ParticleStore;

fn pushed(force: Vector2<f64>) -> Particle {
    let mut p = Particle::at_rest(100.0, 100.0, 2.0);
    p.force = force;
    p
}

#[test]
fn test_euler_displacement_from_rest() {
    let mut p = pushed(Vector2::new(3.0, -1.0));
    let a = p.force / p.mass;
    let dt = 0.1;

    SemiImplicitEuler.advance(&mut p, dt);

    assert_relative_eq!(p.velocity.x, a.x * dt, epsilon = 1e-15);
    assert_relative_eq!(p.position.x - 100.0, a.x * dt * dt, epsilon = 1e-12);
    assert_relative_eq!(p.position.y - 100.0, a.y * dt * dt, epsilon = 1e-12);
}

#[test]
fn test_constant_acceleration_displacement_from_rest() {
    let mut p = pushed(Vector2::new(3.0, 0.0));
    let a = p.force.x / p.mass;
    let dt = 0.1;

    ConstantAcceleration.advance(&mut p, dt);

    assert_relative_eq!(p.velocity.x, a * dt, epsilon = 1e-15);
    assert_relative_eq!(p.position.x - 100.0, 0.5 * a * dt * dt, epsilon = 1e-12);
}

#[test]
fn test_force_cleared_after_step() {
    for kind in [IntegratorKind::SemiImplicitEuler, IntegratorKind::ConstantAcceleration] {
        let mut p = pushed(Vector2::new(1.0, 1.0));
        kind.integrator().advance(&mut p, 0.016);
        assert_eq!(p.force, Vector2::zeros());
    }
}

#[test]
fn test_free_particle_drifts() {
    let mut p = Particle::new(Point2::new(10.0, 20.0), 1.0, Vector2::new(2.0, -4.0));
    ConstantAcceleration.advance(&mut p, 0.5);

    assert_eq!(p.position, Point2::new(11.0, 18.0));
    assert_eq!(p.velocity, Vector2::new(2.0, -4.0));
}

#[test]
fn test_integrate_removes_escaped_particles() {
    let config = SimulationConfig {
        width: 100.0,
        height: 100.0,
        ..SimulationConfig::default()
    };
    let mut store = ParticleStore::new();
    store.add(Particle::new(Point2::new(50.0, 50.0), 1.0, Vector2::new(1.0, 0.0)));
    store.add(Particle::new(Point2::new(99.5, 50.0), 1.0, Vector2::new(10.0, 0.0)));
    store.add(Particle::new(Point2::new(0.5, 0.5), 1.0, Vector2::new(0.0, -10.0)));

    let removed = integrate(&mut store, &SemiImplicitEuler, 1.0, &config);

    assert_eq!(removed, 2);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(0).map(|p| p.position.x), Some(51.0));
}
