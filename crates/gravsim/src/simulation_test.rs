use nalgebra::{Point2, Vector2};

use crate::config::{ForceMethod, SimulationConfig};
use crate::error::SimError;
use crate::particle::Particle;
use crate::simulation::Simulation;

fn small_config() -> SimulationConfig {
    SimulationConfig {
        width: 400.0,
        height: 300.0,
        worker_threads: Some(2),
        ..SimulationConfig::default()
    }
}

#[test]
fn test_invalid_config_rejected() {
    let config = SimulationConfig {
        theta: -1.0,
        ..SimulationConfig::default()
    };
    match Simulation::with_seed(config, 0) {
        Err(SimError::InvalidConfig { field, .. }) => assert_eq!(field, "theta"),
        other => panic!("expected InvalidConfig, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_paused_step_changes_nothing() {
    let mut sim = Simulation::with_seed(small_config(), 1).unwrap();
    sim.seed_uniform(20);
    let before = sim.particles().to_vec();

    sim.set_paused(true);
    let stats = sim.step(0.1).unwrap();

    assert!(stats.paused);
    assert_eq!(sim.frame(), 0);
    assert_eq!(sim.particles(), &before[..]);

    assert!(!sim.toggle_pause());
    sim.step(0.1).unwrap();
    assert_eq!(sim.frame(), 1);
}

#[test]
fn test_out_of_bounds_particle_dropped_next_frame() {
    let mut sim = Simulation::with_seed(small_config(), 2).unwrap();
    sim.add_particle(Particle::at_rest(100.0, 100.0, 2.0));
    sim.add_particle(Particle::at_rest(500.0, 100.0, 2.0));

    let stats = sim.step(0.01).unwrap();

    assert_eq!(stats.particles_before, 2);
    assert_eq!(stats.removed, 1);
    assert_eq!(sim.store().len(), 1);
}

#[test]
fn test_spawn_cluster_and_clear() {
    let mut sim = Simulation::with_seed(small_config(), 3).unwrap();
    sim.seed_uniform(10);
    let range = sim.spawn_cluster(Point2::new(200.0, 150.0), 25, 30.0, Vector2::new(1.0, 0.0));

    assert_eq!(range, 10..35);
    assert!(sim.particles()[range].iter().all(|p| p.velocity.x == 1.0));

    sim.clear();
    assert!(sim.store().is_empty());
    assert_eq!(sim.step(0.01).unwrap().particles_after, 0);
}

#[test]
fn test_stacked_spawn_survives_a_frame() {
    let mut sim = Simulation::with_seed(small_config(), 4).unwrap();
    sim.spawn_cluster(Point2::new(200.0, 150.0), 8, 0.0, Vector2::zeros());

    let stats = sim.step(0.01).unwrap();

    assert_eq!(stats.particles_after, 8);
    assert!(sim.particles().iter().all(|p| p.is_finite()));
    let tree = sim.tree().unwrap();
    assert_eq!(tree.leaves().count(), 1);
}

#[test]
fn test_every_backend_runs() {
    for method in [ForceMethod::BarnesHut, ForceMethod::Direct, ForceMethod::Grid] {
        let config = SimulationConfig {
            force_method: method,
            ..small_config()
        };
        let mut sim = Simulation::with_seed(config, 5).unwrap();
        sim.seed_uniform(200);

        for _ in 0..3 {
            sim.step(0.016).unwrap();
        }
        assert!(sim.particles().iter().all(|p| p.is_finite()), "{method:?}");
        assert_eq!(sim.tree().is_some(), method == ForceMethod::BarnesHut);
    }
}

#[test]
fn test_gravity_pulls_pair_together() {
    let mut sim = Simulation::with_seed(small_config(), 6).unwrap();
    sim.add_particle(Particle::at_rest(150.0, 150.0, 2.0));
    sim.add_particle(Particle::at_rest(250.0, 150.0, 2.0));

    sim.step(1.0).unwrap();

    let p = sim.particles();
    assert!(p[0].velocity.x > 0.0);
    assert!(p[1].velocity.x < 0.0);
    assert!(p[1].position.x - p[0].position.x < 100.0);
}

#[test]
fn test_zero_gravity_leaves_rest_particles_alone() {
    let config = SimulationConfig {
        gravitational_constant: 0.0,
        ..small_config()
    };
    let mut sim = Simulation::with_seed(config, 7).unwrap();
    sim.add_particle(Particle::at_rest(150.0, 150.0, 2.0));
    sim.add_particle(Particle::at_rest(250.0, 150.0, 2.0));

    let stats = sim.step(1.0).unwrap();

    assert_eq!(stats.tree_nodes, 0);
    assert_eq!(sim.particles()[0].position, Point2::new(150.0, 150.0));
}
