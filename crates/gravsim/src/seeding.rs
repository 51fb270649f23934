//! Deterministic particle generators.
//!
//! Both generators draw from a caller-supplied RNG, so a seeded
//! `ChaChaRng` reproduces the same population on every platform.

use std::f64::consts::TAU;

use nalgebra::{Point2, Vector2};
use rand::Rng;

use crate::config::SimulationConfig;
use crate::particle::Particle;

/// `count` particles at rest, uniformly distributed over the simulated area
/// and kept one radius clear of its edges.
///
/// # Examples
///
/// ```
/// use gravsim::config::SimulationConfig;
/// use gravsim::seeding::uniform;
/// use rand::SeedableRng;
/// use rand_chacha::ChaChaRng;
///
/// let config = SimulationConfig::default();
/// let mut rng = ChaChaRng::seed_from_u64(42);
/// let particles = uniform(&mut rng, 100, &config);
///
/// assert_eq!(particles.len(), 100);
/// assert!(particles.iter().all(|p| config.in_bounds(p.position.x, p.position.y)));
/// ```
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, count: usize, config: &SimulationConfig) -> Vec<Particle> {
    let r = config.particle_radius;
    let x_range = span(r, config.width);
    let y_range = span(r, config.height);

    (0..count)
        .map(|_| {
            let x = rng.random_range(x_range.0..x_range.1);
            let y = rng.random_range(y_range.0..y_range.1);
            Particle::at_rest(x, y, r)
        })
        .collect()
}

/// `[margin, extent - margin)`, collapsing to the whole extent when the
/// margin does not fit.
fn span(margin: f64, extent: f64) -> (f64, f64) {
    if extent > 2.0 * margin {
        (margin, extent - margin)
    } else {
        (0.0, extent)
    }
}

/// `count` particles scattered uniformly over a disk of radius `spread`
/// around `center`, all sharing `velocity`.
///
/// A zero spread stacks every particle on `center`; the quadtree merges such
/// coincident bodies into one leaf.
pub fn cluster<R: Rng + ?Sized>(
    rng: &mut R,
    center: Point2<f64>,
    count: usize,
    radius: f64,
    spread: f64,
    velocity: Vector2<f64>,
) -> Vec<Particle> {
    (0..count)
        .map(|_| {
            let offset = if spread > 0.0 {
                let angle = rng.random_range(0.0..TAU);
                let distance = spread * rng.random::<f64>().sqrt();
                Vector2::new(angle.cos(), angle.sin()) * distance
            } else {
                Vector2::zeros()
            };
            Particle::new(center + offset, radius, velocity)
        })
        .collect()
}
