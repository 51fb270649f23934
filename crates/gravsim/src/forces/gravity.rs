//! Direct N-body gravity (O(N²) implementation)

use std::time::Instant;

use nalgebra::{Point2, Vector2};
use rayon::prelude::*;

use crate::error::SimError;
use crate::forces::{ForceModel, ForceReport, GravityParams, pairwise_force};
use crate::particle::Particle;

/// Exact pairwise gravity.
///
/// Best for:
/// - Small populations
/// - Validating [`TreeGravity`](crate::forces::TreeGravity) and
///   [`GridGravity`](crate::forces::GridGravity)
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectGravity;

impl ForceModel for DirectGravity {
    fn accumulate(
        &mut self,
        particles: &mut [Particle],
        params: &GravityParams,
        threads: usize,
    ) -> Result<ForceReport, SimError> {
        let start = Instant::now();
        brute_force_gravity(particles, params, threads);
        Ok(ForceReport {
            evaluate: start.elapsed(),
            ..Default::default()
        })
    }
}

/// Adds the exact force from every other particle to each particle, applying
/// the force law to every ordered pair.
///
/// Each worker owns a contiguous block of particles and writes only their
/// accumulators; sources are read from a snapshot taken up front.
///
/// # Examples
///
/// ```
/// use gravsim::forces::{GravityParams, brute_force_gravity};
/// use gravsim::particle::Particle;
///
/// let mut particles = vec![
///     Particle::at_rest(0.0, 0.0, 1.0),
///     Particle::at_rest(50.0, 0.0, 1.0),
/// ];
/// brute_force_gravity(&mut particles, &GravityParams::default(), 1);
///
/// // Newton's third law
/// let net = particles[0].force + particles[1].force;
/// assert!(net.magnitude() < 1e-12);
/// ```
pub fn brute_force_gravity(particles: &mut [Particle], params: &GravityParams, threads: usize) {
    if particles.len() < 2 {
        return;
    }
    let sources: Vec<Particle> = particles.to_vec();
    let chunk = particles.len().div_ceil(threads.clamp(1, particles.len()));

    particles
        .par_chunks_mut(chunk)
        .enumerate()
        .for_each(|(c, block)| {
            let offset = c * chunk;
            for (i, particle) in block.iter_mut().enumerate() {
                let index = offset + i;
                let force = sources
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != index)
                    .map(|(_, other)| pairwise_force(params, particle, other))
                    .fold(Vector2::zeros(), |acc, f| acc + f);
                particle.force += force;
            }
        });
}

/// Total softened gravitational potential energy, each pair counted once.
///
/// Uses `-G·m₁·m₂ / sqrt(d² + softening)`, the potential matching the force
/// law up to the softening term. Diagnostic only.
pub fn potential_energy(particles: &[Particle], params: &GravityParams) -> f64 {
    particles
        .iter()
        .enumerate()
        .flat_map(|(i, a)| {
            particles[i + 1..].iter().map(move |b| {
                let r = separation(a.position, b.position);
                -params.gravitational_constant * a.mass * b.mass
                    / (r * r + params.softening).sqrt()
            })
        })
        .sum()
}

fn separation(a: Point2<f64>, b: Point2<f64>) -> f64 {
    (a - b).magnitude()
}
