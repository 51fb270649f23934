//! Time integration.
//!
//! Each frame computes forces once, then an integrator turns the accumulated
//! force into a velocity and position update and clears the accumulator for
//! the next frame.

use nalgebra::Vector2;

use crate::config::{IntegratorKind, SimulationConfig};
use crate::particle::Particle;
use crate::store::ParticleStore;

/// Advances a particle by one step using the force accumulated this frame.
///
/// Forces are evaluated once per frame before integration; an integrator
/// never asks for them again mid-step.
pub trait Integrator: Send + Sync {
    /// Advance one particle by one timestep
    ///
    /// Updates velocity and position from `particle.force`, then clears the
    /// accumulator for the next frame.
    ///
    /// # Arguments
    ///
    /// * `particle` - Particle to move (modified in place)
    /// * `dt` - Timestep in simulation time units
    fn advance(&self, particle: &mut Particle, dt: f64);

    /// Advance every particle by one timestep
    ///
    /// Default implementation calls [`Integrator::advance`] on each particle
    /// in store order.
    ///
    /// # Arguments
    ///
    /// * `particles` - Particles to move (modified in place)
    /// * `dt` - Timestep in simulation time units
    fn step(&self, particles: &mut [Particle], dt: f64) {
        for particle in particles {
            self.advance(particle, dt);
        }
    }
}

/// Semi-implicit (symplectic) Euler.
///
/// 1. v ← v + (F/m)·dt
/// 2. x ← x + v·dt
///
/// The position update uses the new velocity, so a body starting at rest
/// moves `a·dt²` in its first step.
///
/// # Examples
///
/// ```
/// use gravsim::integrator::{Integrator, SemiImplicitEuler};
/// use gravsim::particle::Particle;
/// use nalgebra::Vector2;
///
/// let mut p = Particle::at_rest(10.0, 10.0, 1.0);
/// p.force = Vector2::new(p.mass, 0.0); // a = 1
///
/// SemiImplicitEuler.advance(&mut p, 0.5);
///
/// assert_eq!(p.velocity.x, 0.5);
/// assert_eq!(p.position.x, 10.25);
/// assert_eq!(p.force, Vector2::zeros());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SemiImplicitEuler;

impl Integrator for SemiImplicitEuler {
    fn advance(&self, particle: &mut Particle, dt: f64) {
        particle.velocity += acceleration(particle) * dt;
        particle.position += particle.velocity * dt;
        particle.force = Vector2::zeros();
    }
}

/// Euler step with a trapezoidal drift.
///
/// 1. v ← v + a·dt/2
/// 2. x ← x + v·dt
/// 3. v ← v + a·dt/2
///
/// Both half steps use the same force, the one accumulated before
/// integration. The force is not re-evaluated at the new position, so this is
/// not a leapfrog scheme. It ends at the same velocity as
/// [`SemiImplicitEuler`] but moves a body from rest by `½·a·dt²`, the exact
/// displacement under constant acceleration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantAcceleration;

impl Integrator for ConstantAcceleration {
    fn advance(&self, particle: &mut Particle, dt: f64) {
        let half_kick = acceleration(particle) * (dt * 0.5);
        particle.velocity += half_kick;
        particle.position += particle.velocity * dt;
        particle.velocity += half_kick;
        particle.force = Vector2::zeros();
    }
}

fn acceleration(particle: &Particle) -> Vector2<f64> {
    if particle.mass > 0.0 {
        particle.force / particle.mass
    } else {
        Vector2::zeros()
    }
}

impl IntegratorKind {
    pub fn integrator(self) -> &'static dyn Integrator {
        match self {
            IntegratorKind::SemiImplicitEuler => &SemiImplicitEuler,
            IntegratorKind::ConstantAcceleration => &ConstantAcceleration,
        }
    }
}

/// Advances the whole store and drops every particle that ended up outside
/// the simulated area. Returns the number removed.
pub fn integrate(
    store: &mut ParticleStore,
    integrator: &dyn Integrator,
    dt: f64,
    config: &SimulationConfig,
) -> usize {
    integrator.step(store.as_mut_slice(), dt);
    store.retain_in_bounds(config)
}
