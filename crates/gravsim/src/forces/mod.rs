//! Gravity backends.
//!
//! Every backend adds the softened pull
//!
//! ```text
//!            G · m₁ · m₂
//!     F = -----------------   along the unit displacement
//!          d² + softening
//! ```
//!
//! to each particle's force accumulator. They differ only in which pairs are
//! summed exactly:
//!
//! - [`DirectGravity`]: every ordered pair, O(n²); the correctness oracle
//! - [`TreeGravity`]: Barnes-Hut quadtree, O(n log n)
//! - [`GridGravity`]: exact pairs within neighbouring coarse grid cells only

use std::time::Duration;

use nalgebra::Vector2;

use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::particle::Particle;

pub mod grid_gravity;
pub mod gravity;
pub mod tree_gravity;

#[cfg(test)]
mod grid_gravity_test;
#[cfg(test)]
mod gravity_test;
#[cfg(test)]
mod tree_gravity_test;

pub use grid_gravity::GridGravity;
pub use gravity::{DirectGravity, brute_force_gravity, potential_energy};
pub use tree_gravity::TreeGravity;

/// Constants of the force law and the approximation policy.
///
/// θ, softening, the minimum separation and the low-mass skip are independent
/// knobs; none of them is implied by another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityParams {
    pub gravitational_constant: f64,
    pub softening: f64,
    pub theta: f64,
    /// Interactions closer than this are skipped entirely
    pub min_separation: f64,
    /// Tree nodes lighter than this are skipped
    pub low_mass_cutoff: f64,
}

impl From<&SimulationConfig> for GravityParams {
    fn from(config: &SimulationConfig) -> Self {
        GravityParams {
            gravitational_constant: config.gravitational_constant,
            softening: config.softening,
            theta: config.theta,
            min_separation: config.min_separation,
            low_mass_cutoff: config.low_mass_cutoff,
        }
    }
}

impl Default for GravityParams {
    fn default() -> Self {
        Self::from(&SimulationConfig::default())
    }
}

/// Force on a body of mass `m1` from a point mass `m2` sitting at
/// `displacement` from it (`distance` is its magnitude).
///
/// Returns zero for a zero distance rather than dividing by it.
#[inline]
pub fn softened_force(
    params: &GravityParams,
    m1: f64,
    m2: f64,
    displacement: Vector2<f64>,
    distance: f64,
) -> Vector2<f64> {
    if distance <= 0.0 {
        return Vector2::zeros();
    }
    let magnitude = params.gravitational_constant * m1 * m2
        / (distance * distance + params.softening);
    displacement * (magnitude / distance)
}

/// Force on `a` from `b`, honouring the minimum-separation floor.
///
/// # Examples
///
/// ```
/// use gravsim::forces::{GravityParams, pairwise_force};
/// use gravsim::particle::Particle;
///
/// let a = Particle::at_rest(0.0, 0.0, 1.0);
/// let b = Particle::at_rest(100.0, 0.0, 1.0);
/// let f = pairwise_force(&GravityParams::default(), &a, &b);
///
/// assert!(f.x > 0.0);
/// assert_eq!(f.y, 0.0);
/// ```
pub fn pairwise_force(params: &GravityParams, a: &Particle, b: &Particle) -> Vector2<f64> {
    let displacement = b.position - a.position;
    let distance = displacement.magnitude();
    if distance < params.min_separation {
        return Vector2::zeros();
    }
    softened_force(params, a.mass, b.mass, displacement, distance)
}

/// What a backend did during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForceReport {
    /// Spatial structure build time (tree insert + aggregation, grid fill)
    pub build: Duration,
    /// Force evaluation time
    pub evaluate: Duration,
    /// Quadtree nodes in use; zero for backends without a tree
    pub tree_nodes: usize,
    pub deferred_inserts: usize,
    pub pool_growths: usize,
}

/// A source of force on the particles of one frame.
///
/// Backends own whatever spatial structure they need and rebuild it on every
/// call, so one instance is reused across frames.
pub trait ForceModel: Send {
    /// Add this model's pull to every particle's force accumulator
    ///
    /// Existing accumulator contents are kept; the model only adds to them.
    ///
    /// # Arguments
    ///
    /// * `particles` - This frame's particles; forces are added in place
    /// * `params` - Force law constants and approximation policy
    /// * `threads` - Number of workers to split the evaluation over
    ///
    /// # Returns
    ///
    /// Build and evaluation timings plus structure statistics
    ///
    /// # Errors
    ///
    /// [`SimError::BoundaryViolation`] from the tree backend when a particle
    /// lies outside its root. No force is added in that case.
    fn accumulate(
        &mut self,
        particles: &mut [Particle],
        params: &GravityParams,
        threads: usize,
    ) -> Result<ForceReport, SimError>;
}
