//! Real-time 2D particle simulation core.
//!
//! Long-range gravity is approximated with a Barnes-Hut quadtree, short-range
//! contacts are found on a uniform grid, and a simple integrator advances the
//! particles once per frame. [`simulation::Simulation`] ties the pieces
//! together; the individual components are usable on their own.

pub mod collisions;
pub mod config;
pub mod error;
pub mod forces;
pub mod grid;
pub mod integrator;
pub mod particle;
pub mod seeding;
pub mod simulation;
pub mod store;
pub mod tree;

pub use config::{ForceMethod, IntegratorKind, SimulationConfig};
pub use error::SimError;
pub use particle::Particle;
pub use simulation::{FrameStats, Simulation};
pub use store::ParticleStore;

#[cfg(test)]
mod integrator_test;
#[cfg(test)]
mod simulation_test;
