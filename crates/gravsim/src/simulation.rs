//! The simulation context and its frame pipeline.
//!
//! A [`Simulation`] owns everything one running simulation needs: the
//! particle store, the configuration, the gravity backend with its reusable
//! tree, the collision grid and the RNG used for spawning. [`Simulation::step`]
//! runs one frame:
//!
//! 1. drop particles outside the simulated area
//! 2. accumulate gravity (tree build + parallel evaluation for Barnes-Hut)
//! 3. rebuild the collision grid
//! 4. resolve contacts, in parallel by row band
//! 5. integrate and drop particles that left the area
//!
//! Every phase joins before the next starts. Collaborator operations such as
//! [`Simulation::spawn_cluster`] take `&mut self`, so they can only run
//! between frames.

use std::ops::Range;
use std::time::{Duration, Instant};

use nalgebra::{Point2, Vector2};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

use crate::collisions::CollisionGrid;
use crate::config::{ForceMethod, SimulationConfig};
use crate::error::SimError;
use crate::forces::{
    DirectGravity, ForceModel, ForceReport, GravityParams, GridGravity, TreeGravity,
};
use crate::integrator::integrate;
use crate::particle::Particle;
use crate::seeding;
use crate::store::ParticleStore;
use crate::tree::QuadTree;

/// Wall-clock duration of each phase of one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhaseTimings {
    pub cull: Duration,
    /// Tree reset, insertion and mass aggregation (or grid fill)
    pub force_build: Duration,
    pub force_evaluate: Duration,
    pub collision_rebuild: Duration,
    pub collision_resolve: Duration,
    pub integrate: Duration,
}

impl PhaseTimings {
    pub fn total(&self) -> Duration {
        self.cull
            + self.force_build
            + self.force_evaluate
            + self.collision_rebuild
            + self.collision_resolve
            + self.integrate
    }
}

/// Report returned by [`Simulation::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Index of this frame; paused steps do not advance it
    pub frame: u64,
    pub paused: bool,
    pub particles_before: usize,
    pub particles_after: usize,
    /// Particles dropped for being outside the area, before and after
    /// integration
    pub removed: usize,
    pub tree_nodes: usize,
    pub pool_growths: usize,
    pub deferred_inserts: usize,
    pub contacts_resolved: usize,
    pub threads: usize,
    pub timings: PhaseTimings,
}

enum Backend {
    Tree(TreeGravity),
    Direct(DirectGravity),
    Grid(GridGravity),
}

impl Backend {
    fn for_config(config: &SimulationConfig) -> Self {
        match config.force_method {
            ForceMethod::BarnesHut => {
                Backend::Tree(TreeGravity::new(config.root_size(), config.max_tree_depth))
            }
            ForceMethod::Direct => Backend::Direct(DirectGravity),
            ForceMethod::Grid => Backend::Grid(GridGravity::new(
                config.width,
                config.height,
                config.gravity_cell_size,
            )),
        }
    }

    fn model(&mut self) -> &mut dyn ForceModel {
        match self {
            Backend::Tree(tree) => tree,
            Backend::Direct(direct) => direct,
            Backend::Grid(grid) => grid,
        }
    }
}

pub struct Simulation {
    config: SimulationConfig,
    params: GravityParams,
    store: ParticleStore,
    backend: Backend,
    collisions: CollisionGrid,
    rng: ChaChaRng,
    paused: bool,
    frame: u64,
}

impl Simulation {
    /// Creates an empty simulation with a randomly seeded spawn RNG.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidConfig`] if the configuration fails validation.
    pub fn new(config: SimulationConfig) -> Result<Self, SimError> {
        Self::with_seed(config, rand::random())
    }

    /// Creates an empty simulation whose spawns are reproducible.
    ///
    /// # Examples
    ///
    /// ```
    /// use gravsim::config::SimulationConfig;
    /// use gravsim::simulation::Simulation;
    ///
    /// let mut sim = Simulation::with_seed(SimulationConfig::default(), 7).unwrap();
    /// sim.seed_uniform(500);
    ///
    /// let stats = sim.step(0.016).unwrap();
    /// assert_eq!(stats.particles_before, 500);
    /// assert_eq!(sim.frame(), 1);
    /// ```
    pub fn with_seed(config: SimulationConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        log::info!(
            "simulation {}x{} using {:?} gravity and {:?}",
            config.width,
            config.height,
            config.force_method,
            config.integrator
        );
        Ok(Simulation {
            params: GravityParams::from(&config),
            backend: Backend::for_config(&config),
            collisions: CollisionGrid::new(config.width, config.height, config.collision_cell_size),
            store: ParticleStore::new(),
            rng: ChaChaRng::seed_from_u64(seed),
            paused: false,
            frame: 0,
            config,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    /// Direct access to the particles between frames.
    pub fn store_mut(&mut self) -> &mut ParticleStore {
        &mut self.store
    }

    pub fn particles(&self) -> &[Particle] {
        self.store.as_slice()
    }

    /// Number of frames stepped so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Flips the paused flag and returns the new state.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Appends one particle and returns its index. A particle placed outside
    /// the area is dropped at the start of the next frame.
    pub fn add_particle(&mut self, particle: Particle) -> usize {
        self.store.add(particle)
    }

    /// Adds `count` particles of the configured radius scattered over a disk
    /// of radius `spread` around `center`. Returns the index range they
    /// occupy.
    pub fn spawn_cluster(
        &mut self,
        center: Point2<f64>,
        count: usize,
        spread: f64,
        velocity: Vector2<f64>,
    ) -> Range<usize> {
        let start = self.store.len();
        let particles = seeding::cluster(
            &mut self.rng,
            center,
            count,
            self.config.particle_radius,
            spread,
            velocity,
        );
        self.store.extend(particles);
        log::info!("spawned {count} particles around ({}, {})", center.x, center.y);
        start..self.store.len()
    }

    /// Adds `count` particles at rest, uniformly over the area.
    pub fn seed_uniform(&mut self, count: usize) -> Range<usize> {
        let start = self.store.len();
        let particles = seeding::uniform(&mut self.rng, count, &self.config);
        self.store.extend(particles);
        log::info!("seeded {count} particles");
        start..self.store.len()
    }

    /// Removes every particle.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Advances the simulation by one frame of length `dt`.
    ///
    /// A paused simulation returns immediately with `paused` set and nothing
    /// changed.
    ///
    /// # Errors
    ///
    /// [`SimError::BoundaryViolation`] if the tree rejects a particle. The
    /// out-of-bounds cull at the start of the frame keeps this from happening
    /// for any area whose width and height fit in the tree root.
    pub fn step(&mut self, dt: f64) -> Result<FrameStats, SimError> {
        let particles_before = self.store.len();
        if self.paused {
            return Ok(FrameStats {
                frame: self.frame,
                paused: true,
                particles_before,
                particles_after: particles_before,
                ..Default::default()
            });
        }

        let mut timings = PhaseTimings::default();

        let start = Instant::now();
        let mut removed = self.store.retain_in_bounds(&self.config);
        timings.cull = start.elapsed();

        let threads = self.config.thread_count(self.store.len());

        let force = if self.params.gravitational_constant > 0.0 {
            self.backend
                .model()
                .accumulate(self.store.as_mut_slice(), &self.params, threads)?
        } else {
            ForceReport::default()
        };
        timings.force_build = force.build;
        timings.force_evaluate = force.evaluate;

        let start = Instant::now();
        self.collisions.rebuild(self.store.as_slice());
        timings.collision_rebuild = start.elapsed();

        let start = Instant::now();
        let contacts = self.collisions.resolve_all(
            self.store.as_mut_slice(),
            self.config.collision_damping,
            threads,
        );
        timings.collision_resolve = start.elapsed();

        let start = Instant::now();
        removed += integrate(
            &mut self.store,
            self.config.integrator.integrator(),
            dt,
            &self.config,
        );
        timings.integrate = start.elapsed();

        let stats = FrameStats {
            frame: self.frame,
            paused: false,
            particles_before,
            particles_after: self.store.len(),
            removed,
            tree_nodes: force.tree_nodes,
            pool_growths: force.pool_growths,
            deferred_inserts: force.deferred_inserts,
            contacts_resolved: contacts.resolved,
            threads,
            timings,
        };
        self.frame += 1;

        log::debug!(
            "frame {}: {} particles, {} removed, {} nodes, {} contacts on {} threads; \
             cull {:?} build {:?} forces {:?} grid {:?} collide {:?} integrate {:?}",
            stats.frame,
            stats.particles_after,
            stats.removed,
            stats.tree_nodes,
            stats.contacts_resolved,
            threads,
            timings.cull,
            timings.force_build,
            timings.force_evaluate,
            timings.collision_rebuild,
            timings.collision_resolve,
            timings.integrate,
        );

        Ok(stats)
    }

    /// The Barnes-Hut tree from the last frame, when that backend is active.
    pub fn tree(&self) -> Option<&QuadTree> {
        match &self.backend {
            Backend::Tree(tree) => Some(tree.tree()),
            Backend::Direct(_) | Backend::Grid(_) => None,
        }
    }
}
