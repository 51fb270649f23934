use nalgebra::{Point2, Vector2};

use crate::config::SimulationConfig;
use crate::particle::Particle;

/// The authoritative, insertion-ordered collection of particles.
///
/// Trees and grids only ever hold indices into this store, and those indices
/// are valid for a single frame: the store is resized (spawn, removal) only
/// between the parallel phases of a frame.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
        }
    }

    /// Appends a particle and returns its index for the current frame.
    ///
    /// # Examples
    ///
    /// ```
    /// use gravsim::particle::Particle;
    /// use gravsim::store::ParticleStore;
    ///
    /// let mut store = ParticleStore::new();
    /// let idx = store.add(Particle::at_rest(5.0, 5.0, 2.0));
    /// assert_eq!(idx, 0);
    /// assert_eq!(store.len(), 1);
    /// ```
    pub fn add(&mut self, particle: Particle) -> usize {
        self.particles.push(particle);
        self.particles.len() - 1
    }

    pub fn extend<I: IntoIterator<Item = Particle>>(&mut self, particles: I) {
        self.particles.extend(particles);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Drops every particle outside the simulated area, keeping the order of
    /// the survivors. Returns how many were removed.
    pub fn retain_in_bounds(&mut self, config: &SimulationConfig) -> usize {
        let before = self.particles.len();
        self.particles
            .retain(|p| config.in_bounds(p.position.x, p.position.y));
        before - self.particles.len()
    }

    pub fn total_mass(&self) -> f64 {
        self.particles.iter().map(|p| p.mass).sum()
    }

    /// Should stay constant for an isolated system with no removals.
    pub fn total_momentum(&self) -> Vector2<f64> {
        self.particles
            .iter()
            .map(|p| p.momentum())
            .fold(Vector2::zeros(), |acc, m| acc + m)
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(|p| p.kinetic_energy()).sum()
    }

    /// Mass-weighted mean position, or `None` for an empty store.
    pub fn center_of_mass(&self) -> Option<Point2<f64>> {
        let total = self.total_mass();
        if total <= 0.0 {
            return None;
        }
        let weighted = self
            .particles
            .iter()
            .fold(Vector2::zeros(), |acc, p| acc + p.position.coords * p.mass);
        Some(Point2::from(weighted / total))
    }
}

impl From<Vec<Particle>> for ParticleStore {
    fn from(particles: Vec<Particle>) -> Self {
        Self { particles }
    }
}
