//! Tunable simulation constants.
//!
//! Every policy knob of the core lives in [`SimulationConfig`]: the force law
//! constants, the Barnes-Hut opening threshold, collision tuning, the size of
//! the simulated area and the worker thread count. The struct is
//! `serde`-deserializable so a host program can load it from any format; all
//! fields fall back to their defaults when omitted.
//!
//! ```yaml
//! width: 1920.0
//! height: 1080.0
//! gravitational_constant: 0.8
//! softening: 0.5
//! theta: 0.5
//! force_method: barnes_hut   # or "direct", "grid"
//! integrator: semi_implicit_euler   # or "constant_acceleration"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Which gravity backend the simulation uses each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceMethod {
    /// Quadtree approximation, O(n log n)
    #[default]
    BarnesHut,
    /// Exact pairwise summation, O(n²)
    Direct,
    /// Exact pairwise force restricted to neighbouring coarse grid cells
    Grid,
}

/// Time integration scheme applied after forces are accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    /// v += a·dt, then x += v·dt
    #[default]
    SemiImplicitEuler,
    /// Exact constant-acceleration step with the frame's force
    ConstantAcceleration,
}

/// Complete set of constants driving one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Width of the simulated area; x ranges over `[0, width)`
    pub width: f64,
    /// Height of the simulated area; y ranges over `[0, height)`
    pub height: f64,

    /// G in the softened force law
    pub gravitational_constant: f64,
    /// Additive term in the force denominator, `d² + softening`
    pub softening: f64,
    /// Barnes-Hut opening threshold on `size / distance`
    pub theta: f64,
    /// Node-to-particle distances below this are ignored
    pub min_separation: f64,
    /// Tree nodes lighter than this are ignored; 0 disables the skip
    pub low_mass_cutoff: f64,
    /// Depth at which leaves stop subdividing and merge occupants
    pub max_tree_depth: u32,

    /// Fraction of the elastic impulse applied on contact, in `[0, 1]`
    pub collision_damping: f64,
    /// Side of a collision grid cell; must be at least one particle diameter
    pub collision_cell_size: f64,
    /// Side of a coarse cell for [`ForceMethod::Grid`]
    pub gravity_cell_size: f64,

    /// Radius given to seeded and spawned particles
    pub particle_radius: f64,

    /// Worker threads for the parallel phases; `None` uses every core
    pub worker_threads: Option<usize>,

    pub force_method: ForceMethod,
    pub integrator: IntegratorKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            gravitational_constant: 0.8,
            softening: 0.5,
            theta: 0.5,
            min_separation: 4.0,
            low_mass_cutoff: 0.0,
            max_tree_depth: 32,
            collision_damping: 0.2,
            collision_cell_size: 4.0,
            gravity_cell_size: 100.0,
            particle_radius: 2.0,
            worker_threads: None,
            force_method: ForceMethod::BarnesHut,
            integrator: IntegratorKind::SemiImplicitEuler,
        }
    }
}

impl SimulationConfig {
    /// Side length of the square quadtree root covering the whole area.
    pub fn root_size(&self) -> f64 {
        self.width.max(self.height)
    }

    /// Returns `true` if `(x, y)` lies inside `[0, width) × [0, height)`.
    ///
    /// NaN coordinates are never inside.
    pub fn in_bounds(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && x < self.width && y >= 0.0 && y < self.height
    }

    /// Number of worker threads to use for `work_items` independent items.
    ///
    /// Bounded by the configured (or detected) core count and never larger
    /// than the amount of work, but always at least one.
    pub fn thread_count(&self, work_items: usize) -> usize {
        let available = self.worker_threads.unwrap_or_else(num_cpus::get).max(1);
        available.min(work_items).max(1)
    }

    /// Checks every field against its valid range.
    ///
    /// # Examples
    ///
    /// ```
    /// use gravsim::config::SimulationConfig;
    ///
    /// let mut config = SimulationConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.collision_damping = 1.5;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), SimError> {
        positive("width", self.width)?;
        positive("height", self.height)?;
        non_negative("gravitational_constant", self.gravitational_constant)?;
        non_negative("softening", self.softening)?;
        non_negative("theta", self.theta)?;
        non_negative("min_separation", self.min_separation)?;
        non_negative("low_mass_cutoff", self.low_mass_cutoff)?;
        positive("collision_cell_size", self.collision_cell_size)?;
        positive("gravity_cell_size", self.gravity_cell_size)?;
        positive("particle_radius", self.particle_radius)?;

        if !(0.0..=1.0).contains(&self.collision_damping) {
            return Err(SimError::invalid(
                "collision_damping",
                format!("{} is outside [0, 1]", self.collision_damping),
            ));
        }
        if !(1..=60).contains(&self.max_tree_depth) {
            return Err(SimError::invalid(
                "max_tree_depth",
                format!("{} is outside [1, 60]", self.max_tree_depth),
            ));
        }
        if self.worker_threads == Some(0) {
            return Err(SimError::invalid("worker_threads", "must be at least 1"));
        }
        if self.collision_cell_size < 2.0 * self.particle_radius {
            log::warn!(
                "collision cell {} is smaller than particle diameter {}; some contacts will be missed",
                self.collision_cell_size,
                2.0 * self.particle_radius
            );
        }

        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(field, format!("{value} must be finite and > 0")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(field, format!("{value} must be finite and >= 0")))
    }
}
