//! Tree-based gravity using Barnes-Hut algorithm (O(N log N))

use std::time::Instant;

use crate::error::SimError;
use crate::forces::{ForceModel, ForceReport, GravityParams};
use crate::particle::Particle;
use crate::tree::QuadTree;

/// Barnes-Hut gravity backed by a quadtree that is rebuilt every frame.
///
/// The tree, and with it the node pool, is kept between frames so steady
/// populations stop allocating after the first few frames.
///
/// # Opening threshold (θ)
///
/// Controls the accuracy/speed tradeoff:
/// - θ = 0.0: every occupied leaf is visited, same as [`DirectGravity`](super::DirectGravity)
/// - θ = 0.5: good accuracy, the default
/// - θ = 1.0: lower accuracy, faster
///
/// # Examples
///
/// ```
/// use gravsim::forces::{ForceModel, GravityParams, TreeGravity};
/// use gravsim::particle::Particle;
///
/// let mut particles = vec![
///     Particle::at_rest(100.0, 500.0, 2.0),
///     Particle::at_rest(900.0, 500.0, 2.0),
/// ];
///
/// let mut gravity = TreeGravity::new(1920.0, 32);
/// let report = gravity
///     .accumulate(&mut particles, &GravityParams::default(), 4)
///     .unwrap();
///
/// assert!(report.tree_nodes >= 5);
/// assert!(particles[0].force.x > 0.0);
/// ```
pub struct TreeGravity {
    tree: QuadTree,
}

impl TreeGravity {
    /// `root_size` is the side of the square root region, `[0, root_size)²`.
    pub fn new(root_size: f64, max_depth: u32) -> Self {
        TreeGravity {
            tree: QuadTree::new(root_size, max_depth),
        }
    }

    pub fn from_tree(tree: QuadTree) -> Self {
        TreeGravity { tree }
    }

    /// The tree as built by the most recent frame.
    pub fn tree(&self) -> &QuadTree {
        &self.tree
    }
}

impl ForceModel for TreeGravity {
    fn accumulate(
        &mut self,
        particles: &mut [Particle],
        params: &GravityParams,
        threads: usize,
    ) -> Result<ForceReport, SimError> {
        let start = Instant::now();
        let inserted = self.tree.build(particles, threads)?;
        let build = start.elapsed();

        let start = Instant::now();
        self.tree.accumulate_forces(particles, params, threads);
        let evaluate = start.elapsed();

        if inserted.deferred > 0 {
            log::debug!(
                "{} inserts deferred, pool grew {} times",
                inserted.deferred,
                inserted.pool_growths
            );
        }

        Ok(ForceReport {
            build,
            evaluate,
            tree_nodes: self.tree.node_count(),
            deferred_inserts: inserted.deferred,
            pool_growths: inserted.pool_growths,
        })
    }
}
