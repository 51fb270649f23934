//! Barnes-Hut quadtree over the particle store.
//!
//! A frame uses the tree in four steps:
//!
//! 1. [`QuadTree::reset`] returns every node to the pool and seeds a root
//!    covering the simulated area.
//! 2. [`QuadTree::insert_all`] places particles from several worker threads.
//!    Each node guards its own state with a lock, so inserts landing in
//!    different subtrees never wait on each other.
//! 3. [`QuadTree::compute_mass_distribution`] recomputes aggregates bottom-up
//!    and freezes the tree into a lock-free read-only snapshot.
//! 4. [`QuadTree::accumulate_forces`] walks the snapshot once per particle,
//!    in parallel, opening branches whose `size / distance` reaches θ. The
//!    minimum separation only applies to nodes used as a point mass.
//!
//! # Example
//!
//! ```
//! use gravsim::forces::GravityParams;
//! use gravsim::particle::Particle;
//! use gravsim::tree::QuadTree;
//!
//! let mut particles = vec![
//!     Particle::at_rest(100.0, 100.0, 2.0),
//!     Particle::at_rest(300.0, 100.0, 2.0),
//! ];
//!
//! let mut tree = QuadTree::new(1024.0, 32);
//! tree.build(&particles, 2).unwrap();
//!
//! let params = GravityParams::default();
//! tree.accumulate_forces(&mut particles, &params, 2);
//!
//! assert!(particles[0].force.x > 0.0);
//! assert!(particles[1].force.x < 0.0);
//! ```

use nalgebra::{Point2, Vector2};
use rayon::prelude::*;

use super::pool::{NodeId, NodeKind, NodePool, NodeSlot};
use super::region::{Quadrant, Region};
use crate::error::SimError;
use crate::forces::{GravityParams, softened_force};
use crate::particle::Particle;

/// Particles closer than this fraction of their leaf's size are merged
/// instead of triggering another subdivision.
const COINCIDENT_FRACTION: f64 = 1e-12;

/// Read-only view of a node after mass aggregation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeSummary {
    pub region: Region,
    pub mass: f64,
    pub center_of_mass: Point2<f64>,
    pub kind: SummaryKind,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SummaryKind {
    Vacant,
    /// Range into the tree's flattened occupant list
    Leaf { start: u32, len: u32 },
    Branch { first_child: NodeId },
}

/// Outcome of a parallel insertion pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InsertReport {
    pub inserted: usize,
    /// Particles that hit a full pool and were placed after it grew
    pub deferred: usize,
    pub pool_growths: usize,
}

/// Force on one particle together with the number of nodes visited.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceProbe {
    pub force: Vector2<f64>,
    pub visits: usize,
}

struct PoolExhausted;

pub struct QuadTree {
    pool: NodePool,
    summaries: Vec<NodeSummary>,
    occupants: Vec<u32>,
    root_region: Region,
    max_depth: u32,
}

impl QuadTree {
    /// Creates an empty tree whose root covers `[0, root_size)²`.
    pub fn new(root_size: f64, max_depth: u32) -> Self {
        Self::with_pool(root_size, max_depth, NodePool::default())
    }

    /// Creates a tree over an existing pool, mainly to control its starting
    /// capacity.
    pub fn with_pool(root_size: f64, max_depth: u32, mut pool: NodePool) -> Self {
        let root_region = Region::new(0.0, 0.0, root_size);
        pool.release_all(root_region);
        QuadTree {
            pool,
            summaries: Vec::new(),
            occupants: Vec::new(),
            root_region,
            max_depth,
        }
    }

    /// Discards the previous frame's tree and seeds a fresh, empty root.
    pub fn reset(&mut self, root_size: f64) {
        self.root_region = Region::new(0.0, 0.0, root_size);
        self.pool.release_all(self.root_region);
        self.thaw();
    }

    pub fn root_region(&self) -> Region {
        self.root_region
    }

    /// Reset, parallel insert and mass aggregation in one call.
    pub fn build(&mut self, particles: &[Particle], threads: usize) -> Result<InsertReport, SimError> {
        self.reset(self.root_region.size);
        let report = self.insert_all(particles, threads)?;
        self.compute_mass_distribution();
        Ok(report)
    }

    /// Inserts one particle, growing the pool if it runs out.
    ///
    /// Discards the aggregated snapshot; forces and lookups see an empty tree
    /// until the next [`QuadTree::compute_mass_distribution`].
    ///
    /// # Errors
    ///
    /// [`SimError::BoundaryViolation`] if the particle is outside the root.
    pub fn insert(&mut self, index: usize, particles: &[Particle]) -> Result<(), SimError> {
        self.check_contained(index, &particles[index])?;
        self.thaw();
        while self.place(index as u32, particles).is_err() {
            self.pool.grow();
        }
        Ok(())
    }

    /// Inserts every particle of the slice, splitting the index range into
    /// contiguous chunks, one per worker. Like [`QuadTree::insert`], discards
    /// the aggregated snapshot.
    ///
    /// Containment is verified for the whole slice before anything is
    /// inserted, so a boundary violation leaves the tree untouched.
    pub fn insert_all(&mut self, particles: &[Particle], threads: usize) -> Result<InsertReport, SimError> {
        for (index, particle) in particles.iter().enumerate() {
            self.check_contained(index, particle)?;
        }
        if particles.is_empty() {
            return Ok(InsertReport::default());
        }

        self.thaw();
        self.pool.reserve_for(particles.len());

        let n = particles.len();
        let threads = threads.clamp(1, n);
        let chunk = n.div_ceil(threads);

        let tree = &*self;
        let mut deferred: Vec<u32> = (0..threads)
            .into_par_iter()
            .flat_map_iter(|worker| {
                let start = (worker * chunk).min(n);
                let end = (start + chunk).min(n);
                (start as u32..end as u32).filter(move |&i| tree.place(i, particles).is_err())
            })
            .collect();

        let report = InsertReport {
            inserted: n,
            deferred: deferred.len(),
            pool_growths: 0,
        };
        let mut growths = 0;
        while !deferred.is_empty() {
            self.pool.grow();
            growths += 1;
            log::trace!("retrying {} deferred inserts", deferred.len());
            deferred.retain(|&i| self.place(i, particles).is_err());
        }

        Ok(InsertReport {
            pool_growths: growths,
            ..report
        })
    }

    fn thaw(&mut self) {
        self.summaries.clear();
        self.occupants.clear();
    }

    fn check_contained(&self, index: usize, particle: &Particle) -> Result<(), SimError> {
        if self.root_region.contains(&particle.position) {
            Ok(())
        } else {
            Err(SimError::BoundaryViolation {
                index,
                x: particle.position.x,
                y: particle.position.y,
            })
        }
    }

    /// Descends from the root and stores the particle in a leaf.
    ///
    /// Holds at most one pre-existing node's lock at a time; the only second
    /// lock ever taken is on freshly allocated children no other thread can
    /// reach yet.
    fn place(&self, index: u32, particles: &[Particle]) -> Result<(), PoolExhausted> {
        let particle = &particles[index as usize];
        let mut current = NodeId::ROOT;

        loop {
            let mut slot = self.pool.lock(current);
            let kind = slot.kind;
            match kind {
                NodeKind::Vacant => {
                    slot.kind = NodeKind::Leaf;
                    slot.occupants.push(index);
                    slot.add_mass(particle.mass, particle.position);
                    return Ok(());
                }
                NodeKind::Leaf => {
                    let resident = particles[slot.occupants[0] as usize].position;
                    let tolerance = slot.region.size * COINCIDENT_FRACTION;
                    if slot.depth >= self.max_depth
                        || (resident - particle.position).magnitude() <= tolerance
                    {
                        slot.occupants.push(index);
                        slot.add_mass(particle.mass, particle.position);
                        return Ok(());
                    }

                    let first_child = self.pool.allocate_quad().ok_or(PoolExhausted)?;
                    self.subdivide(&mut slot, first_child, particles);
                    slot.add_mass(particle.mass, particle.position);
                    current = first_child.child(slot.region.quadrant(&particle.position));
                }
                NodeKind::Branch { first_child } => {
                    slot.add_mass(particle.mass, particle.position);
                    current = first_child.child(slot.region.quadrant(&particle.position));
                }
            }
        }
    }

    /// Turns a leaf into a branch, pushing its occupants down one level.
    fn subdivide(&self, slot: &mut NodeSlot, first_child: NodeId, particles: &[Particle]) {
        for quadrant in Quadrant::ALL {
            let mut child = self.pool.lock(first_child.child(quadrant));
            child.region = slot.region.child(quadrant);
            child.depth = slot.depth + 1;
        }

        for &occupant in &slot.occupants {
            let p = &particles[occupant as usize];
            let mut child = self.pool.lock(first_child.child(slot.region.quadrant(&p.position)));
            child.kind = NodeKind::Leaf;
            child.occupants.push(occupant);
            child.add_mass(p.mass, p.position);
        }

        slot.occupants.clear();
        slot.kind = NodeKind::Branch { first_child };
    }

    /// Recomputes every branch's mass and center of mass from its children
    /// (post-order) and freezes the tree for force evaluation.
    ///
    /// Must run after all insertions for the frame.
    pub fn compute_mass_distribution(&mut self) {
        self.aggregate(NodeId::ROOT);
        self.freeze();
    }

    fn aggregate(&mut self, id: NodeId) -> (f64, Vector2<f64>) {
        let slot = self.pool.slot_mut(id);
        let first_child = match slot.kind {
            NodeKind::Branch { first_child } => first_child,
            NodeKind::Leaf | NodeKind::Vacant => return (slot.mass, slot.moment),
        };

        let mut mass = 0.0;
        let mut moment = Vector2::zeros();
        for quadrant in Quadrant::ALL {
            let (m, mo) = self.aggregate(first_child.child(quadrant));
            mass += m;
            moment += mo;
        }

        let slot = self.pool.slot_mut(id);
        slot.mass = mass;
        slot.moment = moment;
        (mass, moment)
    }

    fn freeze(&mut self) {
        self.thaw();

        for i in 0..self.pool.in_use() {
            let slot = self.pool.slot_mut(NodeId::new(i));
            let center_of_mass = if slot.mass > 0.0 {
                Point2::from(slot.moment / slot.mass)
            } else {
                slot.region.center()
            };
            let kind = match slot.kind {
                NodeKind::Vacant => SummaryKind::Vacant,
                NodeKind::Branch { first_child } => SummaryKind::Branch { first_child },
                NodeKind::Leaf => {
                    let start = self.occupants.len() as u32;
                    self.occupants.extend_from_slice(&slot.occupants);
                    SummaryKind::Leaf {
                        start,
                        len: slot.occupants.len() as u32,
                    }
                }
            };
            self.summaries.push(NodeSummary {
                region: slot.region,
                mass: slot.mass,
                center_of_mass,
                kind,
            });
        }
    }

    /// Adds the tree's gravitational pull to every particle's force
    /// accumulator. Particles are chunked by index, one chunk per worker.
    ///
    /// `particles` must be the slice the tree was built from.
    pub fn accumulate_forces(&self, particles: &mut [Particle], params: &GravityParams, threads: usize) {
        if particles.is_empty() || self.summaries.is_empty() {
            return;
        }
        let chunk = particles.len().div_ceil(threads.clamp(1, particles.len()));

        particles
            .par_chunks_mut(chunk)
            .enumerate()
            .for_each(|(c, block)| {
                let offset = c * chunk;
                for (i, particle) in block.iter_mut().enumerate() {
                    particle.force += self.evaluate_force(offset + i, particle, params);
                }
            });
    }

    /// Barnes-Hut force on the particle at `index`.
    pub fn evaluate_force(&self, index: usize, particle: &Particle, params: &GravityParams) -> Vector2<f64> {
        self.probe(index, particle, params).force
    }

    /// Like [`QuadTree::evaluate_force`], also counting visited nodes.
    pub fn probe(&self, index: usize, particle: &Particle, params: &GravityParams) -> ForceProbe {
        let mut probe = ForceProbe {
            force: Vector2::zeros(),
            visits: 0,
        };
        if !self.summaries.is_empty() {
            self.visit(NodeId::ROOT, index as u32, particle, params, &mut probe);
        }
        probe
    }

    fn visit(
        &self,
        id: NodeId,
        index: u32,
        particle: &Particle,
        params: &GravityParams,
        probe: &mut ForceProbe,
    ) {
        let node = &self.summaries[id.index()];
        probe.visits += 1;

        let first_child = match node.kind {
            SummaryKind::Vacant => return,
            SummaryKind::Leaf { start, len } => {
                let held = &self.occupants[start as usize..(start + len) as usize];
                if held.contains(&index) {
                    return;
                }
                None
            }
            SummaryKind::Branch { first_child } => Some(first_child),
        };
        if node.mass < params.low_mass_cutoff {
            return;
        }

        let displacement = node.center_of_mass - particle.position;
        let distance = displacement.magnitude();
        let opened = first_child
            .filter(|_| distance == 0.0 || node.region.size / distance >= params.theta);

        if let Some(first_child) = opened {
            for quadrant in Quadrant::ALL {
                let child = first_child.child(quadrant);
                if self.summaries[child.index()].kind != SummaryKind::Vacant {
                    self.visit(child, index, particle, params, probe);
                }
            }
        } else if distance >= params.min_separation && distance > 0.0 {
            // Leaf, or a branch accepted as a point mass
            probe.force += softened_force(params, particle.mass, node.mass, displacement, distance);
        }
    }

    /// Leaf reached by descending from the root toward `position`, or `None`
    /// if the position is outside the root or the tree is not aggregated.
    pub fn locate(&self, position: &Point2<f64>) -> Option<NodeId> {
        if self.summaries.is_empty() || !self.root_region.contains(position) {
            return None;
        }
        let mut current = NodeId::ROOT;
        loop {
            let node = &self.summaries[current.index()];
            match node.kind {
                SummaryKind::Branch { first_child } => {
                    current = first_child.child(node.region.quadrant(position));
                }
                SummaryKind::Leaf { .. } | SummaryKind::Vacant => return Some(current),
            }
        }
    }

    pub fn summary(&self, id: NodeId) -> Option<&NodeSummary> {
        self.summaries.get(id.index())
    }

    /// Particle indices held by a leaf; empty for branches and vacant nodes.
    pub fn occupants(&self, id: NodeId) -> &[u32] {
        match self.summaries.get(id.index()).map(|s| s.kind) {
            Some(SummaryKind::Leaf { start, len }) => {
                &self.occupants[start as usize..(start + len) as usize]
            }
            _ => &[],
        }
    }

    /// Every occupied leaf with its particle indices.
    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &[u32])> + '_ {
        self.summaries
            .iter()
            .enumerate()
            .filter_map(move |(i, summary)| match summary.kind {
                SummaryKind::Leaf { start, len } => Some((
                    NodeId::new(i),
                    &self.occupants[start as usize..(start + len) as usize],
                )),
                _ => None,
            })
    }

    /// Root mass after aggregation; zero for an empty or unaggregated tree.
    pub fn total_mass(&self) -> f64 {
        self.summaries.first().map_or(0.0, |root| root.mass)
    }

    pub fn center_of_mass(&self) -> Option<Point2<f64>> {
        self.summaries
            .first()
            .filter(|root| root.mass > 0.0)
            .map(|root| root.center_of_mass)
    }

    /// Nodes handed out by the pool for the current tree.
    pub fn node_count(&self) -> usize {
        self.pool.in_use()
    }

    pub fn pool_capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn pool_growths(&self) -> usize {
        self.pool.growths()
    }
}
