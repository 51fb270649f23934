//! Reusable node arena for the quadtree.
//!
//! Nodes live contiguously in a `Vec` and refer to each other by [`NodeId`].
//! Subdivision always hands out four consecutive slots, so a branch only
//! stores the id of its first child. Allocation is a single atomic bump of a
//! cursor, which lets worker threads subdivide concurrently through a shared
//! reference; each node's mutable state sits behind its own lock.
//!
//! The pool is never resized while it is shared. When a worker finds it full
//! it backs off, and the owner grows the pool once the parallel phase has
//! joined.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use nalgebra::{Point2, Vector2};

use super::region::{Quadrant, Region};

/// Index into the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub(crate) fn new(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize, "NodeId overflow");
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Id of the given child, for the first child of a quad.
    pub fn child(self, quadrant: Quadrant) -> NodeId {
        NodeId(self.0 + quadrant.index() as u32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Vacant,
    Leaf,
    Branch { first_child: NodeId },
}

/// Mutable state of one node.
#[derive(Debug)]
pub(crate) struct NodeSlot {
    pub region: Region,
    pub depth: u32,
    pub kind: NodeKind,
    /// Particle indices held by a leaf; more than one only after a merge
    pub occupants: Vec<u32>,
    pub mass: f64,
    /// Σ mᵢ·xᵢ, so the center of mass is `moment / mass`
    pub moment: Vector2<f64>,
}

impl NodeSlot {
    fn vacant() -> Self {
        NodeSlot {
            region: Region::new(0.0, 0.0, 0.0),
            depth: 0,
            kind: NodeKind::Vacant,
            occupants: Vec::new(),
            mass: 0.0,
            moment: Vector2::zeros(),
        }
    }

    /// Back to a vacant, massless leaf. Keeps the occupant buffer's capacity.
    fn release(&mut self) {
        self.kind = NodeKind::Vacant;
        self.occupants.clear();
        self.mass = 0.0;
        self.moment = Vector2::zeros();
        self.depth = 0;
    }

    pub fn add_mass(&mut self, mass: f64, position: Point2<f64>) {
        self.mass += mass;
        self.moment += position.coords * mass;
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    slot: Mutex<NodeSlot>,
}

impl Node {
    fn vacant() -> Self {
        Node {
            slot: Mutex::new(NodeSlot::vacant()),
        }
    }
}

/// Growable arena of quadtree nodes, reused from frame to frame.
#[derive(Debug)]
pub struct NodePool {
    nodes: Vec<Node>,
    cursor: AtomicUsize,
    growths: usize,
}

const MIN_QUADS: usize = 16;

impl NodePool {
    /// Creates a pool with room for the root plus `quads` subdivisions.
    pub fn with_quads(quads: usize) -> Self {
        let len = 1 + 4 * quads.max(1);
        NodePool {
            nodes: (0..len).map(|_| Node::vacant()).collect(),
            cursor: AtomicUsize::new(1),
            growths: 0,
        }
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Slots handed out since the last release.
    pub fn in_use(&self) -> usize {
        self.cursor.load(Ordering::Acquire).min(self.nodes.len())
    }

    /// How many times the pool has had to grow over its lifetime.
    pub fn growths(&self) -> usize {
        self.growths
    }

    /// Returns every handed-out node to the vacant state and re-seeds the
    /// root with `root_region`.
    pub(crate) fn release_all(&mut self, root_region: Region) {
        let used = self.in_use();
        for node in &mut self.nodes[..used] {
            slot_of(node).release();
        }
        self.cursor.store(1, Ordering::Release);

        let root = self.slot_mut(NodeId::ROOT);
        root.region = root_region;
        root.depth = 0;
    }

    /// Makes sure a tree over `particles` bodies is unlikely to exhaust the
    /// pool mid-insertion.
    pub(crate) fn reserve_for(&mut self, particles: usize) {
        let wanted = (particles + particles / 2).max(MIN_QUADS);
        if self.quads() < wanted {
            self.resize_quads(wanted);
        }
    }

    /// Doubles the number of quads. Only called while no worker holds a
    /// reference to the pool.
    pub(crate) fn grow(&mut self) {
        let target = (self.quads() * 2).max(MIN_QUADS);
        self.resize_quads(target);
        self.growths += 1;
        log::debug!("node pool grew to {} slots", self.nodes.len());
    }

    fn quads(&self) -> usize {
        (self.nodes.len() - 1) / 4
    }

    fn resize_quads(&mut self, quads: usize) {
        let used = self.in_use();
        self.nodes.resize_with(1 + 4 * quads, Node::vacant);
        self.cursor.store(used, Ordering::Release);
    }

    /// Claims four consecutive vacant slots, or `None` if the pool is full.
    ///
    /// Slot counts are always `1 + 4k` and the cursor starts at 1, so a claim
    /// either fits entirely or lies entirely past the end.
    pub(crate) fn allocate_quad(&self) -> Option<NodeId> {
        let base = self.cursor.fetch_add(4, Ordering::AcqRel);
        (base + 4 <= self.nodes.len()).then(|| NodeId::new(base))
    }

    /// Locks one node for mutation.
    pub(crate) fn lock(&self, id: NodeId) -> MutexGuard<'_, NodeSlot> {
        self.nodes[id.index()]
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access without locking, for sequential phases.
    pub(crate) fn slot_mut(&mut self, id: NodeId) -> &mut NodeSlot {
        slot_of(&mut self.nodes[id.index()])
    }
}

fn slot_of(node: &mut Node) -> &mut NodeSlot {
    node.slot.get_mut().unwrap_or_else(PoisonError::into_inner)
}

impl Default for NodePool {
    fn default() -> Self {
        Self::with_quads(MIN_QUADS)
    }
}
