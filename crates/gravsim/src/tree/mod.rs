//! Barnes-Hut quadtree for approximating long-range gravity.
//!
//! Nodes come from a [`NodePool`] arena and are addressed by [`NodeId`];
//! leaves store indices into the particle store, never references, so the
//! tree holds no borrow of the particles between phases.

pub mod pool;
pub mod quadtree;
pub mod region;

#[cfg(test)]
mod region_test;

pub use pool::{NodeId, NodePool};
pub use quadtree::{ForceProbe, InsertReport, NodeSummary, QuadTree, SummaryKind};
pub use region::{Quadrant, Region};
