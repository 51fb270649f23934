//! Short-range elastic collisions.
//!
//! Contacts are found with a uniform grid ([`CollisionGrid`]) and resolved
//! pairwise with a damped elastic impulse ([`resolve_collision`]).

pub mod grid;
pub mod resolution;


pub use grid::{CollisionGrid, CollisionReport};
pub use resolution::{CONTACT_EPSILON, Contact, resolve_collision};
