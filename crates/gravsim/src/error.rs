//! Error types for the simulation core.

use thiserror::Error;

/// Failures surfaced by the simulation core.
///
/// Numerical trouble (near-zero separations, coincident bodies) never shows up
/// here: it is absorbed by softening and distance cutoffs. What remains are
/// caller bugs and bad configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A particle was handed to the quadtree outside the root region.
    #[error("particle {index} at ({x}, {y}) lies outside the tree root region")]
    BoundaryViolation { index: usize, x: f64, y: f64 },

    /// A configuration value is out of its valid range.
    #[error("invalid configuration `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl SimError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
