//! Pairwise contact response between overlapping particles.
//!
//! The impulse is the elastic one for two disks exchanging momentum along the
//! contact normal,
//!
//! ```text
//!                 2 · m_b
//! Δv_a = -k · ----------- · ((v_a - v_b) · n) · n
//!              m_a + m_b
//! ```
//!
//! scaled by the damping factor `k` (symmetric for `b`). After the impulse the
//! overlap is split equally between the two bodies along `n`.

use crate::particle::Particle;

/// Separations within this distance of touching count as not overlapping,
/// and closer than this count as coincident.
pub const CONTACT_EPSILON: f64 = 1e-9;

/// What [`resolve_collision`] found for a pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contact {
    /// Not overlapping
    Apart,
    /// Centers coincide; no contact normal exists
    Coincident,
    /// Overlapping but already moving apart
    Separating,
    /// Impulse and positional correction applied
    Resolved,
}

/// Resolves one contact in place, returning what happened.
///
/// Only `a` and `b` are touched, and only when they overlap while
/// approaching. Calling it again on the result is a no-op: the positional
/// correction leaves the pair exactly touching.
///
/// # Examples
///
/// ```
/// use gravsim::collisions::{Contact, resolve_collision};
/// use gravsim::particle::Particle;
/// use nalgebra::{Point2, Vector2};
///
/// let mut a = Particle::new(Point2::new(0.0, 0.0), 2.0, Vector2::new(1.0, 0.0));
/// let mut b = Particle::new(Point2::new(3.0, 0.0), 2.0, Vector2::new(-1.0, 0.0));
///
/// assert_eq!(resolve_collision(&mut a, &mut b, 1.0), Contact::Resolved);
/// assert!(a.velocity.x < 0.0 && b.velocity.x > 0.0);
/// assert_eq!(resolve_collision(&mut a, &mut b, 1.0), Contact::Apart);
/// ```
pub fn resolve_collision(a: &mut Particle, b: &mut Particle, damping: f64) -> Contact {
    let d = a.position - b.position;
    let distance = d.magnitude();
    let sum_of_radii = a.radius + b.radius;

    if distance < CONTACT_EPSILON {
        return Contact::Coincident;
    }
    if distance + CONTACT_EPSILON >= sum_of_radii {
        return Contact::Apart;
    }

    let normal = d / distance;
    let approach = (a.velocity - b.velocity).dot(&normal);
    if approach >= 0.0 {
        return Contact::Separating;
    }

    let total = a.mass + b.mass;
    let impulse_a = normal * (approach * 2.0 * b.mass / total);
    let impulse_b = normal * (approach * 2.0 * a.mass / total);
    a.velocity -= impulse_a * damping;
    b.velocity += impulse_b * damping;

    let correction = normal * ((sum_of_radii - distance) * 0.5);
    a.position += correction;
    b.position -= correction;

    Contact::Resolved
}
