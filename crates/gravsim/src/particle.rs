use nalgebra::{Point2, Vector2};

/// A point mass with a collision radius.
///
/// Mass is derived from the radius as the area of a disk, `π·r²`, so all
/// particles share a uniform surface density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Point2<f64>,
    pub velocity: Vector2<f64>,
    /// Force accumulated during the current frame, cleared by the integrator
    pub force: Vector2<f64>,
    pub mass: f64,
    pub radius: f64,
}

impl Particle {
    /// Creates a particle whose mass follows from its radius.
    ///
    /// # Examples
    ///
    /// ```
    /// use gravsim::particle::Particle;
    /// use nalgebra::{Point2, Vector2};
    ///
    /// let p = Particle::new(Point2::new(10.0, 10.0), 2.0, Vector2::zeros());
    /// assert!((p.mass - std::f64::consts::PI * 4.0).abs() < 1e-12);
    /// ```
    pub fn new(position: Point2<f64>, radius: f64, velocity: Vector2<f64>) -> Self {
        Particle {
            position,
            velocity,
            force: Vector2::zeros(),
            mass: std::f64::consts::PI * radius * radius,
            radius,
        }
    }

    /// Convenience constructor at rest.
    pub fn at_rest(x: f64, y: f64, radius: f64) -> Self {
        Self::new(Point2::new(x, y), radius, Vector2::zeros())
    }

    pub fn momentum(&self) -> Vector2<f64> {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.magnitude_squared()
    }

    pub fn distance_to(&self, other: &Particle) -> f64 {
        (self.position - other.position).magnitude()
    }

    /// True when position, velocity, force and mass are all finite.
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|c| c.is_finite())
            && self.velocity.iter().all(|c| c.is_finite())
            && self.force.iter().all(|c| c.is_finite())
            && self.mass.is_finite()
    }
}
