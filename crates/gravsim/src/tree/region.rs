use nalgebra::Point2;

/// One of the four children of a subdivided node.
///
/// Screen coordinates: y grows downward, so "north" is the smaller y.
///
/// ```text
/// +-------+-------+
/// |  NW   |  NE   |
/// +-------+-------+
/// |  SW   |  SE   |
/// +-------+-------+
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quadrant {
    Nw = 0,
    Ne = 1,
    Se = 2,
    Sw = 3,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [Quadrant::Nw, Quadrant::Ne, Quadrant::Se, Quadrant::Sw];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// An axis-aligned square, `[x, x + size) × [y, y + size)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    /// Top-left corner
    pub origin: Point2<f64>,
    /// Side length
    pub size: f64,
}

impl Region {
    pub fn new(x: f64, y: f64, size: f64) -> Self {
        Region {
            origin: Point2::new(x, y),
            size,
        }
    }

    /// Half-open containment test. NaN positions are never contained.
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        point.x >= self.origin.x
            && point.x < self.origin.x + self.size
            && point.y >= self.origin.y
            && point.y < self.origin.y + self.size
    }

    pub fn center(&self) -> Point2<f64> {
        let half = self.size * 0.5;
        Point2::new(self.origin.x + half, self.origin.y + half)
    }

    /// Quadrant of a point assumed to lie inside this region.
    ///
    /// Splits on the same midlines [`Region::child`] uses, so a contained
    /// point always lands in the child that contains it.
    pub fn quadrant(&self, point: &Point2<f64>) -> Quadrant {
        let mid = self.center();
        match (point.x >= mid.x, point.y >= mid.y) {
            (false, false) => Quadrant::Nw,
            (true, false) => Quadrant::Ne,
            (true, true) => Quadrant::Se,
            (false, true) => Quadrant::Sw,
        }
    }

    pub fn child(&self, quadrant: Quadrant) -> Region {
        let half = self.size * 0.5;
        let mid = self.center();
        let origin = match quadrant {
            Quadrant::Nw => self.origin,
            Quadrant::Ne => Point2::new(mid.x, self.origin.y),
            Quadrant::Se => mid,
            Quadrant::Sw => Point2::new(self.origin.x, mid.y),
        };
        Region { origin, size: half }
    }
}
