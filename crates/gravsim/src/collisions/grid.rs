//! Broad-phase collision detection on a uniform grid.
//!
//! With cells at least one particle diameter wide, any two overlapping
//! particles sit in the same or adjacent cells, so checking the 3×3 block
//! around each particle finds every contact.
//!
//! # Parallel resolution
//!
//! Work is split by horizontal bands of grid rows. Resolving a particle in
//! row `r` can move particles of rows `r - 1` and `r + 1`, so a band actually
//! touches its own rows plus one halo row on each side. With bands at least
//! two rows tall, the halos of every other band never meet, and the bands
//! run in two waves: even-numbered bands, then odd-numbered ones.
//!
//! Each band copies the particles of its rows and halo into a private buffer,
//! resolves contacts there, and hands the buffer back. The buffers of one
//! wave hold disjoint particles and are written back once the wave joins.

use std::ops::Range;

use rayon::prelude::*;

use crate::collisions::resolution::{Contact, resolve_collision};
use crate::grid::UniformGrid;
use crate::particle::Particle;

/// Rows per band never go below this.
const MIN_BAND_ROWS: usize = 2;

pub struct CollisionGrid {
    grid: UniformGrid,
}

/// Outcome of one [`CollisionGrid::resolve_all`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Ordered pairs examined
    pub pairs_checked: usize,
    /// Pairs that received an impulse
    pub resolved: usize,
}

impl CollisionReport {
    fn merge(self, other: CollisionReport) -> CollisionReport {
        CollisionReport {
            pairs_checked: self.pairs_checked + other.pairs_checked,
            resolved: self.resolved + other.resolved,
        }
    }
}

impl CollisionGrid {
    pub fn new(width: f64, height: f64, cell_size: f64) -> Self {
        CollisionGrid {
            grid: UniformGrid::new(width, height, cell_size),
        }
    }

    pub fn grid(&self) -> &UniformGrid {
        &self.grid
    }

    /// Buckets every particle by position. Particles outside the grid are
    /// left out and never collide. Returns the number placed.
    pub fn rebuild(&mut self, particles: &[Particle]) -> usize {
        self.grid.rebuild(particles.iter().map(|p| &p.position))
    }

    /// Resolves every contact among the particles bucketed by the last
    /// [`rebuild`](Self::rebuild). Each pair is visited in both orders.
    ///
    /// `particles` must be the slice the grid was rebuilt from.
    pub fn resolve_all(&self, particles: &mut [Particle], damping: f64, threads: usize) -> CollisionReport {
        let rows = self.grid.rows();
        let band_rows = rows.div_ceil(2 * threads.max(1)).max(MIN_BAND_ROWS);

        if threads <= 1 || rows < 2 * band_rows {
            return self.resolve_rows(0..rows, &mut InPlace(particles), damping);
        }

        let bands: Vec<Range<usize>> = (0..rows)
            .step_by(band_rows)
            .map(|start| start..(start + band_rows).min(rows))
            .collect();

        let mut report = CollisionReport::default();
        for wave in 0..2 {
            let snapshot: &[Particle] = particles;
            let results: Vec<(Vec<u32>, Vec<Particle>, CollisionReport)> = bands
                .par_iter()
                .skip(wave)
                .step_by(2)
                .map(|band| self.resolve_band(band.clone(), snapshot, damping))
                .collect();

            for (indices, local, band_report) in results {
                for (&index, particle) in indices.iter().zip(local) {
                    particles[index as usize] = particle;
                }
                report = report.merge(band_report);
            }
        }
        report
    }

    /// Gathers a band plus its halo rows into a private buffer and resolves
    /// the band's contacts there.
    fn resolve_band(
        &self,
        band: Range<usize>,
        particles: &[Particle],
        damping: f64,
    ) -> (Vec<u32>, Vec<Particle>, CollisionReport) {
        let halo = band.start.saturating_sub(1)..(band.end + 1).min(self.grid.rows());

        let mut gathered = Gathered {
            halo_start: halo.start,
            columns: self.grid.columns(),
            offsets: Vec::with_capacity(halo.len() * self.grid.columns() + 1),
            indices: Vec::new(),
            local: Vec::new(),
        };
        for row in halo {
            for column in 0..self.grid.columns() {
                gathered.offsets.push(gathered.indices.len());
                for &index in self.grid.cell(column, row) {
                    gathered.indices.push(index);
                    gathered.local.push(particles[index as usize]);
                }
            }
        }
        gathered.offsets.push(gathered.indices.len());

        let report = self.resolve_rows(band, &mut gathered, damping);
        (gathered.indices, gathered.local, report)
    }

    fn resolve_rows<S: PairSource>(&self, rows: Range<usize>, source: &mut S, damping: f64) -> CollisionReport {
        let mut report = CollisionReport::default();
        for row in rows {
            for column in 0..self.grid.columns() {
                let cell = self.grid.cell(column, row);
                if cell.is_empty() {
                    continue;
                }
                for (a_pos, &a) in cell.iter().enumerate() {
                    for (c, r) in self.grid.neighbourhood(column, row) {
                        for (b_pos, &b) in self.grid.cell(c, r).iter().enumerate() {
                            if a == b {
                                continue;
                            }
                            report.pairs_checked += 1;
                            let (first, second) = source.pair(
                                (column, row, a_pos, a),
                                (c, r, b_pos, b),
                            );
                            if resolve_collision(first, second, damping) == Contact::Resolved {
                                report.resolved += 1;
                            }
                        }
                    }
                }
            }
        }
        report
    }
}

/// Cell coordinates, position within the cell, and global particle index.
type Slot = (usize, usize, usize, u32);

/// Hands out two distinct particles to resolve against each other.
trait PairSource {
    fn pair(&mut self, a: Slot, b: Slot) -> (&mut Particle, &mut Particle);
}

/// Resolves directly on the store, for the single-threaded path.
struct InPlace<'a>(&'a mut [Particle]);

impl PairSource for InPlace<'_> {
    fn pair(&mut self, a: Slot, b: Slot) -> (&mut Particle, &mut Particle) {
        pair_mut(self.0, a.3 as usize, b.3 as usize)
    }
}

/// A band's private copy of the particles in its rows and halo, laid out
/// cell by cell in row-major order.
struct Gathered {
    halo_start: usize,
    columns: usize,
    /// Start of each halo cell in `local`, plus a final end marker
    offsets: Vec<usize>,
    indices: Vec<u32>,
    local: Vec<Particle>,
}

impl Gathered {
    fn local_index(&self, (column, row, position, _): Slot) -> usize {
        self.offsets[(row - self.halo_start) * self.columns + column] + position
    }
}

impl PairSource for Gathered {
    fn pair(&mut self, a: Slot, b: Slot) -> (&mut Particle, &mut Particle) {
        let (i, j) = (self.local_index(a), self.local_index(b));
        pair_mut(&mut self.local, i, j)
    }
}

/// Two distinct mutable elements of one slice.
fn pair_mut(particles: &mut [Particle], i: usize, j: usize) -> (&mut Particle, &mut Particle) {
    debug_assert_ne!(i, j);
    if i < j {
        let (head, tail) = particles.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = particles.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}
