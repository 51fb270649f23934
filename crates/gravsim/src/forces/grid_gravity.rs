//! Short-range gravity on a coarse grid.
//!
//! Particles are bucketed into large cells and each one feels the exact
//! force of every particle in its own and the eight surrounding cells.
//! Anything farther away is ignored, which makes this a cheap local-clumping
//! model rather than an approximation of the full N-body field.

use std::time::Instant;

use nalgebra::Vector2;
use rayon::prelude::*;

use crate::error::SimError;
use crate::forces::{ForceModel, ForceReport, GravityParams, pairwise_force};
use crate::grid::UniformGrid;
use crate::particle::Particle;

pub struct GridGravity {
    grid: UniformGrid,
}

impl GridGravity {
    pub fn new(width: f64, height: f64, cell_size: f64) -> Self {
        GridGravity {
            grid: UniformGrid::new(width, height, cell_size),
        }
    }

    pub fn grid(&self) -> &UniformGrid {
        &self.grid
    }
}

impl ForceModel for GridGravity {
    fn accumulate(
        &mut self,
        particles: &mut [Particle],
        params: &GravityParams,
        threads: usize,
    ) -> Result<ForceReport, SimError> {
        let start = Instant::now();
        self.grid.rebuild(particles.iter().map(|p| &p.position));
        let sources: Vec<Particle> = particles.to_vec();
        let build = start.elapsed();

        let start = Instant::now();
        if !particles.is_empty() {
            let grid = &self.grid;
            let chunk = particles.len().div_ceil(threads.clamp(1, particles.len()));
            particles
                .par_chunks_mut(chunk)
                .enumerate()
                .for_each(|(c, block)| {
                    let offset = c * chunk;
                    for (i, particle) in block.iter_mut().enumerate() {
                        particle.force += neighbour_force(grid, &sources, offset + i, params);
                    }
                });
        }

        Ok(ForceReport {
            build,
            evaluate: start.elapsed(),
            ..Default::default()
        })
    }
}

fn neighbour_force(
    grid: &UniformGrid,
    sources: &[Particle],
    index: usize,
    params: &GravityParams,
) -> Vector2<f64> {
    let particle = &sources[index];
    let Some((column, row)) = grid.cell_of(&particle.position) else {
        return Vector2::zeros();
    };

    let mut force = Vector2::zeros();
    for (c, r) in grid.neighbourhood(column, row) {
        for &j in grid.cell(c, r) {
            if j as usize != index {
                force += pairwise_force(params, particle, &sources[j as usize]);
            }
        }
    }
    force
}
