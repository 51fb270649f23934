//! Uniform bucket grid over the simulated area.
//!
//! Cells are squares of a fixed side, stored row-major. Each cell holds the
//! indices of the particles whose position falls inside it. Both collision
//! detection and the coarse-grid gravity backend sit on top of this.

use nalgebra::Point2;

#[derive(Debug, Clone)]
pub struct UniformGrid {
    cell_size: f64,
    columns: usize,
    rows: usize,
    cells: Vec<Vec<u32>>,
}

impl UniformGrid {
    /// Covers `[0, width) × [0, height)` with `⌈width / cell⌉ × ⌈height / cell⌉`
    /// cells (at least one of each).
    pub fn new(width: f64, height: f64, cell_size: f64) -> Self {
        let columns = cells_along(width, cell_size);
        let rows = cells_along(height, cell_size);
        UniformGrid {
            cell_size,
            columns,
            rows,
            cells: vec![Vec::new(); columns * rows],
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column and row of the cell containing `position`, or `None` outside
    /// the grid (NaN included).
    pub fn cell_of(&self, position: &Point2<f64>) -> Option<(usize, usize)> {
        if !(position.x >= 0.0 && position.y >= 0.0) {
            return None;
        }
        let column = (position.x / self.cell_size) as usize;
        let row = (position.y / self.cell_size) as usize;
        (column < self.columns && row < self.rows).then_some((column, row))
    }

    /// Empties every cell and buckets `positions` by index. Returns how many
    /// were placed; positions outside the grid are left out.
    pub fn rebuild<'a, I>(&mut self, positions: I) -> usize
    where
        I: IntoIterator<Item = &'a Point2<f64>>,
    {
        for cell in &mut self.cells {
            cell.clear();
        }
        let mut placed = 0;
        for (index, position) in positions.into_iter().enumerate() {
            if let Some((column, row)) = self.cell_of(position) {
                self.cells[row * self.columns + column].push(index as u32);
                placed += 1;
            }
        }
        placed
    }

    /// Indices in one cell. Panics on out-of-range coordinates.
    pub fn cell(&self, column: usize, row: usize) -> &[u32] {
        &self.cells[row * self.columns + column]
    }

    /// Coordinates of the up-to-nine cells around and including
    /// `(column, row)`, clipped at the grid edges.
    pub fn neighbourhood(&self, column: usize, row: usize) -> impl Iterator<Item = (usize, usize)> + use<> {
        let (columns, rows) = (self.columns, self.rows);
        let c_lo = column.saturating_sub(1);
        let c_hi = (column + 1).min(columns - 1);
        let r_lo = row.saturating_sub(1);
        let r_hi = (row + 1).min(rows - 1);
        (r_lo..=r_hi).flat_map(move |r| (c_lo..=c_hi).map(move |c| (c, r)))
    }
}

fn cells_along(extent: f64, cell_size: f64) -> usize {
    ((extent / cell_size).ceil() as usize).max(1)
}
