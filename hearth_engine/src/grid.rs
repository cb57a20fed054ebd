//! Boolean occupancy raster used for rejection-sampling placement.
//!
//! One grid covers one surface for the duration of one arrangement pass.
//! Cells only ever flip from free to occupied; there is deliberately no API
//! to clear a cell, so an accepted footprint can never be invalidated later
//! in the pass.

/// A 2D boolean raster over a rectangular surface at a fixed cell size.
///
/// Rows index the x axis, columns the z axis. The outermost ring of cells is
/// excluded from placement so footprints cannot clip past the surface edge.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    cells: Vec<bool>,
    rows: usize,
    cols: usize,
    cell_size: f32,
}

impl OccupancyGrid {
    /// An all-free grid of `ceil(size / cell_size)` cells per axis.
    pub fn new(size: (f32, f32), cell_size: f32) -> Self {
        let rows = (size.0 / cell_size).ceil().max(0.0) as usize;
        let cols = (size.1 / cell_size).ceil().max(0.0) as usize;
        Self {
            cells: vec![false; rows * cols],
            rows,
            cols,
            cell_size,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.cells[self.index(row, col)]
    }

    /// True for cells not on the boundary ring.
    pub fn is_interior(&self, row: usize, col: usize) -> bool {
        row > 0 && col > 0 && row + 1 < self.rows && col + 1 < self.cols
    }

    /// True if a circle of `radius` cells centered at (row, col) stays inside
    /// the grid and overlaps no occupied cell.
    pub fn circle_fits(&self, row: usize, col: usize, radius: usize) -> bool {
        if row < radius || col < radius || row + radius >= self.rows || col + radius >= self.cols {
            return false;
        }
        let r = radius as isize;
        for dr in -r..=r {
            for dc in -r..=r {
                if dr * dr + dc * dc > r * r {
                    continue;
                }
                let cell_row = (row as isize + dr) as usize;
                let cell_col = (col as isize + dc) as usize;
                if self.is_occupied(cell_row, cell_col) {
                    return false;
                }
            }
        }
        true
    }

    /// The largest radius from `radii` (sorted descending) that fits at
    /// (row, col). Bigger footprints get first claim on a cell; a cell where
    /// nothing fits is skipped by the caller, not retried.
    pub fn largest_fitting_radius(&self, row: usize, col: usize, radii: &[usize]) -> Option<usize> {
        radii
            .iter()
            .copied()
            .find(|&radius| self.circle_fits(row, col, radius))
    }

    /// Mark every cell within the circle as occupied.
    pub fn mark_circle(&mut self, row: usize, col: usize, radius: usize) {
        let r = radius as isize;
        for dr in -r..=r {
            for dc in -r..=r {
                if dr * dr + dc * dc > r * r {
                    continue;
                }
                let cell_row = row as isize + dr;
                let cell_col = col as isize + dc;
                if cell_row < 0 || cell_col < 0 {
                    continue;
                }
                let (cell_row, cell_col) = (cell_row as usize, cell_col as usize);
                if cell_row < self.rows && cell_col < self.cols {
                    let idx = self.index(cell_row, cell_col);
                    self.cells[idx] = true;
                }
            }
        }
    }

    /// Place a circular footprint if it fits; returns whether it was placed.
    pub fn try_place(&mut self, row: usize, col: usize, radius: usize) -> bool {
        if !self.is_interior(row, col) || !self.circle_fits(row, col, radius) {
            return false;
        }
        self.mark_circle(row, col, radius);
        true
    }
}
