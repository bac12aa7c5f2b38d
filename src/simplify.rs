//! Greedy square merging of the top surface.
//!
//! The sweep visits cells row-major. Every cell not yet covered anchors the
//! largest flat square that fits in the remaining grid; that square becomes
//! one quad (two triangles) and all of its cells are marked covered.
//!
//! ```text
//!  j →
//! i  A A A B       anchor (0,0) grows to 3×3, (0,3) stays 1×1,
//! ↓  A A A C       (1,3) stays 1×1, ...
//!    A A A D
//!    E F G H
//! ```
//!
//! The result is not a minimal cover, only a deterministic one.

use ndarray::Array2;
use tracing::debug;

use crate::{
    grid::cell_dims,
    types::{Point, PointGrid, Triangle},
};

/// Whether the top surface is merged into larger squares.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Simplification {
    /// Merge flat square regions with [`find_largest_square`].
    #[default]
    Greedy,
    /// One unit square per cell.
    Disabled,
}

/// An accepted `size × size` block of cells anchored at cell `(i, j)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Square {
    pub i: usize,
    pub j: usize,
    pub size: usize,
}

impl Square {
    pub fn area(&self) -> usize {
        self.size * self.size
    }

    /// Corner points `[TL, TR, BL, BR]` of the square.
    ///
    /// `TR` advances along `j`, `BL` along `i`.
    pub fn corners(&self, grid: &PointGrid) -> [Point; 4] {
        let (i, j, s) = (self.i, self.j, self.size);
        [
            grid[[i, j]],
            grid[[i, j + s]],
            grid[[i + s, j]],
            grid[[i + s, j + s]],
        ]
    }

    /// The two triangles `(TL, TR, BL)` and `(TR, BR, BL)` covering the square.
    pub fn triangles(&self, grid: &PointGrid) -> [Triangle; 2] {
        let [tl, tr, bl, br] = self.corners(grid);
        [Triangle::new(tl, tr, bl), Triangle::new(tr, br, bl)]
    }
}

/// Tracks which cells already belong to an accepted square.
///
/// Dimensions are the cell counts, one less than the point grid per axis.
#[derive(Clone, Debug)]
pub struct CoveredMask {
    cells: Array2<bool>,
}

impl CoveredMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            cells: Array2::from_elem((width, height), false),
        }
    }

    pub fn is_covered(&self, i: usize, j: usize) -> bool {
        self.cells[[i, j]]
    }

    /// Marks every cell of `square` as covered.
    pub fn cover(&mut self, square: &Square) {
        for di in 0..square.size {
            for dj in 0..square.size {
                self.cells[[square.i + di, square.j + dj]] = true;
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|&c| c)
    }

    pub fn covered_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Number of consecutive uncovered cells in row `i` starting at column `j`.
    ///
    /// Any covered cell below row `i` in those columns belongs to a square
    /// anchored above, which also covers row `i`, so this run bounds the
    /// largest square that can be placed at `(i, j)` without overlap.
    pub fn free_run(&self, i: usize, j: usize) -> usize {
        self.cells
            .row(i)
            .iter()
            .skip(j)
            .take_while(|&&c| !c)
            .count()
    }
}

/// Returns the side of the largest flat square anchored at point `(i, j)`.
///
/// Size `s` is accepted when every point on the two trailing edges of the
/// `s × s` square, corner `(i + s, j + s)` included, shares the anchor's
/// height. The first size that fails yields `max(s - 1, 1)`; if none fails
/// the result is `max_size`. A single cell is always accepted.
pub fn find_largest_square(grid: &PointGrid, i: usize, j: usize, max_size: usize) -> usize {
    let z = grid[[i, j]].z;
    for s in 1..=max_size {
        let flat = (0..=s).all(|x| grid[[i + s, j + x]].z == z && grid[[i + x, j + s]].z == z);
        if !flat {
            return (s - 1).max(1);
        }
    }
    max_size.max(1)
}

/// Sweeps the grid and returns the accepted squares in emission order,
/// along with the final coverage mask.
pub fn plan_surface(grid: &PointGrid, simplification: Simplification) -> (Vec<Square>, CoveredMask) {
    let (width, height) = cell_dims(grid);
    let mut mask = CoveredMask::new(width, height);
    let mut squares = Vec::new();

    for i in 0..width {
        for j in 0..height {
            if mask.is_covered(i, j) {
                continue;
            }
            let size = match simplification {
                Simplification::Greedy => {
                    let max_size = (width - i).min(height - j).min(mask.free_run(i, j));
                    find_largest_square(grid, i, j, max_size)
                }
                Simplification::Disabled => 1,
            };
            let square = Square { i, j, size };
            if size > 1 {
                debug!("merged {size}x{size} square at ({i}, {j})");
            }
            mask.cover(&square);
            squares.push(square);
        }
    }

    (squares, mask)
}

/// Emits two triangles per square of a precomputed sweep.
///
/// Returns the number of triangles emitted.
pub fn emit_squares<F, E>(grid: &PointGrid, squares: &[Square], mut emit: F) -> Result<usize, E>
where
    F: FnMut(Triangle) -> Result<(), E>,
{
    for square in squares {
        for triangle in square.triangles(grid) {
            emit(triangle)?;
        }
    }
    Ok(squares.len() * 2)
}

/// Runs the full greedy sweep and emits the merged surface.
///
/// Returns the number of triangles emitted.
pub fn simplify_and_emit<F, E>(grid: &PointGrid, emit: F) -> Result<usize, E>
where
    F: FnMut(Triangle) -> Result<(), E>,
{
    let (squares, _) = plan_surface(grid, Simplification::Greedy);
    emit_squares(grid, &squares, emit)
}
