use ndarray::Array2;

use crate::types::{Field, Point, PointGrid, Value};

/// Direction the fractal relief takes relative to the XY plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SurfaceMode {
    /// Heights rise above the plane.
    #[default]
    Extrude,
    /// Heights are negated and sink below the plane.
    Inset,
}

impl SurfaceMode {
    fn sign(self) -> Value {
        match self {
            Self::Extrude => 1.,
            Self::Inset => -1.,
        }
    }
}

/// Lays a field out as surface points centered on the origin.
///
/// ```text
/// (i, j)  →  (i - W/2,  j - H/2,  ±field[i][j] * vertical_scale)
/// ```
///
/// where `W × H` is the cell count, one less than the field dimensions.
pub fn point_grid(field: &Field, vertical_scale: Value, mode: SurfaceMode) -> PointGrid {
    let (nx, ny) = field.dim();
    let half_w = nx.saturating_sub(1) as Value / 2.;
    let half_h = ny.saturating_sub(1) as Value / 2.;
    let sign = mode.sign();
    Array2::from_shape_fn((nx, ny), |(i, j)| {
        Point::new(
            i as Value - half_w,
            j as Value - half_h,
            sign * field[[i, j]] as Value * vertical_scale,
        )
    })
}

/// Number of cells `(W, H)` spanned by a point grid.
pub fn cell_dims(grid: &PointGrid) -> (usize, usize) {
    let (nx, ny) = grid.dim();
    (nx.saturating_sub(1), ny.saturating_sub(1))
}
