use nalgebra::{Point3, Vector3};
use ndarray::Array2;

/// Real-valued coordinate used by every geometric stage.
pub type Value = f64;

/// A 3D point with [`Value`] components.
pub type Point = Point3<Value>;

/// A 3D vector with [`Value`] components.
pub type Vector = Vector3<Value>;

/// Escape-time iteration counts, indexed `[i][j]` with `i` along X and `j` along Y.
///
/// A field over a `width × height` grid has `(width + 1) × (height + 1)` entries.
pub type Field = Array2<u32>;

/// Surface points, one per [`Field`] entry, indexed the same way.
pub type PointGrid = Array2<Point>;

/// One facet of the output solid.
///
/// `inverted` swaps the second and third vertices when the triangle is
/// written, flipping both the winding and the facet normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub vertices: [Point; 3],
    pub inverted: bool,
}

impl Triangle {
    pub fn new(a: Point, b: Point, c: Point) -> Self {
        Self {
            vertices: [a, b, c],
            inverted: false,
        }
    }

    /// Sets the inversion flag.
    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// Vertices in the order they are written, after applying `inverted`.
    pub fn oriented(&self) -> [Point; 3] {
        let [a, b, c] = self.vertices;
        if self.inverted { [a, c, b] } else { [a, b, c] }
    }

    /// Unit facet normal of the oriented triangle.
    ///
    /// Computed as `(p3 - p1) × (p2 - p1)`. A zero-area triangle yields NaN
    /// components.
    pub fn normal(&self) -> Vector {
        let [p1, p2, p3] = self.oriented();
        (p3 - p1).cross(&(p2 - p1)).normalize()
    }
}
