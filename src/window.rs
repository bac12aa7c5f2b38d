use crate::types::Value;

/// Rectangle of the complex plane sampled by the field generator.
///
/// The real axis runs along X (grid index `i`), the imaginary axis along Y
/// (grid index `j`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Window {
    x_min: Value,
    x_max: Value,
    y_min: Value,
    y_max: Value,
}

impl Default for Window {
    /// The unit square `[-1, 1] × [-1, 1]`.
    fn default() -> Self {
        Self::new(-1., 1., -1., 1.)
    }
}

impl Window {
    pub fn new(x_min: Value, x_max: Value, y_min: Value, y_max: Value) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn x_min(&self) -> Value {
        self.x_min
    }

    pub fn x_max(&self) -> Value {
        self.x_max
    }

    pub fn y_min(&self) -> Value {
        self.y_min
    }

    pub fn y_max(&self) -> Value {
        self.y_max
    }

    /// Center of the window as `(x, y)`.
    pub fn center(&self) -> (Value, Value) {
        ((self.x_min + self.x_max) / 2., (self.y_min + self.y_max) / 2.)
    }

    /// Width and height of the window as `(x, y)`.
    pub fn extent(&self) -> (Value, Value) {
        (self.x_max - self.x_min, self.y_max - self.y_min)
    }

    pub fn is_finite(&self) -> bool {
        [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Maps grid point `(i, j)` of a `grid_width × grid_height` grid onto the plane.
    ///
    /// ```text
    /// x = center_x + (extent_x / grid_width) * i - extent_x / 2
    /// ```
    ///
    /// Index `0` lands on the minimum edge and index `grid_width` on the maximum.
    #[inline]
    pub fn coordinate(&self, i: usize, j: usize, grid_width: usize, grid_height: usize) -> (Value, Value) {
        let (center_x, center_y) = self.center();
        let (extent_x, extent_y) = self.extent();
        (
            center_x + (extent_x / grid_width as Value) * i as Value - extent_x / 2.,
            center_y + (extent_y / grid_height as Value) * j as Value - extent_y / 2.,
        )
    }
}
