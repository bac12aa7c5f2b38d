use ndarray::Array2;

use crate::{
    types::{Field, Value},
    window::Window,
};

/// Squared escape radius: a point has escaped once `x² + y² > 4`.
const ESCAPE_RADIUS_SQUARED: Value = 4.;

/// Which quadratic escape-time set to sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fractal {
    /// Julia set for the constant `real + imaginary·i`; each grid point is the starting value.
    Julia { real: Value, imaginary: Value },
    /// Mandelbrot set; iteration starts at zero and each grid point is the constant.
    Mandelbrot,
}

impl Default for Fractal {
    fn default() -> Self {
        Self::Julia {
            real: -0.21,
            imaginary: -0.70,
        }
    }
}

/// Computes escape-time fields over a fixed [`Window`].
///
/// The grid is `(grid_width + 1) × (grid_height + 1)` points, inclusive of
/// both window edges. Stored values are iteration counts:
///
/// ```text
/// escaped at step n   →  max(n - floor, 0)
/// never escaped       →  iterations          (floor not applied)
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct FieldGenerator {
    window: Window,
}

impl FieldGenerator {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Samples the Julia set for the constant `(imaginary_constant, real_constant)`.
    ///
    /// `grid_width` and `grid_height` must be at least 1.
    pub fn generate(
        &self,
        grid_width: usize,
        grid_height: usize,
        imaginary_constant: Value,
        real_constant: Value,
        iterations: u32,
        floor: u32,
    ) -> Field {
        self.sample(grid_width, grid_height, iterations, floor, |x, y| {
            escape_time(x, y, imaginary_constant, real_constant, iterations)
        })
    }

    /// Samples the Mandelbrot set.
    pub fn generate_mandelbrot(
        &self,
        grid_width: usize,
        grid_height: usize,
        iterations: u32,
        floor: u32,
    ) -> Field {
        self.sample(grid_width, grid_height, iterations, floor, |x, y| {
            escape_time(0., 0., y, x, iterations)
        })
    }

    /// Dispatches on [`Fractal`].
    pub fn generate_fractal(
        &self,
        fractal: Fractal,
        grid_width: usize,
        grid_height: usize,
        iterations: u32,
        floor: u32,
    ) -> Field {
        match fractal {
            Fractal::Julia { real, imaginary } => {
                self.generate(grid_width, grid_height, imaginary, real, iterations, floor)
            }
            Fractal::Mandelbrot => self.generate_mandelbrot(grid_width, grid_height, iterations, floor),
        }
    }

    fn sample<F>(&self, grid_width: usize, grid_height: usize, iterations: u32, floor: u32, escape: F) -> Field
    where
        F: Fn(Value, Value) -> Option<u32>,
    {
        debug_assert!(grid_width >= 1 && grid_height >= 1);
        Array2::from_shape_fn((grid_width + 1, grid_height + 1), |(i, j)| {
            let (x, y) = self.window.coordinate(i, j, grid_width, grid_height);
            match escape(x, y) {
                Some(n) => n.saturating_sub(floor),
                None => iterations,
            }
        })
    }
}

/// Iterates the quadratic map from `(x, y)` and returns the step at which it escaped.
///
/// ```text
/// x' = 2xy + cx
/// y' = y² - x² + cy
/// ```
///
/// The escape test runs before each step, so a start outside the radius escapes at `0`.
/// Returns `None` if the point is still bounded after `iterations` steps.
#[inline]
pub fn escape_time(mut x: Value, mut y: Value, cx: Value, cy: Value, iterations: u32) -> Option<u32> {
    let mut x2 = x * x;
    let mut y2 = y * y;
    for n in 0..iterations {
        if x2 + y2 > ESCAPE_RADIUS_SQUARED {
            return Some(n);
        }
        x = 2. * x * y + cx;
        y = y2 - x2 + cy;
        x2 = x * x;
        y2 = y * y;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_julia(width: usize, height: usize, iterations: u32, floor: u32) -> Field {
        FieldGenerator::new(Window::default()).generate(width, height, -0.70, -0.21, iterations, floor)
    }

    #[test]
    fn field_has_inclusive_dimensions() {
        let field = unit_julia(7, 3, 20, 0);
        assert_eq!(field.dim(), (8, 4));
    }

    #[test]
    fn values_stay_within_iteration_cap() {
        for floor in [0, 3, 20] {
            let field = unit_julia(16, 16, 20, floor);
            assert!(field.iter().all(|&v| v <= 20));
        }
    }

    #[test]
    fn matches_reference_field() {
        let field = unit_julia(4, 4, 5, 0);
        let expected = [
            [2, 3, 5, 2, 1],
            [5, 5, 5, 3, 2],
            [3, 5, 5, 5, 3],
            [2, 3, 5, 5, 5],
            [1, 2, 5, 3, 2],
        ];
        for (i, row) in expected.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                assert_eq!(field[[i, j]], v, "mismatch at ({i}, {j})");
            }
        }
    }

    #[test]
    fn floor_applies_only_to_escaping_points() {
        let raw = unit_julia(4, 4, 5, 0);
        let floored = unit_julia(4, 4, 5, 2);
        for (r, f) in raw.iter().zip(floored.iter()) {
            if *r == 5 {
                assert_eq!(*f, 5);
            } else {
                assert_eq!(*f, r.saturating_sub(2));
            }
        }
    }

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(unit_julia(12, 9, 40, 1), unit_julia(12, 9, 40, 1));
    }

    #[test]
    fn escape_is_tested_before_first_step() {
        assert_eq!(escape_time(3., 0., 0., 0., 10), Some(0));
        assert_eq!(escape_time(0., 0., 0., 0., 10), None);
    }

    #[test]
    fn mandelbrot_origin_is_bounded_and_far_points_escape() {
        let generator = FieldGenerator::new(Window::new(-2., 2., -2., 2.));
        let field = generator.generate_mandelbrot(4, 4, 8, 0);
        // (0, 0) sits at grid center; (-2, -2) is a corner.
        assert_eq!(field[[2, 2]], 8);
        assert!(field[[0, 0]] < 8);
    }
}
