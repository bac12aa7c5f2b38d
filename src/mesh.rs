use crate::{
    error::{FractalStlError, Result},
    grid::cell_dims,
    progress::{ProgressObserver, Stage},
    simplify::{Simplification, Square, emit_squares, plan_surface},
    types::{Point, PointGrid, Triangle, Value},
};

/// Triangles per perimeter segment: two wall facets and one base facet.
const TRIANGLES_PER_SEGMENT: usize = 3;

/// Closes a height surface into a solid.
///
/// Emission order:
///
/// ```text
/// 1. top surface        2 triangles per accepted square
/// 2. edges along X      per segment, j = 0 then j = H:  wall, wall, base
/// 3. edges along Y      per segment, i = 0 then i = W:  wall, wall, base
/// ```
///
/// Base facets fan from each floor segment to `center`, so the floor is
/// closed without a separate pass.
///
/// The surface sweep runs at construction; [`triangle_count`](MeshBuilder::triangle_count)
/// is therefore exact before anything is emitted.
pub struct MeshBuilder<'a> {
    grid: &'a PointGrid,
    surface: Vec<Square>,
    floor_value: Value,
    center: (Value, Value),
}

impl<'a> MeshBuilder<'a> {
    /// Plans the top surface of `grid`. The floor defaults to `z = -1` under the origin.
    pub fn new(grid: &'a PointGrid, simplification: Simplification) -> Self {
        let (surface, _) = plan_surface(grid, simplification);
        Self {
            grid,
            surface,
            floor_value: -1.,
            center: (0., 0.),
        }
    }

    /// Sets the height of the floor plane.
    pub fn with_floor(mut self, floor_value: Value) -> Self {
        self.floor_value = floor_value;
        self
    }

    /// Sets the XY point the base triangles fan to.
    pub fn with_center(mut self, x_center: Value, y_center: Value) -> Self {
        self.center = (x_center, y_center);
        self
    }

    /// Accepted surface squares, in emission order.
    pub fn surface(&self) -> &[Square] {
        &self.surface
    }

    /// Exact number of triangles [`build`](MeshBuilder::build) will emit.
    pub fn triangle_count(&self) -> usize {
        let (width, height) = cell_dims(self.grid);
        self.surface.len() * 2 + 2 * TRIANGLES_PER_SEGMENT * (width + height)
    }

    /// Same as [`triangle_count`](MeshBuilder::triangle_count), checked to fit a binary STL header.
    pub fn header_count(&self) -> Result<u32> {
        let (width, height) = cell_dims(self.grid);
        u32::try_from(self.triangle_count()).map_err(|_| FractalStlError::InvalidGrid { width, height })
    }

    /// Emits every triangle of the solid in order.
    pub fn build<F>(&self, observer: &mut dyn ProgressObserver, mut emit: F) -> Result<()>
    where
        F: FnMut(Triangle) -> Result<()>,
    {
        let (width, height) = cell_dims(self.grid);
        let grid = self.grid;

        observer.stage_started(Stage::Surface);
        let surface = emit_squares(grid, &self.surface, &mut emit)?;
        observer.stage_finished(Stage::Surface, surface);

        observer.stage_started(Stage::Skirts);
        let mut skirts = 0;
        for i in 0..width {
            for (j, inverted) in [(0, false), (height, true)] {
                skirts += self.segment(grid[[i, j]], grid[[i + 1, j]], inverted, &mut emit)?;
            }
        }
        for j in 0..height {
            for (i, inverted) in [(0, true), (width, false)] {
                skirts += self.segment(grid[[i, j]], grid[[i, j + 1]], inverted, &mut emit)?;
            }
        }
        observer.stage_finished(Stage::Skirts, skirts);

        Ok(())
    }

    /// Wall quad from `a`–`b` down to the floor, plus the base facet to the center.
    ///
    /// ```text
    ///   a ───── b          surface edge
    ///   │ ╲     │
    ///   │   ╲   │
    ///   a'───── b'         floor
    ///     ╲   ╱
    ///       c              center
    /// ```
    fn segment<F>(&self, a: Point, b: Point, inverted: bool, emit: &mut F) -> Result<usize>
    where
        F: FnMut(Triangle) -> Result<()>,
    {
        let a_floor = Point::new(a.x, a.y, self.floor_value);
        let b_floor = Point::new(b.x, b.y, self.floor_value);
        let center = Point::new(self.center.0, self.center.1, self.floor_value);

        emit(Triangle::new(a, b, a_floor).with_inverted(inverted))?;
        emit(Triangle::new(b, b_floor, a_floor).with_inverted(inverted))?;
        emit(Triangle::new(a_floor, b_floor, center).with_inverted(inverted))?;
        Ok(TRIANGLES_PER_SEGMENT)
    }
}

/// Emits the closed solid for `grid` with the greedy surface.
pub fn build_solid<F>(grid: &PointGrid, floor_value: Value, x_center: Value, y_center: Value, emit: F) -> Result<()>
where
    F: FnMut(Triangle) -> Result<()>,
{
    MeshBuilder::new(grid, Simplification::Greedy)
        .with_floor(floor_value)
        .with_center(x_center, y_center)
        .build(&mut (), emit)
}
