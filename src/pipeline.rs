use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use tracing::info;

use crate::{
    error::{FractalStlError, Result},
    field::{FieldGenerator, Fractal},
    grid::{SurfaceMode, point_grid},
    mesh::MeshBuilder,
    progress::{ProgressObserver, Stage},
    simplify::Simplification,
    stl::{MeshWriter, file_len},
    types::{Field, PointGrid, Value},
    window::Window,
};

/// Every parameter of a field-to-STL run.
///
/// `Default` matches the command-line defaults:
///
/// ```rust,ignore
/// let config = PipelineConfig::default()
///     .with_grid(600, 400)
///     .with_mode(SurfaceMode::Inset);
/// config.validate()?;
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub window: Window,
    /// Cells along X.
    pub grid_width: usize,
    /// Cells along Y.
    pub grid_height: usize,
    pub fractal: Fractal,
    /// Iteration cap; bounded points store this value.
    pub iterations: u32,
    /// Subtracted from the escape step of escaping points, clamped at zero.
    pub floor: u32,
    /// Height of one iteration step.
    pub vertical_scale: Value,
    /// Depth of the floor plane below `z = 0`.
    pub base_height: Value,
    pub mode: SurfaceMode,
    pub simplification: Simplification,
    /// XY point the base triangles fan to.
    pub center: (Value, Value),
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window: Window::default(),
            grid_width: 300,
            grid_height: 300,
            fractal: Fractal::default(),
            iterations: 40,
            floor: 0,
            vertical_scale: 0.1,
            base_height: 1.,
            mode: SurfaceMode::default(),
            simplification: Simplification::default(),
            center: (0., 0.),
        }
    }
}

impl PipelineConfig {
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    pub fn with_grid(mut self, grid_width: usize, grid_height: usize) -> Self {
        self.grid_width = grid_width;
        self.grid_height = grid_height;
        self
    }

    pub fn with_fractal(mut self, fractal: Fractal) -> Self {
        self.fractal = fractal;
        self
    }

    pub fn with_iterations(mut self, iterations: u32, floor: u32) -> Self {
        self.iterations = iterations;
        self.floor = floor;
        self
    }

    pub fn with_vertical_scale(mut self, vertical_scale: Value) -> Self {
        self.vertical_scale = vertical_scale;
        self
    }

    pub fn with_base_height(mut self, base_height: Value) -> Self {
        self.base_height = base_height;
        self
    }

    pub fn with_mode(mut self, mode: SurfaceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_simplification(mut self, simplification: Simplification) -> Self {
        self.simplification = simplification;
        self
    }

    pub fn with_center(mut self, x_center: Value, y_center: Value) -> Self {
        self.center = (x_center, y_center);
        self
    }

    /// Z of the floor plane.
    pub fn floor_value(&self) -> Value {
        -self.base_height
    }

    /// Upper bound on the triangle count: `2·W·H + 6·W + 6·H`.
    ///
    /// `None` when it does not fit the u32 count of a binary STL header.
    pub fn max_triangles(&self) -> Option<u32> {
        let (w, h) = (self.grid_width, self.grid_height);
        let surface = w.checked_mul(h)?.checked_mul(2)?;
        let skirts = w.checked_add(h)?.checked_mul(6)?;
        u32::try_from(surface.checked_add(skirts)?).ok()
    }

    /// Rejects parameters that would make generation or output meaningless.
    pub fn validate(&self) -> Result<()> {
        let invalid_grid = FractalStlError::InvalidGrid {
            width: self.grid_width,
            height: self.grid_height,
        };
        if self.grid_width == 0 || self.grid_height == 0 || self.max_triangles().is_none() {
            return Err(invalid_grid);
        }
        if self.iterations == 0 {
            return Err(FractalStlError::InvalidIterations);
        }
        if self.floor > self.iterations {
            return Err(FractalStlError::FloorAboveIterations {
                floor: self.floor,
                iterations: self.iterations,
            });
        }
        if !self.window.is_finite() {
            return Err(FractalStlError::NonFiniteParameter("window"));
        }
        if let Fractal::Julia { real, imaginary } = self.fractal {
            if !(real.is_finite() && imaginary.is_finite()) {
                return Err(FractalStlError::NonFiniteParameter("julia constant"));
            }
        }
        let reals = [
            ("vertical scale", self.vertical_scale),
            ("base height", self.base_height),
            ("center x", self.center.0),
            ("center y", self.center.1),
        ];
        if let Some(&(name, _)) = reals.iter().find(|(_, v)| !v.is_finite()) {
            return Err(FractalStlError::NonFiniteParameter(name));
        }
        Ok(())
    }

    /// Generates the escape-time field.
    pub fn field(&self) -> Field {
        FieldGenerator::new(self.window).generate_fractal(
            self.fractal,
            self.grid_width,
            self.grid_height,
            self.iterations,
            self.floor,
        )
    }
}

/// What a completed run produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub triangles: u32,
    /// Accepted top-surface squares.
    pub squares: usize,
    pub bytes: usize,
}

/// Runs the whole pipeline into `path`.
///
/// Parameters are validated before the file is created, so invalid input
/// leaves nothing on disk. The file is created before the field is
/// generated, so an unwritable destination fails without any work done.
pub fn run(config: &PipelineConfig, path: impl AsRef<Path>, observer: &mut dyn ProgressObserver) -> Result<RunSummary> {
    config.validate()?;
    let path = path.as_ref();
    let out = BufWriter::new(File::create(path)?);

    let field = generate(config, observer);
    let grid = point_grid(&field, config.vertical_scale, config.mode);
    let builder = mesh_builder(config, &grid);
    let declared = builder.header_count()?;

    info!("writing {declared} triangles to {}", path.display());
    let writer = MeshWriter::open(out, declared)?;
    let (_, summary) = write_solid(&builder, writer, observer)?;
    Ok(summary)
}

/// Runs the whole pipeline into an arbitrary writer and hands it back.
pub fn run_to_writer<W: Write>(
    config: &PipelineConfig,
    out: W,
    observer: &mut dyn ProgressObserver,
) -> Result<(W, RunSummary)> {
    config.validate()?;
    let field = generate(config, observer);
    let grid = point_grid(&field, config.vertical_scale, config.mode);
    let builder = mesh_builder(config, &grid);
    let writer = MeshWriter::open(out, builder.header_count()?)?;
    write_solid(&builder, writer, observer)
}

fn generate(config: &PipelineConfig, observer: &mut dyn ProgressObserver) -> Field {
    observer.stage_started(Stage::Field);
    let field = config.field();
    observer.stage_finished(Stage::Field, 0);
    field
}

fn mesh_builder<'a>(config: &PipelineConfig, grid: &'a PointGrid) -> MeshBuilder<'a> {
    MeshBuilder::new(grid, config.simplification)
        .with_floor(config.floor_value())
        .with_center(config.center.0, config.center.1)
}

fn write_solid<W: Write>(
    builder: &MeshBuilder,
    mut writer: MeshWriter<W>,
    observer: &mut dyn ProgressObserver,
) -> Result<(W, RunSummary)> {
    builder.build(observer, |t| writer.emit(t))?;
    let triangles = writer.written();
    let out = writer.finish()?;
    let summary = RunSummary {
        triangles,
        squares: builder.surface().len(),
        bytes: file_len(triangles),
    };
    Ok((out, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{progress::RecordingProgress, stl::read_count};

    #[test]
    fn defaults_match_command_line() {
        let config = PipelineConfig::default();
        assert_eq!(config.window, Window::new(-1., 1., -1., 1.));
        assert_eq!((config.grid_width, config.grid_height), (300, 300));
        assert_eq!(
            config.fractal,
            Fractal::Julia {
                real: -0.21,
                imaginary: -0.70
            }
        );
        assert_eq!((config.iterations, config.floor), (40, 0));
        assert_eq!(config.floor_value(), -1.);
        assert_eq!(config.mode, SurfaceMode::Extrude);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_input_is_rejected() {
        let base = PipelineConfig::default();
        let cases = [
            base.clone().with_grid(0, 10),
            base.clone().with_iterations(0, 0),
            base.clone().with_iterations(5, 6),
            base.clone().with_window(Window::new(-1., Value::INFINITY, -1., 1.)),
            base.clone().with_base_height(Value::NAN),
            base.clone().with_fractal(Fractal::Julia {
                real: Value::NAN,
                imaginary: 0.,
            }),
        ];
        for config in cases {
            let err = config.validate().unwrap_err();
            assert!(err.is_invalid_input(), "{err}");
        }
    }

    #[test]
    fn oversized_grid_is_rejected_before_allocation() {
        for (w, h) in [(usize::MAX, 1), (1, usize::MAX), (100_000, 100_000)] {
            let config = PipelineConfig::default().with_grid(w, h);
            assert!(config.max_triangles().is_none());
            let err = config.validate().unwrap_err();
            assert!(matches!(err, FractalStlError::InvalidGrid { .. }), "{err}");
            assert!(run_to_writer(&config, Vec::new(), &mut ()).is_err());
        }
    }

    #[test]
    fn max_triangles_matches_unsimplified_formula() {
        let config = PipelineConfig::default().with_grid(4, 4);
        assert_eq!(config.max_triangles(), Some(80));
    }

    #[test]
    fn unwritable_destination_fails_before_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.stl");
        let config = PipelineConfig::default().with_grid(4, 4);
        let mut progress = RecordingProgress::default();

        let err = run(&config, &path, &mut progress).unwrap_err();
        assert!(matches!(err, FractalStlError::Io(_)));
        assert!(progress.events.iter().all(|(stage, _)| *stage != Stage::Field));
    }

    #[test]
    fn floor_equal_to_iterations_is_allowed() {
        assert!(PipelineConfig::default().with_iterations(5, 5).validate().is_ok());
    }

    #[test]
    fn in_memory_run_reports_every_stage() {
        let config = PipelineConfig::default()
            .with_grid(4, 4)
            .with_iterations(5, 0);
        let mut progress = RecordingProgress::default();
        let (bytes, summary) = run_to_writer(&config, Vec::new(), &mut progress).unwrap();

        assert_eq!(summary.triangles, 80);
        assert_eq!(summary.squares, 16);
        assert_eq!(bytes.len(), summary.bytes);
        assert_eq!(read_count(&bytes), Some(80));
        let stages: Vec<Stage> = progress.events.iter().map(|(s, _)| *s).collect();
        assert_eq!(
            stages,
            [Stage::Field, Stage::Field, Stage::Surface, Stage::Surface, Stage::Skirts, Stage::Skirts]
        );
    }
}
