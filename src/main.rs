//! fractal-stl - render a Julia or Mandelbrot escape-time field as a printable STL solid.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use fractal_stl::{
    PipelineConfig,
    field::Fractal,
    grid::SurfaceMode,
    progress::TracingProgress,
    simplify::Simplification,
    window::Window,
};

#[derive(Parser, Debug)]
#[command(name = "fractal-stl")]
#[command(about = "Generate a watertight STL solid from an escape-time fractal", long_about = None)]
struct Cli {
    /// Output STL file path
    #[arg(short, long)]
    output: PathBuf,

    /// Left edge of the complex-plane window
    #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
    x_min: f64,

    /// Right edge of the complex-plane window
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    x_max: f64,

    /// Bottom edge of the complex-plane window
    #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
    y_min: f64,

    /// Top edge of the complex-plane window
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    y_max: f64,

    /// Grid cells along X
    #[arg(long, default_value_t = 300)]
    width: usize,

    /// Grid cells along Y
    #[arg(long, default_value_t = 300)]
    height: usize,

    /// Real part of the Julia constant
    #[arg(long, default_value_t = -0.21, allow_hyphen_values = true)]
    julia_real: f64,

    /// Imaginary part of the Julia constant
    #[arg(long, default_value_t = -0.70, allow_hyphen_values = true)]
    julia_imaginary: f64,

    /// Sample the Mandelbrot set instead of a Julia set
    #[arg(long)]
    mandelbrot: bool,

    /// Iteration cap
    #[arg(long, default_value_t = 40)]
    iterations: u32,

    /// Subtracted from every escape step, clamped at zero
    #[arg(long, default_value_t = 0)]
    floor: u32,

    /// Height of one iteration step
    #[arg(long, default_value_t = 0.1, allow_hyphen_values = true)]
    vertical_scale: f64,

    /// Depth of the flat base below z = 0
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    base_height: f64,

    /// Raise the relief above the base or sink it below
    #[arg(long, value_enum, default_value_t = Mode::Extrude)]
    mode: Mode,

    /// Emit one quad per cell instead of merging flat regions
    #[arg(long)]
    no_simplify: bool,

    /// Print debug information
    #[arg(long)]
    debug: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Extrude,
    Inset,
}

impl From<Mode> for SurfaceMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Extrude => SurfaceMode::Extrude,
            Mode::Inset => SurfaceMode::Inset,
        }
    }
}

impl Cli {
    fn config(&self) -> PipelineConfig {
        let fractal = if self.mandelbrot {
            Fractal::Mandelbrot
        } else {
            Fractal::Julia {
                real: self.julia_real,
                imaginary: self.julia_imaginary,
            }
        };
        let simplification = if self.no_simplify {
            Simplification::Disabled
        } else {
            Simplification::Greedy
        };

        PipelineConfig::default()
            .with_window(Window::new(self.x_min, self.x_max, self.y_min, self.y_max))
            .with_grid(self.width, self.height)
            .with_fractal(fractal)
            .with_iterations(self.iterations, self.floor)
            .with_vertical_scale(self.vertical_scale)
            .with_base_height(self.base_height)
            .with_mode(self.mode.into())
            .with_simplification(simplification)
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    if let Err(err) = execute(&cli) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn execute(cli: &Cli) -> Result<()> {
    let config = cli.config();
    let summary = fractal_stl::run(&config, &cli.output, &mut TracingProgress::default())
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    tracing::info!(
        "wrote {} triangles ({} surface squares, {} bytes)",
        summary.triangles,
        summary.squares,
        summary.bytes
    );
    Ok(())
}
