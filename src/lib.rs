pub mod error;
pub mod field;
pub mod grid;
pub mod mesh;
pub mod pipeline;
pub mod progress;
pub mod simplify;
pub mod stl;
pub mod types;
pub mod window;

pub use error::{FractalStlError, Result};
pub use pipeline::{PipelineConfig, RunSummary, run, run_to_writer};
