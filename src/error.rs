use derive_more::{Display, From};

pub type Result<T> = core::result::Result<T, FractalStlError>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum FractalStlError {
    /// Grid resolution with a zero dimension.
    InvalidGrid { width: usize, height: usize },
    /// Iteration floor larger than the iteration cap.
    FloorAboveIterations { floor: u32, iterations: u32 },
    /// Iteration cap of zero.
    InvalidIterations,
    /// A real-valued parameter that is NaN or infinite.
    NonFiniteParameter(&'static str),
    /// The destination could not be created or written.
    #[from]
    Io(std::io::Error),
    /// Triangles emitted do not match the count declared in the header.
    TriangleCountMismatch { declared: u32, written: u32 },
}

impl std::error::Error for FractalStlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl FractalStlError {
    /// Returns `true` for errors caused by caller-supplied parameters.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidGrid { .. }
                | Self::FloorAboveIterations { .. }
                | Self::InvalidIterations
                | Self::NonFiniteParameter(_)
        )
    }
}
