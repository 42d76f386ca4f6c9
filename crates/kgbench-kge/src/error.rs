use thiserror::Error;

/// Errors that can occur in kgbench-kge.
#[derive(Error, Debug)]
pub enum Error {
    /// Embedding width cannot be split into real and imaginary halves.
    #[error("Embedding width {0} is odd; complex embeddings need an even width")]
    OddDimension(usize),
    /// Batch sizes or widths are inconsistent for the requested operation.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    /// Array construction or reshape failed.
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    /// Combination mode string not recognised.
    #[error("Unsupported combination mode: {0}")]
    UnsupportedCombine(String),
    /// Entity or relation index out of range.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for kgbench-kge.
pub type Result<T> = std::result::Result<T, Error>;
