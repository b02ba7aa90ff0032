//! Error types for densample

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DensampleError {
    /// Invalid configuration or request (unknown class, too few classes, ...)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Mismatched array dimensions
    #[error("Shape error: {0}")]
    ShapeError(String),

    /// Malformed or unparseable input data
    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, DensampleError>;
