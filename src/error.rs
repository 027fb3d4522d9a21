use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogLinError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid count at row {row}: {value}")]
    InvalidCount { row: usize, value: String },

    #[error("Fit failed to converge after {iterations} iterations: {message}")]
    FitConvergence { iterations: usize, message: String },

    #[error("Invalid sequence at position {position}: {message}")]
    InvalidSequence { position: usize, message: String },

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Data error: {0}")]
    DataError(String),
}

/// Type alias for Result with LogLinError
pub type Result<T> = std::result::Result<T, LogLinError>;

impl LogLinError {
    /// Create a new Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        LogLinError::Validation(message.into())
    }

    /// Create a new InvalidCount error
    pub fn invalid_count(row: usize, value: impl ToString) -> Self {
        LogLinError::InvalidCount {
            row,
            value: value.to_string(),
        }
    }

    /// Create a new FitConvergence error
    pub fn fit_convergence(iterations: usize, message: impl Into<String>) -> Self {
        LogLinError::FitConvergence {
            iterations,
            message: message.into(),
        }
    }

    /// Create a new InvalidSequence error
    pub fn invalid_sequence(position: usize, message: impl Into<String>) -> Self {
        LogLinError::InvalidSequence {
            position,
            message: message.into(),
        }
    }
}
