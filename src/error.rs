//! Error module for the grid SNN library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq)]
pub enum SNNError {
    /// Error for an invalid model or connection parameter. The message names the
    /// offending parameter so the caller can correct it and retry.
    InvalidParameter(String),
    /// Error for a connection targeting a receptor port outside the node's configured range.
    IncompatibleReceptor { receptor: usize, num_receptors: usize },
    /// Error for out of bounds access, e.g., node not found.
    OutOfBounds(String),
    /// Error for invalid operation.
    InvalidOperation(String),
    /// Error for I/O operations.
    IOError(String),
}

impl fmt::Display for SNNError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SNNError::InvalidParameter(e) => write!(f, "Invalid parameter: {}", e),
            SNNError::IncompatibleReceptor {
                receptor,
                num_receptors,
            } => write!(
                f,
                "Incompatible receptor: port {} is outside the valid range 1..={}",
                receptor, num_receptors
            ),
            SNNError::OutOfBounds(e) => write!(f, "Index out of bounds: {}", e),
            SNNError::InvalidOperation(e) => write!(f, "Invalid operation: {}", e),
            SNNError::IOError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for SNNError {}
