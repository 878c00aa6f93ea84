//! Error types for the stringer-panel solver

use thiserror::Error;

/// Main error type for stringer-panel operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FEAError {
    #[error("Node {0} not found in model")]
    NodeNotFound(usize),

    #[error("Duplicate number {0} already exists")]
    DuplicateNumber(usize),

    #[error("Membrane did not converge after {iterations} iterations: {message}")]
    NonConvergence { iterations: usize, message: String },

    #[error("Singular flexibility matrix: {0}")]
    SingularFlexibility(String),

    #[error("Missing material parameters: {0}")]
    MissingMaterialParameters(String),

    #[error("Axial force {force} exceeds section capacity {capacity}")]
    CapacityExceeded { force: f64, capacity: f64 },

    #[error("Index {index} out of range for vector of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for stringer-panel operations
pub type FEAResult<T> = Result<T, FEAError>;
