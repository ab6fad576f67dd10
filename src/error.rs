//! Error types shared by the density builders and the first-order engine

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DensityError {
    /// Coefficient or offset shapes that do not agree with the basis size.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Insufficient input data: {required} orbital grids required, {supplied} supplied")]
    InsufficientInputData { required: usize, supplied: usize },

    /// Grid `index` is sampled on a different geometry than grid 0.
    #[error("Geometry mismatch: grid {index} does not share the sampling geometry of grid 0")]
    GeometryMismatch { index: usize },

    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The combined value at sample `point` was NaN or infinite.
    #[error("Non-finite sample: combined value {value} at point {point}")]
    NonFiniteSample { point: usize, value: f64 },

    #[error("Worker failed: {0}")]
    WorkerFailed(String),
}

pub type Result<T> = std::result::Result<T, DensityError>;

impl From<serde_json::Error> for DensityError {
    fn from(err: serde_json::Error) -> Self {
        DensityError::InvalidConfig(err.to_string())
    }
}
