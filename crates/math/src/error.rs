//! Error types for mathematical operations.

use xsection_traits::{EstimatorError, TransformError};

/// Errors that can occur during mathematical operations.
#[derive(Debug, thiserror::Error)]
pub enum MathError {
    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Linear algebra error.
    #[error("linear algebra error: {0}")]
    LinearAlgebra(String),

    /// Empty data.
    #[error("empty data provided")]
    EmptyData,

    /// Too few observations for the requested statistic.
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations.
        required: usize,
        /// Actual number of observations.
        actual: usize,
    },

    /// Input has zero variance.
    #[error("zero variance")]
    ZeroVariance,

    /// A regression weight is missing or non-positive.
    #[error("non-positive weight at row {0}")]
    NonPositiveWeight(usize),

    /// Boundary compression cannot be evaluated.
    #[error("degenerate outlier boundary: {0}")]
    DegenerateBoundary(String),

    /// Invalid parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Robust residual scale is zero on an inexact fit.
    #[error("robust residual scale collapsed to zero")]
    ScaleCollapse,

    /// Iterative fit did not converge.
    #[error("no convergence after {0} iterations")]
    NoConvergence(usize),
}

impl From<MathError> for TransformError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::EmptyData => Self::EmptyData,
            MathError::InvalidParameter(msg) => Self::InvalidParameter(msg),
            other => Self::Degenerate(other.to_string()),
        }
    }
}

impl From<MathError> for EstimatorError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::DimensionMismatch { expected, actual } => {
                Self::DimensionMismatch { expected, actual, context: "regression input".into() }
            }
            MathError::EmptyData => Self::InsufficientData { required: 1, actual: 0 },
            MathError::InsufficientData { required, actual } => {
                Self::InsufficientData { required, actual }
            }
            MathError::ZeroVariance => Self::ZeroVariance,
            MathError::NoConvergence(iters) => Self::NoConvergence(iters),
            MathError::InvalidParameter(msg) => Self::InvalidConfig(msg),
            other => Self::LinearAlgebra(other.to_string()),
        }
    }
}
