//! Cross-sectional transformation trait definitions.

use ndarray::Array1;

/// Errors that can occur during transformation.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Empty input data.
    #[error("empty input data")]
    EmptyData,

    /// Invalid parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The cross-section cannot be transformed (no variance, boundary collapse).
    #[error("degenerate cross-section: {0}")]
    Degenerate(String),
}

/// Cross-sectional data transformation.
///
/// Operates on the values of one factor for one session; returns new values
/// in the same order and never mixes sessions.
pub trait CrossSectionTransform: Send + Sync {
    /// Transform one cross-section.
    ///
    /// Missing values (NaN) are passed through unchanged.
    ///
    /// # Errors
    /// Returns `TransformError::Degenerate` if the cross-section cannot be
    /// transformed meaningfully.
    fn apply(&self, values: &Array1<f64>) -> Result<Array1<f64>, TransformError>;

    /// Returns the name of this transformation.
    fn name(&self) -> &str;
}
