//! Error types for factor evaluation.

use xsection_math::MathError;
use xsection_panel::PanelError;
use xsection_traits::{CalendarError, EstimatorError, TransformError};

/// Errors that can occur during factor evaluation.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Trading calendar has no open date where one is required.
    #[error(transparent)]
    DataGap(#[from] CalendarError),

    /// Cross-section cannot support a transform or fit.
    #[error("degenerate group: {0}")]
    DegenerateGroup(String),

    /// Fit failed on a usable cross-section.
    #[error("model fit failed: {0}")]
    ModelFit(String),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Panel loading error.
    #[error("panel error: {0}")]
    Panel(#[from] PanelError),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl ModelError {
    /// Returns whether this error skips one group rather than aborting a run.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::DegenerateGroup(_) | Self::ModelFit(_))
    }
}

impl From<TransformError> for ModelError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::InvalidParameter(msg) => Self::Config(msg),
            other => Self::DegenerateGroup(other.to_string()),
        }
    }
}

impl From<EstimatorError> for ModelError {
    fn from(err: EstimatorError) -> Self {
        if err.is_degenerate() {
            Self::DegenerateGroup(err.to_string())
        } else if err.is_recoverable() {
            Self::ModelFit(err.to_string())
        } else {
            Self::Config(err.to_string())
        }
    }
}
