//! Single cross-section estimator trait definitions.

use ndarray::Array1;
use xsection_primitives::MarketValueWeights;

/// Errors that can occur during estimation.
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    /// Dimension mismatch in input data.
    #[error("dimension mismatch for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
        /// Context description.
        context: String,
    },

    /// Insufficient data for estimation.
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations.
        required: usize,
        /// Actual number of observations.
        actual: usize,
    },

    /// Explanatory variable has no variance.
    #[error("explanatory variable has zero variance")]
    ZeroVariance,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Linear algebra error.
    #[error("linear algebra error: {0}")]
    LinearAlgebra(String),

    /// Iterative fit did not converge.
    #[error("no convergence after {0} iterations")]
    NoConvergence(usize),
}

impl EstimatorError {
    /// Returns whether this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidConfig(_) | Self::DimensionMismatch { .. })
    }

    /// Returns whether the input cross-section itself is degenerate.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        matches!(self, Self::InsufficientData { .. } | Self::ZeroVariance)
    }
}

/// Slope estimate of a single-regressor fit with intercept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeEstimate {
    /// Fitted intercept.
    pub intercept: f64,
    /// Fitted slope.
    pub slope: f64,
    /// Standard error of the slope.
    pub slope_se: f64,
    /// t-statistic of the slope.
    pub t_value: f64,
    /// Number of observations in the fit.
    pub n_obs: usize,
}

/// Trait for fitting `y = a + b * x` on one cross-section.
pub trait CrossSectionEstimator: Send + Sync {
    /// Fit the regression.
    ///
    /// # Arguments
    /// * `x` - Explanatory variable (n,)
    /// * `y` - Response (n,)
    /// * `weights` - Market value weights (n,); ignored by unweighted estimators
    ///
    /// # Errors
    /// Returns `EstimatorError` if dimensions mismatch, the cross-section is
    /// degenerate, or the fit fails.
    fn fit(
        &self,
        x: &Array1<f64>,
        y: &Array1<f64>,
        weights: &MarketValueWeights,
    ) -> Result<SlopeEstimate, EstimatorError>;

    /// Short name of the estimator.
    fn name(&self) -> &str;
}
