//! Cross-sectional slope regression.

use ndarray::Array1;
use xsection_math::{HuberConfig, huber_fit, ols_fit, spearman, wls_fit};
use xsection_primitives::MarketValueWeights;
use xsection_traits::{CrossSectionEstimator, EstimatorError, SlopeEstimate};

use crate::{ModelError, ModelType};

fn check_lengths(
    x: &Array1<f64>,
    y: &Array1<f64>,
    weights: &MarketValueWeights,
) -> Result<(), EstimatorError> {
    for (context, actual) in [("response", y.len()), ("weights", weights.len())] {
        if actual != x.len() {
            return Err(EstimatorError::DimensionMismatch {
                expected: x.len(),
                actual,
                context: context.to_string(),
            });
        }
    }
    Ok(())
}

/// Ordinary least squares slope estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OlsEstimator;

impl CrossSectionEstimator for OlsEstimator {
    fn fit(
        &self,
        x: &Array1<f64>,
        y: &Array1<f64>,
        weights: &MarketValueWeights,
    ) -> Result<SlopeEstimate, EstimatorError> {
        check_lengths(x, y, weights)?;
        Ok(ols_fit(x, y)?)
    }

    fn name(&self) -> &str {
        "ols"
    }
}

/// Market-value weighted least squares slope estimator.
///
/// Every weight must be positive; rows with missing or non-positive market
/// value are expected to be dropped before fitting.
#[derive(Debug, Clone, Copy, Default)]
pub struct WlsEstimator;

impl CrossSectionEstimator for WlsEstimator {
    fn fit(
        &self,
        x: &Array1<f64>,
        y: &Array1<f64>,
        weights: &MarketValueWeights,
    ) -> Result<SlopeEstimate, EstimatorError> {
        check_lengths(x, y, weights)?;
        Ok(wls_fit(x, y, weights.raw())?)
    }

    fn name(&self) -> &str {
        "wls"
    }
}

/// Huber robust slope estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct HuberEstimator {
    config: HuberConfig,
}

impl HuberEstimator {
    /// Create a new estimator.
    #[must_use]
    pub const fn new(config: HuberConfig) -> Self {
        Self { config }
    }

    /// Get the Huber settings.
    #[must_use]
    pub const fn config(&self) -> &HuberConfig {
        &self.config
    }
}

impl CrossSectionEstimator for HuberEstimator {
    fn fit(
        &self,
        x: &Array1<f64>,
        y: &Array1<f64>,
        weights: &MarketValueWeights,
    ) -> Result<SlopeEstimate, EstimatorError> {
        check_lengths(x, y, weights)?;
        Ok(huber_fit(x, y, &self.config)?)
    }

    fn name(&self) -> &str {
        "rlm"
    }
}

/// Fit details of one cross-section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossSectionFit {
    /// Slope estimate.
    pub estimate: SlopeEstimate,
    /// Spearman rank correlation between factor and response.
    pub ic: f64,
}

/// Fits `excess_return = a + loading * factor` on one joined cross-section.
pub struct CrossSectionRegressor {
    estimator: Box<dyn CrossSectionEstimator>,
}

impl std::fmt::Debug for CrossSectionRegressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossSectionRegressor").field("estimator", &self.estimator.name()).finish()
    }
}

impl CrossSectionRegressor {
    /// Create a regressor around any estimator.
    #[must_use]
    pub fn new(estimator: Box<dyn CrossSectionEstimator>) -> Self {
        Self { estimator }
    }

    /// Create the regressor for a model choice.
    #[must_use]
    pub fn for_model(model: ModelType, huber: HuberConfig) -> Self {
        match model {
            ModelType::Ols => Self::new(Box::new(OlsEstimator)),
            ModelType::Wls => Self::new(Box::new(WlsEstimator)),
            ModelType::Rlm => Self::new(Box::new(HuberEstimator::new(huber))),
        }
    }

    /// Name of the underlying estimator.
    #[must_use]
    pub fn name(&self) -> &str {
        self.estimator.name()
    }

    /// Fit one cross-section.
    ///
    /// # Arguments
    /// * `factor` - Standardized factor values (n,)
    /// * `excess_return` - Excess returns (n,)
    /// * `weights` - Market values (n,)
    ///
    /// # Errors
    /// Returns `ModelError::DegenerateGroup` below three rows or for a
    /// constant factor, and `ModelError::ModelFit` if the fit fails.
    pub fn fit(
        &self,
        factor: &Array1<f64>,
        excess_return: &Array1<f64>,
        weights: &MarketValueWeights,
    ) -> Result<CrossSectionFit, ModelError> {
        let estimate = self.estimator.fit(factor, excess_return, weights)?;
        let ic = spearman(factor, excess_return);
        Ok(CrossSectionFit { estimate, ic })
    }
}
