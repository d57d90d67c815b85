//! Cross-sectional standardization.

use ndarray::Array1;
use xsection_traits::{CrossSectionTransform, TransformError};

use crate::{MathError, nan_mean, nan_std};

/// Z-score one cross-section using the population standard deviation.
///
/// Non-finite values are ignored for the moments and passed through.
///
/// # Errors
/// Returns `MathError::EmptyData` if there is no finite value and
/// `MathError::ZeroVariance` if the finite values are all equal.
pub fn standardize(data: &Array1<f64>) -> Result<Array1<f64>, MathError> {
    let values = data.to_vec();
    let mean = nan_mean(&values);
    if mean.is_nan() {
        return Err(MathError::EmptyData);
    }
    let std = nan_std(&values, 0);
    if !(std.is_finite() && std > 0.0) {
        return Err(MathError::ZeroVariance);
    }
    Ok(data.mapv(|x| if x.is_finite() { (x - mean) / std } else { x }))
}

/// Cross-sectional z-score transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standardizer;

impl Standardizer {
    /// Create a new standardizer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CrossSectionTransform for Standardizer {
    fn apply(&self, values: &Array1<f64>) -> Result<Array1<f64>, TransformError> {
        Ok(standardize(values)?)
    }

    fn name(&self) -> &str {
        "zscore"
    }
}
