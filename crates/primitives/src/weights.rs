//! Regression weight definitions.

use ndarray::Array1;

/// Market value weights for weighted least squares.
#[derive(Debug, Clone)]
pub struct MarketValueWeights {
    /// Raw market values.
    raw: Array1<f64>,
    /// Square root weights, applied to rows of the design.
    sqrt_weights: Array1<f64>,
}

impl MarketValueWeights {
    /// Create weights from raw market values.
    ///
    /// Non-finite or non-positive values get zero weight.
    #[must_use]
    pub fn from_raw(raw: Array1<f64>) -> Self {
        let sqrt_weights = raw.mapv(|x| if x.is_finite() && x > 0.0 { x.sqrt() } else { 0.0 });
        Self { raw, sqrt_weights }
    }

    /// Uniform weights of one.
    #[must_use]
    pub fn uniform(n: usize) -> Self {
        Self::from_raw(Array1::ones(n))
    }

    /// Get the raw market values.
    #[must_use]
    pub const fn raw(&self) -> &Array1<f64> {
        &self.raw
    }

    /// Get square root weights for WLS regression.
    #[must_use]
    pub const fn sqrt_weights(&self) -> &Array1<f64> {
        &self.sqrt_weights
    }

    /// Whether every weight is usable.
    #[must_use]
    pub fn all_positive(&self) -> bool {
        self.sqrt_weights.iter().all(|&w| w > 0.0)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}
