//! Per-session factor robustification and standardization.

use ndarray::Array1;
use xsection_math::{OutlierMethod, OutlierTransformer, Standardizer};
use xsection_primitives::{CrossSection, Date, FactorName, MarketValueWeights, Symbol};
use xsection_traits::CrossSectionTransform;

use crate::ModelError;

/// One factor at one session end after robustification and standardization.
///
/// Only entities with a usable raw value are kept; `raw` is the audit trail
/// of the input.
#[derive(Debug, Clone)]
pub struct TransformedCrossSection {
    /// Session end date.
    pub session_end: Date,
    /// Factor name.
    pub factor: FactorName,
    /// Entity symbols (n,).
    pub symbols: Vec<Symbol>,
    /// Raw factor values (n,).
    pub raw: Array1<f64>,
    /// Outlier-compressed values (n,).
    pub robust: Array1<f64>,
    /// Z-scored robust values (n,).
    pub standardized: Array1<f64>,
}

impl TransformedCrossSection {
    /// Number of entities.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Standardized values as a cross-section.
    #[must_use]
    pub fn standardized_cross_section(&self) -> CrossSection {
        CrossSection::new(self.session_end, self.symbols.clone(), self.standardized.clone())
    }
}

/// Applies the drop-zero, outlier compression and z-score steps to one
/// cross-section.
#[derive(Debug, Clone, Copy)]
pub struct FactorTransformer {
    drop_zero_values: bool,
    outlier: OutlierTransformer,
    standardizer: Standardizer,
}

impl FactorTransformer {
    /// Create a new transformer.
    #[must_use]
    pub const fn new(method: OutlierMethod, drop_zero_values: bool) -> Self {
        Self { drop_zero_values, outlier: OutlierTransformer::new(method), standardizer: Standardizer::new() }
    }

    /// Transform one factor cross-section.
    ///
    /// # Errors
    /// Returns `ModelError::DegenerateGroup` if nothing usable remains, the
    /// outlier boundary is degenerate or the robust values have no variance.
    pub fn transform(
        &self,
        factor: &FactorName,
        xs: &CrossSection,
    ) -> Result<TransformedCrossSection, ModelError> {
        let drop_zero = self.drop_zero_values;
        let kept = xs.filter(|v| v.is_finite() && !(drop_zero && v == 0.0));
        if kept.is_empty() {
            return Err(ModelError::DegenerateGroup(format!(
                "{factor} has no usable value on {}",
                xs.date
            )));
        }

        let robust = self.outlier.apply(&kept.values)?;
        let standardized = self.standardizer.apply(&robust)?;
        Ok(TransformedCrossSection {
            session_end: xs.date,
            factor: factor.clone(),
            symbols: kept.symbols,
            raw: kept.values,
            robust,
            standardized,
        })
    }
}

/// Rows of one session with a complete factor value, excess return and
/// weight.
#[derive(Debug, Clone)]
pub struct JoinedCrossSection {
    /// Entity symbols (n,).
    pub symbols: Vec<Symbol>,
    /// Standardized factor values (n,).
    pub factor: Array1<f64>,
    /// Excess returns (n,).
    pub excess_return: Array1<f64>,
    /// Market value weights (n,).
    pub weights: MarketValueWeights,
}

impl JoinedCrossSection {
    /// Inner-join transformed factor values with `(symbol, excess_return, weight)` rows.
    ///
    /// Rows with a non-finite value are dropped. Non-positive weights are
    /// dropped only when `positive_weights` is set, for the weighted fit.
    pub fn join(
        transformed: &TransformedCrossSection,
        positive_weights: bool,
        returns: impl Fn(&Symbol) -> Option<(f64, f64)>,
    ) -> Self {
        let mut symbols = Vec::with_capacity(transformed.len());
        let mut factor = Vec::with_capacity(transformed.len());
        let mut excess_return = Vec::with_capacity(transformed.len());
        let mut weights = Vec::with_capacity(transformed.len());

        for (symbol, &value) in transformed.symbols.iter().zip(transformed.standardized.iter()) {
            let Some((er, weight)) = returns(symbol) else { continue };
            let complete = value.is_finite() && er.is_finite() && weight.is_finite();
            if complete && (!positive_weights || weight > 0.0) {
                symbols.push(symbol.clone());
                factor.push(value);
                excess_return.push(er);
                weights.push(weight);
            }
        }

        Self {
            symbols,
            factor: Array1::from_vec(factor),
            excess_return: Array1::from_vec(excess_return),
            weights: MarketValueWeights::from_raw(Array1::from_vec(weights)),
        }
    }

    /// Number of complete rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
