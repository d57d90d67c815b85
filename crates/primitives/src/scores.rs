//! Cross-sectional factor values.

use ndarray::Array1;

use crate::{Date, Symbol};

/// Values of one factor for every entity sharing one session end date.
#[derive(Debug, Clone)]
pub struct CrossSection {
    /// Session end date.
    pub date: Date,
    /// Entity symbols (n_entities,).
    pub symbols: Vec<Symbol>,
    /// Factor values (n_entities,), NaN marks a missing value.
    pub values: Array1<f64>,
}

impl CrossSection {
    /// Create a new cross-section.
    #[must_use]
    pub fn new(date: Date, symbols: Vec<Symbol>, values: Array1<f64>) -> Self {
        debug_assert_eq!(symbols.len(), values.len());
        Self { date, symbols, values }
    }

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

    /// Get the value for a specific symbol.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.symbols.iter().position(|s| s.as_str() == symbol).map(|i| self.values[i])
    }

    /// Number of finite values.
    #[must_use]
    pub fn n_finite(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }

    /// Keep only entries whose value satisfies `keep`.
    #[must_use]
    pub fn filter(&self, keep: impl Fn(f64) -> bool) -> Self {
        let (symbols, values): (Vec<Symbol>, Vec<f64>) = self
            .symbols
            .iter()
            .zip(self.values.iter())
            .filter(|(_, v)| keep(**v))
            .map(|(s, v)| (s.clone(), *v))
            .unzip();
        Self::new(self.date, symbols, Array1::from_vec(values))
    }

    /// Replace the values, keeping date and symbols.
    #[must_use]
    pub fn with_values(&self, values: Array1<f64>) -> Self {
        Self::new(self.date, self.symbols.clone(), values)
    }
}
