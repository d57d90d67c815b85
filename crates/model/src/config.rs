//! Evaluation configuration.

use std::fmt;

use serde::{Deserialize, Serialize};
use xsection_math::{HuberConfig, OutlierMethod};
use xsection_primitives::Horizon;

use crate::ModelError;

/// Regression model fitted per cross-section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// Ordinary least squares.
    Ols,
    /// Market-value weighted least squares.
    #[default]
    Wls,
    /// Huber robust linear model.
    Rlm,
}

impl ModelType {
    /// Short label used in output names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ols => "ols",
            Self::Wls => "wls",
            Self::Rlm => "rlm",
        }
    }

    /// Whether the fit uses market value weights.
    #[must_use]
    pub const fn is_weighted(self) -> bool {
        matches!(self, Self::Wls)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Quantile breakpoints of the pooled standardized panel.
///
/// Deserializes from either a bucket count (`5`) or a list of breakpoints in
/// `[0, 1]` (`[0.1, 0.5, 0.9]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantiles {
    /// Equal-count buckets.
    Count(usize),
    /// Explicit breakpoints; `0` and `1` are always added.
    Breakpoints(Vec<f64>),
}

impl Quantiles {
    /// Ascending distinct quantile levels, including `0` and `1`.
    ///
    /// # Errors
    /// Returns `ModelError::Config` for a zero count or a breakpoint outside
    /// `[0, 1]`.
    pub fn levels(&self) -> Result<Vec<f64>, ModelError> {
        let mut levels = match self {
            Self::Count(0) => return Err(ModelError::Config("quantiles must be positive".into())),
            Self::Count(n) => (0..=*n).map(|k| k as f64 / *n as f64).collect(),
            Self::Breakpoints(points) => {
                if let Some(p) = points.iter().find(|p| !(0.0..=1.0).contains(*p)) {
                    return Err(ModelError::Config(format!("quantile breakpoint {p} is outside [0, 1]")));
                }
                let mut levels = points.clone();
                levels.extend([0.0, 1.0]);
                levels
            }
        };
        levels.sort_by(f64::total_cmp);
        levels.dedup();
        Ok(levels)
    }
}

/// Bucketing of standardized factor values.
///
/// Exactly one of `quantiles` and `bins` must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningConfig {
    /// Quantile breakpoints of the pooled panel.
    pub quantiles: Option<Quantiles>,
    /// Explicit ascending bucket edges.
    pub bins: Option<Vec<f64>>,
    /// Session lag for turnover and autocorrelation.
    pub lag: usize,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self { quantiles: None, bins: None, lag: 1 }
    }
}

impl BinningConfig {
    /// Check the bucketing choice.
    ///
    /// # Errors
    /// Returns `ModelError::Config` unless exactly one of `quantiles` and
    /// `bins` is set, for invalid quantiles or for a zero lag.
    pub fn validate(&self) -> Result<(), ModelError> {
        match (&self.quantiles, &self.bins) {
            (Some(_), Some(_)) => {
                return Err(ModelError::Config("set either quantiles or bins, not both".into()));
            }
            (None, None) => return Err(ModelError::Config("set one of quantiles or bins".into())),
            (Some(quantiles), None) => {
                quantiles.levels()?;
            }
            (None, Some(bins)) if bins.len() < 2 => {
                return Err(ModelError::Config("bins need at least two edges".into()));
            }
            _ => {}
        }
        if self.lag == 0 {
            return Err(ModelError::Config("lag must be at least one session".into()));
        }
        Ok(())
    }
}

/// Factor evaluation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Regression model.
    pub model: ModelType,
    /// Outlier compression method.
    pub outlier: OutlierMethod,
    /// Horizons to evaluate; every horizon of the return panel when empty.
    pub horizons: Vec<Horizon>,
    /// Drop zero factor values before robustification.
    pub drop_zero_values: bool,
    /// Absolute t-statistic counted as significant.
    pub t_threshold: f64,
    /// Absolute IC counted as significant.
    pub ic_threshold: f64,
    /// Worker threads; one runs sequentially.
    pub workers: usize,
    /// Huber settings used by [`ModelType::Rlm`].
    #[serde(skip)]
    pub huber: HuberConfig,
    /// Quantile analytics; skipped when unset.
    pub binning: Option<BinningConfig>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            model: ModelType::default(),
            outlier: OutlierMethod::default(),
            horizons: Vec::new(),
            drop_zero_values: true,
            t_threshold: 2.0,
            ic_threshold: 0.02,
            workers: 1,
            huber: HuberConfig::default(),
            binning: None,
        }
    }
}

impl EvalConfig {
    /// Check the configuration before a run.
    ///
    /// # Errors
    /// Returns `ModelError::Config` for a zero worker count, a zero horizon,
    /// a negative threshold or an invalid binning choice.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.workers == 0 {
            return Err(ModelError::Config("workers must be at least one".into()));
        }
        if self.horizons.iter().any(|h| h.get() == 0) {
            return Err(ModelError::Config("horizon must be at least one month".into()));
        }
        for (name, value) in [("t_threshold", self.t_threshold), ("ic_threshold", self.ic_threshold)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ModelError::Config(format!("{name} must be non-negative, got {value}")));
            }
        }
        if let Some(binning) = &self.binning {
            binning.validate()?;
        }
        Ok(())
    }

    /// Output name suffix, e.g. `wls_mad`.
    #[must_use]
    pub fn run_label(&self) -> String {
        format!("{}_{}", self.model, self.outlier)
    }
}
