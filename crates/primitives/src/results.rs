//! Regression and aggregate result records.

use serde::{Deserialize, Serialize};

use crate::{Date, FactorName, Horizon, ResultKey};

/// Outcome of one cross-sectional regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Session end date.
    pub session_end: Date,
    /// Factor name.
    pub factor: FactorName,
    /// Return horizon.
    pub horizon: Horizon,
    /// Fitted slope of excess return on the standardized factor.
    pub loading: f64,
    /// t-statistic of the slope.
    pub t_value: f64,
    /// Number of complete rows in the fit.
    pub sample_count: usize,
    /// Spearman rank correlation between factor and excess return.
    pub ic: f64,
}

impl RegressionResult {
    /// Key of this result.
    #[must_use]
    pub fn key(&self) -> ResultKey {
        ResultKey::new(self.factor.clone(), self.horizon, self.session_end)
    }
}

/// Significance summary of one (factor, horizon) pair across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStat {
    /// Factor name.
    pub factor: FactorName,
    /// Return horizon.
    pub horizon: Horizon,
    /// Number of sessions aggregated.
    pub n_sessions: usize,
    /// Mean slope t-statistic.
    pub t_value_mean: f64,
    /// Standard deviation of slope t-statistics.
    pub t_value_std: f64,
    /// Fraction of sessions whose absolute t-statistic reaches the threshold.
    pub t_gt2: f64,
    /// Mean factor loading.
    pub factor_loading_mean: f64,
    /// Standard deviation of factor loadings.
    pub factor_loading_std: f64,
    /// One-sample t-statistic of loadings against zero.
    pub factor_loading_tvalue: f64,
    /// Two-sided p-value of `factor_loading_tvalue`.
    pub factor_loading_pvalue: f64,
    /// Mean IC.
    pub ic_mean: f64,
    /// Standard deviation of IC.
    pub ic_std: f64,
    /// Fraction of sessions whose absolute IC reaches the threshold.
    pub ic_gt002: f64,
    /// One-sample t-statistic of the slope t-values against zero.
    pub ic_tvalue: f64,
    /// Two-sided p-value of `ic_tvalue`.
    pub ic_pvalue: f64,
    /// Mean sample count per session.
    pub sample_count_mean: f64,
    /// Median sample count per session.
    pub sample_count_median: f64,
}

impl AggregateStat {
    /// Summary row label, e.g. `er_1m/PAT_M`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{}", self.horizon.er_column(), self.factor)
    }
}
