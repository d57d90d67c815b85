//! Output tables.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{Column, DataFrame};
use xsection_primitives::{AggregateStat, Date, FactorName, Horizon, RegressionResult};

use crate::{ModelError, QuantileAnalytics, TransformedCrossSection};

const HORIZON_COLUMN: &str = "excess_return_horizon";

fn horizon_column(horizons: impl IntoIterator<Item = Horizon>) -> Column {
    Column::new(HORIZON_COLUMN.into(), horizons.into_iter().map(|h| h.er_column()).collect::<Vec<_>>())
}

fn date_column(name: &str, dates: impl IntoIterator<Item = Date>) -> Column {
    Column::new(name.into(), dates.into_iter().collect::<Vec<_>>())
}

/// `[excess_return_horizon, session_end, <factor columns>]` of one result field.
fn wide_table(
    results: &[RegressionResult],
    value: impl Fn(&RegressionResult) -> f64,
) -> Result<DataFrame, ModelError> {
    let factors: BTreeSet<&FactorName> = results.iter().map(|r| &r.factor).collect();
    let mut rows: BTreeMap<(Horizon, Date), BTreeMap<&FactorName, f64>> = BTreeMap::new();
    for r in results {
        rows.entry((r.horizon, r.session_end)).or_default().insert(&r.factor, value(r));
    }

    let mut columns = vec![
        horizon_column(rows.keys().map(|(h, _)| *h)),
        date_column("session_end", rows.keys().map(|(_, d)| *d)),
    ];
    for factor in factors {
        let values: Vec<Option<f64>> = rows.values().map(|row| row.get(factor).copied()).collect();
        columns.push(Column::new(factor.as_str().into(), values));
    }
    Ok(DataFrame::new(columns)?)
}

/// Factor loadings per horizon and session.
///
/// # Errors
/// Returns `ModelError::Polars` if the frame cannot be assembled.
pub fn loading_table(results: &[RegressionResult]) -> Result<DataFrame, ModelError> {
    wide_table(results, |r| r.loading)
}

/// Slope t-statistics per horizon and session.
///
/// # Errors
/// Returns `ModelError::Polars` if the frame cannot be assembled.
pub fn tvalue_table(results: &[RegressionResult]) -> Result<DataFrame, ModelError> {
    wide_table(results, |r| r.t_value)
}

/// Information coefficients per horizon and session.
///
/// # Errors
/// Returns `ModelError::Polars` if the frame cannot be assembled.
pub fn ic_table(results: &[RegressionResult]) -> Result<DataFrame, ModelError> {
    wide_table(results, |r| r.ic)
}

/// One row per (horizon, factor) with the significance summary.
///
/// # Errors
/// Returns `ModelError::Polars` if the frame cannot be assembled.
pub fn summary_table(stats: &[AggregateStat]) -> Result<DataFrame, ModelError> {
    let field = |name: &str, f: fn(&AggregateStat) -> f64| {
        Column::new(name.into(), stats.iter().map(f).collect::<Vec<f64>>())
    };
    Ok(DataFrame::new(vec![
        horizon_column(stats.iter().map(|s| s.horizon)),
        Column::new("factor".into(), stats.iter().map(|s| s.factor.as_str()).collect::<Vec<_>>()),
        field("t_value_mean", |s| s.t_value_mean),
        field("t_gt2", |s| s.t_gt2),
        field("factor_loading_mean", |s| s.factor_loading_mean),
        field("factor_loading_std", |s| s.factor_loading_std),
        field("factor_loading_tvalue", |s| s.factor_loading_tvalue),
        field("ic_mean", |s| s.ic_mean),
        field("ic_std", |s| s.ic_std),
        field("ic_gt002", |s| s.ic_gt002),
        field("ic_tvalue", |s| s.ic_tvalue),
        field("sample_count_mean", |s| s.sample_count_mean),
        field("sample_count_median", |s| s.sample_count_median),
    ])?)
}

/// `[excess_return_horizon, session_end, quantile, turnover]`.
///
/// # Errors
/// Returns `ModelError::Polars` if the frame cannot be assembled.
pub fn turnover_table(analytics: &QuantileAnalytics) -> Result<DataFrame, ModelError> {
    let rows = &analytics.turnover;
    Ok(DataFrame::new(vec![
        horizon_column(rows.iter().map(|r| r.horizon)),
        date_column("session_end", rows.iter().map(|r| r.session_end)),
        Column::new("quantile".into(), rows.iter().map(|r| r.bucket as u32).collect::<Vec<_>>()),
        Column::new("turnover".into(), rows.iter().map(|r| r.turnover).collect::<Vec<_>>()),
    ])?)
}

/// `[excess_return_horizon, session_end, autocorrelation]`.
///
/// # Errors
/// Returns `ModelError::Polars` if the frame cannot be assembled.
pub fn autocorrelation_table(analytics: &QuantileAnalytics) -> Result<DataFrame, ModelError> {
    let rows = &analytics.autocorrelation;
    Ok(DataFrame::new(vec![
        horizon_column(rows.iter().map(|r| r.horizon)),
        date_column("session_end", rows.iter().map(|r| r.session_end)),
        Column::new(
            "autocorrelation".into(),
            rows.iter().map(|r| r.autocorrelation).collect::<Vec<_>>(),
        ),
    ])?)
}

/// `[excess_return_horizon, session_end, quantile, mean_return]`.
///
/// # Errors
/// Returns `ModelError::Polars` if the frame cannot be assembled.
pub fn quantile_returns_table(analytics: &QuantileAnalytics) -> Result<DataFrame, ModelError> {
    let rows = &analytics.returns;
    Ok(DataFrame::new(vec![
        horizon_column(rows.iter().map(|r| r.horizon)),
        date_column("session_end", rows.iter().map(|r| r.session_end)),
        Column::new("quantile".into(), rows.iter().map(|r| r.bucket as u32).collect::<Vec<_>>()),
        Column::new("mean_return".into(), rows.iter().map(|r| r.mean_return).collect::<Vec<_>>()),
    ])?)
}

/// `[excess_return_horizon, session_end, spread]`.
///
/// # Errors
/// Returns `ModelError::Polars` if the frame cannot be assembled.
pub fn spread_table(analytics: &QuantileAnalytics) -> Result<DataFrame, ModelError> {
    let rows = &analytics.spread;
    Ok(DataFrame::new(vec![
        horizon_column(rows.iter().map(|r| r.horizon)),
        date_column("session_end", rows.iter().map(|r| r.session_end)),
        Column::new("spread".into(), rows.iter().map(|r| r.spread).collect::<Vec<_>>()),
    ])?)
}

/// `[symbol, session_end, <factor>, <factor>_Trans]` of one factor, where the
/// transformed column holds the standardized robust value.
///
/// # Errors
/// Returns `ModelError::Polars` if the frame cannot be assembled.
pub fn transformed_table(
    factor: &FactorName,
    transformed: &[TransformedCrossSection],
) -> Result<DataFrame, ModelError> {
    let sessions: Vec<&TransformedCrossSection> =
        transformed.iter().filter(|t| &t.factor == factor).collect();
    let symbols: Vec<&str> =
        sessions.iter().flat_map(|t| t.symbols.iter().map(|s| s.as_str())).collect();
    let dates = sessions.iter().flat_map(|t| std::iter::repeat_n(t.session_end, t.len()));
    let raw: Vec<f64> = sessions.iter().flat_map(|t| t.raw.iter().copied()).collect();
    let standardized: Vec<f64> =
        sessions.iter().flat_map(|t| t.standardized.iter().copied()).collect();

    Ok(DataFrame::new(vec![
        Column::new("symbol".into(), symbols),
        date_column("session_end", dates),
        Column::new(factor.as_str().into(), raw),
        Column::new(factor.transformed_column().into(), standardized),
    ])?)
}
