//! Significance aggregation across sessions.

use std::collections::BTreeMap;

use xsection_math::{nan_mean, nan_median, nan_std, ttest_1samp};
use xsection_primitives::{AggregateStat, FactorName, Horizon, RegressionResult};

/// Share of `values` whose magnitude reaches `threshold`, over all values.
fn share_at_least(values: &[f64], threshold: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().filter(|v| v.abs() >= threshold).count() as f64 / values.len() as f64
}

/// Summarize the results of one (factor, horizon) series.
fn summarize(
    factor: FactorName,
    horizon: Horizon,
    results: &[&RegressionResult],
    t_threshold: f64,
    ic_threshold: f64,
) -> AggregateStat {
    let loadings: Vec<f64> = results.iter().map(|r| r.loading).collect();
    let t_values: Vec<f64> = results.iter().map(|r| r.t_value).collect();
    let ics: Vec<f64> = results.iter().map(|r| r.ic).collect();
    let samples: Vec<f64> = results.iter().map(|r| r.sample_count as f64).collect();

    let loading_test = ttest_1samp(&loadings, 0.0);
    let t_test = ttest_1samp(&t_values, 0.0);

    AggregateStat {
        factor,
        horizon,
        n_sessions: results.len(),
        t_value_mean: nan_mean(&t_values),
        t_value_std: nan_std(&t_values, 0),
        t_gt2: share_at_least(&t_values, t_threshold),
        factor_loading_mean: nan_mean(&loadings),
        factor_loading_std: nan_std(&loadings, 0),
        factor_loading_tvalue: loading_test.statistic,
        factor_loading_pvalue: loading_test.pvalue,
        ic_mean: nan_mean(&ics),
        ic_std: nan_std(&ics, 0),
        ic_gt002: share_at_least(&ics, ic_threshold),
        ic_tvalue: t_test.statistic,
        ic_pvalue: t_test.pvalue,
        sample_count_mean: nan_mean(&samples),
        sample_count_median: nan_median(&samples),
    }
}

/// Aggregate regression results per (factor, horizon).
///
/// Standard deviations are population; the one-sample tests use the sample
/// standard deviation. The IC t-value tests the per-session slope t-values
/// against zero. Output is ordered by factor, then horizon.
#[must_use]
pub fn aggregate(
    results: &[RegressionResult],
    t_threshold: f64,
    ic_threshold: f64,
) -> Vec<AggregateStat> {
    let mut series: BTreeMap<(FactorName, Horizon), Vec<&RegressionResult>> = BTreeMap::new();
    for r in results {
        series.entry((r.factor.clone(), r.horizon)).or_default().push(r);
    }
    series
        .into_iter()
        .map(|((factor, horizon), rows)| summarize(factor, horizon, &rows, t_threshold, ic_threshold))
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use xsection_primitives::Date;

    fn result(month: u32, factor: &str, horizon: u32, value: f64, ic: f64, n: usize) -> RegressionResult {
        RegressionResult {
            session_end: Date::from_ymd_opt(2024, month, 28).unwrap(),
            factor: factor.into(),
            horizon: Horizon(horizon),
            loading: value,
            t_value: value,
            sample_count: n,
            ic,
        }
    }

    fn sample() -> Vec<RegressionResult> {
        vec![
            result(1, "PAT_M", 1, 1.0, 0.05, 100),
            result(2, "PAT_M", 1, 2.0, -0.01, 120),
            result(3, "PAT_M", 1, 3.0, 0.03, 90),
            result(4, "PAT_M", 1, -5.0, -0.02, 110),
        ]
    }

    #[test]
    fn hand_computed_summary() {
        let stats = aggregate(&sample(), 2.0, 0.02);
        assert_eq!(stats.len(), 1);
        let s = &stats[0];

        assert_eq!(s.n_sessions, 4);
        assert_relative_eq!(s.t_value_mean, 0.25, epsilon = 1e-12);
        assert_relative_eq!(s.t_value_std, 3.112_474_899_497_183, epsilon = 1e-12);
        assert_relative_eq!(s.t_gt2, 0.75);
        assert_relative_eq!(s.factor_loading_mean, 0.25, epsilon = 1e-12);
        assert_relative_eq!(s.factor_loading_std, 3.112_474_899_497_183, epsilon = 1e-12);
        assert_relative_eq!(s.factor_loading_tvalue, 0.139_121_668_728_050_5, epsilon = 1e-12);
        assert_relative_eq!(s.factor_loading_pvalue, 0.898_168_267_194_069, epsilon = 1e-6);
        assert_relative_eq!(s.ic_tvalue, s.factor_loading_tvalue, epsilon = 1e-9);
        assert_relative_eq!(s.ic_mean, 0.0125, epsilon = 1e-12);
        assert_relative_eq!(s.ic_std, 0.028_613_807_855_649, epsilon = 1e-12);
        assert_relative_eq!(s.ic_gt002, 0.75);
        assert_relative_eq!(s.sample_count_mean, 105.0, epsilon = 1e-12);
        assert_relative_eq!(s.sample_count_median, 105.0, epsilon = 1e-12);
    }

    #[test]
    fn thresholds_are_configurable() {
        let s = &aggregate(&sample(), 3.0, 0.04)[0];
        assert_relative_eq!(s.t_gt2, 0.5);
        assert_relative_eq!(s.ic_gt002, 0.25);
    }

    #[test]
    fn groups_by_factor_then_horizon() {
        let mut results = sample();
        results.push(result(1, "ROE", 1, 0.5, 0.1, 50));
        results.push(result(1, "PAT_M", 3, 0.5, 0.1, 50));

        let stats = aggregate(&results, 2.0, 0.02);
        let labels: Vec<String> = stats.iter().map(AggregateStat::label).collect();
        assert_eq!(labels, vec!["er_1m/PAT_M", "er_3m/PAT_M", "er_1m/ROE"]);

        // a single session has no sample standard deviation
        assert_eq!(stats[1].n_sessions, 1);
        assert!(stats[1].factor_loading_tvalue.is_nan());
        assert_relative_eq!(stats[1].factor_loading_std, 0.0);
    }

    #[test]
    fn empty_results() {
        assert!(aggregate(&[], 2.0, 0.02).is_empty());
    }
}
