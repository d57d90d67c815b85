//! NaN-aware summary statistics and the one-sample t-test.
//!
//! Non-finite values are dropped before handing the data to `statrs`.

use statrs::{
    distribution::{ContinuousCDF, StudentsT},
    statistics::{Data, Median, OrderStatistics, Statistics},
};

fn finite(values: &[f64]) -> impl Iterator<Item = f64> + '_ {
    values.iter().copied().filter(|v| v.is_finite())
}

/// Mean of the finite values, NaN if there are none.
#[must_use]
pub fn nan_mean(values: &[f64]) -> f64 {
    finite(values).mean()
}

/// Standard deviation of the finite values with `ddof` delta degrees of freedom.
///
/// Returns NaN when fewer than `ddof + 1` finite values are present.
#[must_use]
pub fn nan_std(values: &[f64], ddof: usize) -> f64 {
    let n = finite(values).count();
    if n <= ddof {
        return f64::NAN;
    }
    match ddof {
        0 => finite(values).population_std_dev(),
        1 => finite(values).std_dev(),
        _ => (finite(values).population_variance() * n as f64 / (n - ddof) as f64).sqrt(),
    }
}

/// Median of the finite values, NaN if there are none.
#[must_use]
pub fn nan_median(values: &[f64]) -> f64 {
    Data::new(finite(values).collect::<Vec<_>>()).median()
}

/// Quantiles of the finite values at each `tau` in `[0, 1]`.
///
/// Interpolates between order statistics (approximately median-unbiased
/// estimator), so `0` and `1` map to the minimum and maximum. Entries are NaN
/// when there is no finite value or `tau` is outside `[0, 1]`.
#[must_use]
pub fn nan_quantiles(values: &[f64], taus: &[f64]) -> Vec<f64> {
    let mut data = Data::new(finite(values).collect::<Vec<_>>());
    taus.iter().map(|&tau| data.quantile(tau)).collect()
}

/// Result of a one-sample Student t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTest {
    /// t-statistic.
    pub statistic: f64,
    /// Two-sided p-value.
    pub pvalue: f64,
    /// Degrees of freedom.
    pub df: usize,
}

impl TTest {
    const fn undefined(df: usize) -> Self {
        Self { statistic: f64::NAN, pvalue: f64::NAN, df }
    }
}

/// One-sample t-test of the finite values against `popmean`.
///
/// Uses the sample standard deviation (ddof 1). Fewer than two finite values
/// give a NaN statistic. A zero standard deviation gives an infinite statistic
/// signed like the mean difference and a p-value of zero.
#[must_use]
pub fn ttest_1samp(values: &[f64], popmean: f64) -> TTest {
    let n = finite(values).count();
    if n < 2 {
        return TTest::undefined(n.saturating_sub(1));
    }
    let df = n - 1;
    let diff = nan_mean(values) - popmean;
    let se = nan_std(values, 1) / (n as f64).sqrt();

    if se == 0.0 {
        if diff == 0.0 {
            return TTest::undefined(df);
        }
        return TTest { statistic: diff.signum() * f64::INFINITY, pvalue: 0.0, df };
    }

    let statistic = diff / se;
    let pvalue = StudentsT::new(0.0, 1.0, df as f64)
        .map(|dist| 2.0 * (1.0 - dist.cdf(statistic.abs())))
        .unwrap_or(f64::NAN);

    TTest { statistic, pvalue, df }
}
