//! Intercept plus single-slope regressions.
//!
//! All fits share the design `[1, x]` and report the slope, its standard
//! error and t-statistic. Inputs must be complete: callers drop rows with a
//! missing factor, return or weight before fitting.

use ndarray::{Array1, Array2};
use xsection_traits::SlopeEstimate;

use crate::{MathError, invert, nan_median, nan_std, weighted_least_squares};

/// Minimum rows for a slope t-statistic (two coefficients plus one residual degree of freedom).
pub const MIN_OBSERVATIONS: usize = 3;

/// Relative residual sum of squares under which a fit counts as exact.
const PERFECT_FIT_TOL: f64 = 1e-20;

/// Standard normal 0.75 quantile, normalizing the MAD of residuals.
const NORMAL_Q75: f64 = 0.674_489_750_196_081_7;

fn validate(x: &Array1<f64>, y: &Array1<f64>) -> Result<(), MathError> {
    if x.len() != y.len() {
        return Err(MathError::DimensionMismatch { expected: x.len(), actual: y.len() });
    }
    if x.len() < MIN_OBSERVATIONS {
        return Err(MathError::InsufficientData { required: MIN_OBSERVATIONS, actual: x.len() });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::InvalidParameter("regression inputs must be finite".into()));
    }
    let magnitude = x.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    if nan_std(&x.to_vec(), 0) <= f64::EPSILON * magnitude {
        return Err(MathError::ZeroVariance);
    }
    Ok(())
}

fn design(x: &Array1<f64>) -> Array2<f64> {
    let mut d = Array2::ones((x.len(), 2));
    d.column_mut(1).assign(x);
    d
}

/// Slope t-statistic, with exact fits mapped to a signed infinity.
///
/// A constant response has a zero slope and reports a zero t-statistic.
fn slope_t_value(slope: f64, se: f64, rss: f64, tss: f64) -> (f64, f64) {
    if tss <= 0.0 {
        return (0.0, 0.0);
    }
    if rss <= PERFECT_FIT_TOL * tss {
        return (slope, slope.signum() * f64::INFINITY);
    }
    (slope, slope / se)
}

fn fit_with_sqrt_weights(
    x: &Array1<f64>,
    y: &Array1<f64>,
    sqrt_weights: &Array1<f64>,
) -> Result<SlopeEstimate, MathError> {
    let result = weighted_least_squares(y, &design(x), sqrt_weights)?;
    let se = result.std_error(1);
    let (slope, t_value) =
        slope_t_value(result.coefficients[1], se, result.weighted_rss, result.weighted_tss);
    Ok(SlopeEstimate {
        intercept: result.coefficients[0],
        slope,
        slope_se: se,
        t_value,
        n_obs: x.len(),
    })
}

/// Ordinary least squares fit of `y = a + b x`.
///
/// # Errors
/// Returns `MathError::InsufficientData` below three rows,
/// `MathError::ZeroVariance` for a constant `x`, or a linear algebra error.
pub fn ols_fit(x: &Array1<f64>, y: &Array1<f64>) -> Result<SlopeEstimate, MathError> {
    validate(x, y)?;
    fit_with_sqrt_weights(x, y, &Array1::ones(x.len()))
}

/// Weighted least squares fit of `y = a + b x` with observation weights.
///
/// # Errors
/// As [`ols_fit`], plus `MathError::NonPositiveWeight` for a missing or
/// non-positive weight.
pub fn wls_fit(
    x: &Array1<f64>,
    y: &Array1<f64>,
    weights: &Array1<f64>,
) -> Result<SlopeEstimate, MathError> {
    validate(x, y)?;
    if weights.len() != x.len() {
        return Err(MathError::DimensionMismatch { expected: x.len(), actual: weights.len() });
    }
    if let Some(row) = weights.iter().position(|w| !(w.is_finite() && *w > 0.0)) {
        return Err(MathError::NonPositiveWeight(row));
    }
    fit_with_sqrt_weights(x, y, &weights.mapv(f64::sqrt))
}

/// Huber M-estimation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HuberConfig {
    /// Tuning constant of the Huber loss.
    pub tuning: f64,
    /// Maximum IRLS iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the coefficient change.
    pub tol: f64,
}

impl Default for HuberConfig {
    fn default() -> Self {
        Self { tuning: 1.345, max_iter: 50, tol: 1e-8 }
    }
}

/// Residual scale `median(|r|) / 0.6745`.
fn mad_scale(residuals: &Array1<f64>) -> f64 {
    let abs: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
    nan_median(&abs) / NORMAL_Q75
}

/// Robust fit of `y = a + b x` under Huber loss.
///
/// Iteratively reweighted least squares starting from OLS, with the scale
/// re-estimated from the residual MAD each iteration. The slope standard
/// error uses the Huber H1 sandwich covariance.
///
/// # Errors
/// As [`ols_fit`], plus `MathError::NoConvergence` if the coefficients do
/// not settle within `config.max_iter` iterations and
/// `MathError::ScaleCollapse` when more than half of the residuals vanish
/// while the fit is not exact.
pub fn huber_fit(
    x: &Array1<f64>,
    y: &Array1<f64>,
    config: &HuberConfig,
) -> Result<SlopeEstimate, MathError> {
    validate(x, y)?;
    if config.tuning.is_nan() || config.tuning <= 0.0 {
        return Err(MathError::InvalidParameter(format!("tuning {}", config.tuning)));
    }
    let n = x.len();
    let d = design(x);
    let initial = weighted_least_squares(y, &d, &Array1::ones(n))?;
    if initial.weighted_tss <= 0.0 || initial.weighted_rss <= PERFECT_FIT_TOL * initial.weighted_tss
    {
        return fit_with_sqrt_weights(x, y, &Array1::ones(n));
    }

    let mut coefficients = initial.coefficients;
    let mut residuals = initial.residuals;
    let mut scale = mad_scale(&residuals);
    let mut converged = false;

    for _ in 0..config.max_iter {
        if scale <= f64::EPSILON {
            return Err(MathError::ScaleCollapse);
        }
        let sqrt_w = residuals.mapv(|r| {
            let u = (r / scale).abs();
            if u <= config.tuning { 1.0 } else { (config.tuning / u).sqrt() }
        });
        let next = weighted_least_squares(y, &d, &sqrt_w)?;
        let delta = (&next.coefficients - &coefficients)
            .iter()
            .fold(0.0f64, |m, v| m.max(v.abs()));
        let size = coefficients.iter().fold(1.0f64, |m, v| m.max(v.abs()));

        coefficients = next.coefficients;
        residuals = next.residuals;
        scale = mad_scale(&residuals);

        if delta <= config.tol * size {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(MathError::NoConvergence(config.max_iter));
    }

    if scale <= f64::EPSILON {
        return Err(MathError::ScaleCollapse);
    }
    let slope = coefficients[1];

    let p = 2.0;
    let nf = n as f64;
    let u = residuals.mapv(|r| r / scale);
    let psi_sq: f64 = u.iter().map(|v| v.clamp(-config.tuning, config.tuning).powi(2)).sum();
    let psi_deriv = u.mapv(|v| if v.abs() <= config.tuning { 1.0 } else { 0.0 });
    let m = psi_deriv.sum() / nf;
    let var_psi_deriv = psi_deriv.iter().map(|v| (v - m).powi(2)).sum::<f64>() / nf;
    let k = 1.0 + (p / nf) * var_psi_deriv / (m * m);

    let xtx_inv = invert(&d.t().dot(&d))?;
    let variance = k * k * (psi_sq / (nf - p)) / (m * m) * scale * scale * xtx_inv[[1, 1]];
    let slope_se = variance.sqrt();

    Ok(SlopeEstimate {
        intercept: coefficients[0],
        slope,
        slope_se,
        t_value: slope / slope_se,
        n_obs: n,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    use super::*;

    fn noisy_line() -> (Array1<f64>, Array1<f64>) {
        let x = array![-1.5, -1.0, -0.4, 0.0, 0.3, 0.9, 1.2, 1.7];
        let noise = array![0.05, -0.1, 0.02, 0.08, -0.04, -0.07, 0.03, 0.01];
        let y = x.mapv(|v| 0.5 + 2.0 * v) + noise;
        (x, y)
    }

    #[test]
    fn ols_recovers_exact_line() {
        let x = array![1.0, 2.0, 3.0, 4.0];
        let y = x.mapv(|v| 0.3 - 1.5 * v);
        let fit = ols_fit(&x, &y).unwrap();
        assert_relative_eq!(fit.slope, -1.5, epsilon = 1e-12);
        assert_relative_eq!(fit.intercept, 0.3, epsilon = 1e-12);
        assert!(fit.t_value.is_infinite() && fit.t_value < 0.0);
        assert_eq!(fit.n_obs, 4);
    }

    #[test]
    fn ols_t_value_matches_closed_form() {
        let (x, y) = noisy_line();
        let fit = ols_fit(&x, &y).unwrap();

        let n = x.len() as f64;
        let xm = x.mean().unwrap();
        let ym = y.mean().unwrap();
        let sxx: f64 = x.iter().map(|v| (v - xm).powi(2)).sum();
        let sxy: f64 = x.iter().zip(y.iter()).map(|(a, b)| (a - xm) * (b - ym)).sum();
        let b = sxy / sxx;
        let a = ym - b * xm;
        let rss: f64 = x.iter().zip(y.iter()).map(|(xi, yi)| (yi - a - b * xi).powi(2)).sum();
        let se = (rss / (n - 2.0) / sxx).sqrt();

        assert_relative_eq!(fit.slope, b, epsilon = 1e-12);
        assert_relative_eq!(fit.slope_se, se, epsilon = 1e-12);
        assert_relative_eq!(fit.t_value, b / se, epsilon = 1e-9);
    }

    #[test]
    fn uniform_wls_equals_ols() {
        let (x, y) = noisy_line();
        let ols = ols_fit(&x, &y).unwrap();
        let wls = wls_fit(&x, &y, &Array1::from_elem(x.len(), 7.5)).unwrap();
        assert_relative_eq!(ols.slope, wls.slope, epsilon = 1e-12);
        assert_relative_eq!(ols.intercept, wls.intercept, epsilon = 1e-12);
        assert_relative_eq!(ols.t_value, wls.t_value, epsilon = 1e-9);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-3.0)]
    #[case(f64::NAN)]
    fn wls_rejects_bad_weight(#[case] bad: f64) {
        let (x, y) = noisy_line();
        let mut w = Array1::ones(x.len());
        w[2] = bad;
        assert!(matches!(wls_fit(&x, &y, &w), Err(MathError::NonPositiveWeight(2))));
    }

    #[rstest]
    #[case(array![1.0], array![0.1])]
    #[case(array![1.0, 2.0], array![0.1, 0.2])]
    fn too_few_rows(#[case] x: Array1<f64>, #[case] y: Array1<f64>) {
        let err = ols_fit(&x, &y).unwrap_err();
        assert!(matches!(err, MathError::InsufficientData { required: 3, .. }));
    }

    #[test]
    fn constant_factor_is_zero_variance() {
        let x = array![1.0, 1.0, 1.0];
        let y = array![0.1, 0.5, 0.2];
        assert!(matches!(ols_fit(&x, &y), Err(MathError::ZeroVariance)));
    }

    #[test]
    fn huber_matches_ols_without_outliers() {
        let (x, y) = noisy_line();
        let huber = huber_fit(&x, &y, &HuberConfig::default()).unwrap();
        assert_relative_eq!(huber.slope, 2.0, epsilon = 0.1);
        assert!(huber.t_value > 10.0);
    }

    #[test]
    fn huber_resists_outlier() {
        let (x, mut y) = noisy_line();
        y[7] += 40.0;
        let ols = ols_fit(&x, &y).unwrap();
        let huber = huber_fit(&x, &y, &HuberConfig::default()).unwrap();
        assert!((huber.slope - 2.0).abs() < (ols.slope - 2.0).abs());
        assert!(huber.slope_se.is_finite() && huber.slope_se > 0.0);
    }

    #[test]
    fn huber_exact_line_is_infinite_t() {
        let x = array![0.0, 1.0, 2.0, 3.0];
        let y = x.mapv(|v| 1.0 + 0.5 * v);
        let fit = huber_fit(&x, &y, &HuberConfig::default()).unwrap();
        assert_relative_eq!(fit.slope, 0.5, epsilon = 1e-12);
        assert_eq!(fit.t_value, f64::INFINITY);
    }

    #[test]
    fn huber_collapsed_scale_is_fit_error() {
        // OLS passes through five of nine points, so the residual MAD is zero
        let x = array![-4.0, -3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0, 4.0];
        let y = array![1.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0, -1.0, 1.0];
        let err = huber_fit(&x, &y, &HuberConfig::default()).unwrap_err();
        assert!(matches!(err, MathError::ScaleCollapse));

        let err: xsection_traits::EstimatorError = err.into();
        assert!(err.is_recoverable());
        assert!(!err.is_degenerate());
    }
}
