//! Linear algebra for small least-squares problems.

use ndarray::{Array1, Array2};

use crate::MathError;

/// Result of weighted least squares regression.
#[derive(Debug, Clone)]
pub struct WlsResult {
    /// Estimated coefficients.
    pub coefficients: Array1<f64>,
    /// Unweighted residuals `y - X b`.
    pub residuals: Array1<f64>,
    /// Inverse of the weighted normal matrix `(X' W X)^-1`.
    pub normal_inverse: Array2<f64>,
    /// Weighted residual sum of squares.
    pub weighted_rss: f64,
    /// Weighted total sum of squares about the weighted mean of `y`.
    pub weighted_tss: f64,
    /// Residual degrees of freedom `n - p`.
    pub df_resid: usize,
}

impl WlsResult {
    /// Residual variance estimate `weighted_rss / df_resid`.
    #[must_use]
    pub fn sigma2(&self) -> f64 {
        if self.df_resid == 0 { f64::NAN } else { self.weighted_rss / self.df_resid as f64 }
    }

    /// Standard error of coefficient `j` under the classical covariance.
    #[must_use]
    pub fn std_error(&self, j: usize) -> f64 {
        (self.sigma2() * self.normal_inverse[[j, j]]).sqrt()
    }

    /// Coefficient of determination.
    #[must_use]
    pub fn r_squared(&self) -> f64 {
        if self.weighted_tss > 0.0 { 1.0 - self.weighted_rss / self.weighted_tss } else { 0.0 }
    }
}

/// Perform weighted least squares regression.
///
/// Solves: argmin_beta sum(w_i * (y_i - X_i * beta)^2)
///
/// # Arguments
/// * `y` - Response vector (n,)
/// * `x` - Design matrix (n x p)
/// * `sqrt_weights` - Square roots of the weights (n,)
///
/// # Errors
/// Returns error if dimensions mismatch or the normal matrix is singular.
pub fn weighted_least_squares(
    y: &Array1<f64>,
    x: &Array2<f64>,
    sqrt_weights: &Array1<f64>,
) -> Result<WlsResult, MathError> {
    let n = y.len();
    let p = x.ncols();

    if x.nrows() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: x.nrows() });
    }
    if sqrt_weights.len() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: sqrt_weights.len() });
    }
    if n == 0 {
        return Err(MathError::EmptyData);
    }

    let y_weighted = y * sqrt_weights;
    let mut x_weighted = x.clone();
    for (mut row, &w) in x_weighted.rows_mut().into_iter().zip(sqrt_weights.iter()) {
        row *= w;
    }

    let xtx = x_weighted.t().dot(&x_weighted);
    let xty = x_weighted.t().dot(&y_weighted);
    let coefficients = solve_linear_system(&xtx, &xty)?;
    let normal_inverse = invert(&xtx)?;

    let residuals = y - &x.dot(&coefficients);
    let weighted_rss: f64 =
        residuals.iter().zip(sqrt_weights.iter()).map(|(r, w)| (r * w).powi(2)).sum();

    let w_sum: f64 = sqrt_weights.iter().map(|w| w * w).sum();
    let y_bar = if w_sum > 0.0 { y_weighted.dot(sqrt_weights) / w_sum } else { 0.0 };
    let weighted_tss: f64 =
        y.iter().zip(sqrt_weights.iter()).map(|(yi, w)| (w * (yi - y_bar)).powi(2)).sum();

    Ok(WlsResult {
        coefficients,
        residuals,
        normal_inverse,
        weighted_rss,
        weighted_tss,
        df_resid: n.saturating_sub(p),
    })
}

/// Invert a square matrix by solving against each unit vector.
///
/// # Errors
/// Returns error if the matrix is not square or is singular.
pub fn invert(a: &Array2<f64>) -> Result<Array2<f64>, MathError> {
    let n = a.nrows();
    let mut inv = Array2::zeros((n, n));
    for j in 0..n {
        let mut e = Array1::zeros(n);
        e[j] = 1.0;
        let col = solve_linear_system(a, &e)?;
        inv.column_mut(j).assign(&col);
    }
    Ok(inv)
}

/// Solve a linear system Ax = b using Gaussian elimination with partial pivoting.
fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, MathError> {
    let n = a.nrows();
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    if a.ncols() != n {
        return Err(MathError::LinearAlgebra("matrix must be square".to_string()));
    }
    if b.len() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: b.len() });
    }

    // Augmented matrix [A | b]
    let mut aug = Array2::zeros((n, n + 1));
    aug.slice_mut(ndarray::s![.., ..n]).assign(a);
    aug.column_mut(n).assign(b);

    let scale = a.iter().fold(0.0f64, |m, v| m.max(v.abs())).max(1.0);

    for col in 0..n {
        let (max_row, max_val) = (col..n)
            .map(|row| (row, aug[[row, col]].abs()))
            .fold((col, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

        if max_val < 1e-14 * scale {
            return Err(MathError::LinearAlgebra(
                "matrix is singular or nearly singular".to_string(),
            ));
        }

        if max_row != col {
            for j in 0..=n {
                aug.swap([col, j], [max_row, j]);
            }
        }

        for row in (col + 1)..n {
            let factor = aug[[row, col]] / aug[[col, col]];
            for j in col..=n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    // Back substitution
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = aug[[i, n]];
        for j in (i + 1)..n {
            sum -= aug[[i, j]] * x[j];
        }
        x[i] = sum / aug[[i, i]];
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    fn design(x: &[f64]) -> Array2<f64> {
        let mut d = Array2::ones((x.len(), 2));
        d.column_mut(1).assign(&Array1::from(x.to_vec()));
        d
    }

    #[test]
    fn wls_simple_regression() {
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let x = design(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let weights = Array1::ones(5);

        let result = weighted_least_squares(&y, &x, &weights).unwrap();

        assert_relative_eq!(result.coefficients[0], 0.0, epsilon = 1e-10);
        assert_relative_eq!(result.coefficients[1], 1.0, epsilon = 1e-10);
        assert_relative_eq!(result.r_squared(), 1.0, epsilon = 1e-10);
        assert_eq!(result.df_resid, 3);
    }

    #[test]
    fn wls_weighted_regression() {
        let y = array![1.0, 2.0, 3.0, 4.0, 100.0];
        let x = design(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        // Very low weight on the outlier
        let weights = array![1.0, 1.0, 1.0, 1.0, 0.001];

        let result = weighted_least_squares(&y, &x, &weights).unwrap();

        assert_relative_eq!(result.coefficients[1], 1.0, epsilon = 0.1);
    }

    #[test]
    fn slope_standard_error_matches_closed_form() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = array![1.2, 1.9, 3.2, 3.8, 5.1];
        let result = weighted_least_squares(&y, &design(&xs), &Array1::ones(5)).unwrap();

        // se(b) = sqrt(sigma2 / Sxx), Sxx = 10
        let expected = (result.sigma2() / 10.0).sqrt();
        assert_relative_eq!(result.std_error(1), expected, epsilon = 1e-12);
    }

    #[test]
    fn invert_recovers_identity() {
        let a = array![[4.0, 1.0], [2.0, 3.0]];
        let inv = invert(&a).unwrap();
        let eye = a.dot(&inv);
        assert_relative_eq!(eye[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(eye[[0, 1]], 0.0, epsilon = 1e-12);
        assert_relative_eq!(eye[[1, 1]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn singular_design_errors() {
        let y = array![1.0, 2.0, 3.0];
        let x = design(&[2.0, 2.0, 2.0]);
        let err = weighted_least_squares(&y, &x, &Array1::ones(3)).unwrap_err();
        assert!(matches!(err, MathError::LinearAlgebra(_)));
    }
}
