//! Boundary compression of cross-sectional outliers.
//!
//! Values beyond `center ± 3 * scale` are mapped linearly into the band
//! between three and five scales from the center, anchored at the band
//! boundary and the cross-section extreme. Rank order is preserved and
//! interior values are left untouched.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use xsection_traits::{CrossSectionTransform, TransformError};

use crate::{MathError, nan_mean, nan_median, nan_std};

/// Consistency constant turning MAD into a normal standard deviation estimate.
pub const MAD_SCALE: f64 = 1.4826;

/// Band half-width in scale units.
const BAND: f64 = 3.0;

/// Width of the compressed region beyond the band, in scale units.
const SPILL: f64 = 2.0;

/// Center and scale estimator for outlier compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    /// Mean and population standard deviation.
    #[default]
    Std,
    /// Median and scaled median absolute deviation.
    Mad,
}

impl OutlierMethod {
    /// Short label used in output names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Std => "std",
            Self::Mad => "mad",
        }
    }

    /// Center and scale of the finite values, `None` when there are none.
    #[must_use]
    pub fn center_scale(self, values: &[f64]) -> Option<(f64, f64)> {
        if !values.iter().any(|v| v.is_finite()) {
            return None;
        }
        match self {
            Self::Std => Some((nan_mean(values), nan_std(values, 0))),
            Self::Mad => {
                let median = nan_median(values);
                let deviations: Vec<f64> = values.iter().map(|v| (v - median).abs()).collect();
                Some((median, MAD_SCALE * nan_median(&deviations)))
            }
        }
    }
}

impl std::fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Compress outliers of one cross-section.
///
/// Non-finite values are ignored for the statistics and passed through.
/// An all-missing cross-section is returned unchanged.
///
/// # Errors
/// Returns `MathError::DegenerateBoundary` when values lie beyond the band
/// but the compression denominator is not a positive finite number, or the
/// scale is zero so that every outlier would collapse onto the center.
pub fn compress_outliers(
    data: &Array1<f64>,
    method: OutlierMethod,
) -> Result<Array1<f64>, MathError> {
    let values = data.to_vec();
    let Some((center, scale)) = method.center_scale(&values) else {
        return Ok(data.clone());
    };

    let upper = center + BAND * scale;
    let lower = center - BAND * scale;
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    let has_upper = max > upper;
    let has_lower = min < lower;
    if (has_upper || has_lower) && scale <= 0.0 {
        return Err(MathError::DegenerateBoundary(format!(
            "{method} scale is zero with values outside the band"
        )));
    }

    let upper_span = max - upper;
    let lower_span = min - lower;
    if has_upper && !(upper_span.is_finite() && upper_span > 0.0) {
        return Err(MathError::DegenerateBoundary(format!("upper span {upper_span}")));
    }
    if has_lower && !(lower_span.is_finite() && lower_span < 0.0) {
        return Err(MathError::DegenerateBoundary(format!("lower span {lower_span}")));
    }

    Ok(data.mapv(|x| {
        if !x.is_finite() {
            x
        } else if x > upper {
            upper + SPILL * scale * (x - upper) / upper_span
        } else if x < lower {
            lower - SPILL * scale * (x - lower) / lower_span
        } else {
            x
        }
    }))
}

/// Outlier compression transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlierTransformer {
    method: OutlierMethod,
}

impl OutlierTransformer {
    /// Create a new transformer.
    #[must_use]
    pub const fn new(method: OutlierMethod) -> Self {
        Self { method }
    }

    /// Get the method.
    #[must_use]
    pub const fn method(&self) -> OutlierMethod {
        self.method
    }
}

impl CrossSectionTransform for OutlierTransformer {
    fn apply(&self, values: &Array1<f64>) -> Result<Array1<f64>, TransformError> {
        Ok(compress_outliers(values, self.method)?)
    }

    fn name(&self) -> &str {
        self.method.label()
    }
}
