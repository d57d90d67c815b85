#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xsection/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod stats;
pub use stats::{TTest, nan_mean, nan_median, nan_quantiles, nan_std, ttest_1samp};

mod outliers;
pub use outliers::{MAD_SCALE, OutlierMethod, OutlierTransformer, compress_outliers};

mod cross_section;
pub use cross_section::{Standardizer, standardize};

mod linalg;
pub use linalg::{WlsResult, invert, weighted_least_squares};

mod regression;
pub use regression::{HuberConfig, MIN_OBSERVATIONS, huber_fit, ols_fit, wls_fit};

mod rank;
pub use rank::{average_ranks, pearson, spearman};

mod error;
pub use error::MathError;
