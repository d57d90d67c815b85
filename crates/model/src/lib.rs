#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xsection/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
pub use config::{BinningConfig, EvalConfig, ModelType, Quantiles};

mod transform;
pub use transform::{FactorTransformer, JoinedCrossSection, TransformedCrossSection};

mod regressor;
pub use regressor::{CrossSectionFit, CrossSectionRegressor, HuberEstimator, OlsEstimator, WlsEstimator};

mod aggregate;
pub use aggregate::aggregate;

mod quantile;
pub use quantile::{
    BinEdges, BucketReturn, BucketTurnover, QuantileAnalytics, QuantileSpread, RankAutocorrelation,
    analyze,
};

mod evaluator;
pub use evaluator::{Evaluation, FactorEvaluator, SessionFit, SkippedGroup};

pub mod tables;

mod error;
pub use error::ModelError;

/// Re-export commonly used types.
pub mod prelude {
    pub use xsection_traits::CrossSectionEstimator;

    pub use super::{EvalConfig, Evaluation, FactorEvaluator, ModelError, ModelType};
}
