//! # xsection
//!
//! Cross-sectional factor signal evaluation.
//!
//! Factor values are robustified and standardized per session, regressed
//! against forward excess returns and summarized into significance
//! statistics. Individual components can be enabled via feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Core type definitions
//! - `traits`: Trait abstractions
//! - `math`: Robust statistics and regression kernels
//! - `calendar`: Trading calendar and session schedules
//! - `utils`: Column and date helpers
//! - `panel`: Universe filtering, forward returns and factor panels
//! - `model`: Per-session regressions, aggregation and quantile analytics
//! - `cli`: The `evaluate` binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use xsection::model::{EvalConfig, FactorEvaluator};
//! use xsection::panel::{FactorPanel, ReturnPanel};
//!
//! let evaluator = FactorEvaluator::new(EvalConfig::default())?;
//! let evaluation = evaluator.evaluate(&factors, &returns)?;
//! let summary = evaluator.summarize(&evaluation);
//! ```

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xsection/issues/")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use xsection_primitives as primitives;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use xsection_traits as traits;
#[cfg(feature = "math")]
#[doc(inline)]
pub use xsection_math as math;
#[cfg(feature = "calendar")]
#[doc(inline)]
pub use xsection_calendar as calendar;
#[cfg(feature = "utils")]
#[doc(inline)]
pub use xsection_utils as utils;
#[cfg(feature = "panel")]
#[doc(inline)]
pub use xsection_panel as panel;
#[cfg(feature = "model")]
#[doc(inline)]
pub use xsection_model as model;
