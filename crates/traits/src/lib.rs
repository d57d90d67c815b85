#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xsection/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod calendar;
pub use calendar::{CalendarError, TradingCalendar};

mod transform;
pub use transform::{CrossSectionTransform, TransformError};

mod estimator;
pub use estimator::{CrossSectionEstimator, EstimatorError, SlopeEstimate};
