#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xsection/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod frame;

mod registry;
pub use registry::{ListingRecord, NameChange};

mod eligibility;
pub use eligibility::{EligibilityConfig, EligibilityFilter};

mod market;
pub use market::{BenchmarkRates, Quote, QuoteBook};

mod returns;
pub use returns::{ReturnCalculator, ReturnConfig, ReturnObservation, ReturnPanel};

mod factors;
pub use factors::FactorPanel;

mod error;
pub use error::PanelError;
