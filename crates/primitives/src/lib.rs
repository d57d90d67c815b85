#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xsection/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod asset;
pub use asset::Symbol;

mod factor;
pub use factor::FactorName;

mod session;
pub use session::{Horizon, Session, SessionPeriod};

mod keys;
pub use keys::{ResultKey, SessionKey};

mod returns;
pub use returns::ReturnRecord;

mod scores;
pub use scores::CrossSection;

mod results;
pub use results::{AggregateStat, RegressionResult};

mod weights;
pub use weights::MarketValueWeights;

/// Re-export common date type.
pub type Date = chrono::NaiveDate;
