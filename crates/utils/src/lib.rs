#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xsection/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod columns;
pub use columns::{f64_column, flag_column, require_columns, string_column};

mod dates;
pub use dates::{date_column, date_from_epoch_days, parse_date};

mod error;
pub use error::UtilsError;
