#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xsection/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod table;
pub use table::CalendarTable;

mod months;
pub use months::{MonthWindow, horizon_end, month_bounds, resolve_month};

mod schedule;
pub use schedule::{ScheduleConfig, SessionScheduler};
