//! In-memory trading calendar.

use std::collections::BTreeSet;

use polars::prelude::DataFrame;
use xsection_primitives::Date;
use xsection_traits::{CalendarError, TradingCalendar};
use xsection_utils::{UtilsError, date_column, flag_column, require_columns};

/// Set of open trading dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarTable {
    open: BTreeSet<Date>,
}

impl CalendarTable {
    /// Column holding the calendar date.
    pub const DATE_COLUMN: &'static str = "cal_date";
    /// Column holding the open flag.
    pub const OPEN_COLUMN: &'static str = "is_open";

    /// Build from open dates in any order.
    #[must_use]
    pub fn from_dates(dates: impl IntoIterator<Item = Date>) -> Self {
        Self { open: dates.into_iter().collect() }
    }

    /// Build from a `{cal_date, is_open}` frame, keeping rows flagged open.
    ///
    /// # Errors
    /// Returns `UtilsError` if a column is missing or a date cannot be read.
    pub fn from_frame(df: &DataFrame) -> Result<Self, UtilsError> {
        require_columns(df, &[Self::DATE_COLUMN, Self::OPEN_COLUMN])?;
        let dates = date_column(df, Self::DATE_COLUMN)?;
        let flags = flag_column(df, Self::OPEN_COLUMN)?;
        Ok(Self::from_dates(
            dates.into_iter().zip(flags).filter_map(|(d, open)| if open { d } else { None }),
        ))
    }

    /// Number of open dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// Earliest and latest open date.
    #[must_use]
    pub fn span(&self) -> Option<(Date, Date)> {
        Some((*self.open.first()?, *self.open.last()?))
    }
}

impl TradingCalendar for CalendarTable {
    fn open_dates(&self, start: Date, end: Date) -> Result<Vec<Date>, CalendarError> {
        if start > end {
            return Err(CalendarError::InvalidRange { start, end });
        }
        Ok(self.open.range(start..=end).copied().collect())
    }

    fn first_open(&self, start: Date, end: Date) -> Result<Option<Date>, CalendarError> {
        if start > end {
            return Err(CalendarError::InvalidRange { start, end });
        }
        Ok(self.open.range(start..=end).next().copied())
    }

    fn last_open(&self, start: Date, end: Date) -> Result<Option<Date>, CalendarError> {
        if start > end {
            return Err(CalendarError::InvalidRange { start, end });
        }
        Ok(self.open.range(start..=end).next_back().copied())
    }

    fn is_open(&self, date: Date) -> Result<bool, CalendarError> {
        Ok(self.open.contains(&date))
    }
}
