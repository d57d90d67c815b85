//! Trading calendar lookup.

use xsection_primitives::Date;

/// Errors that can occur during calendar lookups.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// No open trading date where one is required.
    #[error("no open trading date between {start} and {end}")]
    DataGap {
        /// Window start.
        start: Date,
        /// Window end.
        end: Date,
    },

    /// Start after end.
    #[error("invalid date range: {start} is after {end}")]
    InvalidRange {
        /// Range start.
        start: Date,
        /// Range end.
        end: Date,
    },

    /// Schedule parameters cannot produce any window.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Date arithmetic left the representable range.
    #[error("date out of range: {0}")]
    OutOfRange(String),

    /// The calendar source could not answer.
    #[error("calendar unavailable: {0}")]
    Unavailable(String),
}

impl CalendarError {
    /// Returns whether this error is a data gap.
    #[must_use]
    pub const fn is_data_gap(&self) -> bool {
        matches!(self, Self::DataGap { .. })
    }
}

/// Lookup of open trading dates.
///
/// Implementations are expected to be pre-fetched; lookups never block on
/// an external service.
pub trait TradingCalendar: Send + Sync {
    /// Open trading dates in `[start, end]`, ascending.
    ///
    /// # Errors
    /// Returns `CalendarError::InvalidRange` if `start > end`, or an
    /// implementation-specific error if the lookup fails.
    fn open_dates(&self, start: Date, end: Date) -> Result<Vec<Date>, CalendarError>;

    /// First open date in `[start, end]`, if any.
    ///
    /// # Errors
    /// Propagates lookup errors.
    fn first_open(&self, start: Date, end: Date) -> Result<Option<Date>, CalendarError> {
        Ok(self.open_dates(start, end)?.first().copied())
    }

    /// Last open date in `[start, end]`, if any.
    ///
    /// # Errors
    /// Propagates lookup errors.
    fn last_open(&self, start: Date, end: Date) -> Result<Option<Date>, CalendarError> {
        Ok(self.open_dates(start, end)?.last().copied())
    }

    /// Whether `date` is an open trading date.
    ///
    /// # Errors
    /// Propagates lookup errors.
    fn is_open(&self, date: Date) -> Result<bool, CalendarError> {
        Ok(!self.open_dates(date, date)?.is_empty())
    }
}
