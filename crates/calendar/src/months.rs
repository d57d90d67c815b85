//! Calendar-month arithmetic resolved to trading dates.

use chrono::{Datelike, Months};
use xsection_primitives::{Date, Horizon};
use xsection_traits::{CalendarError, TradingCalendar};

/// First and last calendar day of the month `offset` months from `date`'s month.
///
/// # Errors
/// Returns `CalendarError::OutOfRange` if the result is not representable.
pub fn month_bounds(date: Date, offset: i32) -> Result<(Date, Date), CalendarError> {
    let out_of_range = || CalendarError::OutOfRange(format!("{date} shifted by {offset} months"));

    let first_of_month = date.with_day(1).ok_or_else(out_of_range)?;
    let step = Months::new(offset.unsigned_abs());
    let first = if offset >= 0 {
        first_of_month.checked_add_months(step)
    } else {
        first_of_month.checked_sub_months(step)
    }
    .ok_or_else(out_of_range)?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(out_of_range)?;

    Ok((first, last))
}

/// One calendar month with its open-date bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    /// First calendar day.
    pub first_day: Date,
    /// Last calendar day.
    pub last_day: Date,
    /// First open date in the month.
    pub first_open: Option<Date>,
    /// Last open date in the month.
    pub last_open: Option<Date>,
}

impl MonthWindow {
    /// Whether the month has at least one open date.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.first_open.is_some() && self.last_open.is_some()
    }

    /// Open-date bounds, falling back to the calendar bounds.
    #[must_use]
    pub fn bounds_or_calendar(&self) -> (Date, Date) {
        (self.first_open.unwrap_or(self.first_day), self.last_open.unwrap_or(self.last_day))
    }
}

/// Resolve the month `offset` months from `date`'s month against `calendar`.
///
/// # Errors
/// Propagates calendar lookup and date range errors.
pub fn resolve_month<C>(calendar: &C, date: Date, offset: i32) -> Result<MonthWindow, CalendarError>
where
    C: TradingCalendar + ?Sized,
{
    let (first_day, last_day) = month_bounds(date, offset)?;
    let open = calendar.open_dates(first_day, last_day)?;
    Ok(MonthWindow {
        first_day,
        last_day,
        first_open: open.first().copied(),
        last_open: open.last().copied(),
    })
}

/// Future trading date `horizon` months after `session_end`.
///
/// The last open date of the calendar month `horizon` months ahead; the
/// calendar month end when that month has no open date.
///
/// # Errors
/// Propagates calendar lookup and date range errors.
pub fn horizon_end<C>(calendar: &C, session_end: Date, horizon: Horizon) -> Result<Date, CalendarError>
where
    C: TradingCalendar + ?Sized,
{
    let offset = i32::try_from(horizon.get())
        .map_err(|_| CalendarError::OutOfRange(format!("horizon {horizon}")))?;
    let window = resolve_month(calendar, session_end, offset)?;
    Ok(window.last_open.unwrap_or(window.last_day))
}
