//! Session schedule construction.
//!
//! Sessions of every period label are regrouped from one pass over the
//! monthly windows strictly before the anchor's month, newest first, so a
//! quarterly session always spans exactly three monthly sessions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use xsection_primitives::{Date, Session, SessionPeriod};
use xsection_traits::{CalendarError, TradingCalendar};

use crate::resolve_month;

/// Schedule configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Anchor date; today when unset.
    pub anchor: Option<Date>,
    /// Lookback length in years.
    pub years: u32,
    /// Period labels to build.
    pub periods: Vec<SessionPeriod>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { anchor: None, years: 3, periods: vec![SessionPeriod::Monthly] }
    }
}

impl ScheduleConfig {
    /// Anchor date, defaulting to today's local date.
    #[must_use]
    pub fn anchor_or_today(&self) -> Date {
        self.anchor.unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Number of monthly windows in the lookback.
    #[must_use]
    pub const fn total_months(&self) -> u32 {
        self.years * 12
    }

    /// Check that the configuration can produce sessions.
    ///
    /// # Errors
    /// Returns `CalendarError::InvalidSchedule` for a zero lookback or an
    /// empty period list.
    pub fn validate(&self) -> Result<(), CalendarError> {
        if self.years == 0 {
            return Err(CalendarError::InvalidSchedule("lookback must be at least one year".into()));
        }
        if self.periods.is_empty() {
            return Err(CalendarError::InvalidSchedule("no session period requested".into()));
        }
        Ok(())
    }
}

/// Builds ordered session windows against a trading calendar.
#[derive(Debug)]
pub struct SessionScheduler<'a, C: ?Sized> {
    calendar: &'a C,
    config: ScheduleConfig,
}

impl<'a, C> SessionScheduler<'a, C>
where
    C: TradingCalendar + ?Sized,
{
    /// Create a new scheduler.
    pub const fn new(calendar: &'a C, config: ScheduleConfig) -> Self {
        Self { calendar, config }
    }

    /// Get the configuration.
    pub const fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Monthly `(start, end)` trading-date windows, newest first.
    ///
    /// The most recent month falls back to its calendar bounds when the
    /// calendar has no open date for it.
    ///
    /// # Errors
    /// Returns `CalendarError::DataGap` for an unresolvable interior month.
    pub fn monthly_windows(&self) -> Result<Vec<(Date, Date)>, CalendarError> {
        self.config.validate()?;
        let anchor = self.config.anchor_or_today();
        let total = self.config.total_months();

        let mut windows = Vec::with_capacity(total as usize);
        for i in 1..=total {
            let offset = -i32::try_from(i)
                .map_err(|_| CalendarError::InvalidSchedule(format!("lookback of {i} months")))?;
            let month = resolve_month(self.calendar, anchor, offset)?;
            if !month.is_resolved() {
                if i != 1 {
                    return Err(CalendarError::DataGap { start: month.first_day, end: month.last_day });
                }
                warn!(
                    start = %month.first_day,
                    end = %month.last_day,
                    "no open date in most recent month, using calendar bounds"
                );
            }
            windows.push(month.bounds_or_calendar());
        }
        debug!(%anchor, months = windows.len(), "resolved monthly windows");
        Ok(windows)
    }

    /// Sessions of one period label, oldest first.
    ///
    /// # Errors
    /// Propagates errors from [`Self::monthly_windows`].
    pub fn sessions(&self, period: SessionPeriod) -> Result<Vec<Session>, CalendarError> {
        let windows = self.monthly_windows()?;
        Ok(group_windows(&windows, period))
    }

    /// Sessions of every configured period label from one calendar pass.
    ///
    /// # Errors
    /// Propagates errors from [`Self::monthly_windows`].
    pub fn schedule(&self) -> Result<BTreeMap<SessionPeriod, Vec<Session>>, CalendarError> {
        let windows = self.monthly_windows()?;
        let schedule: BTreeMap<_, _> =
            self.config.periods.iter().map(|&p| (p, group_windows(&windows, p))).collect();
        for (period, sessions) in &schedule {
            info!(
                %period,
                count = sessions.len(),
                first = ?sessions.first().map(|s| s.start),
                last = ?sessions.last().map(|s| s.end),
                "built session schedule"
            );
        }
        Ok(schedule)
    }
}

/// Regroup newest-first monthly windows into sessions of `period`, oldest first.
fn group_windows(windows: &[(Date, Date)], period: SessionPeriod) -> Vec<Session> {
    let months = period.months() as usize;
    let mut sessions: Vec<Session> = windows
        .chunks_exact(months)
        .map(|block| {
            let end = block[0].1;
            let start = block[months - 1].0;
            Session::new(period, start, end)
        })
        .collect();
    sessions.reverse();
    sessions
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Weekday};
    use rstest::rstest;

    use super::*;
    use crate::CalendarTable;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn weekday_calendar(from: Date, to: Date) -> CalendarTable {
        CalendarTable::from_dates(
            from.iter_days()
                .take_while(|x| *x <= to)
                .filter(|x| !matches!(x.weekday(), Weekday::Sat | Weekday::Sun)),
        )
    }

    fn config(years: u32, periods: Vec<SessionPeriod>) -> ScheduleConfig {
        ScheduleConfig { anchor: Some(d(2024, 7, 15)), years, periods }
    }

    #[rstest]
    #[case(SessionPeriod::Monthly, 24)]
    #[case(SessionPeriod::Quarterly, 8)]
    #[case(SessionPeriod::SemiAnnual, 4)]
    #[case(SessionPeriod::Annual, 2)]
    fn counts_increasing_non_overlapping(#[case] period: SessionPeriod, #[case] count: usize) {
        let cal = weekday_calendar(d(2022, 1, 1), d(2024, 12, 31));
        let scheduler = SessionScheduler::new(&cal, config(2, vec![period]));
        let sessions = scheduler.sessions(period).unwrap();

        assert_eq!(sessions.len(), count);
        for pair in sessions.windows(2) {
            assert!(pair[0].end < pair[1].start);
            assert!(!pair[0].overlaps(&pair[1]));
        }
        for s in &sessions {
            assert!(s.start <= s.end);
            assert!(cal.is_open(s.start).unwrap() && cal.is_open(s.end).unwrap());
        }
    }

    #[test]
    fn monthly_sessions_resolve_to_trading_dates() {
        let cal = weekday_calendar(d(2023, 1, 1), d(2024, 12, 31));
        let sessions = SessionScheduler::new(&cal, config(1, vec![SessionPeriod::Monthly]))
            .sessions(SessionPeriod::Monthly)
            .unwrap();

        // July 2023 starts on a Saturday; June 2024 ends on a Sunday
        assert_eq!(sessions[0], Session::new(SessionPeriod::Monthly, d(2023, 7, 3), d(2023, 7, 31)));
        assert_eq!(sessions[11], Session::new(SessionPeriod::Monthly, d(2024, 6, 3), d(2024, 6, 28)));
    }

    #[test]
    fn coarse_sessions_regroup_monthly_windows() {
        let cal = weekday_calendar(d(2022, 1, 1), d(2024, 12, 31));
        let scheduler = SessionScheduler::new(
            &cal,
            config(1, vec![SessionPeriod::Monthly, SessionPeriod::Quarterly, SessionPeriod::Annual]),
        );
        let schedule = scheduler.schedule().unwrap();
        let monthly = &schedule[&SessionPeriod::Monthly];
        let quarterly = &schedule[&SessionPeriod::Quarterly];
        let annual = &schedule[&SessionPeriod::Annual];

        assert_eq!(quarterly[3].end, monthly[11].end);
        assert_eq!(quarterly[3].start, monthly[9].start);
        assert_eq!(annual[0].start, monthly[0].start);
        assert_eq!(annual[0].end, monthly[11].end);
    }

    #[test]
    fn interior_gap_is_error() {
        let full = weekday_calendar(d(2023, 1, 1), d(2024, 12, 31));
        let cal = CalendarTable::from_dates(
            full.open_dates(d(2023, 1, 1), d(2024, 12, 31))
                .unwrap()
                .into_iter()
                .filter(|x| !(x.year() == 2024 && x.month() == 1)),
        );
        // January 2024 has no open date
        let err = SessionScheduler::new(&cal, config(1, vec![SessionPeriod::Monthly]))
            .monthly_windows()
            .unwrap_err();
        assert!(err.is_data_gap());
        assert_eq!(err.to_string(), "no open trading date between 2024-01-01 and 2024-01-31");
    }

    #[test]
    fn most_recent_gap_falls_back() {
        let cal = weekday_calendar(d(2023, 1, 1), d(2024, 5, 31));
        let windows = SessionScheduler::new(&cal, config(1, vec![SessionPeriod::Monthly]))
            .monthly_windows()
            .unwrap();
        assert_eq!(windows[0], (d(2024, 6, 1), d(2024, 6, 30)));
        assert_eq!(windows[1], (d(2024, 5, 1), d(2024, 5, 31)));
    }

    #[test]
    fn invalid_config() {
        let cal = CalendarTable::default();
        let scheduler = SessionScheduler::new(&cal, config(0, vec![SessionPeriod::Monthly]));
        assert!(matches!(scheduler.monthly_windows(), Err(CalendarError::InvalidSchedule(_))));

        let scheduler = SessionScheduler::new(&cal, config(1, vec![]));
        assert!(matches!(scheduler.schedule(), Err(CalendarError::InvalidSchedule(_))));
    }

    #[test]
    fn config_from_json() {
        let cfg: ScheduleConfig =
            serde_json::from_str(r#"{"anchor": "2024-07-15", "periods": ["M", "Q"]}"#).unwrap();
        assert_eq!(cfg.years, 3);
        assert_eq!(cfg.anchor, Some(d(2024, 7, 15)));
        assert_eq!(cfg.periods, vec![SessionPeriod::Monthly, SessionPeriod::Quarterly]);
        assert_eq!(cfg.total_months(), 36);
    }
}
