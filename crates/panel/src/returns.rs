//! Forward excess returns.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use polars::prelude::{Column, DataFrame};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use xsection_calendar::horizon_end;
use xsection_primitives::{Date, Horizon, ReturnRecord, Session, SessionKey, Symbol};
use xsection_traits::TradingCalendar;
use xsection_utils::{f64_column, require_columns};

use crate::{
    BenchmarkRates, EligibilityFilter, PanelError, QuoteBook,
    frame::{date_keys, symbol_keys},
};

/// Return calculation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnConfig {
    /// Forward horizons to price.
    pub horizons: Vec<Horizon>,
    /// Emit symbols without their exchange suffix.
    pub strip_exchange_suffix: bool,
}

impl Default for ReturnConfig {
    fn default() -> Self {
        Self { horizons: Horizon::STANDARD.to_vec(), strip_exchange_suffix: false }
    }
}

/// Prices forward excess returns for eligible entities at session ends.
#[derive(Debug)]
pub struct ReturnCalculator<'a, C: ?Sized> {
    calendar: &'a C,
    quotes: &'a QuoteBook,
    rates: &'a BenchmarkRates,
    config: ReturnConfig,
}

impl<'a, C> ReturnCalculator<'a, C>
where
    C: TradingCalendar + ?Sized,
{
    /// Create a new calculator.
    pub const fn new(
        calendar: &'a C,
        quotes: &'a QuoteBook,
        rates: &'a BenchmarkRates,
        config: ReturnConfig,
    ) -> Self {
        Self { calendar, quotes, rates, config }
    }

    /// Get the configuration.
    pub const fn config(&self) -> &ReturnConfig {
        &self.config
    }

    /// Excess returns of `universe` measured from `session_end`.
    ///
    /// Entities without a tradable quote on either end get no record. A
    /// horizon without a benchmark rate on `session_end` is skipped.
    ///
    /// # Errors
    /// Returns `PanelError::InvalidConfig` for a zero horizon and propagates
    /// calendar lookup errors.
    pub fn compute(
        &self,
        session_end: Date,
        universe: &BTreeSet<Symbol>,
    ) -> Result<Vec<ReturnRecord>, PanelError> {
        let mut records = Vec::new();
        for &horizon in &self.config.horizons {
            if horizon.get() == 0 {
                return Err(PanelError::InvalidConfig("horizon must be at least one month".into()));
            }
            let Some(rate) = self.rates.rate(session_end, horizon) else {
                warn!(%session_end, %horizon, "no benchmark rate, skipping horizon");
                continue;
            };
            let future = horizon_end(self.calendar, session_end, horizon)?;

            let before = records.len();
            for symbol in universe {
                let Some(current) = self.quotes.get(session_end, symbol).filter(|q| q.is_tradable())
                else {
                    continue;
                };
                let Some(later) = self.quotes.get(future, symbol).filter(|q| q.is_tradable()) else {
                    continue;
                };
                let forward = (later.close / current.close - 1.0) * 100.0;
                let symbol =
                    if self.config.strip_exchange_suffix { symbol.without_exchange() } else { symbol.clone() };
                records.push(ReturnRecord::new(
                    symbol,
                    session_end,
                    horizon,
                    forward - rate,
                    current.market_value,
                ));
            }
            debug!(%session_end, %horizon, %future, priced = records.len() - before, "priced horizon");
        }
        Ok(records)
    }

    /// Return panel over `sessions`, each priced for its eligible universe.
    ///
    /// # Errors
    /// Propagates errors from [`Self::compute`].
    pub fn compute_sessions(
        &self,
        sessions: &[Session],
        filter: &EligibilityFilter,
    ) -> Result<ReturnPanel, PanelError> {
        let mut records = Vec::new();
        for session in sessions {
            let universe = filter.eligible(session.end, &self.quotes.quoted(session.end));
            records.extend(self.compute(session.end, &universe)?);
        }
        info!(sessions = sessions.len(), records = records.len(), "computed forward returns");
        Ok(ReturnPanel::from_records(records))
    }
}

/// Excess return and weight of one entity in one return group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnObservation {
    /// Excess return in percent.
    pub excess_return: f64,
    /// Market value at the session date.
    pub weight: f64,
}

type ReturnGroup = BTreeMap<Symbol, ReturnObservation>;

/// Excess returns grouped by horizon and session date.
#[derive(Debug, Clone, Default)]
pub struct ReturnPanel {
    groups: BTreeMap<(Horizon, Date), ReturnGroup>,
}

impl ReturnPanel {
    /// Build from return records; later records win on duplicate keys.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = ReturnRecord>) -> Self {
        let mut groups: BTreeMap<(Horizon, Date), ReturnGroup> = BTreeMap::new();
        for r in records {
            groups.entry((r.horizon, r.session_date)).or_default().insert(
                r.symbol,
                ReturnObservation { excess_return: r.excess_return, weight: r.weight },
            );
        }
        Self { groups }
    }

    /// Load from a wide `{symbol, session_date, er_<h>m, weight_<h>m}` frame.
    ///
    /// Every `er_<h>m` column needs a matching `weight_<h>m` column. Rows
    /// with a missing excess return are dropped for that horizon.
    ///
    /// # Errors
    /// Returns `PanelError::NoColumns` without any excess return column, or
    /// `PanelError` for missing columns and null keys.
    pub fn from_frame(df: &DataFrame) -> Result<Self, PanelError> {
        require_columns(df, &["symbol", "session_date"])?;
        let horizons: BTreeSet<Horizon> =
            df.get_column_names_str().into_iter().filter_map(Horizon::from_er_column).collect();
        if horizons.is_empty() {
            return Err(PanelError::NoColumns("excess return"));
        }

        let symbols = symbol_keys(df, "symbol")?;
        let dates = date_keys(df, "session_date")?;

        let mut records = Vec::new();
        for horizon in horizons {
            let returns = f64_column(df, &horizon.er_column())?;
            let weights = f64_column(df, &horizon.weight_column())?;
            records.extend(
                symbols
                    .iter()
                    .zip(&dates)
                    .zip(returns.into_iter().zip(weights))
                    .filter(|(_, (er, _))| er.is_finite())
                    .map(|((symbol, &date), (er, weight))| {
                        ReturnRecord::new(symbol.clone(), date, horizon, er, weight)
                    }),
            );
        }
        Ok(Self::from_records(records))
    }

    /// Wide frame with one row per `(session_date, symbol)`, nulls where a
    /// horizon has no record.
    ///
    /// # Errors
    /// Returns `PanelError::Polars` if the frame cannot be assembled.
    pub fn to_frame(&self) -> Result<DataFrame, PanelError> {
        let keys: BTreeSet<SessionKey> = self
            .groups
            .iter()
            .flat_map(|((_, date), group)| group.keys().map(|s| SessionKey::new(*date, s.clone())))
            .collect();
        let index: HashMap<&SessionKey, usize> = keys.iter().enumerate().map(|(i, k)| (k, i)).collect();

        let mut columns = vec![
            Column::new("symbol".into(), keys.iter().map(|k| k.symbol.as_str()).collect::<Vec<_>>()),
            Column::new("session_date".into(), keys.iter().map(|k| k.session_end).collect::<Vec<_>>()),
        ];
        for horizon in self.horizons() {
            let mut returns: Vec<Option<f64>> = vec![None; keys.len()];
            let mut weights: Vec<Option<f64>> = vec![None; keys.len()];
            for ((_, date), group) in self.groups.range((horizon, Date::MIN)..=(horizon, Date::MAX)) {
                for (symbol, obs) in group {
                    let row = index[&SessionKey::new(*date, symbol.clone())];
                    returns[row] = Some(obs.excess_return);
                    weights[row] = Some(obs.weight);
                }
            }
            columns.push(Column::new(horizon.er_column().into(), returns));
            columns.push(Column::new(horizon.weight_column().into(), weights));
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Horizons present, ascending.
    #[must_use]
    pub fn horizons(&self) -> BTreeSet<Horizon> {
        self.groups.keys().map(|(h, _)| *h).collect()
    }

    /// Session dates present for `horizon`, ascending.
    #[must_use]
    pub fn sessions(&self, horizon: Horizon) -> Vec<Date> {
        self.groups.range((horizon, Date::MIN)..=(horizon, Date::MAX)).map(|((_, d), _)| *d).collect()
    }

    /// Returns of every entity for one horizon and session date.
    #[must_use]
    pub fn group(&self, horizon: Horizon, date: Date) -> Option<&BTreeMap<Symbol, ReturnObservation>> {
        self.groups.get(&(horizon, date))
    }

    /// Total number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use polars::prelude::*;

    use super::*;
    use crate::{EligibilityConfig, ListingRecord, Quote};
    use xsection_calendar::CalendarTable;
    use xsection_primitives::SessionPeriod;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn quote(close: f64, market_value: f64) -> Quote {
        Quote { close, market_value }
    }

    fn fixture() -> (CalendarTable, QuoteBook, BenchmarkRates) {
        let cal = CalendarTable::from_dates([d(2024, 1, 31), d(2024, 2, 28), d(2024, 2, 29), d(2024, 4, 30)]);
        let quotes = QuoteBook::from_rows([
            (d(2024, 1, 31), "A.SH".into(), quote(10.0, 5e9)),
            (d(2024, 1, 31), "B.SZ".into(), quote(20.0, 8e9)),
            (d(2024, 1, 31), "C.SZ".into(), quote(5.0, 1e9)),
            (d(2024, 2, 29), "A.SH".into(), quote(11.0, 5.5e9)),
            (d(2024, 2, 29), "B.SZ".into(), quote(19.0, 7.6e9)),
            (d(2024, 4, 30), "A.SH".into(), quote(12.0, 6e9)),
        ]);
        let rates = BenchmarkRates::from_rows([
            (d(2024, 1, 31), Horizon(1), 0.2),
            (d(2024, 1, 31), Horizon(3), 0.5),
        ]);
        (cal, quotes, rates)
    }

    fn universe(symbols: &[&str]) -> BTreeSet<Symbol> {
        symbols.iter().map(|s| Symbol::from(*s)).collect()
    }

    #[test]
    fn excess_return_against_last_open_date() {
        let (cal, quotes, rates) = fixture();
        let config = ReturnConfig { horizons: vec![Horizon(1), Horizon(3)], strip_exchange_suffix: false };
        let calc = ReturnCalculator::new(&cal, &quotes, &rates, config);
        let records = calc.compute(d(2024, 1, 31), &universe(&["A.SH", "B.SZ", "C.SZ"])).unwrap();

        // C has no February quote; only A is quoted at the end of April
        assert_eq!(records.len(), 3);
        let a1 = &records[0];
        assert_eq!((a1.symbol.as_str(), a1.horizon), ("A.SH", Horizon(1)));
        assert_relative_eq!(a1.excess_return, 9.8, epsilon = 1e-10);
        assert_relative_eq!(a1.weight, 5e9);
        assert_relative_eq!(records[1].excess_return, -5.2, epsilon = 1e-10);
        assert_eq!(records[2].horizon, Horizon(3));
        assert_relative_eq!(records[2].excess_return, 19.5, epsilon = 1e-10);
    }

    #[test]
    fn missing_rate_skips_horizon() {
        let (cal, quotes, rates) = fixture();
        let calc = ReturnCalculator::new(&cal, &quotes, &rates, ReturnConfig::default());
        let records = calc.compute(d(2024, 1, 31), &universe(&["A.SH"])).unwrap();
        assert!(records.iter().all(|r| r.horizon <= Horizon(3)));
    }

    #[test]
    fn strips_exchange_suffix() {
        let (cal, quotes, rates) = fixture();
        let config = ReturnConfig { horizons: vec![Horizon(1)], strip_exchange_suffix: true };
        let calc = ReturnCalculator::new(&cal, &quotes, &rates, config);
        let records = calc.compute(d(2024, 1, 31), &universe(&["A.SH"])).unwrap();
        assert_eq!(records[0].symbol.as_str(), "A");
    }

    #[test]
    fn zero_horizon_is_config_error() {
        let (cal, quotes, rates) = fixture();
        let config = ReturnConfig { horizons: vec![Horizon(0)], strip_exchange_suffix: false };
        let calc = ReturnCalculator::new(&cal, &quotes, &rates, config);
        assert!(matches!(calc.compute(d(2024, 1, 31), &BTreeSet::new()), Err(PanelError::InvalidConfig(_))));
    }

    #[test]
    fn sessions_priced_for_eligible_universe() {
        let (cal, quotes, rates) = fixture();
        let filter = EligibilityFilter::new(
            EligibilityConfig::default(),
            vec![
                ListingRecord { symbol: "A.SH".into(), list_date: d(2010, 1, 4), delist_date: None },
                ListingRecord { symbol: "B.SZ".into(), list_date: d(2023, 12, 1), delist_date: None },
            ],
            vec![],
        );
        let config = ReturnConfig { horizons: vec![Horizon(1)], strip_exchange_suffix: false };
        let calc = ReturnCalculator::new(&cal, &quotes, &rates, config);
        let session = Session::new(SessionPeriod::Monthly, d(2024, 1, 2), d(2024, 1, 31));

        let panel = calc.compute_sessions(&[session], &filter).unwrap();
        let group = panel.group(Horizon(1), d(2024, 1, 31)).unwrap();
        assert_eq!(group.len(), 1);
        assert!(group.contains_key("A.SH"));
    }

    #[test]
    fn panel_frame_round_trip_keeps_missing_cells() {
        let df = df! {
            "symbol" => &["A", "B", "A"],
            "session_date" => &["20240131", "20240131", "20240229"],
            "er_1m" => &[Some(1.0), Some(-2.0), None],
            "weight_1m" => &[1e9, 2e9, 1e9],
            "er_3m" => &[Some(3.0), None, Some(4.0)],
            "weight_3m" => &[1e9, 2e9, 1e9],
        }
        .unwrap();

        let panel = ReturnPanel::from_frame(&df).unwrap();
        assert_eq!(panel.horizons().into_iter().collect::<Vec<_>>(), vec![Horizon(1), Horizon(3)]);
        assert_eq!(panel.len(), 4);
        assert_eq!(panel.sessions(Horizon(1)), vec![d(2024, 1, 31)]);
        assert_eq!(panel.sessions(Horizon(3)), vec![d(2024, 1, 31), d(2024, 2, 29)]);

        let out = panel.to_frame().unwrap();
        assert_eq!(out.shape(), (3, 6));
        let er_3m = out.column("er_3m").unwrap().f64().unwrap().clone();
        assert_eq!(er_3m.get(0), Some(3.0));
        assert_eq!(er_3m.get(1), None);
        assert_eq!(er_3m.get(2), Some(4.0));
    }

    #[test]
    fn panel_requires_return_columns() {
        let df = df! { "symbol" => &["A"], "session_date" => &["20240131"] }.unwrap();
        assert!(matches!(ReturnPanel::from_frame(&df), Err(PanelError::NoColumns(_))));

        let df = df! { "symbol" => &["A"], "session_date" => &["20240131"], "er_1m" => &[1.0] }.unwrap();
        assert!(ReturnPanel::from_frame(&df).is_err());
    }
}
