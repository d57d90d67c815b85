//! Daily quotes and benchmark rates.

use std::collections::{BTreeMap, HashMap, HashSet};

use polars::prelude::DataFrame;
use xsection_primitives::{Date, Horizon, Symbol};
use xsection_utils::{f64_column, require_columns};

use crate::{
    PanelError,
    frame::{date_keys, symbol_keys},
};

/// Close price and market value of one entity on one date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    /// Adjusted close price.
    pub close: f64,
    /// Total market value.
    pub market_value: f64,
}

impl Quote {
    /// Whether the close can be used to price a return.
    #[must_use]
    pub fn is_tradable(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// Quotes keyed by trade date and symbol.
#[derive(Debug, Clone, Default)]
pub struct QuoteBook {
    by_date: HashMap<Date, HashMap<Symbol, Quote>>,
}

impl QuoteBook {
    /// Build from `(date, symbol, quote)` rows; later rows win.
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = (Date, Symbol, Quote)>) -> Self {
        let mut by_date: HashMap<Date, HashMap<Symbol, Quote>> = HashMap::new();
        for (date, symbol, quote) in rows {
            by_date.entry(date).or_default().insert(symbol, quote);
        }
        Self { by_date }
    }

    /// Load from a `{symbol, trade_date, close, market_value}` frame.
    ///
    /// # Errors
    /// Returns `PanelError` if a column is missing or a key is null.
    pub fn from_frame(df: &DataFrame) -> Result<Self, PanelError> {
        require_columns(df, &["symbol", "trade_date", "close", "market_value"])?;
        let symbols = symbol_keys(df, "symbol")?;
        let dates = date_keys(df, "trade_date")?;
        let closes = f64_column(df, "close")?;
        let values = f64_column(df, "market_value")?;

        Ok(Self::from_rows(dates.into_iter().zip(symbols).zip(closes.into_iter().zip(values)).map(
            |((date, symbol), (close, market_value))| (date, symbol, Quote { close, market_value }),
        )))
    }

    /// Quote of `symbol` on `date`.
    #[must_use]
    pub fn get(&self, date: Date, symbol: &Symbol) -> Option<&Quote> {
        self.by_date.get(&date)?.get(symbol)
    }

    /// Symbols with a tradable quote on `date`.
    #[must_use]
    pub fn quoted(&self, date: Date) -> HashSet<Symbol> {
        self.by_date
            .get(&date)
            .map(|quotes| {
                quotes.iter().filter(|(_, q)| q.is_tradable()).map(|(s, _)| s.clone()).collect()
            })
            .unwrap_or_default()
    }

    /// Number of trade dates.
    #[must_use]
    pub fn n_dates(&self) -> usize {
        self.by_date.len()
    }
}

/// Risk-free rates in percent, keyed by date and horizon.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkRates {
    by_date: BTreeMap<Date, BTreeMap<Horizon, f64>>,
}

impl BenchmarkRates {
    /// Build from `(date, horizon, rate)` rows.
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = (Date, Horizon, f64)>) -> Self {
        let mut by_date: BTreeMap<Date, BTreeMap<Horizon, f64>> = BTreeMap::new();
        for (date, horizon, rate) in rows {
            by_date.entry(date).or_default().insert(horizon, rate);
        }
        Self { by_date }
    }

    /// Load from a `{date, <h>m ...}` frame.
    ///
    /// Rate columns are named after their horizon (`1m`, `3m`, `6m`, `12m`);
    /// `1y` is read as `12m`. Null rates are skipped.
    ///
    /// # Errors
    /// Returns `PanelError::NoColumns` if no rate column is present.
    pub fn from_frame(df: &DataFrame) -> Result<Self, PanelError> {
        require_columns(df, &["date"])?;
        let dates = date_keys(df, "date")?;

        let columns: Vec<(String, Horizon)> = df
            .get_column_names_str()
            .into_iter()
            .filter_map(|name| parse_rate_column(name).map(|h| (name.to_string(), h)))
            .collect();
        if columns.is_empty() {
            return Err(PanelError::NoColumns("benchmark rate"));
        }

        let mut rows = Vec::with_capacity(dates.len() * columns.len());
        for (name, horizon) in &columns {
            let rates = f64_column(df, name)?;
            rows.extend(
                dates
                    .iter()
                    .zip(rates)
                    .filter(|(_, r)| r.is_finite())
                    .map(|(&date, rate)| (date, *horizon, rate)),
            );
        }
        Ok(Self::from_rows(rows))
    }

    /// Rate for `horizon` on `date`.
    #[must_use]
    pub fn rate(&self, date: Date, horizon: Horizon) -> Option<f64> {
        self.by_date.get(&date)?.get(&horizon).copied()
    }
}

fn parse_rate_column(name: &str) -> Option<Horizon> {
    if name == "1y" {
        return Some(Horizon(12));
    }
    let months: u32 = name.strip_suffix('m')?.parse().ok()?;
    (months > 0).then_some(Horizon(months))
}
