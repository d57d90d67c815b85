//! Listing registry and name-change history.

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use xsection_primitives::{Date, Symbol};
use xsection_utils::{date_column, require_columns, string_column};

use crate::{
    PanelError,
    frame::{date_keys, symbol_keys},
};

/// Listing and delisting dates of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Entity id.
    pub symbol: Symbol,
    /// Listing date.
    pub list_date: Date,
    /// Delisting date, if delisted.
    pub delist_date: Option<Date>,
}

impl ListingRecord {
    /// Load from a `{symbol, list_date, delist_date}` frame.
    ///
    /// `delist_date` is optional; null listing dates are an error.
    ///
    /// # Errors
    /// Returns `PanelError` if a column is missing or a key is null.
    pub fn from_frame(df: &DataFrame) -> Result<Vec<Self>, PanelError> {
        require_columns(df, &["symbol", "list_date"])?;
        let symbols = symbol_keys(df, "symbol")?;
        let list_dates = date_keys(df, "list_date")?;
        let delist_dates = optional_dates(df, "delist_date")?;

        Ok(symbols
            .into_iter()
            .zip(list_dates)
            .zip(delist_dates)
            .map(|((symbol, list_date), delist_date)| Self { symbol, list_date, delist_date })
            .collect())
    }

    /// Whether the entity is listed and not yet delisted on `date`.
    #[must_use]
    pub fn is_listed_on(&self, date: Date) -> bool {
        self.list_date <= date && self.delist_date.is_none_or(|d| date < d)
    }
}

/// One name-change interval of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameChange {
    /// Entity id.
    pub symbol: Symbol,
    /// Name carried in the interval.
    pub name: String,
    /// First day of the interval.
    pub start_date: Date,
    /// Day the interval ended; open-ended when missing.
    pub end_date: Option<Date>,
}

impl NameChange {
    /// Load from a `{symbol, name, start_date, end_date}` frame.
    ///
    /// Rows with a null name are dropped.
    ///
    /// # Errors
    /// Returns `PanelError` if a column is missing or a key is null.
    pub fn from_frame(df: &DataFrame) -> Result<Vec<Self>, PanelError> {
        require_columns(df, &["symbol", "name", "start_date"])?;
        let symbols = symbol_keys(df, "symbol")?;
        let names = string_column(df, "name")?;
        let starts = date_keys(df, "start_date")?;
        let ends = optional_dates(df, "end_date")?;

        Ok(symbols
            .into_iter()
            .zip(names)
            .zip(starts)
            .zip(ends)
            .filter_map(|(((symbol, name), start_date), end_date)| {
                Some(Self { symbol, name: name?, start_date, end_date })
            })
            .collect())
    }

    /// Whether the interval `start <= date < end` is active on `date`.
    #[must_use]
    pub fn is_active_on(&self, date: Date) -> bool {
        self.start_date <= date && self.end_date.is_none_or(|end| date < end)
    }
}

fn optional_dates(df: &DataFrame, name: &str) -> Result<Vec<Option<Date>>, PanelError> {
    if df.get_column_names_str().contains(&name) {
        Ok(date_column(df, name)?)
    } else {
        Ok(vec![None; df.height()])
    }
}
