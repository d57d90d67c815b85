//! Key column readers shared by the loaders.

use polars::prelude::DataFrame;
use xsection_primitives::{Date, Symbol};
use xsection_utils::{date_column, string_column};

use crate::PanelError;

/// Read a non-null symbol column.
pub(crate) fn symbol_keys(df: &DataFrame, name: &str) -> Result<Vec<Symbol>, PanelError> {
    string_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, s)| s.map(Symbol::from).ok_or_else(|| null_key(name, row)))
        .collect()
}

/// Read a non-null date column.
pub(crate) fn date_keys(df: &DataFrame, name: &str) -> Result<Vec<Date>, PanelError> {
    date_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, d)| d.ok_or_else(|| null_key(name, row)))
        .collect()
}

fn null_key(column: &str, row: usize) -> PanelError {
    PanelError::NullKey { column: column.to_string(), row }
}
