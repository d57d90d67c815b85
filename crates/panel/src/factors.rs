//! Raw factor panel.

use std::collections::BTreeMap;

use ndarray::Array1;
use polars::prelude::DataFrame;
use xsection_primitives::{CrossSection, Date, FactorName, Symbol};
use xsection_utils::{f64_column, require_columns};

use crate::{
    PanelError,
    frame::{date_keys, symbol_keys},
};

const KEY_COLUMNS: [&str; 2] = ["symbol", "session_end"];

/// Factor values of every entity at one session end, one column per factor.
#[derive(Debug, Clone)]
struct SessionBlock {
    symbols: Vec<Symbol>,
    columns: Vec<Array1<f64>>,
}

/// Factor values keyed by session end, symbol and factor name.
#[derive(Debug, Clone, Default)]
pub struct FactorPanel {
    factors: Vec<FactorName>,
    sessions: BTreeMap<Date, SessionBlock>,
}

impl FactorPanel {
    /// Load from a `{symbol, session_end, <factor columns>}` frame.
    ///
    /// With `factors` unset every numeric non-key column is a factor. Missing
    /// values are read as NaN. Duplicate `(symbol, session_end)` rows keep the
    /// last row.
    ///
    /// # Errors
    /// Returns `PanelError::NoColumns` if no factor column is found, or
    /// `PanelError` for missing columns and null keys.
    pub fn from_frame(df: &DataFrame, factors: Option<&[FactorName]>) -> Result<Self, PanelError> {
        require_columns(df, &KEY_COLUMNS)?;
        let factors: Vec<FactorName> = match factors {
            Some(names) => {
                let names_str: Vec<&str> = names.iter().map(FactorName::as_str).collect();
                require_columns(df, &names_str)?;
                names.to_vec()
            }
            None => df
                .get_columns()
                .iter()
                .filter(|c| !KEY_COLUMNS.contains(&c.name().as_str()))
                .filter(|c| c.dtype().is_float() || c.dtype().is_integer())
                .map(|c| FactorName::new(c.name().as_str()))
                .collect(),
        };
        if factors.is_empty() {
            return Err(PanelError::NoColumns("factor"));
        }

        let symbols = symbol_keys(df, "symbol")?;
        let dates = date_keys(df, "session_end")?;
        let values: Vec<Vec<f64>> =
            factors.iter().map(|f| f64_column(df, f.as_str())).collect::<Result<_, _>>()?;

        let mut rows: BTreeMap<Date, BTreeMap<&Symbol, usize>> = BTreeMap::new();
        for (row, (symbol, date)) in symbols.iter().zip(&dates).enumerate() {
            rows.entry(*date).or_default().insert(symbol, row);
        }

        let sessions = rows
            .into_iter()
            .map(|(date, by_symbol)| {
                let columns = values
                    .iter()
                    .map(|column| by_symbol.values().map(|&row| column[row]).collect())
                    .collect();
                let symbols = by_symbol.into_keys().cloned().collect();
                (date, SessionBlock { symbols, columns })
            })
            .collect();

        Ok(Self { factors, sessions })
    }

    /// Factor names, in column order.
    #[must_use]
    pub fn factors(&self) -> &[FactorName] {
        &self.factors
    }

    /// Session end dates, ascending.
    pub fn sessions(&self) -> impl Iterator<Item = Date> + '_ {
        self.sessions.keys().copied()
    }

    /// Values of `factor` at `session_end`, symbols ascending.
    #[must_use]
    pub fn cross_section(&self, session_end: Date, factor: &FactorName) -> Option<CrossSection> {
        let j = self.factors.iter().position(|f| f == factor)?;
        let block = self.sessions.get(&session_end)?;
        Some(CrossSection::new(session_end, block.symbols.clone(), block.columns[j].clone()))
    }

    /// Number of session ends.
    #[must_use]
    pub fn n_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Total number of `(symbol, session_end)` rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.sessions.values().map(|b| b.symbols.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn frame() -> DataFrame {
        df! {
            "symbol" => &["B", "A", "A", "B", "A"],
            "session_end" => &["20240131", "20240131", "20240229", "20240229", "20240229"],
            "name" => &["b", "a", "a", "b", "a"],
            "PAT_M" => &[Some(2.0), Some(1.0), Some(3.0), None, Some(5.0)],
            "ROE" => &[10i64, 20, 30, 40, 50],
        }
        .unwrap()
    }

    #[test]
    fn infers_numeric_factor_columns() {
        let panel = FactorPanel::from_frame(&frame(), None).unwrap();
        assert_eq!(panel.factors(), &[FactorName::new("PAT_M"), FactorName::new("ROE")]);
        assert_eq!(panel.sessions().collect::<Vec<_>>(), vec![d(2024, 1, 31), d(2024, 2, 29)]);
        assert_eq!(panel.n_sessions(), 2);
        assert_eq!(panel.n_rows(), 4);
    }

    #[test]
    fn cross_section_sorted_by_symbol_last_row_wins() {
        let panel = FactorPanel::from_frame(&frame(), None).unwrap();

        let xs = panel.cross_section(d(2024, 1, 31), &"PAT_M".into()).unwrap();
        assert_eq!(xs.symbols, vec![Symbol::from("A"), Symbol::from("B")]);
        assert_eq!(xs.values.to_vec(), vec![1.0, 2.0]);

        let xs = panel.cross_section(d(2024, 2, 29), &"PAT_M".into()).unwrap();
        assert_eq!(xs.get("A"), Some(5.0));
        assert!(xs.get("B").unwrap().is_nan());

        assert!(panel.cross_section(d(2024, 3, 29), &"PAT_M".into()).is_none());
        assert!(panel.cross_section(d(2024, 1, 31), &"EPS".into()).is_none());
    }

    #[test]
    fn explicit_factor_selection() {
        let panel = FactorPanel::from_frame(&frame(), Some(&["ROE".into()])).unwrap();
        assert_eq!(panel.factors(), &[FactorName::new("ROE")]);

        let err = FactorPanel::from_frame(&frame(), Some(&["EPS".into()])).unwrap_err();
        assert_eq!(err.to_string(), "missing column: EPS");
    }

    #[test]
    fn no_factor_columns() {
        let df = df! { "symbol" => &["A"], "session_end" => &["20240131"], "name" => &["a"] }.unwrap();
        assert!(matches!(FactorPanel::from_frame(&df, None), Err(PanelError::NoColumns(_))));
    }
}
