//! Date parsing and extraction.

use polars::prelude::*;
use xsection_primitives::Date;

use crate::UtilsError;

/// Days from 0001-01-01 to the Unix epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Parse a `YYYYMMDD` or `YYYY-MM-DD` date.
///
/// # Errors
/// Returns `UtilsError::InvalidDate` for any other input.
pub fn parse_date(raw: &str) -> Result<Date, UtilsError> {
    let raw = raw.trim();
    let format = if raw.len() == 8 { "%Y%m%d" } else { "%Y-%m-%d" };
    Date::parse_from_str(raw, format).map_err(|_| UtilsError::InvalidDate(raw.to_string()))
}

/// Convert polars days since the Unix epoch to a date.
#[must_use]
pub fn date_from_epoch_days(days: i32) -> Option<Date> {
    Date::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)
}

/// Read a date column, nulls mapped to `None`.
///
/// Accepts polars `Date` and `Datetime` columns, strings in either
/// supported format, and integers written as `YYYYMMDD`.
///
/// # Errors
/// Returns `UtilsError::MissingColumn` if absent, `UtilsError::InvalidDate`
/// for an unparseable value, or a polars error for an unsupported dtype.
pub fn date_column(df: &DataFrame, name: &str) -> Result<Vec<Option<Date>>, UtilsError> {
    let column = df.column(name).map_err(|_| UtilsError::MissingColumn(name.to_string()))?;

    match column.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {
            let days = column.cast(&DataType::Date)?.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .map(|d| match d {
                    Some(d) => date_from_epoch_days(d)
                        .map(Some)
                        .ok_or_else(|| UtilsError::InvalidDate(d.to_string())),
                    None => Ok(None),
                })
                .collect()
        }
        DataType::String => {
            column.str()?.into_iter().map(|s| s.map(parse_date).transpose()).collect()
        }
        dtype if dtype.is_integer() => {
            let ints = column.cast(&DataType::Int64)?;
            ints.i64()?.into_iter().map(|v| v.map(|v| parse_date(&v.to_string())).transpose()).collect()
        }
        other => Err(UtilsError::UnsupportedType { column: name.to_string(), dtype: other.to_string() }),
    }
}
