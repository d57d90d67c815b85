//! Typed column extraction.

use polars::prelude::*;

use crate::UtilsError;

/// Check that every name in `columns` is present.
///
/// # Errors
/// Returns `UtilsError::MissingColumn` naming the first absent column.
pub fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<(), UtilsError> {
    let names = df.get_column_names_str();
    match columns.iter().find(|c| !names.contains(c)) {
        Some(missing) => Err(UtilsError::MissingColumn((*missing).to_string())),
        None => Ok(()),
    }
}

fn get<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, UtilsError> {
    df.column(name).map_err(|_| UtilsError::MissingColumn(name.to_string()))
}

/// Read a column as strings, nulls mapped to `None`.
///
/// # Errors
/// Returns `UtilsError::MissingColumn` if absent or a polars cast error.
pub fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, UtilsError> {
    let column = get(df, name)?.cast(&DataType::String)?;
    Ok(column.str()?.into_iter().map(|s| s.map(str::to_owned)).collect())
}

/// Read a column as `f64`, nulls and unparseable values mapped to NaN.
///
/// # Errors
/// Returns `UtilsError::MissingColumn` if absent or a polars cast error.
pub fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, UtilsError> {
    let column = get(df, name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Read a boolean flag column.
///
/// Booleans are taken as is; strings `1`/`true` and non-zero numbers are
/// `true`; nulls are `false`.
///
/// # Errors
/// Returns `UtilsError::MissingColumn` if absent or a polars cast error.
pub fn flag_column(df: &DataFrame, name: &str) -> Result<Vec<bool>, UtilsError> {
    let column = get(df, name)?;
    match column.dtype() {
        DataType::Boolean => Ok(column.bool()?.into_iter().map(|v| v.unwrap_or(false)).collect()),
        DataType::String => Ok(column
            .str()?
            .into_iter()
            .map(|v| matches!(v.map(str::trim), Some("1" | "true" | "True" | "TRUE")))
            .collect()),
        _ => Ok(f64_column(df, name)?.into_iter().map(|v| v.is_finite() && v != 0.0).collect()),
    }
}
