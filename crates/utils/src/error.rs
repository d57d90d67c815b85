//! Error types for utility functions.

/// Errors that can occur during utility operations.
#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Missing column.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// Unparseable date.
    #[error("invalid date: {0:?}")]
    InvalidDate(String),

    /// Column dtype cannot be read as requested.
    #[error("column {column} has unsupported dtype {dtype}")]
    UnsupportedType {
        /// Column name.
        column: String,
        /// Polars dtype.
        dtype: String,
    },
}
