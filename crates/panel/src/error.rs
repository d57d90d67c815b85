//! Error types for panel construction.

use xsection_traits::CalendarError;
use xsection_utils::UtilsError;

/// Errors that can occur while loading panels or computing returns.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// Column extraction error.
    #[error(transparent)]
    Utils(#[from] UtilsError),

    /// Calendar lookup error.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// A required key value is null.
    #[error("null {column} at row {row}")]
    NullKey {
        /// Column name.
        column: String,
        /// Row index.
        row: usize,
    },

    /// The panel has no usable column of the requested kind.
    #[error("no {0} columns found")]
    NoColumns(&'static str),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
