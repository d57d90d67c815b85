//! Forward return records.

use serde::{Deserialize, Serialize};

use crate::{Date, Horizon, SessionKey, Symbol};

/// Excess return of one entity over one horizon, measured from a session date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRecord {
    /// Entity identifier.
    pub symbol: Symbol,
    /// Session date the return is measured from.
    pub session_date: Date,
    /// Forward horizon.
    pub horizon: Horizon,
    /// Forward return minus the matching risk-free rate, in percent.
    pub excess_return: f64,
    /// Market value on the session date.
    pub weight: f64,
}

impl ReturnRecord {
    /// Create a new return record.
    #[must_use]
    pub const fn new(
        symbol: Symbol,
        session_date: Date,
        horizon: Horizon,
        excess_return: f64,
        weight: f64,
    ) -> Self {
        Self { symbol, session_date, horizon, excess_return, weight }
    }

    /// Key of the observation this record belongs to.
    #[must_use]
    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.session_date, self.symbol.clone())
    }

    /// Whether the record can enter a fit: finite return and positive weight.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.excess_return.is_finite() && self.weight.is_finite() && self.weight > 0.0
    }
}
