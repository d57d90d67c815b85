//! Composite keys for derived tables.
//!
//! Every derived table in the pipeline is keyed by one of these types, so
//! joins and sort orders are defined in one place.

use serde::{Deserialize, Serialize};

use crate::{Date, FactorName, Horizon, Symbol};

/// Key of one entity observation within one session.
///
/// Orders by session first, then symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    /// Session end date.
    pub session_end: Date,
    /// Entity identifier.
    pub symbol: Symbol,
}

impl SessionKey {
    /// Create a new session key.
    #[must_use]
    pub const fn new(session_end: Date, symbol: Symbol) -> Self {
        Self { session_end, symbol }
    }
}

/// Key of one regression result.
///
/// Orders by factor, then horizon, then session, which is the order the
/// aggregator consumes results in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResultKey {
    /// Factor name.
    pub factor: FactorName,
    /// Return horizon.
    pub horizon: Horizon,
    /// Session end date.
    pub session_end: Date,
}

impl ResultKey {
    /// Create a new result key.
    #[must_use]
    pub const fn new(factor: FactorName, horizon: Horizon, session_end: Date) -> Self {
        Self { factor, horizon, session_end }
    }

    /// The (factor, horizon) pair this key aggregates into.
    #[must_use]
    pub fn series(&self) -> (FactorName, Horizon) {
        (self.factor.clone(), self.horizon)
    }
}
