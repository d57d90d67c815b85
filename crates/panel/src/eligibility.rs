//! Per-session universe filtering.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Days;
use serde::{Deserialize, Serialize};
use tracing::info;
use xsection_primitives::{Date, Symbol};

use crate::{ListingRecord, NameChange};

/// Eligibility filter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityConfig {
    /// Minimum days between listing and session end.
    pub kickoff_days: u32,
    /// Substring marking special-treatment names.
    pub special_marker: String,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self { kickoff_days: 365, special_marker: "ST".to_string() }
    }
}

/// Narrows the registry to the entities valid at a session end.
///
/// Three passes are applied in order: seasoning (listed more than
/// `kickoff_days` before the session end and not delisted), special
/// treatment (no active name containing the marker) and liquidity (quoted on
/// the session end).
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    config: EligibilityConfig,
    listings: Vec<ListingRecord>,
    name_changes: HashMap<Symbol, Vec<NameChange>>,
}

impl EligibilityFilter {
    /// Create a new filter.
    #[must_use]
    pub fn new(
        config: EligibilityConfig,
        listings: Vec<ListingRecord>,
        name_changes: Vec<NameChange>,
    ) -> Self {
        let mut by_symbol: HashMap<Symbol, Vec<NameChange>> = HashMap::new();
        for change in name_changes {
            by_symbol.entry(change.symbol.clone()).or_default().push(change);
        }
        Self { config, listings, name_changes: by_symbol }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &EligibilityConfig {
        &self.config
    }

    /// Entities seasoned at `session_end`.
    #[must_use]
    pub fn seasoned(&self, session_end: Date) -> BTreeSet<Symbol> {
        let cutoff = session_end.checked_sub_days(Days::new(u64::from(self.config.kickoff_days)));
        self.listings
            .iter()
            .filter(|r| cutoff.is_some_and(|c| r.list_date < c))
            .filter(|r| r.delist_date.is_none_or(|d| session_end < d))
            .map(|r| r.symbol.clone())
            .collect()
    }

    /// Whether `symbol` carries a special-treatment name at `session_end`.
    #[must_use]
    pub fn is_special_treatment(&self, symbol: &Symbol, session_end: Date) -> bool {
        self.name_changes.get(symbol).is_some_and(|changes| {
            changes.iter().any(|c| {
                c.is_active_on(session_end) && c.name.contains(&self.config.special_marker)
            })
        })
    }

    /// Entities eligible at `session_end` given the symbols quoted on that date.
    #[must_use]
    pub fn eligible(&self, session_end: Date, quoted: &HashSet<Symbol>) -> BTreeSet<Symbol> {
        let seasoned = self.seasoned(session_end);
        let n_seasoned = seasoned.len();

        let regular: BTreeSet<Symbol> =
            seasoned.into_iter().filter(|s| !self.is_special_treatment(s, session_end)).collect();
        let n_regular = regular.len();

        let eligible: BTreeSet<Symbol> = regular.into_iter().filter(|s| quoted.contains(s)).collect();

        info!(
            %session_end,
            registry = self.listings.len(),
            seasoned = n_seasoned,
            special_treatment = n_seasoned - n_regular,
            suspended = n_regular - eligible.len(),
            eligible = eligible.len(),
            "filtered universe"
        );
        eligible
    }
}
