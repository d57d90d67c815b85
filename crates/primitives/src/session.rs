//! Session and horizon definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Date;

/// Period label of an evaluation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SessionPeriod {
    /// One calendar month.
    #[serde(rename = "M", alias = "1m")]
    Monthly,
    /// Three calendar months.
    #[serde(rename = "Q", alias = "3m")]
    Quarterly,
    /// Six calendar months.
    #[serde(rename = "SA", alias = "6m")]
    SemiAnnual,
    /// Twelve calendar months.
    #[serde(rename = "A", alias = "12m")]
    Annual,
}

impl SessionPeriod {
    /// All period labels, shortest first.
    pub const ALL: [Self; 4] = [Self::Monthly, Self::Quarterly, Self::SemiAnnual, Self::Annual];

    /// Number of calendar months covered by one session.
    #[must_use]
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::SemiAnnual => 6,
            Self::Annual => 12,
        }
    }

    /// Short label used in column names (`M`, `Q`, `SA`, `A`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Monthly => "M",
            Self::Quarterly => "Q",
            Self::SemiAnnual => "SA",
            Self::Annual => "A",
        }
    }

    /// Look up the period covering exactly `months` months.
    #[must_use]
    pub const fn from_months(months: u32) -> Option<Self> {
        match months {
            1 => Some(Self::Monthly),
            3 => Some(Self::Quarterly),
            6 => Some(Self::SemiAnnual),
            12 => Some(Self::Annual),
            _ => None,
        }
    }
}

impl fmt::Display for SessionPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One dated evaluation window, both ends on trading dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Session {
    /// Period label.
    pub period: SessionPeriod,
    /// First trading date of the window.
    pub start: Date,
    /// Last trading date of the window.
    pub end: Date,
}

impl Session {
    /// Create a new session.
    #[must_use]
    pub const fn new(period: SessionPeriod, start: Date, end: Date) -> Self {
        Self { period, start, end }
    }

    /// Whether two windows share at least one day.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Whether `date` falls inside the window.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Forward return horizon in months.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Horizon(pub u32);

impl Horizon {
    /// Horizons evaluated by default.
    pub const STANDARD: [Self; 4] = [Self(1), Self(3), Self(6), Self(12)];

    /// Create a new horizon.
    #[must_use]
    pub const fn months(months: u32) -> Self {
        Self(months)
    }

    /// Number of months.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Excess return column name, e.g. `er_3m`.
    #[must_use]
    pub fn er_column(self) -> String {
        format!("er_{}m", self.0)
    }

    /// Weight column name, e.g. `weight_3m`.
    #[must_use]
    pub fn weight_column(self) -> String {
        format!("weight_{}m", self.0)
    }

    /// Parse an excess return column name back into a horizon.
    #[must_use]
    pub fn from_er_column(name: &str) -> Option<Self> {
        name.strip_prefix("er_")
            .and_then(|rest| rest.strip_suffix('m'))
            .and_then(|months| months.parse::<u32>().ok())
            .filter(|&months| months > 0)
            .map(Self)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}
