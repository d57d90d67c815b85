//! Entity identifier types.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Entity identifier (stock code or ticker).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
pub struct Symbol(pub String);

impl Symbol {
    /// Create a new symbol.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Strip an exchange suffix, e.g. `000001.SZ` becomes `000001`.
    #[must_use]
    pub fn without_exchange(&self) -> Self {
        match self.0.split_once('.') {
            Some((code, _)) => Self(code.to_string()),
            None => self.clone(),
        }
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::borrow::Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}
