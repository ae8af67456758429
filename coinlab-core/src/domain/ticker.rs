//! Ticker symbols and provider-internal asset identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::provider::DataError;

/// Upper-cased asset symbol as compared against the provider directory.
///
/// Input is case-insensitive; the stored form is always upper case so that
/// `"btc"` and `"BTC"` resolve identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickerSymbol(String);

impl TickerSymbol {
    /// Trim and upper-case a user supplied ticker. Empty input is rejected.
    pub fn parse(raw: &str) -> Result<Self, DataError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DataError::InvalidInput(
                "ticker symbol must not be empty".into(),
            ));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TickerSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider slug used to build per-asset URLs (e.g. `bitcoin`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetIdentifier(String);

impl AssetIdentifier {
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
