//! Currency and amount value objects

use crate::core::error::ConversionError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

const MIN_SYMBOL_LEN: usize = 2;
const MAX_SYMBOL_LEN: usize = 10;

/// A normalized currency or crypto-asset ticker, e.g. `USD` or `BTC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencySymbol(String);

impl CurrencySymbol {
    /// Trims and upper-cases `symbol`, rejecting anything outside 2..=10 characters.
    pub fn new(symbol: &str) -> Result<Self, ConversionError> {
        let normalized = symbol.trim().to_uppercase();
        let len = normalized.chars().count();
        if !(MIN_SYMBOL_LEN..=MAX_SYMBOL_LEN).contains(&len) {
            return Err(ConversionError::InvalidCurrency(format!(
                "'{}' must be between {MIN_SYMBOL_LEN} and {MAX_SYMBOL_LEN} characters",
                symbol.trim()
            )));
        }
        Ok(CurrencySymbol(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencySymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencySymbol {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencySymbol::new(s)
    }
}

impl TryFrom<String> for CurrencySymbol {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencySymbol::new(&value)
    }
}

impl From<CurrencySymbol> for String {
    fn from(symbol: CurrencySymbol) -> Self {
        symbol.0
    }
}

/// A strictly positive, finite amount of money.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Amount(f64);

impl Amount {
    pub fn new(value: f64) -> Result<Self, ConversionError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConversionError::InvalidAmount(value));
        }
        Ok(Amount(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
