//! Conversion abstractions and core types

use crate::core::currency::{Amount, CurrencySymbol};
use crate::core::error::ConversionError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// A validated request to convert `amount` of `from` into `to`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub amount: Amount,
    pub from: CurrencySymbol,
    pub to: CurrencySymbol,
}

impl ConversionRequest {
    pub fn new(amount: Amount, from: CurrencySymbol, to: CurrencySymbol) -> Self {
        Self { amount, from, to }
    }
}

/// Outcome of one successful provider round trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    original_amount: f64,
    converted_amount: f64,
    from: CurrencySymbol,
    to: CurrencySymbol,
    exchange_rate: f64,
    fetched_at: DateTime<Utc>,
    source_updated_at: DateTime<Utc>,
}

impl ConversionResult {
    /// The exchange rate is derived as `converted_amount / original_amount`.
    pub(crate) fn new(
        original_amount: Amount,
        converted_amount: f64,
        from: CurrencySymbol,
        to: CurrencySymbol,
        fetched_at: DateTime<Utc>,
        source_updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            original_amount: original_amount.value(),
            converted_amount,
            exchange_rate: converted_amount / original_amount.value(),
            from,
            to,
            fetched_at,
            source_updated_at,
        }
    }

    pub fn original_amount(&self) -> f64 {
        self.original_amount
    }

    pub fn converted_amount(&self) -> f64 {
        self.converted_amount
    }

    pub fn from(&self) -> &CurrencySymbol {
        &self.from
    }

    pub fn to(&self) -> &CurrencySymbol {
        &self.to
    }

    pub fn exchange_rate(&self) -> f64 {
        self.exchange_rate
    }

    /// When the query was made.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// When the provider last refreshed the quote.
    pub fn source_updated_at(&self) -> DateTime<Utc> {
        self.source_updated_at
    }
}

#[async_trait]
pub trait PriceRepository: Send + Sync {
    /// Fetches the converted price for `request`.
    ///
    /// Implementations stop early once `cancel` fires and report
    /// [`ConversionError::Cancelled`].
    async fn get_conversion_price(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<ConversionResult, ConversionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_rate_is_derived_from_amounts() {
        let now = Utc::now();
        let result = ConversionResult::new(
            Amount::new(100.0).unwrap(),
            0.0025,
            "USD".parse().unwrap(),
            "BTC".parse().unwrap(),
            now,
            now,
        );

        assert_eq!(result.original_amount(), 100.0);
        assert_eq!(result.converted_amount(), 0.0025);
        assert!((result.exchange_rate() - 0.000025).abs() < 1e-15);
        assert!(
            (result.exchange_rate() * result.original_amount() - result.converted_amount()).abs()
                < 1e-12
        );
        assert_eq!(result.from().as_str(), "USD");
        assert_eq!(result.to().as_str(), "BTC");
        assert_eq!(result.fetched_at(), now);
        assert_eq!(result.source_updated_at(), now);
    }

    #[test]
    fn test_result_serializes_symbols_as_strings() {
        let now = Utc::now();
        let result = ConversionResult::new(
            Amount::new(2.0).unwrap(),
            100.0,
            "ETH".parse().unwrap(),
            "USD".parse().unwrap(),
            now,
            now,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["from"], "ETH");
        assert_eq!(json["to"], "USD");
        assert_eq!(json["exchange_rate"], 50.0);
    }
}
