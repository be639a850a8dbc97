//! Currency conversion use case

use crate::core::conversion::{ConversionRequest, ConversionResult, PriceRepository};
use crate::core::currency::{Amount, CurrencySymbol};
use crate::core::error::ConversionError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Validates raw user input and asks the repository for a conversion.
pub struct CurrencyConverter<R> {
    repository: R,
}

impl<R: PriceRepository> CurrencyConverter<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Converts `amount` of `from` into `to`.
    ///
    /// Invalid input is rejected before the repository is called.
    pub async fn convert(
        &self,
        amount: f64,
        from: &str,
        to: &str,
        cancel: &CancellationToken,
    ) -> Result<ConversionResult, ConversionError> {
        let amount = Amount::new(amount)?;
        let from = CurrencySymbol::new(from)?;
        let to = CurrencySymbol::new(to)?;
        let request = ConversionRequest::new(amount, from, to);
        debug!(?request, "Validated conversion request");

        let result = self
            .repository
            .get_conversion_price(&request, cancel)
            .await?;
        info!(
            from = %result.from(),
            to = %result.to(),
            rate = result.exchange_rate(),
            "Conversion completed"
        );
        Ok(result)
    }
}
