pub mod convert;
pub mod setup;
pub mod ui;

use crate::core::{ConversionError, ErrorKind};

/// Suggestion shown under an error, keyed on the concrete failure kind.
pub fn hint_for(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::Unauthorized => {
            Some("Check that CMC_API_KEY holds a valid CoinMarketCap API key.")
        }
        ErrorKind::Forbidden => Some("Your API plan does not include the price-conversion endpoint."),
        ErrorKind::RateLimitExceeded => {
            Some("The API rate limit was reached; wait a minute and try again.")
        }
        ErrorKind::NetworkFailure => Some("Check your network connection and CMC_API_URL."),
        ErrorKind::ServerError => Some("CoinMarketCap is having trouble; try again later."),
        ErrorKind::InvalidCurrency => Some("Use ticker symbols such as USD, EUR, BTC or ETH."),
        ErrorKind::Cancelled => {
            Some("The conversion was interrupted or exceeded timeout_secs.")
        }
        ErrorKind::InvalidAmount
        | ErrorKind::InvalidResponse
        | ErrorKind::ApiFailure
        | ErrorKind::RetriesExhausted => None,
    }
}

/// Prints `err` to stderr, with a hint when it wraps a conversion failure.
pub fn present_error(err: &anyhow::Error) {
    eprintln!("{} {err:#}", ui::style_text("Error:", ui::StyleType::Error));

    if let Some(hint) = err
        .downcast_ref::<ConversionError>()
        .and_then(|e| hint_for(e.root_kind()))
    {
        eprintln!("{}", ui::style_text(hint, ui::StyleType::Subtle));
    }
}
