//! Core business logic abstractions

pub mod config;
pub mod conversion;
pub mod converter;
pub mod currency;
pub mod error;
pub mod log;
pub mod retry;

// Re-export main types for cleaner imports
pub use conversion::{ConversionRequest, ConversionResult, PriceRepository};
pub use converter::CurrencyConverter;
pub use currency::{Amount, CurrencySymbol};
pub use error::{ConversionError, ErrorKind};
pub use retry::{RetryError, RetryPolicy, with_retry};
