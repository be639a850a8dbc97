//! Domain error taxonomy for conversions

use std::fmt::Display;
use thiserror::Error;

/// Closed set of failure kinds surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAmount,
    InvalidCurrency,
    Unauthorized,
    Forbidden,
    RateLimitExceeded,
    ServerError,
    NetworkFailure,
    InvalidResponse,
    ApiFailure,
    RetriesExhausted,
    Cancelled,
}

impl ErrorKind {
    /// Whether an attempt that failed with this kind may be tried again.
    ///
    /// Depends on the kind alone, never on message text.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::NetworkFailure | ErrorKind::RateLimitExceeded | ErrorKind::ServerError
        )
    }

    /// Stable message prefix; every rendered error of this kind starts with it.
    pub fn prefix(self) -> &'static str {
        match self {
            ErrorKind::InvalidAmount => "invalid amount",
            ErrorKind::InvalidCurrency => "invalid currency symbol",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::RateLimitExceeded => "rate limit exceeded",
            ErrorKind::ServerError => "server error",
            ErrorKind::NetworkFailure => "network failure",
            ErrorKind::InvalidResponse => "invalid API response",
            ErrorKind::ApiFailure => "API request failed",
            ErrorKind::RetriesExhausted => "max retry attempts",
            ErrorKind::Cancelled => "conversion cancelled",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A classified conversion failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("invalid amount: must be a finite number greater than zero, got {0}")]
    InvalidAmount(f64),

    #[error("invalid currency symbol: {0}")]
    InvalidCurrency(String),

    #[error("unauthorized: invalid API key")]
    Unauthorized,

    #[error("forbidden: API key does not have access to this endpoint")]
    Forbidden,

    #[error("rate limit exceeded: too many requests")]
    RateLimitExceeded,

    #[error("server error: {0}, please try again later")]
    ServerError(String),

    #[error("network failure: could not connect to API: {0}")]
    NetworkFailure(String),

    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    #[error("API request failed: {0}")]
    ApiFailure(String),

    #[error("max retry attempts ({attempts}) exceeded: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<ConversionError>,
    },

    #[error("conversion cancelled before a result was available")]
    Cancelled,
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            ConversionError::InvalidCurrency(_) => ErrorKind::InvalidCurrency,
            ConversionError::Unauthorized => ErrorKind::Unauthorized,
            ConversionError::Forbidden => ErrorKind::Forbidden,
            ConversionError::RateLimitExceeded => ErrorKind::RateLimitExceeded,
            ConversionError::ServerError(_) => ErrorKind::ServerError,
            ConversionError::NetworkFailure(_) => ErrorKind::NetworkFailure,
            ConversionError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            ConversionError::ApiFailure(_) => ErrorKind::ApiFailure,
            ConversionError::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
            ConversionError::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Kind of the concrete failure behind this error.
    ///
    /// For `RetriesExhausted` this is the kind of the last attempt's error.
    pub fn root_kind(&self) -> ErrorKind {
        match self {
            ConversionError::RetriesExhausted { last, .. } => last.root_kind(),
            other => other.kind(),
        }
    }

    /// Builds the error for a classified provider-side kind.
    ///
    /// Kinds without a detail slot drop `detail`. Validation and terminal kinds
    /// never come out of classification; they fold into `ApiFailure`.
    pub(crate) fn from_kind(kind: ErrorKind, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match kind {
            ErrorKind::InvalidCurrency => ConversionError::InvalidCurrency(detail),
            ErrorKind::Unauthorized => ConversionError::Unauthorized,
            ErrorKind::Forbidden => ConversionError::Forbidden,
            ErrorKind::RateLimitExceeded => ConversionError::RateLimitExceeded,
            ErrorKind::ServerError => ConversionError::ServerError(detail),
            ErrorKind::NetworkFailure => ConversionError::NetworkFailure(detail),
            ErrorKind::InvalidResponse => ConversionError::InvalidResponse(detail),
            ErrorKind::ApiFailure
            | ErrorKind::InvalidAmount
            | ErrorKind::RetriesExhausted
            | ErrorKind::Cancelled => ConversionError::ApiFailure(detail),
        }
    }
}
