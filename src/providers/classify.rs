//! Classify HTTP statuses, provider error codes and transport failures into
//! [`ConversionError`]s.
//!
//! HTTP statuses and the codes the provider embeds in its `status` block share
//! one rule table, so both paths always agree on the kind.

use crate::core::error::{ConversionError, ErrorKind};

struct Rule {
    kind: ErrorKind,
    http: &'static [u16],
    provider: &'static [i64],
}

const RULES: &[Rule] = &[
    Rule {
        kind: ErrorKind::InvalidCurrency,
        http: &[400],
        provider: &[],
    },
    Rule {
        kind: ErrorKind::Unauthorized,
        http: &[401],
        provider: &[1001, 1002],
    },
    Rule {
        kind: ErrorKind::Forbidden,
        http: &[403],
        provider: &[1005, 1006, 1007],
    },
    Rule {
        kind: ErrorKind::RateLimitExceeded,
        http: &[429],
        provider: &[1008, 1009, 1010, 1011],
    },
    Rule {
        kind: ErrorKind::ServerError,
        http: &[500, 502, 503, 504],
        provider: &[],
    },
];

/// Kind for a non-2xx HTTP status. Unlisted statuses are `ApiFailure`.
pub fn kind_for_status(status: u16) -> ErrorKind {
    RULES
        .iter()
        .find(|rule| rule.http.contains(&status))
        .map_or(ErrorKind::ApiFailure, |rule| rule.kind)
}

/// Kind for a non-zero provider `error_code`. Unlisted codes are `ApiFailure`.
pub fn kind_for_provider_code(code: i64) -> ErrorKind {
    RULES
        .iter()
        .find(|rule| rule.provider.contains(&code))
        .map_or(ErrorKind::ApiFailure, |rule| rule.kind)
}

/// Classifies a non-2xx response.
///
/// `provider_message` is the `error_message` from the body when it decoded as
/// a provider envelope; `body` is the raw response text.
pub fn classify_http_status(
    status: u16,
    provider_message: Option<&str>,
    body: &str,
) -> ConversionError {
    let kind = kind_for_status(status);
    let detail = match kind {
        ErrorKind::InvalidCurrency => provider_message
            .map(str::to_string)
            .unwrap_or_else(|| body.trim().to_string()),
        _ => format!("HTTP {status}"),
    };
    ConversionError::from_kind(kind, detail)
}

/// Classifies a non-zero error code reported inside a response envelope.
pub fn classify_provider_code(code: i64, message: Option<&str>) -> ConversionError {
    let kind = kind_for_provider_code(code);
    let detail = format!("code {} - {}", code, message.unwrap_or_default());
    ConversionError::from_kind(kind, detail)
}

/// Classifies a failure to get any response at all.
///
/// A request that could not even be built (e.g. an API key that is not a
/// valid header value) never reached the network and is not retryable.
pub fn classify_transport(err: &reqwest::Error) -> ConversionError {
    if err.is_builder() {
        return ConversionError::ApiFailure(format!("invalid request: {err}"));
    }
    let reason = if err.is_timeout() {
        "request timeout"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    ConversionError::NetworkFailure(format!("{reason}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_table() {
        let cases = [
            (400, ErrorKind::InvalidCurrency, false),
            (401, ErrorKind::Unauthorized, false),
            (403, ErrorKind::Forbidden, false),
            (429, ErrorKind::RateLimitExceeded, true),
            (500, ErrorKind::ServerError, true),
            (502, ErrorKind::ServerError, true),
            (503, ErrorKind::ServerError, true),
            (504, ErrorKind::ServerError, true),
            (404, ErrorKind::ApiFailure, false),
            (418, ErrorKind::ApiFailure, false),
            (501, ErrorKind::ApiFailure, false),
            (302, ErrorKind::ApiFailure, false),
        ];
        for (status, kind, retryable) in cases {
            let err = classify_http_status(status, None, "");
            assert_eq!(err.kind(), kind, "HTTP {status}");
            assert_eq!(err.is_retryable(), retryable, "HTTP {status}");
        }
    }

    #[test]
    fn test_provider_code_table() {
        let cases = [
            (1001, ErrorKind::Unauthorized, false),
            (1002, ErrorKind::Unauthorized, false),
            (1005, ErrorKind::Forbidden, false),
            (1006, ErrorKind::Forbidden, false),
            (1007, ErrorKind::Forbidden, false),
            (1008, ErrorKind::RateLimitExceeded, true),
            (1009, ErrorKind::RateLimitExceeded, true),
            (1010, ErrorKind::RateLimitExceeded, true),
            (1011, ErrorKind::RateLimitExceeded, true),
            (1003, ErrorKind::ApiFailure, false),
            (400, ErrorKind::ApiFailure, false),
            (500, ErrorKind::ApiFailure, false),
        ];
        for (code, kind, retryable) in cases {
            let err = classify_provider_code(code, Some("whatever"));
            assert_eq!(err.kind(), kind, "code {code}");
            assert_eq!(err.is_retryable(), retryable, "code {code}");
        }
    }

    #[test]
    fn test_classification_ignores_message_text() {
        for message in [None, Some(""), Some("please retry"), Some("server error")] {
            assert_eq!(
                classify_provider_code(1002, message).kind(),
                ErrorKind::Unauthorized
            );
            assert_eq!(
                classify_http_status(503, message, "rate limit").kind(),
                ErrorKind::ServerError
            );
        }
    }

    #[test]
    fn test_bad_request_detail_prefers_provider_message() {
        let err = classify_http_status(400, Some("Invalid value for \"symbol\": \"XYZQ\""), "{}");
        assert_eq!(
            err.to_string(),
            "invalid currency symbol: Invalid value for \"symbol\": \"XYZQ\""
        );

        let err = classify_http_status(400, None, "  bad request  ");
        assert_eq!(err.to_string(), "invalid currency symbol: bad request");
    }

    #[test]
    fn test_unknown_provider_code_detail() {
        let err = classify_provider_code(1003, Some("Your API Key must be activated"));
        assert_eq!(
            err.to_string(),
            "API request failed: code 1003 - Your API Key must be activated"
        );
    }
}
