use coinconv::cli::convert::{ConvertArgs, OutputFormat};
use coinconv::core::{ConversionError, CurrencyConverter, ErrorKind, RetryPolicy};
use coinconv::providers::CoinMarketCapProvider;
use std::fs;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const ETH_TO_EUR: &str = r#"{
        "status": {
            "timestamp": "2024-03-01T12:00:00.000Z",
            "error_code": 0,
            "error_message": null,
            "elapsed": 9,
            "credit_count": 1
        },
        "data": {
            "id": 1027,
            "symbol": "ETH",
            "name": "Ethereum",
            "amount": 1.5,
            "last_updated": "2024-03-01T11:59:00.000Z",
            "quote": {
                "EUR": {
                    "price": 4500.0,
                    "last_updated": "2024-03-01T11:58:00.000Z"
                }
            }
        }
    }"#;

    pub async fn create_mock_server(
        from: &str,
        to: &str,
        template: ResponseTemplate,
        expected_calls: u64,
    ) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/tools/price-conversion"))
            .and(query_param("symbol", from))
            .and(query_param("convert", to))
            .respond_with(template)
            .expect(expected_calls)
            .mount(&mock_server)
            .await;

        mock_server
    }
}

fn fast_retries() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        multiplier: 2.0,
    }
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let mock_server = test_utils::create_mock_server(
        "ETH",
        "EUR",
        wiremock::ResponseTemplate::new(200).set_body_string(test_utils::ETH_TO_EUR),
        1,
    )
    .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    let config_content = format!(
        r#"
api:
  base_url: "{}"
  key: "integration-key"
timeout_secs: 10
retry:
  max_attempts: 2
  initial_delay_ms: 10
  max_delay_ms: 50
"#,
        mock_server.uri()
    );
    fs::write(&config_path, config_content).unwrap();
    info!(path = %config_path.display(), "Wrote test config");

    let args = ConvertArgs {
        amount: 1.5,
        from: "eth".to_string(),
        to: "eur".to_string(),
        format: OutputFormat::Json,
    };
    let result = coinconv::run_command(
        coinconv::AppCommand::Convert(args),
        config_path.to_str(),
    )
    .await;

    assert!(result.is_ok(), "run_command failed: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_converter_with_coinmarketcap_provider() {
    let mock_server = test_utils::create_mock_server(
        "ETH",
        "EUR",
        wiremock::ResponseTemplate::new(200).set_body_string(test_utils::ETH_TO_EUR),
        1,
    )
    .await;

    let provider = CoinMarketCapProvider::new(reqwest::Client::new(), &mock_server.uri(), "k")
        .with_retry_policy(fast_retries());
    let converter = CurrencyConverter::new(provider);
    let cancel = CancellationToken::new();

    let result = converter
        .convert(1.5, " eth ", "EUR", &cancel)
        .await
        .unwrap();

    info!(?result, "Conversion succeeded");
    assert_eq!(result.from().as_str(), "ETH");
    assert_eq!(result.to().as_str(), "EUR");
    assert_eq!(result.converted_amount(), 4500.0);
    assert_eq!(result.exchange_rate(), 3000.0);
}

#[test_log::test(tokio::test)]
async fn test_invalid_input_never_reaches_the_api() {
    let mock_server = test_utils::create_mock_server(
        "ETH",
        "EUR",
        wiremock::ResponseTemplate::new(200).set_body_string(test_utils::ETH_TO_EUR),
        0,
    )
    .await;

    let provider = CoinMarketCapProvider::new(reqwest::Client::new(), &mock_server.uri(), "k");
    let converter = CurrencyConverter::new(provider);
    let cancel = CancellationToken::new();

    let err = converter
        .convert(-1.0, "ETH", "EUR", &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAmount);

    let err = converter
        .convert(1.0, "ETH", "E", &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCurrency);
}

#[test_log::test(tokio::test)]
async fn test_unauthorized_surfaces_through_app_error() {
    let mock_server = test_utils::create_mock_server(
        "BTC",
        "USD",
        wiremock::ResponseTemplate::new(401).set_body_string(
            r#"{"status": {"error_code": 1002, "error_message": "API key missing."}}"#,
        ),
        1,
    )
    .await;

    let provider = CoinMarketCapProvider::new(reqwest::Client::new(), &mock_server.uri(), "bad")
        .with_retry_policy(fast_retries());
    let converter = CurrencyConverter::new(provider);
    let cancel = CancellationToken::new();

    let err = converter
        .convert(1.0, "BTC", "USD", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ConversionError::Unauthorized));
    assert!(!err.is_retryable());

    let app_err = anyhow::Error::from(err);
    let inner = app_err.downcast_ref::<ConversionError>().unwrap();
    assert_eq!(inner.root_kind(), ErrorKind::Unauthorized);
    assert!(coinconv::cli::hint_for(inner.root_kind()).is_some());
}

#[test_log::test(tokio::test)]
async fn test_server_errors_exhaust_configured_attempts() {
    let mock_server = test_utils::create_mock_server(
        "BTC",
        "USD",
        wiremock::ResponseTemplate::new(503),
        3,
    )
    .await;

    let provider = CoinMarketCapProvider::new(reqwest::Client::new(), &mock_server.uri(), "k")
        .with_retry_policy(fast_retries());
    let converter = CurrencyConverter::new(provider);
    let cancel = CancellationToken::new();

    let err = converter
        .convert(1.0, "BTC", "USD", &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RetriesExhausted);
    assert_eq!(err.root_kind(), ErrorKind::ServerError);
    assert!(err.to_string().starts_with("max retry attempts (3) exceeded"));
}
