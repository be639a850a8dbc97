use crate::core::conversion::{ConversionRequest, ConversionResult, PriceRepository};
use crate::core::error::ConversionError;
use crate::core::retry::{RetryError, RetryPolicy, with_retry};
use crate::providers::classify::{classify_http_status, classify_provider_code, classify_transport};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

const CONVERSION_PATH: &str = "/v1/tools/price-conversion";
const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

/// Price repository backed by the CoinMarketCap price-conversion tool.
pub struct CoinMarketCapProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry_policy: RetryPolicy,
}

impl CoinMarketCapProvider {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        CoinMarketCapProvider {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// One round trip to the provider, without retries.
    #[instrument(
        name = "CmcConversionFetch",
        skip(self, request),
        fields(amount = %request.amount, from = %request.from, to = %request.to)
    )]
    pub async fn fetch(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, ConversionError> {
        let endpoint = format!("{}{}", self.base_url, CONVERSION_PATH);
        let url = reqwest::Url::parse_with_params(
            &endpoint,
            &[
                ("amount", request.amount.to_string()),
                ("symbol", request.from.to_string()),
                ("convert", request.to.to_string()),
            ],
        )
        .map_err(|e| ConversionError::ApiFailure(format!("invalid API URL {endpoint}: {e}")))?;
        debug!("Requesting conversion from {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        debug!(%status, "Received CoinMarketCap response");

        let body = response.text().await.map_err(|e| {
            ConversionError::ApiFailure(format!("failed to read response body: {e}"))
        })?;

        if !status.is_success() {
            let provider_message = serde_json::from_str::<ApiResponse>(&body)
                .ok()
                .and_then(|r| r.status.error_message);
            return Err(classify_http_status(
                status.as_u16(),
                provider_message.as_deref(),
                &body,
            ));
        }

        let api_response: ApiResponse = serde_json::from_str(&body)
            .map_err(|e| ConversionError::InvalidResponse(e.to_string()))?;

        debug!(
            error_code = api_response.status.error_code,
            credit_count = ?api_response.status.credit_count,
            timestamp = ?api_response.status.timestamp,
            "Provider status"
        );
        if api_response.status.error_code != 0 {
            return Err(classify_provider_code(
                api_response.status.error_code,
                api_response.status.error_message.as_deref(),
            ));
        }

        let data: ConversionData = serde_json::from_value(api_response.data).map_err(|e| {
            ConversionError::InvalidResponse(format!("failed to parse conversion data: {e}"))
        })?;
        let item = data.into_first().ok_or_else(|| {
            ConversionError::InvalidResponse("response contains no conversion data".to_string())
        })?;
        debug!(symbol = %item.symbol, amount = ?item.amount, "Conversion data");

        let quote = item.quote.get(request.to.as_str()).ok_or_else(|| {
            ConversionError::InvalidResponse(format!("no quote found for {}", request.to))
        })?;
        let converted_amount = quote.price.ok_or_else(|| {
            ConversionError::InvalidResponse(format!("quote for {} has no price", request.to))
        })?;

        Ok(ConversionResult::new(
            request.amount,
            converted_amount,
            request.from.clone(),
            request.to.clone(),
            Utc::now(),
            quote.last_updated,
        ))
    }
}

#[async_trait]
impl PriceRepository for CoinMarketCapProvider {
    async fn get_conversion_price(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<ConversionResult, ConversionError> {
        with_retry(
            &self.retry_policy,
            cancel,
            ConversionError::is_retryable,
            |attempt| {
                debug!(attempt = attempt + 1, "Fetching conversion");
                self.fetch(request)
            },
        )
        .await
        .map_err(|e| match e {
            RetryError::Permanent(err) => err,
            RetryError::Exhausted { attempts, last } => ConversionError::RetriesExhausted {
                attempts,
                last: Box::new(last),
            },
            RetryError::Cancelled { attempts } => {
                debug!(attempts, "Conversion cancelled");
                ConversionError::Cancelled
            }
        })
    }
}

#[derive(Deserialize, Debug)]
struct ApiResponse {
    status: StatusObject,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Deserialize, Debug)]
struct StatusObject {
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    error_code: i64,
    error_message: Option<String>,
    credit_count: Option<i64>,
}

/// The provider returns an array when the symbol matches several assets.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum ConversionData {
    Single(PriceConversionData),
    Many(Vec<PriceConversionData>),
}

impl ConversionData {
    fn into_first(self) -> Option<PriceConversionData> {
        match self {
            ConversionData::Single(item) => Some(item),
            ConversionData::Many(items) => items.into_iter().next(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct PriceConversionData {
    symbol: String,
    amount: Option<f64>,
    quote: HashMap<String, QuoteDetail>,
}

#[derive(Deserialize, Debug)]
struct QuoteDetail {
    price: Option<f64>,
    last_updated: DateTime<Utc>,
}
