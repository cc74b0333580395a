use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::Client as HttpClient;
use tracing::{debug, warn};

use super::models::{ApiError, CoinHistory, RateLimitInfo};
use crate::api::PriceSource;
use crate::models::ObservationDate;

const API_KEY_HEADER: &str = "x-cg-pro-api-key";

/// CoinGecko Pro API client
pub struct CoinGeckoClient {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
}

impl CoinGeckoClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://pro-api.coingecko.com/api/v3";

    /// `base_url` is normally `DEFAULT_BASE_URL`; tests and staging point elsewhere
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn create_headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let key_value = HeaderValue::from_str(&self.api_key)
            .map_err(|e| ApiError::RequestError(format!("Failed to create API key header: {}", e)))?;
        headers.insert(API_KEY_HEADER, key_value);

        Ok(headers)
    }

    /// Header lookups are case-insensitive in `HeaderMap`
    fn extract_rate_limit_info(headers: &HeaderMap) -> RateLimitInfo {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
        };

        RateLimitInfo {
            limit: header("x-ratelimit-limit").and_then(|s| s.parse().ok()),
            remaining: header("x-ratelimit-remaining").and_then(|s| s.parse().ok()),
            reset: header("x-ratelimit-reset"),
        }
    }

    fn map_send_error(e: reqwest::Error) -> ApiError {
        if e.is_connect() {
            ApiError::Unreachable(e.to_string())
        } else {
            ApiError::RequestError(format!("Request failed: {}", e))
        }
    }

    async fn handle_error_response(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        let body_text = response.text().await.unwrap_or_default();

        match ApiError::from_status(status, body_text) {
            ApiError::RateLimited { .. } => {
                warn!("Rate limited by price source, retry after {:?} s", retry_after);
                ApiError::RateLimited { retry_after }
            }
            ApiError::ServerError(code, body) => {
                warn!("Server error {}: {}", code, body);
                ApiError::ServerError(code, body)
            }
            other => other,
        }
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response, ApiError> {
        let headers = self.create_headers()?;

        let response = self
            .http_client
            .get(url)
            .headers(headers)
            .query(query)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        Ok(response)
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    /// GET /ping
    ///
    /// Lightweight call whose only interesting output is the rate limit headers.
    async fn ping(&self) -> Result<RateLimitInfo, ApiError> {
        let url = format!("{}/ping", self.base_url);
        let response = self.get(&url, &[]).await?;

        let info = Self::extract_rate_limit_info(response.headers());
        debug!("Ping rate limit headers: {:?}", info);
        Ok(info)
    }

    /// GET /coins/{id}/history?date=DD-MM-YYYY
    async fn coin_history(
        &self,
        external_id: &str,
        date: ObservationDate,
    ) -> Result<CoinHistory, ApiError> {
        let url = format!("{}/coins/{}/history", self.base_url, external_id);
        let query = [
            ("date", date.api_format()),
            ("localization", "false".to_string()),
        ];

        self.get(&url, &query)
            .await?
            .json::<CoinHistory>()
            .await
            .map_err(|e| ApiError::DeserializationError(format!("Failed to parse response: {}", e)))
    }
}
