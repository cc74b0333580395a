use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Rate limit information from `/ping` response headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub reset: Option<String>,
}

/// Body of `GET /coins/{id}/history`
#[derive(Debug, Clone, Deserialize)]
pub struct CoinHistory {
    pub id: Option<String>,
    pub market_data: Option<MarketData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketData {
    pub current_price: UsdQuote,
    pub market_cap: UsdQuote,
    pub total_volume: UsdQuote,
}

/// Per-currency figure map; only the `usd` entry is read
#[derive(Debug, Clone, Deserialize)]
pub struct UsdQuote {
    pub usd: Option<Decimal>,
}

/// The three USD figures stored for each asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsdFigures {
    pub price: Decimal,
    pub market_cap: Decimal,
    pub volume: Decimal,
}

impl CoinHistory {
    /// Extract `market_data.{current_price,market_cap,total_volume}.usd`.
    /// Coins without market data for the requested day come back without these fields.
    pub fn usd_figures(&self) -> Result<UsdFigures, ApiError> {
        let coin = self.id.as_deref().unwrap_or("unknown");
        let market_data = self.market_data.as_ref().ok_or_else(|| {
            ApiError::DeserializationError(format!("no market_data for {}", coin))
        })?;

        let field = |quote: &UsdQuote, name: &str| {
            quote.usd.ok_or_else(|| {
                ApiError::DeserializationError(format!("missing {}.usd for {}", name, coin))
            })
        };

        Ok(UsdFigures {
            price: field(&market_data.current_price, "current_price")?,
            market_cap: field(&market_data.market_cap, "market_cap")?,
            volume: field(&market_data.total_volume, "total_volume")?,
        })
    }
}

/// Error type for price source operations
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400 Bad Request
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// 401 Unauthorized
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// 403 Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// 404 Not Found
    #[error("Not Found: {0}")]
    NotFound(String),
    /// 429 Too Many Requests
    #[error("Rate Limited. Retry after {retry_after:?} s")]
    RateLimited { retry_after: Option<u64> },
    /// 5xx Server Error
    #[error("Server Error ({0}): {1}")]
    ServerError(u16, String),
    /// Other non-success statuses
    #[error("HTTP Error ({0}): {1}")]
    HttpError(u16, String),
    /// No connection could be established at all
    #[error("Price source unreachable: {0}")]
    Unreachable(String),
    /// Any other request failure (timeout, broken body, ...)
    #[error("Request Error: {0}")]
    RequestError(String),
    #[error("Deserialization Error: {0}")]
    DeserializationError(String),
}

impl ApiError {
    /// Map a non-success status and its body onto an error variant
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 => {
                // CoinGecko puts the reason under "error"
                let message = serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                    .unwrap_or(body);
                ApiError::BadRequest(message)
            }
            401 => ApiError::Unauthorized(body),
            403 => ApiError::Forbidden(body),
            404 => ApiError::NotFound(body),
            429 => ApiError::RateLimited { retry_after: None },
            500..=599 => ApiError::ServerError(status, body),
            _ => ApiError::HttpError(status, body),
        }
    }

    /// HTTP status behind the error, if the request got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest(_) => Some(400),
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::RateLimited { .. } => Some(429),
            ApiError::ServerError(code, _) | ApiError::HttpError(code, _) => Some(*code),
            ApiError::Unreachable(_)
            | ApiError::RequestError(_)
            | ApiError::DeserializationError(_) => None,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Unreachable(_))
    }
}
