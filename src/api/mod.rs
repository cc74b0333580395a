//! External price source

use async_trait::async_trait;

use crate::models::ObservationDate;

pub mod coingecko;

pub use coingecko::{ApiError, CoinHistory, RateLimitInfo};

/// The two calls the pipeline makes against the price source
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Lightweight call used to read the remaining quota
    async fn ping(&self) -> Result<RateLimitInfo, ApiError>;

    /// Historical snapshot of one coin for one day
    async fn coin_history(
        &self,
        external_id: &str,
        date: ObservationDate,
    ) -> Result<CoinHistory, ApiError>;
}
