use chrono::NaiveDateTime;
use thiserror::Error;

use crate::api::ApiError;

/// Missing or unusable settings, detected once at startup
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("Invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Run-level failures. Each one aborts the run; the orchestrator decides
/// whether to retry and who to notify.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Only {remaining} API calls remaining (threshold {threshold})")]
    QuotaExceeded { remaining: u64, threshold: u64 },

    #[error("API limit check failed: {0}")]
    QuotaCheck(#[source] ApiError),

    #[error("No active assets found")]
    EmptyAssetSet,

    #[error("Asset fetch failed: {0}")]
    AssetSource(#[source] sqlx::Error),

    #[error("Collection failed after {attempts} attempt(s): {last}")]
    CollectorExhausted {
        attempts: u32,
        #[source]
        last: ApiError,
    },

    #[error("Failed to store data: {0}")]
    Write(#[source] sqlx::Error),

    #[error("Failed to apply warehouse schema: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("Verification query failed: {0}")]
    Verification(#[source] sqlx::Error),

    /// Raised after the write committed: the rows stay in the warehouse
    #[error("Data verification failed. Expected {expected} records, found {found} for {timestamp}")]
    VerificationMismatch {
        expected: usize,
        found: i64,
        timestamp: NaiveDateTime,
    },
}
