use tracing::{error, info, warn};

use crate::api::PriceSource;
use crate::utils::PipelineError;

/// Verify enough API calls remain for a full run.
///
/// A missing `X-Ratelimit-Remaining` header counts as zero remaining.
/// Any failure here is fatal; quota is a precondition, not a transient fault.
pub async fn check_quota(
    source: &dyn PriceSource,
    min_remaining: u64,
) -> Result<bool, PipelineError> {
    let info = source.ping().await.map_err(|e| {
        error!("API limit check failed: {}", e);
        PipelineError::QuotaCheck(e)
    })?;

    let remaining = info.remaining.unwrap_or_else(|| {
        warn!("Price source did not report remaining quota, treating as 0");
        0
    });

    if remaining < min_remaining {
        error!("Only {} API calls remaining (threshold {})", remaining, min_remaining);
        return Err(PipelineError::QuotaExceeded {
            remaining,
            threshold: min_remaining,
        });
    }

    match info.limit {
        Some(limit) => info!("API calls remaining: {} of {}", remaining, limit),
        None => info!("API calls remaining: {}", remaining),
    }
    if let Some(reset) = &info.reset {
        info!("API quota resets at {}", reset);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePriceSource;

    #[tokio::test]
    async fn test_below_threshold_is_rejected() {
        let source = FakePriceSource::new().with_remaining(Some(999));

        match check_quota(&source, 1000).await {
            Err(PipelineError::QuotaExceeded { remaining, threshold }) => {
                assert_eq!(remaining, 999);
                assert_eq!(threshold, 1000);
            }
            other => panic!("expected quota error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_threshold_itself_is_enough() {
        let source = FakePriceSource::new().with_remaining(Some(1000));
        assert!(check_quota(&source, 1000).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_header_fails_closed() {
        let source = FakePriceSource::new().with_remaining(None);
        assert!(matches!(
            check_quota(&source, 1000).await,
            Err(PipelineError::QuotaExceeded { remaining: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_ping_failure_is_fatal() {
        let source = FakePriceSource::new().with_failing_ping();
        assert!(matches!(
            check_quota(&source, 1000).await,
            Err(PipelineError::QuotaCheck(_))
        ));
    }
}
