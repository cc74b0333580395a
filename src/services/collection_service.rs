//! Daily collection sweep
//!
//! Fetches one history snapshot per asset for the target date, batch by
//! batch. Per-asset failures are recorded and the sweep carries on; only an
//! unreachable price source (under `FailurePolicy::RestartSweep`) aborts the
//! sweep, and then the whole sweep is retried from the first asset.
//!
//! Known edge case: a restarted sweep fetches every asset again, including
//! the ones that already succeeded in the aborted attempt. Nothing from an
//! aborted attempt is kept.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, PriceSource};
use crate::config::{CollectorSettings, FailurePolicy};
use crate::models::{Asset, CollectionResult, Observation, ObservationDate};
use crate::utils::{retry_with_backoff, BatchPacer, PipelineError};

/// Collect yesterday's (relative to `run_time`) figures for every asset
pub async fn collect_daily_data(
    source: &dyn PriceSource,
    assets: &[Asset],
    settings: &CollectorSettings,
    run_time: DateTime<Utc>,
) -> Result<CollectionResult, PipelineError> {
    let target_date = ObservationDate::from_run_time(run_time);
    info!(
        "Collecting {} assets for {} in batches of {}",
        assets.len(),
        target_date,
        settings.batch_size
    );

    let results = retry_with_backoff(settings.max_attempts, settings.backoff, |attempt| {
        if attempt > 1 {
            info!("Restarting collection sweep (attempt {})", attempt);
        }
        sweep(source, assets, settings, target_date)
    })
    .await
    .map_err(|exhausted| {
        error!(
            "Collection aborted after {} attempt(s): {}",
            exhausted.attempts, exhausted.last
        );
        PipelineError::CollectorExhausted {
            attempts: exhausted.attempts,
            last: exhausted.last,
        }
    })?;

    if !results.is_partitioned() {
        warn!(
            "Asset ids repeat across collection outcomes for {}; the asset list has duplicates",
            results.target_date
        );
    }
    Ok(results)
}

/// One full pass over the assets with a fresh result
async fn sweep(
    source: &dyn PriceSource,
    assets: &[Asset],
    settings: &CollectorSettings,
    target_date: ObservationDate,
) -> Result<CollectionResult, ApiError> {
    let mut results = CollectionResult::new(target_date);
    let mut pacer = BatchPacer::new(assets, settings.batch_size, settings.batch_pause);

    while let Some(batch) = pacer.next_batch().await {
        debug!("Batch {}: {} assets", pacer.batches_yielded(), batch.len());

        for asset in batch {
            match fetch_observation(source, asset, target_date).await {
                Ok(observation) => results.success.push(observation),
                Err(e)
                    if e.is_unreachable()
                        && settings.failure_policy == FailurePolicy::RestartSweep =>
                {
                    error!("Price source unreachable while collecting {}: {}", asset.asset_id, e);
                    return Err(e);
                }
                Err(e) => {
                    match e.status() {
                        Some(status) => {
                            error!("Failed to collect data for {}: {}", asset.asset_id, status)
                        }
                        None => error!("Failed to collect data for {}: {}", asset.asset_id, e),
                    }
                    results.failed.push(asset.asset_id);
                }
            }
        }
    }

    info!(
        "Sweep finished: {} collected, {} failed, {} batches, {} pauses",
        results.success.len(),
        results.failed.len(),
        pacer.batches_yielded(),
        pacer.pauses_taken()
    );
    Ok(results)
}

async fn fetch_observation(
    source: &dyn PriceSource,
    asset: &Asset,
    target_date: ObservationDate,
) -> Result<Observation, ApiError> {
    let figures = source
        .coin_history(&asset.external_id, target_date)
        .await?
        .usd_figures()?;

    Ok(Observation {
        asset_id: asset.asset_id,
        timestamp: target_date.timestamp(),
        price_usd: figures.price,
        market_cap_usd: figures.market_cap,
        volume_24h_usd: figures.volume,
    })
}
