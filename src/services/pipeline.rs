//! The five-stage daily run: quota, assets, collect, store, verify.
//! Stages run strictly in order; the first error ends the run.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::api::PriceSource;
use crate::config::Settings;
use crate::db::Warehouse;
use crate::models::RunReport;
use crate::services::{
    asset_service, collection_service, quota_service, storage_service, verification_service,
};
use crate::utils::PipelineError;

pub async fn run_pipeline(
    settings: &Settings,
    source: &dyn PriceSource,
    warehouse: &dyn Warehouse,
    run_time: DateTime<Utc>,
) -> Result<RunReport, PipelineError> {
    info!("[1/5] Checking API quota");
    quota_service::check_quota(source, settings.quota_min_remaining).await?;

    info!("[2/5] Fetching active assets");
    let assets = asset_service::fetch_active_assets(warehouse, settings.asset_limit).await?;

    info!("[3/5] Collecting daily data");
    let results =
        collection_service::collect_daily_data(source, &assets, &settings.collector, run_time)
            .await?;

    info!("[4/5] Storing daily data");
    let stored = storage_service::store_daily_data(warehouse, results).await?;

    info!("[5/5] Verifying daily data");
    verification_service::verify_daily_data(warehouse, &stored).await?;

    Ok(stored.report())
}
