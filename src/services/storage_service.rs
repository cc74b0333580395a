use tracing::{error, info};

use crate::db::Warehouse;
use crate::models::CollectionResult;
use crate::utils::PipelineError;

/// Persist every successful observation in one all-or-nothing write.
/// Returns `results` unchanged so the Verifier can take it next.
pub async fn store_daily_data(
    warehouse: &dyn Warehouse,
    results: CollectionResult,
) -> Result<CollectionResult, PipelineError> {
    let committed = warehouse
        .insert_observations(&results.success)
        .await
        .map_err(|e| {
            error!("Failed to store data: {}", e);
            PipelineError::Write(e)
        })?;

    info!(
        "Stored {} rows for {} in PRICE_HISTORY_COMPLETE",
        committed, results.target_date
    );
    Ok(results)
}
