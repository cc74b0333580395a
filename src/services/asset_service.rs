use tracing::{error, info};

use crate::db::Warehouse;
use crate::models::Asset;
use crate::utils::PipelineError;

/// Read the ranked active asset universe.
/// An empty universe means upstream data is broken, so it is an error.
pub async fn fetch_active_assets(
    warehouse: &dyn Warehouse,
    limit: u32,
) -> Result<Vec<Asset>, PipelineError> {
    let assets = warehouse.fetch_active_assets(limit).await.map_err(|e| {
        error!("Asset fetch failed: {}", e);
        PipelineError::AssetSource(e)
    })?;

    if assets.is_empty() {
        error!("No active assets found");
        return Err(PipelineError::EmptyAssetSet);
    }

    info!("Loaded {} active assets", assets.len());
    Ok(assets)
}
