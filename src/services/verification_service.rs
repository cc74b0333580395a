use tracing::{error, info};

use crate::db::Warehouse;
use crate::models::CollectionResult;
use crate::utils::PipelineError;

/// Compare the stored distinct-asset count for the target date with the
/// number of successful observations.
///
/// Only catches missing or extra assets. Wrong values, duplicate rows for
/// one asset and corrupted fields all pass.
pub async fn verify_daily_data(
    warehouse: &dyn Warehouse,
    results: &CollectionResult,
) -> Result<(), PipelineError> {
    let timestamp = results.target_date.timestamp();
    let expected = results.success.len();

    info!(
        "Daily Collection Results for {}: successful={} failed={} skipped={}",
        results.target_date,
        results.success.len(),
        results.failed.len(),
        results.skipped.len()
    );

    let found = warehouse.count_assets_at(timestamp).await.map_err(|e| {
        error!("Verification failed: {}", e);
        PipelineError::Verification(e)
    })?;

    if found != expected as i64 {
        error!(
            "Data verification failed. Expected {} records, found {}",
            expected, found
        );
        return Err(PipelineError::VerificationMismatch {
            expected,
            found,
            timestamp,
        });
    }

    info!("Verification: PASSED ({} assets at {})", found, timestamp);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Observation, ObservationDate};
    use crate::testing::FakeWarehouse;
    use rust_decimal::Decimal;

    fn observation(asset_id: i64, date: ObservationDate) -> Observation {
        Observation {
            asset_id,
            timestamp: date.timestamp(),
            price_usd: Decimal::ONE,
            market_cap_usd: Decimal::ONE,
            volume_24h_usd: Decimal::ONE,
        }
    }

    fn results(date: ObservationDate, count: i64) -> CollectionResult {
        let mut results = CollectionResult::new(date);
        results.success = (1..=count).map(|id| observation(id, date)).collect();
        results
    }

    #[tokio::test]
    async fn test_matching_count_passes() {
        let date = ObservationDate::from_ymd(2024, 6, 1);
        let results = results(date, 3);
        let warehouse = FakeWarehouse::new(Vec::new()).with_rows(results.success.clone());

        verify_daily_data(&warehouse, &results).await.unwrap();
    }

    #[tokio::test]
    async fn test_under_count_is_mismatch() {
        let date = ObservationDate::from_ymd(2024, 6, 1);
        let warehouse = FakeWarehouse::new(Vec::new()).reporting_count(199);

        match verify_daily_data(&warehouse, &results(date, 200)).await {
            Err(PipelineError::VerificationMismatch { expected, found, timestamp }) => {
                assert_eq!(expected, 200);
                assert_eq!(found, 199);
                assert_eq!(timestamp, date.timestamp());
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rows_from_other_days_are_ignored() {
        let date = ObservationDate::from_ymd(2024, 6, 1);
        let previous = ObservationDate::from_ymd(2024, 5, 31);
        let results = results(date, 2);
        let mut rows = results.success.clone();
        rows.push(observation(9, previous));
        let warehouse = FakeWarehouse::new(Vec::new()).with_rows(rows);

        verify_daily_data(&warehouse, &results).await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_rows_for_one_asset_go_unnoticed() {
        let date = ObservationDate::from_ymd(2024, 6, 1);
        let results = results(date, 2);
        let mut rows = results.success.clone();
        rows.extend(results.success.clone());
        let warehouse = FakeWarehouse::new(Vec::new()).with_rows(rows);

        verify_daily_data(&warehouse, &results).await.unwrap();
    }
}
