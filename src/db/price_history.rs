use chrono::NaiveDateTime;
use sqlx::mysql::MySqlConnection;

use crate::models::Observation;

/// Insert one daily row
pub async fn insert_observation(
    conn: &mut MySqlConnection,
    observation: &Observation,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO PRICE_HISTORY_COMPLETE (ASSET_ID, TIMESTAMP, PRICE_USD, MARKET_CAP_USD, VOLUME_24H_USD) \
         VALUES (?, ?, ?, ?, ?)"
    )
    .bind(observation.asset_id)
    .bind(observation.timestamp)
    .bind(observation.price_usd)
    .bind(observation.market_cap_usd)
    .bind(observation.volume_24h_usd)
    .execute(conn)
    .await?;

    Ok(())
}

/// Number of distinct assets that have a row at `timestamp`
pub async fn count_distinct_assets_at(
    conn: &mut MySqlConnection,
    timestamp: NaiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT ASSET_ID) FROM PRICE_HISTORY_COMPLETE WHERE TIMESTAMP = ?"
    )
    .bind(timestamp)
    .fetch_one(conn)
    .await
}
