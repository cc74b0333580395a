use sqlx::mysql::MySqlConnection;

use crate::models::Asset;

/// Active assets with a CoinGecko id, best market cap rank first
pub async fn get_active_assets(
    conn: &mut MySqlConnection,
    limit: u32,
) -> Result<Vec<Asset>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, String)>(
        "SELECT ASSET_ID, COINGECKO_ID FROM ASSETS \
         WHERE IS_ACTIVE = TRUE AND COINGECKO_ID IS NOT NULL \
         ORDER BY MARKET_CAP_RANK ASC LIMIT ?"
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(asset_id, external_id)| Asset::new(asset_id, external_id))
        .collect())
}
