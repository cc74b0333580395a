use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use tracing::{debug, error, warn};

use crate::config::WarehouseSettings;
use crate::models::{Asset, Observation};

pub mod assets;
pub mod price_history;

const SCHEMA_SQL: &str = include_str!("../../migrations/create_tables.sql");

/// Warehouse operations used by the pipeline, one per stage.
/// Each call opens its own session and releases it before returning.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Ranked active asset universe, at most `limit` entries
    async fn fetch_active_assets(&self, limit: u32) -> Result<Vec<Asset>, sqlx::Error>;

    /// Insert every row or none of them. Returns the number of rows committed.
    async fn insert_observations(&self, rows: &[Observation]) -> Result<u64, sqlx::Error>;

    /// Count of distinct asset ids stored at `timestamp`
    async fn count_assets_at(&self, timestamp: NaiveDateTime) -> Result<i64, sqlx::Error>;
}

/// MySQL-backed warehouse. No pool: a connection lives for exactly one operation.
pub struct MySqlWarehouse {
    options: MySqlConnectOptions,
    compute: String,
}

impl MySqlWarehouse {
    pub fn new(settings: &WarehouseSettings) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(&settings.host)
            .username(&settings.username)
            .password(&settings.password)
            .database(&settings.database);
        if let Some(port) = settings.port {
            options = options.port(port);
        }

        Self {
            options,
            compute: settings.compute.clone(),
        }
    }

    async fn connect(&self) -> Result<MySqlConnection, sqlx::Error> {
        debug!("Opening warehouse session (compute: {})", self.compute);
        MySqlConnection::connect_with(&self.options).await
    }

    async fn release(conn: MySqlConnection) {
        if let Err(e) = conn.close().await {
            warn!("Failed to close warehouse session cleanly: {}", e);
        }
    }

    /// Create the tables this job reads and writes if they are missing
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.connect().await?;
        let result = sqlx::raw_sql(SCHEMA_SQL)
            .execute(&mut conn)
            .await
            .map(|_| ());
        Self::release(conn).await;
        result
    }
}

/// All inserts run in one transaction; the first failure rolls everything back
async fn insert_all(conn: &mut MySqlConnection, rows: &[Observation]) -> Result<u64, sqlx::Error> {
    let mut tx = conn.begin().await?;

    for (index, row) in rows.iter().enumerate() {
        if let Err(e) = price_history::insert_observation(&mut *tx, row).await {
            error!(
                "Insert failed for asset {} (row {} of {}): {}",
                row.asset_id,
                index + 1,
                rows.len(),
                e
            );
            if let Err(rollback_err) = tx.rollback().await {
                error!("Failed to rollback: {}", rollback_err);
            }
            return Err(e);
        }
    }

    tx.commit().await?;
    Ok(rows.len() as u64)
}

#[async_trait]
impl Warehouse for MySqlWarehouse {
    async fn fetch_active_assets(&self, limit: u32) -> Result<Vec<Asset>, sqlx::Error> {
        let mut conn = self.connect().await?;
        let result = assets::get_active_assets(&mut conn, limit).await;
        Self::release(conn).await;
        result
    }

    async fn insert_observations(&self, rows: &[Observation]) -> Result<u64, sqlx::Error> {
        let mut conn = self.connect().await?;
        let result = insert_all(&mut conn, rows).await;
        Self::release(conn).await;
        result
    }

    async fn count_assets_at(&self, timestamp: NaiveDateTime) -> Result<i64, sqlx::Error> {
        let mut conn = self.connect().await?;
        let result = price_history::count_distinct_assets_at(&mut conn, timestamp).await;
        Self::release(conn).await;
        result
    }
}
