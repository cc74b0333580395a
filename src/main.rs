use std::process::ExitCode;

use chrono::Utc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod db;
mod models;
mod services;
mod utils;

#[cfg(test)]
mod testing;

use api::coingecko::CoinGeckoClient;
use config::Settings;
use db::MySqlWarehouse;
use models::RunReport;
use utils::PipelineError;

/// One run: collect yesterday's prices, store them, verify the count
async fn run() -> Result<RunReport, PipelineError> {
    let settings = Settings::from_env()?;
    info!(
        "Warehouse {} (database {}, compute {})",
        settings.warehouse.host, settings.warehouse.database, settings.warehouse.compute
    );

    let source = CoinGeckoClient::with_base_url(
        settings.price_source.api_key.clone(),
        settings.price_source.base_url.clone(),
    );
    let warehouse = MySqlWarehouse::new(&settings.warehouse);

    if settings.warehouse.apply_schema {
        info!("Applying warehouse schema...");
        warehouse.ensure_schema().await.map_err(PipelineError::Schema)?;
    }

    services::run_pipeline(&settings, &source, &warehouse, Utc::now()).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env()
            .add_directive("crypto_daily_collector=debug".parse().unwrap())
            .add_directive("sqlx=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap()))
        .with_target(true)
        .init();

    info!("Starting crypto daily price collection");

    match run().await {
        Ok(report) => {
            info!(
                "Daily collection for {} complete: {} stored, {} failed, {} skipped",
                report.target_date, report.succeeded, report.failed, report.skipped
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Daily collection failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
