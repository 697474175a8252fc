//! HTTP server for the NL2SQL pipeline.

use nl2sql::api::{create_router, AppState};
use nl2sql::{AppConfig, Nl2SqlService};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let service = Nl2SqlService::from_config(&config).await?;
    let stats = service.statistics();
    info!(
        "Service ready: {} tables, {} examples, generator={:?}, database_connected={}",
        stats.schema_info.total_tables,
        stats.few_shot_learning.total_examples,
        stats.model_info.generator,
        stats.database_connected
    );

    let app = create_router(AppState::new(service));
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
