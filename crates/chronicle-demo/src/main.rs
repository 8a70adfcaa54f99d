//! Chronicle demo entry point.

use std::sync::Arc;

use chronicle_core::application::Application;
use chronicle_core::clock::SystemClock;
use chronicle_core::store::EventStore;
use chronicle_demo::config::{DemoConfig, StoreConfig};
use chronicle_demo::error::AppError;
use chronicle_demo::scenario;
use chronicle_event_store::memory_event_store::InMemoryEventStore;
use chronicle_event_store::pg_event_store::PgEventStore;
use chronicle_event_store::schema::CREATE_EVENTS_TABLE;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

async fn build_store(config: &StoreConfig) -> Result<Arc<dyn EventStore>, AppError> {
    match config {
        StoreConfig::InMemory => {
            tracing::info!("Using in-memory event store");
            Ok(Arc::new(InMemoryEventStore::new()))
        }
        StoreConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .connect(database_url)
                .await?;
            sqlx::raw_sql(CREATE_EVENTS_TABLE).execute(&pool).await?;
            tracing::info!("Using PostgreSQL event store");
            Ok(Arc::new(PgEventStore::new(pool)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = DemoConfig::from_env()?;
    let store = build_store(&config.store).await?;
    let app = Application::new(store, Arc::new(SystemClock));

    let view = scenario::run(&app).await?;
    let rendered = serde_json::to_string_pretty(&view)?;
    tracing::info!(report_id = %view.report_id, version = view.version, "scenario complete");
    println!("{rendered}");

    Ok(())
}
