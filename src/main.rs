use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rulebook_backend::config::{Config, LogFormat, StoreConfig};
use rulebook_backend::search::SearchIndex;
use rulebook_backend::services::Services;
use rulebook_backend::store::{RecordStore, RestStore, SqliteStore};
use rulebook_backend::{api, create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting Rulebook Backend");
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (RULEBOOK_API_PSK). Admin routes are open!");
    }

    let store: Arc<dyn RecordStore> = match &config.store {
        StoreConfig::Rest { url, api_key } => {
            tracing::info!("Record store: {}", url);
            Arc::new(RestStore::new(url, api_key)?)
        }
        StoreConfig::Sqlite { db_path } => {
            tracing::info!("Record store: sqlite at {:?}", db_path);
            Arc::new(SqliteStore::open(db_path).await?)
        }
    };

    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    let state = AppState {
        services: Services::new(store),
        search,
        config: Arc::new(config.clone()),
    };

    tracing::info!("Building search index...");
    api::reindex(&state).await;

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
