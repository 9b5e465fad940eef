// src/bin/api_server.rs

use slmobi::infra::{logging, AppConfig, DiskImageStore, HttpFetcher, StorageBackend};
use slmobi::storage::{CatalogStore, MemoryStore, PgStore};
use slmobi::transport;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// How often expired admin sessions are purged.
const SESSION_PURGE_EVERY: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let config = AppConfig::from_env()?;

    // --- Storage ---
    let store: Arc<dyn CatalogStore> = match config.storage_backend {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            info!(max_connections = config.db_max_connections, "connecting to PostgreSQL");
            Arc::new(PgStore::connect(url, config.db_max_connections).await?)
        }
        StorageBackend::Memory => {
            warn!("using in-memory storage; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    // --- Images, fetcher, sessions ---
    let images = Arc::new(DiskImageStore::new(config.image_dir.clone()));
    info!(dir = %images.dir().display(), "image directory");
    let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout)?);

    let app_state = transport::http::AppState::new(&config, store, images, fetcher);
    let sessions = app_state.sessions.clone();
    sessions.clone().start_background_purge_task(SESSION_PURGE_EVERY);

    // --- API Server ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "API server listening");
    info!("Swagger UI available at /swagger-ui");

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!(error = %e, "server stopped");
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            sessions.shutdown();
            info!("graceful shutdown complete");
        }
    }

    Ok(())
}
