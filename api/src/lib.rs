pub mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use manual_index::QueryService;
use tokio::signal;
use tracing::{error, info};

pub use crate::core::app_state::{AppConfig, AppState, ConfigError};
pub use crate::error_handler::{AppError, AppResult};

use crate::middleware_layer::request_id::request_id_layer;
use crate::routes::{
    index::rebuild_index_route::rebuild_index_route,
    records::record_route::record_route,
    root_route::root_route,
    search::search_route::{search_route, search_top_route},
    stats_route::stats_route,
};

/// Boots the HTTP server with configuration from the environment.
///
/// The corpus (if `CORPUS_PATH` is set) loads in the background; until it is
/// published, search endpoints answer 503.
pub async fn start() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let service = Arc::new(QueryService::from_config(config.service.clone()).map_err(ConfigError::from)?);

    if config.service.corpus_path.is_some() {
        let service = service.clone();
        tokio::spawn(async move {
            match service.rebuild_from_corpus(None).await {
                Ok(report) => info!(
                    indexed = report.indexed,
                    skipped = report.skipped,
                    duration_ms = report.duration_ms as u64,
                    "initial corpus load finished"
                ),
                Err(err) => error!(error = %err, "initial corpus load failed"),
            }
        });
    } else {
        info!("CORPUS_PATH not set; index stays unready until POST /index/rebuild");
    }

    let address = config.address.clone();
    let app = router(Arc::new(AppState::new(service, config)));

    // Bind to address
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(AppError::Bind)?;
    info!(%address, "listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)
}

/// Builds the application router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(root_route))
        .route("/stats", get(stats_route))
        .route("/search", post(search_route))
        .route("/search/top", post(search_top_route))
        .route("/records/{id}", get(record_route))
        .route("/index/rebuild", post(rebuild_index_route))
        .fallback(|| async { AppError::NotFound })
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_id_layer))
        .with_state(state)
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}
