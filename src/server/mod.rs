use axum::{
    routing::{get, post},
    Router,
    http::{header, Method},
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use crate::storage::SqliteStore;
use crate::ui::Icons;

pub mod routes;

/// Server state
pub struct AppState {
    pub store: SqliteStore,
}

/// Any origin with credentials: the request origin is mirrored back,
/// since a literal `*` cannot be combined with credentials.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Build the application router. Unmatched paths are served from `static_dir`.
pub fn router(state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        .route("/api/submit", post(routes::submit))
        .route("/api/responses", get(routes::list))
        .route("/api/stats", get(routes::stats))
        .route("/api/export/csv", get(routes::export_csv))
        .route("/admin", get(routes::admin))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(port: u16, store: SqliteStore, static_dir: &Path) -> anyhow::Result<()> {
    let state = Arc::new(AppState { store });
    let app = router(state, static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);
    if static_dir.is_dir() {
        tracing::info!("Serving static files from {}", static_dir.display());
    } else {
        tracing::warn!("Static directory {} does not exist; non-API paths will return 404", static_dir.display());
    }
    println!("{} Server running at http://localhost:{}", Icons::GLOBE, port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
