use axum::{routing::get, Router};
use database::DbRepository;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub db_repo: DbRepository,
}

/// Builds the read-only JSON API.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/timeline", get(handlers::get_timeline))
        .route("/api/news", get(handlers::get_news))
        .route("/api/news/:id", get(handlers::get_news_item))
        .route("/api/analyses", get(handlers::get_analyses))
        .route("/api/analyses/:id", get(handlers::get_analysis))
        .route("/api/trades", get(handlers::get_trades))
        .route("/api/trades/:id", get(handlers::get_trade))
        .route("/api/positions", get(handlers::get_positions_filtered))
        .route("/api/positions/open", get(handlers::get_open_positions))
        .route("/api/positions/history", get(handlers::get_position_history))
        .route("/api/positions/:id", get(handlers::get_position))
        .route("/api/portfolio/latest", get(handlers::get_latest_portfolio))
        .route("/api/portfolio/history", get(handlers::get_portfolio_history))
        .route("/api/events", get(handlers::get_events))
        .with_state(state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// Serves the API on `addr` until the process is stopped.
pub async fn run_server(addr: SocketAddr, db_repo: DbRepository) -> anyhow::Result<()> {
    let app = router(Arc::new(AppState { db_repo }));

    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
